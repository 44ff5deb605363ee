use serde::{Deserialize, Serialize};
use statement_tables::ExtractionResult;

pub const SERVICE_NAME: &str = "pdf-parser";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

impl HealthResponse {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            service: SERVICE_NAME.to_string(),
            version: SERVICE_VERSION.to_string(),
        }
    }
}

/// Body of a successful `POST /parse`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParseResponse {
    pub rows: Vec<Vec<String>>,
    pub pages_processed: usize,
    pub method_used: String,
    pub total_rows: usize,
}

impl From<ExtractionResult> for ParseResponse {
    fn from(result: ExtractionResult) -> Self {
        Self {
            rows: result.rows,
            pages_processed: result.pages_processed,
            method_used: result.method_used.as_str().to_string(),
            total_rows: result.total_rows,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}
