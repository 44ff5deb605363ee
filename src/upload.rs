use statement_tables::{ExtractOptions, extract_pdf_bytes};

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::models::ParseResponse;

pub const FILE_FIELD: &str = "file";

#[must_use]
pub fn missing_file() -> ApiError {
    ApiError::BadRequest("No file uploaded".to_string())
}

/// A body that cannot be read as multipart form data has no file in it.
pub fn require_form<T>(form: worker::Result<T>) -> Result<T, ApiError> {
    form.map_err(|_| missing_file())
}

fn too_large(config: &ServiceConfig) -> ApiError {
    ApiError::PayloadTooLarge(format!(
        "File too large (max {})",
        config.max_upload_label()
    ))
}

/// Rejects a request whose declared body size exceeds the limit. Missing or
/// unparsable headers are left to the per-file check.
pub fn check_content_length(
    content_length: Option<&str>,
    config: &ServiceConfig,
) -> Result<(), ApiError> {
    let declared = content_length.and_then(|value| value.trim().parse::<usize>().ok());
    match declared {
        Some(length) if length > config.max_upload_bytes => Err(too_large(config)),
        _ => Ok(()),
    }
}

pub fn validate_upload(filename: &str, size: usize, config: &ServiceConfig) -> Result<(), ApiError> {
    if filename.is_empty() {
        return Err(ApiError::BadRequest("Empty filename".to_string()));
    }
    if !filename.to_ascii_lowercase().ends_with(".pdf") {
        return Err(ApiError::BadRequest("File must be a PDF".to_string()));
    }
    if size > config.max_upload_bytes {
        return Err(too_large(config));
    }
    Ok(())
}

/// Runs extraction over one validated upload. The bytes are dropped when
/// this returns, whatever the outcome.
pub fn parse_upload(bytes: Vec<u8>, config: &ServiceConfig) -> Result<ParseResponse, ApiError> {
    if bytes.len() > config.max_upload_bytes {
        return Err(too_large(config));
    }

    let result = extract_pdf_bytes(&bytes, &ExtractOptions::default())?;
    Ok(ParseResponse::from(result))
}
