use worker::Env;

use crate::error::ApiError;

pub const MAX_UPLOAD_BYTES_VAR: &str = "MAX_UPLOAD_BYTES";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const MEBIBYTE: usize = 1024 * 1024;

/// Settings of the HTTP boundary. The extraction core never sees these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub max_upload_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServiceConfig {
    /// Builds the config from a variable lookup; unset variables keep their
    /// defaults, malformed ones are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_upload_bytes = match lookup(MAX_UPLOAD_BYTES_VAR) {
            None => DEFAULT_MAX_UPLOAD_BYTES,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(value) if value > 0 => value,
                _ => {
                    return Err(ApiError::Internal(format!(
                        "invalid {MAX_UPLOAD_BYTES_VAR} '{raw}', expected a positive byte count"
                    )));
                }
            },
        };

        Ok(Self { max_upload_bytes })
    }

    pub fn from_env(env: &Env) -> Result<Self, ApiError> {
        Self::from_lookup(|name| env.var(name).ok().map(|value| value.to_string()))
    }

    /// Human-readable upload limit, e.g. `10MB`.
    #[must_use]
    pub fn max_upload_label(&self) -> String {
        if self.max_upload_bytes % MEBIBYTE == 0 {
            format!("{}MB", self.max_upload_bytes / MEBIBYTE)
        } else {
            format!("{} bytes", self.max_upload_bytes)
        }
    }
}
