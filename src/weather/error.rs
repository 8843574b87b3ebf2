use serde::Serialize;
use thiserror::Error;

/// Why weather could not be obtained for a single forecast point
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchError {
    /// The point itself is malformed; nothing was sent
    #[error("Invalid forecast point: {message}")]
    Validation { message: String },

    /// Connection failure or timeout, still failing after all retries
    #[error("Network error after {attempts} attempts: {message}")]
    Network { attempts: u32, message: String },

    /// The weather endpoint answered with a non-success status
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The weather endpoint answered 2xx with a body that is not valid weather data
    #[error("Malformed weather response: {message}")]
    MalformedResponse { message: String },
}

impl FetchError {
    /// Only transport-level failures are worth another attempt
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Network { .. })
    }
}
