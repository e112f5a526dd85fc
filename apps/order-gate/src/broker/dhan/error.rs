//! Dhan-specific error types.
//!
//! These never cross the adapter boundary. [`super::DhanBroker`] converts
//! every variant into an offline report, a zero quote or a rejected
//! placement before returning.

use thiserror::Error;

/// Errors from the Dhan HTTP client.
#[derive(Debug, Error, Clone)]
pub enum DhanError {
    /// Network or transport failure.
    #[error("Network error: {0}")]
    Network(String),

    /// API returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// Response body could not be parsed.
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// Retries exhausted without a usable response.
    #[error("Max retries exceeded after {attempts} attempts")]
    MaxRetriesExceeded {
        /// Number of attempts made before giving up.
        attempts: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_status() {
        let err = DhanError::Api {
            status: 401,
            message: "Invalid token".to_string(),
        };
        assert_eq!(err.to_string(), "API error (401): Invalid token");
    }

    #[test]
    fn test_max_retries_display() {
        let err = DhanError::MaxRetriesExceeded { attempts: 3 };
        assert_eq!(err.to_string(), "Max retries exceeded after 3 attempts");
    }
}
