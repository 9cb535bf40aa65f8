//! Error types for the API crate.

use thiserror::Error;

/// API error type covering all failure modes of a server call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured base URL could not be parsed.
    #[error("invalid server URL: {0}")]
    InvalidBaseUrl(String),

    /// The request never produced a response (connection refused, DNS
    /// failure, timeout, TLS error).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    ///
    /// `message` carries the `error` field of the response body when the
    /// server provided one, otherwise the raw body text.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Server-provided error message, if any.
        message: String,
    },

    /// A 2xx response carried a body that could not be decoded as the
    /// expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// A local file could not be read for upload.
    #[error("failed to read {path}: {source}")]
    LocalFile {
        /// The path that failed to read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Returns the HTTP status code when the error is a status failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_includes_message() {
        let err = ApiError::Status {
            status: 507,
            message: "quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "server returned 507: quota exceeded");
        assert_eq!(err.status(), Some(507));
    }

    #[test]
    fn test_non_status_errors_have_no_code() {
        let err = ApiError::InvalidBaseUrl("not a url".to_string());
        assert_eq!(err.status(), None);
    }
}
