//! Error types for safewander.
//!
//! This module defines all error types used throughout the safewander crate,
//! covering the remote services, the local cache, and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for safewander operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Remote Service Errors ===
    /// The HTTP request could not be performed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// An operation timed out.
    #[error("operation timed out: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
    },

    /// A response body could not be interpreted.
    #[error("could not decode {what}: {message}")]
    Decode {
        /// What was being decoded.
        what: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// The requested review does not exist.
    #[error("review {id} not found")]
    NotFound {
        /// The requested id.
        id: i64,
    },

    /// User input was rejected before anything was sent.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    // === Object Storage Errors ===
    /// No storage service is configured.
    #[error("object storage is not configured (set storage.url and storage.anon_key)")]
    StorageNotConfigured,

    /// An object upload failed.
    #[error("failed to upload {path}: {message}")]
    Upload {
        /// The object path inside the bucket.
        path: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Cache Errors ===
    /// Failed to open or create the cache database.
    #[error("failed to open cache at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A cache query failed.
    #[error("cache query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run cache migrations.
    #[error("cache migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for safewander operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new validation error.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a new decode error.
    #[must_use]
    pub fn decode(what: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            what,
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is transient, so the same request may succeed later.
    ///
    /// Timeouts, connection failures, 408, 429 and 5xx answers count as
    /// transient. Everything else is final.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Status { status, .. } => is_retryable_status(*status),
            Self::Http(err) => {
                err.is_timeout()
                    || err.is_connect()
                    || err.is_request()
                    || err.status().is_some_and(|s| is_retryable_status(s.as_u16()))
            }
            _ => false,
        }
    }

    /// Check if this error means the requested record does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error was caused by rejected user input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

fn is_retryable_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..600).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound { id: 7 };
        assert_eq!(err.to_string(), "review 7 not found");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_validation_error_display() {
        let err = Error::validation("rating", "must be between 1 and 5");
        assert_eq!(err.to_string(), "invalid rating: must be between 1 and 5");
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_status_error_display() {
        let err = Error::Status {
            url: "http://localhost/reviews".to_string(),
            status: 502,
        };
        let msg = err.to_string();
        assert!(msg.contains("/reviews"));
        assert!(msg.contains("502"));
    }

    #[test]
    fn test_retryable_statuses() {
        for status in [408, 429, 500, 502, 503, 504] {
            let err = Error::Status {
                url: String::new(),
                status,
            };
            assert!(err.is_retryable(), "{status} should be retryable");
        }
        for status in [400, 401, 403, 404, 422] {
            let err = Error::Status {
                url: String::new(),
                status,
            };
            assert!(!err.is_retryable(), "{status} should be final");
        }
    }

    #[test]
    fn test_timeout_is_retryable() {
        let err = Error::Timeout {
            operation: "GET /reviews".to_string(),
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("GET /reviews"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound { id: 1 }.is_not_found());
        assert!(!Error::internal("x").is_not_found());
        assert!(!Error::NotFound { id: 1 }.is_retryable());
    }

    #[test]
    fn test_upload_error_display() {
        let err = Error::Upload {
            path: "123-photo.jpg".to_string(),
            message: "bucket not found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("123-photo.jpg"));
        assert!(msg.contains("bucket not found"));
    }

    #[test]
    fn test_storage_not_configured_display() {
        assert!(Error::StorageNotConfigured
            .to_string()
            .contains("storage.url"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_decode_error_display() {
        let err = Error::decode("review record", "missing id");
        assert_eq!(err.to_string(), "could not decode review record: missing id");
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "backend.url must not be empty".to_string(),
        };
        assert!(err.to_string().contains("backend.url"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
