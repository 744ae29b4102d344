//! Error type for calls to the club data service.

use thiserror::Error;

/// Failure reported by the data service (or the driver underneath it).
///
/// Keeps the human message and the machine-readable code apart so the
/// classifier can match markers against either.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
    pub code: Option<String>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Error for a lookup that matched no row.
    pub fn not_found(what: &str, id: i64) -> Self {
        Self::with_code(format!("{what} {id} not found"), "not_found")
    }
}

impl From<sqlx::Error> for RemoteError {
    fn from(e: sqlx::Error) -> Self {
        let code = match &e {
            sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
            sqlx::Error::PoolTimedOut => Some("pool_timed_out".to_string()),
            sqlx::Error::Io(io) => Some(io.kind().to_string()),
            sqlx::Error::RowNotFound => Some("not_found".to_string()),
            _ => None,
        };
        Self {
            message: e.to_string(),
            code,
        }
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(e: serde_json::Error) -> Self {
        Self::with_code(e.to_string(), "invalid_payload")
    }
}

/// Result alias for data service calls.
pub type RemoteResult<T> = Result<T, RemoteError>;
