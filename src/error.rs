use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Missing or malformed caller-supplied input.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(&'static str),

    /// Business-rule violation such as a duplicate name or a non-empty space.
    #[error("{0}")]
    Conflict(String),

    /// A gateway or encoding step failed; the cause has already been logged.
    #[error("{0}")]
    Failed(&'static str),

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("mail delivery failed: {0}")]
    Mail(String),

    #[error("invalid token format")]
    InvalidTokenFormat,
}

impl Error {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Returns true for errors caused by the caller's input rather than application state.
    #[must_use]
    pub const fn is_param_error(&self) -> bool {
        matches!(self, Self::BadRequest(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Collapses a low-level failure into an application error with a fixed message.
pub trait ResultExt<T> {
    fn op_err(self, message: &'static str) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn op_err(self, message: &'static str) -> Result<T> {
        self.map_err(|e| {
            tracing::warn!("{message}: {e}");
            Error::Failed(message)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_err_hides_cause() {
        let raw: std::result::Result<(), Error> = Err(Error::Config("disk on fire".into()));
        let err = raw.op_err("get apply list failed").unwrap_err();
        assert_eq!(err.to_string(), "get apply list failed");
        assert!(!err.is_param_error());
    }

    #[test]
    fn test_bad_request_is_param_error() {
        assert!(Error::bad_request("id can not be empty").is_param_error());
        assert!(!Error::conflict("space name already exists").is_param_error());
    }
}
