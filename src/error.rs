//! Error types.
//!
//! Request-level failures are `ClientError` and always reach the caller.
//! Transport lifecycle failures are `TransportError` and stay inside the
//! manager, which logs them.

use std::time::Duration;

/// Failure of a single request.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The URL could not be parsed or is not http/https. No network call was made.
    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// No lease could be taken from the connection pool in time.
    #[error("timed out after {0:?} waiting for a pooled connection")]
    PoolTimeout(Duration),

    #[error("connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The handle holds no live transport (initialization failed or it was closed).
    #[error("pooled transport is unavailable")]
    Unavailable,

    /// A blocking call was made on a current-thread async runtime, which cannot
    /// hand its thread over. Nothing was sent.
    #[error("cannot block inside a current-thread async runtime; use the non-blocking executor")]
    BlockingInAsyncContext,
}

impl ClientError {
    pub(crate) fn invalid_url(url: &str, reason: impl ToString) -> Self {
        ClientError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for errors raised before anything was sent.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidUrl { .. } | ClientError::BlockingInAsyncContext
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout(e)
        } else if e.is_connect() {
            ClientError::Connect(e)
        } else {
            ClientError::Transport(e)
        }
    }
}

/// Failure while building or closing the pooled transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to start I/O runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("{field} = {value} exceeds the maximum of {max}")]
    LimitTooLarge {
        field: &'static str,
        value: usize,
        max: usize,
    },

    #[error("transport {0} is already closed")]
    AlreadyClosed(u64),
}
