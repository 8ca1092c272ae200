//! Error types for connection attempts and the retry controller.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Error reported by a `Connector` for a single attempt.
/// `code` is the server error number used for transient classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptError {
    pub code: u32,
    pub message: String,
}

impl AttemptError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for AttemptError {}

/// Terminal failure of a `connect` call.
///
/// Timeouts carry their own variant so callers can tell "the server rejected
/// us N times" apart from "we gave up waiting".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConnectError {
    /// Attempt failed with an error that is not transient. Never retried.
    #[error("connection failed: {0}")]
    Fatal(AttemptError),

    /// Attempt failed transiently after the retry budget was spent.
    #[error("connection failed after {retries} retries: {last}")]
    RetriesExhausted { retries: u32, last: AttemptError },

    /// Overall connect timeout elapsed before the connection was established.
    #[error("connection timed out after {}ms ({retries} retries)", .timeout.as_millis())]
    TimedOut {
        #[serde(serialize_with = "serialize_millis")]
        timeout: Duration,
        retries: u32,
        last: Option<AttemptError>,
    },
}

impl ConnectError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ConnectError::TimedOut { .. })
    }

    /// The connector error that ended (or last preceded) the operation.
    pub fn attempt_error(&self) -> Option<&AttemptError> {
        match self {
            ConnectError::Fatal(e) => Some(e),
            ConnectError::RetriesExhausted { last, .. } => Some(last),
            ConnectError::TimedOut { last, .. } => last.as_ref(),
        }
    }

    pub fn code(&self) -> Option<u32> {
        self.attempt_error().map(|e| e.code)
    }
}

/// Invalid retry policy parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("connect timeout must be positive (omit it for no timeout)")]
    ZeroConnectTimeout,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}
