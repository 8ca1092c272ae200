//! Signals emitted while a connection is being established.

use super::error::{AttemptError, ConnectError};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// Observable progress of a `connect` call. Zero or more `AttemptFailed` /
/// `Retry` events are followed by exactly one terminal event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConnectEvent {
    /// An attempt failed. `attempt` is 0 for the initial attempt.
    AttemptFailed { attempt: u32, error: AttemptError },
    /// The retry interval elapsed and re-attempt `attempt` (1-based) is starting.
    Retry { attempt: u32 },
    /// Terminal: a session was established.
    Connected { retries: u32 },
    /// Terminal: fatal error or retry budget exhausted.
    Failed { error: ConnectError },
    /// Terminal: the overall connect timeout elapsed.
    TimedOut { error: ConnectError },
}

impl ConnectEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConnectEvent::Connected { .. } | ConnectEvent::Failed { .. } | ConnectEvent::TimedOut { .. }
        )
    }

    pub(crate) fn terminal_for(error: &ConnectError) -> Self {
        if error.is_timeout() {
            ConnectEvent::TimedOut {
                error: error.clone(),
            }
        } else {
            ConnectEvent::Failed {
                error: error.clone(),
            }
        }
    }
}

/// Optional event sink. A closed receiver is ignored; it never changes the outcome.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventSink(Option<UnboundedSender<ConnectEvent>>);

impl EventSink {
    pub(crate) fn new(tx: Option<UnboundedSender<ConnectEvent>>) -> Self {
        Self(tx)
    }

    pub(crate) fn emit(&self, event: ConnectEvent) {
        if let Some(tx) = &self.0 {
            if tx.send(event).is_err() {
                tracing::trace!("connect event receiver dropped");
            }
        }
    }
}
