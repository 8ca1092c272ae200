//! Per-connection attempt bookkeeping.

use super::error::AttemptError;
use serde::Serialize;

/// Where a single `connect` call currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Connecting,
    WaitingToRetry,
    TimedOut,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::TimedOut | Phase::Succeeded | Phase::Failed)
    }
}

/// Mutable state of one connection lifecycle. Created fresh by every
/// `connect` call and never shared between calls.
#[derive(Debug, Clone, Default)]
pub struct AttemptState {
    /// Re-attempts made so far (the initial attempt is not counted).
    pub attempts_made: u32,
    pub phase: Phase,
    pub last_error: Option<AttemptError>,
}

impl AttemptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to `next`. Terminal phases are final.
    pub(crate) fn transition(&mut self, next: Phase) {
        debug_assert!(
            !self.phase.is_terminal(),
            "transition {:?} -> {:?} after terminal phase",
            self.phase,
            next
        );
        tracing::trace!(from = ?self.phase, to = ?next, "attempt phase");
        self.phase = next;
    }
}
