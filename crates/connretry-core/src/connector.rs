//! The connection collaborator driven by the retry controller.
//!
//! A `Connector` performs exactly one connection attempt per call and never
//! retries on its own; the controller owns retries and the overall timeout.
//! [`ScriptedConnector`] plays back a fixed sequence of outcomes and backs
//! the `simulate` command and the tests.

use crate::retry::AttemptError;
use std::future::Future;
use std::time::Duration;

/// Makes one connection attempt per call.
///
/// The returned future may be dropped before it resolves (timeout); that is
/// how an in-flight attempt is cancelled.
pub trait Connector {
    type Session: Send;

    fn attempt(&mut self) -> impl Future<Output = Result<Self::Session, AttemptError>> + Send;
}

/// One scripted attempt outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Fail with the given server error code.
    Fail(u32),
    /// Establish a session.
    Succeed,
    /// Never resolve (e.g. a server that accepted TCP but never answers).
    Hang,
}

/// Session returned by [`ScriptedConnector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedSession {
    /// 0-based index of the attempt that succeeded.
    pub attempt: u32,
}

/// Plays back `steps` in order, one per attempt; the last step repeats once
/// the script runs out. An empty script always succeeds.
#[derive(Debug, Clone)]
pub struct ScriptedConnector {
    steps: Vec<Step>,
    latency: Duration,
    attempts: u32,
}

impl ScriptedConnector {
    pub fn new(steps: impl Into<Vec<Step>>) -> Self {
        Self {
            steps: steps.into(),
            latency: Duration::ZERO,
            attempts: 0,
        }
    }

    /// Always fail with `code`.
    pub fn always_failing(code: u32) -> Self {
        Self::new(vec![Step::Fail(code)])
    }

    /// Delay every attempt's outcome by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of attempts started so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn next_step(&self) -> Step {
        let idx = self.attempts as usize;
        self.steps
            .get(idx)
            .or_else(|| self.steps.last())
            .copied()
            .unwrap_or(Step::Succeed)
    }
}

impl Connector for ScriptedConnector {
    type Session = SimulatedSession;

    async fn attempt(&mut self) -> Result<SimulatedSession, AttemptError> {
        let step = self.next_step();
        let attempt = self.attempts;
        self.attempts += 1;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match step {
            Step::Succeed => Ok(SimulatedSession { attempt }),
            Step::Fail(code) => Err(AttemptError::new(
                code,
                format!("scripted failure on attempt {attempt}"),
            )),
            Step::Hang => std::future::pending().await,
        }
    }
}
