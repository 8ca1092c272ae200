//! Retry controller: drives a `Connector` until it connects, fails terminally,
//! or the overall connect timeout elapses.

use super::classify::TransientErrorLookup;
use super::error::ConnectError;
use super::event::{ConnectEvent, EventSink};
use super::policy::RetryPolicy;
use super::state::{AttemptState, Phase};
use crate::connector::Connector;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;

/// Stateless across `connect` calls; every call gets its own `AttemptState`,
/// so one controller can serve independent connections concurrently.
#[derive(Clone)]
pub struct RetryController {
    lookup: Arc<dyn TransientErrorLookup>,
}

impl std::fmt::Debug for RetryController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryController").finish_non_exhaustive()
    }
}

impl RetryController {
    pub fn new(lookup: impl TransientErrorLookup + 'static) -> Self {
        Self {
            lookup: Arc::new(lookup),
        }
    }

    pub fn from_shared(lookup: Arc<dyn TransientErrorLookup>) -> Self {
        Self { lookup }
    }

    /// Establish a connection under `policy`.
    pub async fn connect<C: Connector>(
        &self,
        policy: &RetryPolicy,
        connector: &mut C,
    ) -> Result<C::Session, ConnectError> {
        self.connect_with_events(policy, connector, None).await
    }

    /// Like [`RetryController::connect`], also sending [`ConnectEvent`]s to `events`.
    pub async fn connect_with_events<C: Connector>(
        &self,
        policy: &RetryPolicy,
        connector: &mut C,
        events: Option<UnboundedSender<ConnectEvent>>,
    ) -> Result<C::Session, ConnectError> {
        let sink = EventSink::new(events);
        let mut state = AttemptState::new();
        let result = self.drive(policy, connector, &mut state, &sink).await;
        debug_assert!(state.phase.is_terminal());
        debug_assert!(state.attempts_made <= policy.max_retries());
        match &result {
            Ok(_) => sink.emit(ConnectEvent::Connected {
                retries: state.attempts_made,
            }),
            Err(e) => sink.emit(ConnectEvent::terminal_for(e)),
        }
        result
    }

    async fn drive<C: Connector>(
        &self,
        policy: &RetryPolicy,
        connector: &mut C,
        state: &mut AttemptState,
        sink: &EventSink,
    ) -> Result<C::Session, ConnectError> {
        // Armed once at the first attempt and never reset.
        let mut timeout = connect_deadline(policy);

        loop {
            state.transition(Phase::Connecting);
            tracing::debug!(attempt = state.attempts_made, "connection attempt");

            let outcome = tokio::select! {
                biased;
                () = &mut timeout => None,
                res = connector.attempt() => Some(res),
            };
            let err = match outcome {
                None => return Err(timed_out(policy, state)),
                Some(Ok(session)) => {
                    state.transition(Phase::Succeeded);
                    tracing::info!(retries = state.attempts_made, "connection established");
                    return Ok(session);
                }
                Some(Err(err)) => err,
            };

            tracing::warn!(
                attempt = state.attempts_made,
                code = err.code,
                "connection attempt failed: {}",
                err.message
            );
            sink.emit(ConnectEvent::AttemptFailed {
                attempt: state.attempts_made,
                error: err.clone(),
            });

            let transient = self.lookup.is_transient_error(err.code);
            if !transient || !policy.has_retries_left(state.attempts_made) {
                state.transition(Phase::Failed);
                let error = if transient {
                    ConnectError::RetriesExhausted {
                        retries: state.attempts_made,
                        last: err.clone(),
                    }
                } else {
                    ConnectError::Fatal(err.clone())
                };
                state.last_error = Some(err);
                tracing::warn!(retries = state.attempts_made, "giving up: {}", error);
                return Err(error);
            }
            state.last_error = Some(err);

            state.transition(Phase::WaitingToRetry);
            let retry_timer = tokio::time::sleep(policy.retry_interval());
            let retry_due = tokio::select! {
                biased;
                () = &mut timeout => false,
                () = retry_timer => true,
            };
            if !retry_due {
                return Err(timed_out(policy, state));
            }

            state.attempts_made += 1;
            tracing::info!(attempt = state.attempts_made, "retrying connection");
            sink.emit(ConnectEvent::Retry {
                attempt: state.attempts_made,
            });
        }
    }
}

/// Future that completes when the overall connect timeout elapses, or never
/// when the policy has no timeout.
fn connect_deadline(policy: &RetryPolicy) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    match policy.connect_timeout() {
        Some(t) => Box::pin(tokio::time::sleep_until(Instant::now() + t)),
        None => Box::pin(std::future::pending()),
    }
}

fn timed_out(policy: &RetryPolicy, state: &mut AttemptState) -> ConnectError {
    state.transition(Phase::TimedOut);
    let error = ConnectError::TimedOut {
        timeout: policy.connect_timeout().unwrap_or_default(),
        retries: state.attempts_made,
        last: state.last_error.clone(),
    };
    tracing::warn!(retries = state.attempts_made, "{}", error);
    error
}
