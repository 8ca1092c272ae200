//! Integration tests: retry counts on transient errors, no retry on fatal
//! errors, and the overall connect timeout preempting retries.
//!
//! Time is paused, so retry intervals and timeouts are virtual and exact.

use connretry_core::connector::{ScriptedConnector, Step};
use connretry_core::retry::{ConnectError, ConnectEvent, RetryController, RetryPolicy};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

const INVALID_LOGIN: u32 = 18456;

fn policy(max_retries: u32, interval_ms: u64, timeout_ms: Option<u64>) -> RetryPolicy {
    RetryPolicy::from_millis(max_retries, interval_ms, timeout_ms).unwrap()
}

/// Controller whose lookup treats only the invalid-login code as transient.
fn login_is_transient() -> RetryController {
    RetryController::new(|code: u32| code == INVALID_LOGIN)
}

/// Controller whose lookup treats everything except the invalid-login code as transient.
fn login_is_fatal() -> RetryController {
    RetryController::new(|code: u32| code != INVALID_LOGIN)
}

fn collect(mut rx: mpsc::UnboundedReceiver<ConnectEvent>) -> Vec<ConnectEvent> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

fn retry_attempts(events: &[ConnectEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|e| match e {
            ConnectEvent::Retry { attempt } => Some(*attempt),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn retries_specified_number_of_times_on_transient_errors() {
    let ctl = login_is_transient();
    let mut connector = ScriptedConnector::always_failing(INVALID_LOGIN);
    let (tx, rx) = mpsc::unbounded_channel();

    let err = ctl
        .connect_with_events(&policy(5, 25, Some(10_000)), &mut connector, Some(tx))
        .await
        .unwrap_err();

    assert!(!err.is_timeout());
    assert_eq!(err.code(), Some(INVALID_LOGIN));
    assert!(matches!(err, ConnectError::RetriesExhausted { retries: 5, .. }));
    assert_eq!(connector.attempts(), 6);

    let events = collect(rx);
    assert_eq!(retry_attempts(&events), vec![1, 2, 3, 4, 5]);
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert!(matches!(events.last(), Some(ConnectEvent::Failed { .. })));
}

#[tokio::test(start_paused = true)]
async fn no_retries_on_non_transient_errors() {
    let ctl = login_is_fatal();
    let mut connector = ScriptedConnector::always_failing(INVALID_LOGIN);
    let (tx, rx) = mpsc::unbounded_channel();
    let start = Instant::now();

    let err = ctl
        .connect_with_events(&policy(5, 25, Some(10_000)), &mut connector, Some(tx))
        .await
        .unwrap_err();

    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(matches!(&err, ConnectError::Fatal(e) if e.code == INVALID_LOGIN));
    assert_eq!(connector.attempts(), 1);

    let events = collect(rx);
    assert!(retry_attempts(&events).is_empty());
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], ConnectEvent::AttemptFailed { attempt: 0, .. }));
    assert!(matches!(events[1], ConnectEvent::Failed { .. }));
}

#[tokio::test(start_paused = true)]
async fn no_retries_if_connection_timeout_fires() {
    let ctl = login_is_transient();
    let mut connector = ScriptedConnector::always_failing(INVALID_LOGIN);
    let (tx, rx) = mpsc::unbounded_channel();
    let start = Instant::now();

    let err = ctl
        .connect_with_events(&policy(5, 25, Some(12)), &mut connector, Some(tx))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(start.elapsed(), Duration::from_millis(12));
    assert_eq!(connector.attempts(), 1);
    match &err {
        ConnectError::TimedOut {
            timeout,
            retries,
            last,
        } => {
            assert_eq!(*timeout, Duration::from_millis(12));
            assert_eq!(*retries, 0);
            assert_eq!(last.as_ref().map(|e| e.code), Some(INVALID_LOGIN));
        }
        other => panic!("expected TimedOut, got {other:?}"),
    }

    let events = collect(rx);
    assert!(retry_attempts(&events).is_empty());
    assert!(matches!(events.last(), Some(ConnectEvent::TimedOut { .. })));
}

#[tokio::test(start_paused = true)]
async fn timeout_wins_exact_tie_with_retry_timer() {
    let ctl = login_is_transient();
    let mut connector = ScriptedConnector::always_failing(INVALID_LOGIN);
    let (tx, rx) = mpsc::unbounded_channel();

    let err = ctl
        .connect_with_events(&policy(5, 25, Some(25)), &mut connector, Some(tx))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(connector.attempts(), 1);
    assert!(retry_attempts(&collect(rx)).is_empty());
}

#[tokio::test(start_paused = true)]
async fn timeout_preempts_a_later_retry() {
    // Retries fire at 25, 50, 75; the timeout at 90 cancels the wait for the fourth.
    let ctl = login_is_transient();
    let mut connector = ScriptedConnector::always_failing(INVALID_LOGIN);
    let (tx, rx) = mpsc::unbounded_channel();

    let err = ctl
        .connect_with_events(&policy(10, 25, Some(90)), &mut connector, Some(tx))
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectError::TimedOut { retries: 3, .. }));
    assert_eq!(connector.attempts(), 4);
    assert_eq!(retry_attempts(&collect(rx)), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn retry_count_matches_budget_for_any_small_budget() {
    let ctl = login_is_transient();
    for max_retries in 0..8u32 {
        let mut connector = ScriptedConnector::always_failing(INVALID_LOGIN);
        let (tx, rx) = mpsc::unbounded_channel();
        let err = ctl
            .connect_with_events(&policy(max_retries, 25, Some(10_000)), &mut connector, Some(tx))
            .await
            .unwrap_err();
        assert!(!err.is_timeout(), "budget {max_retries}");
        assert!(connector.attempts() <= max_retries + 1);
        assert_eq!(connector.attempts(), max_retries + 1);
        assert_eq!(retry_attempts(&collect(rx)).len(), max_retries as usize);
    }
}

#[tokio::test(start_paused = true)]
async fn unbounded_timeout_still_terminates() {
    let ctl = login_is_transient();
    let mut connector = ScriptedConnector::always_failing(INVALID_LOGIN)
        .with_latency(Duration::from_secs(60));
    let err = ctl
        .connect(&policy(2, 1_000, None), &mut connector)
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectError::RetriesExhausted { retries: 2, .. }));
    assert_eq!(connector.attempts(), 3);
}

#[tokio::test(start_paused = true)]
async fn succeeds_after_transient_failures() {
    let ctl = login_is_transient();
    let mut connector =
        ScriptedConnector::new(vec![Step::Fail(INVALID_LOGIN), Step::Fail(INVALID_LOGIN), Step::Succeed]);
    let (tx, rx) = mpsc::unbounded_channel();

    let session = ctl
        .connect_with_events(&policy(5, 25, Some(10_000)), &mut connector, Some(tx))
        .await
        .unwrap();

    assert_eq!(session.attempt, 2);
    let events = collect(rx);
    assert_eq!(
        events,
        vec![
            ConnectEvent::AttemptFailed {
                attempt: 0,
                error: events_error(&events, 0),
            },
            ConnectEvent::Retry { attempt: 1 },
            ConnectEvent::AttemptFailed {
                attempt: 1,
                error: events_error(&events, 2),
            },
            ConnectEvent::Retry { attempt: 2 },
            ConnectEvent::Connected { retries: 2 },
        ]
    );
}

fn events_error(events: &[ConnectEvent], idx: usize) -> connretry_core::retry::AttemptError {
    match &events[idx] {
        ConnectEvent::AttemptFailed { error, .. } => {
            assert_eq!(error.code, INVALID_LOGIN);
            error.clone()
        }
        other => panic!("expected AttemptFailed at {idx}, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn fatal_error_after_transient_ones_stops_retrying() {
    let ctl = login_is_transient();
    let mut connector = ScriptedConnector::new(vec![Step::Fail(INVALID_LOGIN), Step::Fail(233)]);
    let err = ctl
        .connect(&policy(5, 25, Some(10_000)), &mut connector)
        .await
        .unwrap_err();
    assert!(matches!(&err, ConnectError::Fatal(e) if e.code == 233));
    assert_eq!(connector.attempts(), 2);
}

#[tokio::test(start_paused = true)]
async fn dropped_event_receiver_does_not_change_outcome() {
    let ctl = login_is_transient();
    let mut connector = ScriptedConnector::always_failing(INVALID_LOGIN);
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);
    let err = ctl
        .connect_with_events(&policy(3, 25, Some(10_000)), &mut connector, Some(tx))
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectError::RetriesExhausted { retries: 3, .. }));
}

#[tokio::test(start_paused = true)]
async fn controller_keeps_no_state_between_connections() {
    let ctl = login_is_transient();
    let p = policy(2, 25, Some(10_000));

    let mut first = ScriptedConnector::always_failing(INVALID_LOGIN);
    let err = ctl.connect(&p, &mut first).await.unwrap_err();
    assert!(matches!(err, ConnectError::RetriesExhausted { retries: 2, .. }));

    let mut second = ScriptedConnector::new(vec![Step::Fail(INVALID_LOGIN), Step::Succeed]);
    let session = ctl.connect(&p, &mut second).await.unwrap();
    assert_eq!(session.attempt, 1);

    let mut third = ScriptedConnector::always_failing(INVALID_LOGIN);
    let err = ctl.connect(&p, &mut third).await.unwrap_err();
    assert!(matches!(err, ConnectError::RetriesExhausted { retries: 2, .. }));
    assert_eq!(third.attempts(), 3);
}

#[tokio::test(start_paused = true)]
async fn concurrent_connections_share_one_controller() {
    let ctl = login_is_transient();
    let p = policy(2, 25, Some(10_000));
    let mut a = ScriptedConnector::always_failing(INVALID_LOGIN);
    let mut b = ScriptedConnector::new(vec![Step::Succeed]);
    let (ra, rb) = tokio::join!(ctl.connect(&p, &mut a), ctl.connect(&p, &mut b));
    assert!(ra.is_err());
    assert!(rb.is_ok());
    assert_eq!(a.attempts(), 3);
    assert_eq!(b.attempts(), 1);
}
