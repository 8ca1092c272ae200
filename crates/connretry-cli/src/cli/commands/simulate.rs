//! `connretry simulate` – drive the retry controller with a scripted connector.

use anyhow::{Context, Result};
use connretry_core::config::ConnretryConfig;
use connretry_core::connector::{ScriptedConnector, Step};
use connretry_core::retry::{CodeSetLookup, ConnectEvent, RetryController, RetryPolicy};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::cli::SimulateArgs;

/// Config values with command-line overrides applied.
pub(crate) fn effective_settings(
    cfg: &ConnretryConfig,
    args: &SimulateArgs,
) -> Result<(RetryPolicy, CodeSetLookup)> {
    let mut retry = cfg.retry.clone();
    if let Some(n) = args.max_retries {
        retry.max_retries = n;
    }
    if let Some(ms) = args.retry_interval_ms {
        retry.retry_interval_ms = ms;
    }
    if args.no_timeout {
        retry.connect_timeout_ms = None;
    } else if let Some(ms) = args.connect_timeout_ms {
        retry.connect_timeout_ms = Some(ms);
    }
    let policy = retry.to_policy().context("invalid retry settings")?;

    let mut transient = cfg.transient.clone();
    transient.extra_codes.extend(args.transient.iter().copied());
    Ok((policy, transient.to_lookup()))
}

/// Attempt script: the requested failures, then success or a hang.
pub(crate) fn script(args: &SimulateArgs) -> Vec<Step> {
    let mut steps: Vec<Step> = args.fail.iter().copied().map(Step::Fail).collect();
    if args.hang {
        steps.push(Step::Hang);
    } else if args.then_succeed || steps.is_empty() {
        steps.push(Step::Succeed);
    }
    steps
}

fn describe(event: &ConnectEvent) -> String {
    match event {
        ConnectEvent::AttemptFailed { attempt, error } => {
            format!("attempt {} failed: {}", attempt, error)
        }
        ConnectEvent::Retry { attempt } => format!("retry {}", attempt),
        ConnectEvent::Connected { retries } => format!("connected after {} retries", retries),
        ConnectEvent::Failed { error } => format!("failed: {}", error),
        ConnectEvent::TimedOut { error } => format!("timed out: {}", error),
    }
}

pub async fn run_simulate(cfg: &ConnretryConfig, args: &SimulateArgs) -> Result<()> {
    let (policy, lookup) = effective_settings(cfg, args)?;
    let mut connector =
        ScriptedConnector::new(script(args)).with_latency(Duration::from_millis(args.latency_ms));
    let controller = RetryController::new(lookup);
    tracing::debug!(?policy, "simulating connection");

    let (tx, mut rx) = mpsc::unbounded_channel::<ConnectEvent>();
    let json = args.json;
    let printer = async move {
        while let Some(event) = rx.recv().await {
            if json {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::warn!("serialize event: {}", e),
                }
            } else {
                println!("{}", describe(&event));
            }
        }
    };

    let (result, ()) = tokio::join!(
        controller.connect_with_events(&policy, &mut connector, Some(tx)),
        printer
    );

    match result {
        Ok(session) => {
            if !json {
                println!(
                    "session established on attempt {} ({} attempts made)",
                    session.attempt,
                    connector.attempts()
                );
            }
            Ok(())
        }
        Err(e) => Err(e).context(format!("after {} attempts", connector.attempts())),
    }
}
