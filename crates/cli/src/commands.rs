//! Subcommand bodies. Each one owns its session from connect to close.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use serde_json::Value;
use session::{
    BaseClient, CallError, CloseInfo, EventName, ExtendedClient, ExtendedSession, Session,
    SessionBuilder, SessionConfig, SessionError,
};
use tokio::sync::Notify;
use tracing::{info, warn};
use ws_rpc::WsConnector;

use crate::args::Command;

/// Upper bound on the farewell `EnableEvents(false)`; with the default
/// failure mode a call on a dead connection never settles.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub async fn run(command: Command, config: SessionConfig) -> anyhow::Result<ExitCode> {
    let closed = Arc::new(Notify::new());
    let session = connect(config, Arc::clone(&closed)).await?;
    let outcome = match command {
        Command::Version => call(&session, "GetAppVersion", Vec::new()).await,
        Command::Call { method, args } => call(&session, &method, args).await,
        Command::Watch {
            variables,
            interval,
        } => watch(session.activate(), &variables, interval, &closed).await,
    };
    session.close().await;
    outcome
}

/// Connects and arranges for `closed` to be notified when the connection
/// ends.
async fn connect(config: SessionConfig, closed: Arc<Notify>) -> anyhow::Result<Session> {
    let connector = WsConnector::from_config(&config);
    let address = config.address.clone();
    SessionBuilder::from_config(config)
        .on_close(move |close: &CloseInfo| {
            info!(code = ?close.code, reason = %close.reason, "Connection closed");
            closed.notify_one();
        })
        .connect(&connector)
        .await
        .with_context(|| format!("connecting to {address}"))
}

/// Prints the data of a successful call. A remote failure prints its
/// descriptor to stderr and yields a failing exit code.
async fn call(session: &Session, method: &str, args: Vec<Value>) -> anyhow::Result<ExitCode> {
    let result = tokio::select! {
        result = session.call(method, args) => result,
        _ = tokio::signal::ctrl_c() => bail!("interrupted while waiting for {method}"),
    };

    match result {
        Ok(data) => {
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(CallError::Remote(err)) => {
            eprintln!("{method} failed: {}", serde_json::to_string_pretty(err.descriptor())?);
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err).with_context(|| format!("calling {method}")),
    }
}

async fn watch(
    session: ExtendedSession,
    variables: &[String],
    interval_ms: u32,
    closed: &Notify,
) -> anyhow::Result<ExitCode> {
    for event in EventName::ALL {
        session.set_event_handler(
            event,
            Arc::new(move |args: &[Value]| {
                println!("{} {}", event.as_str(), Value::Array(args.to_vec()));
            }),
        );
    }

    start_watching(&session, variables, interval_ms)
        .await
        .context("starting to watch")?;
    info!(subscriptions = variables.len(), "Watching; press Ctrl-C to stop");

    tokio::select! {
        interrupted = tokio::signal::ctrl_c() => interrupted.context("waiting for Ctrl-C")?,
        _ = closed.notified() => {
            warn!("Service closed the connection");
            return Ok(ExitCode::FAILURE);
        }
    }

    match tokio::time::timeout(SHUTDOWN_GRACE, session.enable_events(false)).await {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => warn!(error = %err, "Could not disable notifications"),
        Err(_) => warn!("No answer while disabling notifications"),
    }
    Ok(ExitCode::SUCCESS)
}

/// Turns notifications on and subscribes to each variable.
async fn start_watching(
    session: &ExtendedSession,
    variables: &[String],
    interval_ms: u32,
) -> Result<(), SessionError> {
    session.enable_events(true).await?;
    for name in variables {
        session.subscribe_variable(name, interval_ms).await?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
