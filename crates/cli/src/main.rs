//! `fmlink` entry point.
//!
//! Composition root: parses the command line, installs the tracing
//! subscriber, resolves [`session::SessionConfig`], and wires a
//! [`ws_rpc::WsConnector`] into a [`session::Session`] for the chosen
//! subcommand.

use std::process::ExitCode;

use clap::Parser;

mod args;
mod commands;
mod config;
mod telemetry;

use args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let telemetry = telemetry::init(cli.log_format)?;

    let outcome = match config::resolve(&cli) {
        Ok(config) => commands::run(cli.command, config).await,
        Err(err) => Err(err),
    };

    telemetry.shutdown();
    outcome
}
