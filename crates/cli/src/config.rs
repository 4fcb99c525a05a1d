//! Session settings: optional TOML file first, then command line overrides.
//!
//! ```toml
//! address = "bench-pc:41000"
//! transport_failure_mode = "report_and_reject"
//! connect_timeout_secs = 5
//! ```

use std::path::Path;

use anyhow::{anyhow, Context};
use session::{EndpointAddress, SessionConfig, TransportFailureMode};

use crate::args::Cli;

/// Resolves the effective configuration for this invocation.
pub fn resolve(cli: &Cli) -> anyhow::Result<SessionConfig> {
    let config = match &cli.config {
        Some(path) => load(path)?,
        None => SessionConfig::default(),
    };
    apply_overrides(config, cli)
}

pub fn load(path: &Path) -> anyhow::Result<SessionConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse(&text).with_context(|| format!("parsing config file {}", path.display()))
}

pub fn parse(text: &str) -> Result<SessionConfig, toml::de::Error> {
    toml::from_str(text)
}

fn apply_overrides(mut config: SessionConfig, cli: &Cli) -> anyhow::Result<SessionConfig> {
    if let Some(address) = &cli.address {
        config.address = EndpointAddress::new(address.as_str())
            .ok_or_else(|| anyhow!("--address must not be blank"))?;
    }
    if cli.reject_on_transport_failure {
        config.transport_failure_mode = TransportFailureMode::ReportAndReject;
    }
    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
