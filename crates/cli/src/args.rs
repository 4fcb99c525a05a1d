//! Command line surface.

use std::convert::Infallible;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;

/// Talk to a running fmlink service over WebSocket.
#[derive(Debug, Parser)]
#[command(name = "fmlink", version)]
pub struct Cli {
    /// Service address as `host:port`. Overrides the configuration file.
    #[arg(long, global = true, env = "FMLINK_ADDRESS")]
    pub address: Option<String>,

    /// TOML file holding session settings.
    #[arg(long, global = true, env = "FMLINK_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        env = "FMLINK_LOG_FORMAT",
        value_enum,
        default_value = "pretty"
    )]
    pub log_format: LogFormat,

    /// Fail calls whose transport breaks instead of leaving them pending.
    #[arg(long, global = true)]
    pub reject_on_transport_failure: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the service's application version.
    Version,

    /// Invoke one remote method and print its data.
    Call {
        /// Remote method name, e.g. `ReadVariable`.
        method: String,

        /// Arguments in order. Each is read as JSON; anything that is not
        /// valid JSON is sent as a string.
        #[arg(value_parser = parse_json_arg, allow_hyphen_values = true)]
        args: Vec<Value>,
    },

    /// Enable notifications and print them until interrupted.
    Watch {
        /// Variable to subscribe to. Repeatable.
        #[arg(long = "variable", value_name = "NAME")]
        variables: Vec<String>,

        /// Sampling interval for subscribed variables.
        #[arg(long, value_name = "MS", default_value_t = 100)]
        interval: u32,
    },
}

/// `42` and `[1,2]` stay JSON; `speed` becomes `"speed"`.
pub fn parse_json_arg(raw: &str) -> Result<Value, Infallible> {
    Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
