//! Clap derive structures for the `intesis` CLI.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// intesis -- control Intesis HVAC units through the vendor cloud
#[derive(Debug, Parser)]
#[command(
    name = "intesis",
    version,
    about = "Control Intesis HVAC units from the command line",
    long_about = "Talks to the Intesis cloud API for device inventory and status,\n\
        and drives the per-session TCP control channel for parameter writes.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Cloud account username
    #[arg(long, short = 'u', env = "INTESIS_USERNAME", global = true)]
    pub username: Option<String>,

    /// Cloud account password
    #[arg(
        long,
        short = 'p',
        env = "INTESIS_PASSWORD",
        global = true,
        hide_env = true
    )]
    pub password: Option<String>,

    /// Path to the YAML credentials file
    #[arg(long, env = "INTESIS_SECRETS", global = true)]
    pub secrets: Option<PathBuf>,

    /// Cloud API base URL override (testing / debugging)
    #[arg(long, env = "INTESIS_HOSTNAME", global = true)]
    pub hostname: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List all devices on the account
    Devices,

    /// Show the current state of a device
    Status {
        /// Numeric device id
        device: i64,
    },

    /// Read one parameter of a device
    Get {
        /// Numeric device id
        device: i64,
        /// Parameter name (e.g. power, mode, setpoint) or raw uid
        param: String,
    },

    /// Write one parameter of a device
    Set {
        /// Numeric device id
        device: i64,
        /// Parameter name (e.g. power, mode, setpoint) or raw uid
        param: String,
        /// Value word (e.g. on, heat) or raw integer
        value: String,
        /// Debug override of the TCP control endpoint (host:port)
        #[arg(long)]
        tcp_server: Option<String>,
    },

    /// Poll a device's state on an interval until interrupted
    Watch {
        /// Numeric device id
        device: i64,
        /// Poll interval (e.g. 30s, 2m)
        #[arg(long, short = 'i', default_value = "30s", value_parser = humantime::parse_duration)]
        interval: Duration,
    },
}
