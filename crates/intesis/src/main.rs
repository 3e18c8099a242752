mod cli;
mod commands;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use intesis_core::HvacConfig;

use crate::cli::{Cli, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = build_hvac_config(&cli.global)?;
    tracing::debug!(command = ?cli.command, "dispatching command");
    commands::dispatch(cli.command, config).await
}

/// Build an `HvacConfig` from the settings file, credential chain, and
/// CLI overrides.
fn build_hvac_config(global: &GlobalOpts) -> Result<HvacConfig, CliError> {
    let settings = intesis_config::load_settings()?;

    let secrets_path = global
        .secrets
        .clone()
        .unwrap_or_else(intesis_config::default_secrets_path);
    let creds = intesis_config::resolve_credentials(
        global.username.as_deref(),
        global.password.as_deref(),
        &secrets_path,
    )?;

    let mut config = intesis_config::to_hvac_config(&creds, &settings);
    if let Some(ref hostname) = global.hostname {
        config.hostname.clone_from(hostname);
    }
    Ok(config)
}
