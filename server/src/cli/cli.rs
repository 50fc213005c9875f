// server/src/cli/cli.rs

// CLI entry point: resolves configuration, starts logging, loads the seed
// data and then runs either one command or the interactive shell.

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use clinic_lib::config::{config_file, load_clinic_config, ClinicConfig};
use clinic_lib::seed::load_seed;
use clinic_lib::store::Store;

use crate::cli::commands::{CliArgs, ClinicCommand};
use crate::cli::handlers::{Session, StdinPrompter};
use crate::cli::interactive::run_cli_interactive;

/// The log filter used when RUST_LOG is not set.
pub fn default_log_filter(config: &ClinicConfig, verbose: bool) -> String {
    if verbose { "debug".to_string() } else { config.log_level.clone() }
}

fn init_logging(filter: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .try_init();
}

pub fn start_cli() -> Result<()> {
    let args = CliArgs::parse();

    let config = load_clinic_config(args.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&default_log_filter(&config, args.verbose));
    match config_file(args.config.as_deref()) {
        Some(path) => debug!("configuration read from {}", path.display()),
        None => debug!("no configuration file, using defaults and environment"),
    }
    debug!("configuration resolved: {:?}", config);

    let seed_dir = args.seed_dir.clone().or_else(|| config.data.seed_dir.clone());
    let state = load_seed(seed_dir.as_deref()).context("Failed to load seed data")?;
    info!(
        "loaded {} patients, {} appointments, {} prescriptions",
        state.patients().len(),
        state.appointments().len(),
        state.prescriptions().len()
    );

    let mut session = Session::new(Store::new(state), config);
    match args.command.unwrap_or(ClinicCommand::Interactive) {
        ClinicCommand::Interactive => run_cli_interactive(&mut session),
        command => {
            let stdout = io::stdout();
            session.execute(command, &mut StdinPrompter, &mut stdout.lock())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_prefer_verbose_over_configured_level() {
        let config = ClinicConfig::default();
        assert_eq!(default_log_filter(&config, false), "warn");
        assert_eq!(default_log_filter(&config, true), "debug");
    }
}
