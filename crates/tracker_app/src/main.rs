mod cli;
mod commands;
mod config;
mod logging;
mod render;

use std::path::PathBuf;

use anyhow::Context;

use crate::config::{AppConfig, BASE_URL_ENV, DEFAULT_CONFIG_FILE};
use crate::logging::LogDestination;

fn main() -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches();

    let destination = matches
        .get_one::<String>("log")
        .and_then(|value| LogDestination::from_arg(value))
        .unwrap_or(LogDestination::File);
    logging::initialize(destination, matches.get_flag("verbose"));

    let config_path = matches
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut config = AppConfig::load(&config_path).context("could not load configuration")?;
    config.override_base_url(
        std::env::var(BASE_URL_ENV).ok(),
        matches.get_one::<String>("base-url").map(String::as_str),
    );

    commands::run_command(&matches, &config)
}
