// jstage/src/main.rs
use std::process;

use clap::Parser;
use colored::Colorize;
use jstage_common::config::Config;
use jstage_common::error::Result;
use jstage_common::model::Catalog;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{CliArgs, Command};

fn init_logging(verbose: u8) {
    let level_filter = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("JSTAGE_LOG")
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .without_time()
        .try_init();
}

fn load_config(cli_args: &CliArgs) -> Result<Config> {
    let mut config = Config::load()?;
    if let Some(java_home) = &cli_args.java_home {
        config = config.with_java_home(java_home)?;
    }
    if let Some(scratch_dir) = &cli_args.scratch_dir {
        config = config.with_scratch_dir(scratch_dir);
    }
    if let Some(catalog) = &cli_args.catalog {
        config = config.with_catalog(catalog);
    }
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

fn run(cli_args: &CliArgs) -> Result<()> {
    let config = load_config(cli_args)?;
    let catalog = Catalog::load(config.catalog_path.as_deref())?;
    debug!(
        "Using catalog '{}' with {} sources",
        catalog.release,
        catalog.sources.len()
    );
    let command = cli_args.command.clone().unwrap_or_default();
    command.run(&config, &catalog)
}

fn main() {
    let cli_args = CliArgs::parse();
    init_logging(cli_args.verbose);

    if let Err(e) = run(&cli_args) {
        error!("Command failed: {:#}", e);
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        process::exit(1);
    }
    debug!("Command completed successfully.");
}
