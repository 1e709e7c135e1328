// jstage/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use jstage_common::error::Result;
use jstage_common::model::Catalog;
use jstage_common::Config;

pub mod clean;
pub mod stage;
pub mod status;

use crate::cli::clean::Clean;
use crate::cli::stage::Stage;
use crate::cli::status::Status;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "jstage", bin_name = "jstage")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory to stage the runtime image into [env: JSTAGE_JAVA_HOME]
    #[arg(long, global = true, value_name = "DIR")]
    pub java_home: Option<PathBuf>,

    /// Reuse this scratch directory instead of creating a new one [env: JSTAGE_SCRATCH_DIR]
    #[arg(long, global = true, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,

    /// Load sources and layout from a TOML catalog [env: JSTAGE_CATALOG]
    #[arg(long, global = true, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download and unpack whatever java_home is missing (default)
    Stage(Stage),
    /// Show which parts of java_home are present
    Status(Status),
    /// Delete the staged java_home
    Clean(Clean),
}

impl Default for Command {
    fn default() -> Self {
        Self::Stage(Stage)
    }
}

impl Command {
    pub fn run(&self, config: &Config, catalog: &Catalog) -> Result<()> {
        match self {
            Self::Stage(command) => command.run(config, catalog),
            Self::Status(command) => command.run(config, catalog),
            Self::Clean(command) => command.run(config),
        }
    }
}
