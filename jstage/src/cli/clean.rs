// jstage/src/cli/clean.rs
use clap::Args;
use colored::Colorize;
use jstage_common::error::Result;
use jstage_common::Config;
use jstage_core::fs::remove_java_home;

#[derive(Args, Debug, Clone)]
pub struct Clean;

impl Clean {
    pub fn run(&self, config: &Config) -> Result<()> {
        let java_home = config.java_home();
        if remove_java_home(java_home)? {
            println!(
                "{}Removed {}",
                "==> ".bold().blue(),
                java_home.display()
            );
        } else {
            println!("{} does not exist, nothing to remove", java_home.display());
        }
        Ok(())
    }
}
