// jstage/src/cli/stage.rs
use clap::Args;
use colored::Colorize;
use jstage_common::error::Result;
use jstage_common::model::Catalog;
use jstage_common::Config;
use jstage_core::Orchestrator;
use jstage_net::HttpDownloader;

#[derive(Args, Debug, Clone)]
pub struct Stage;

impl Stage {
    pub fn run(&self, config: &Config, catalog: &Catalog) -> Result<()> {
        println!(
            "{}Staging {} into {}",
            "==> ".bold().blue(),
            catalog.release.bold(),
            config.java_home().display()
        );

        let downloader = HttpDownloader::new()?;
        let summary = Orchestrator::new(config, catalog, &downloader).run()?;

        if summary.missing.is_empty() {
            println!(
                "{}{}",
                "==> ".bold().blue(),
                "java_home is already complete".bold()
            );
            return Ok(());
        }

        println!(
            "{}Ran {} tasks for {}",
            "==> ".bold().blue(),
            summary.tasks_run,
            summary.missing
        );
        println!(
            "    links: {} recorded, {} repaired, {} already present",
            summary.repair.total(),
            summary.repair.repaired,
            summary.repair.already_present
        );
        for record in &summary.repair.broken {
            println!(
                "    {} {} -> {}",
                "broken link".yellow(),
                record.link_path.display(),
                record.target_path.display()
            );
        }
        if let Some(scratch) = &summary.scratch {
            println!("    scratch directory kept at {}", scratch.display());
        }
        if !summary.still_missing.is_empty() {
            println!(
                "{}{} {}",
                "==> ".bold().yellow(),
                "Still missing:".yellow().bold(),
                summary.still_missing
            );
        } else {
            println!("{}{}", "==> ".bold().blue(), "Done".green().bold());
        }
        Ok(())
    }
}
