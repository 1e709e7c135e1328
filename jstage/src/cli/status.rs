// jstage/src/cli/status.rs
use clap::Args;
use colored::Colorize;
use jstage_common::error::Result;
use jstage_common::model::{ArtifactSet, Catalog};
use jstage_common::Config;
use jstage_core::{missing_artifacts, present_artifacts};
use serde_json::json;

#[derive(Args, Debug, Clone)]
pub struct Status {
    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

impl Status {
    pub fn run(&self, config: &Config, catalog: &Catalog) -> Result<()> {
        let java_home = config.java_home();
        let missing = missing_artifacts(java_home, &catalog.sentinels);

        if self.json {
            let present = present_artifacts(java_home, &catalog.sentinels);
            let report = json!({
                "java_home": java_home,
                "release": catalog.release,
                "present": present.names(),
                "missing": missing.names(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("{}{}", "==> ".bold().blue(), java_home.display());
        for (class, sentinel) in catalog.sentinels.entries() {
            let name = class_name(class);
            if missing.contains(class) {
                println!("  {} {:<18} {}", "✗".red().bold(), name, "missing".red());
            } else {
                println!(
                    "  {} {:<18} {}",
                    "✓".green().bold(),
                    name,
                    sentinel.display().to_string().dimmed()
                );
            }
        }
        Ok(())
    }
}

fn class_name(class: ArtifactSet) -> &'static str {
    class.names().first().copied().unwrap_or("unknown")
}
