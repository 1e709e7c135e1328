// jstage-core/src/pipeline/mod.rs
pub mod plan;
pub mod runner;

pub use plan::{Task, TaskPlanner};
pub use runner::{Orchestrator, RunSummary};
