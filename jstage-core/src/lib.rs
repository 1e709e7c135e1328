// jstage-core/src/lib.rs
pub mod check;
pub mod extract;
pub mod fs;
pub mod ledger;
pub mod pipeline;

pub use check::{missing_artifacts, present_artifacts};
pub use ledger::{RepairReport, SymlinkLedger, SymlinkRecord};
pub use pipeline::{Orchestrator, RunSummary, Task, TaskPlanner};
