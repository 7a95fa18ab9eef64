//! Install, update and uninstall execution.
//!
//! Two strategies exist: delegating to an external packaging tool, or
//! copying bundles straight out of the market mirror cache. Batches run
//! sequentially and report per-item outcomes.

pub mod ansi;
pub mod batch;
pub mod direct;
pub mod error;
pub mod orchestrator;
pub mod tool;

pub use {
    batch::{BatchProgress, BatchReport, ProgressSender},
    direct::{DirectInstaller, delete_installation},
    error::{Error, Result},
    orchestrator::{Orchestrator, SyncReport},
    tool::{CommandTool, PackageTool, agent_args},
};
