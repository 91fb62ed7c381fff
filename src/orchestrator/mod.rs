//! Application-level orchestration.
//!
//! This module owns the workflow state machine (image → video → optional edit), the
//! controller task that serves UI commands, and post-run processing such as handoff and
//! downloads. UI/CLI layers call into this module to keep responsibilities separated.

#[cfg(feature = "tui")]
mod controller;
mod post_process;
mod run;
mod workflow;

#[cfg(feature = "tui")]
pub(crate) use controller::{run_controller, ControllerCtx, UiCommand};
pub(crate) use post_process::{process_run_completion, save_artifact};
pub use run::{Stage, StageStatus, WorkflowInput, WorkflowRun};
pub use workflow::WorkflowOrchestrator;
