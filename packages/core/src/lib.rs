//! Core domain types for the kiln build server.
//!
//! This crate contains shared types used across all packages:
//! - Job and Workspace for the configured build jobs
//! - BranchState and BuildRecord for per-branch build history
//! - LogPage for windowed build-log reads

mod build;
mod job;

pub use build::{BranchState, BuildRecord, BuildStatus, JobDetails, LogPage};
pub use job::{GitAuth, Job, ValidationError, Workspace, WorkspaceError, WORKSPACE_FILE};
