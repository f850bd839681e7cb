//! Server API functions for the kiln build server.
//!
//! This crate contains all shared fullstack server functions for:
//! - Workspace management (list, get, add, remove jobs)
//! - Polling (on-demand poll of a job's repository)
//! - Branches and builds (details, force build, log pages, abort)

mod branches;
mod jobs;

#[cfg(feature = "server")]
mod init;

// Re-export all server functions
pub use branches::*;
pub use jobs::*;

#[cfg(feature = "server")]
pub use init::*;

// Re-export core types for convenience
pub use kiln_core::{
    BranchState, BuildRecord, BuildStatus, GitAuth, Job, JobDetails, LogPage, Workspace,
};
