//! Actor system for the kiln build server.
//!
//! This crate provides the Ractor-based runtime that owns the workspace
//! and runs builds.
//!
//! # Architecture
//!
//! - `Supervisor` - Top-level actor that owns the workspace and job actors
//! - `JobActor` - Polls one repository's branch heads and starts builds
//! - `BuildActor` - Runs one build script and streams its log
//!
//! # Usage
//!
//! ```ignore
//! use actors::{start_supervisor, SupervisorMessage};
//!
//! // Start the supervisor over a loaded workspace
//! let (supervisor, handle) = start_supervisor(workspace, dir).await?;
//!
//! // Ask for the job list via message
//! supervisor.send_message(SupervisorMessage::ListJobs { reply })?;
//! ```

mod build_actor;
pub mod git;
mod job_actor;
mod messages;
mod persistence;
pub mod registry;
mod supervisor;

pub use build_actor::{BuildActor, BuildArgs};
pub use job_actor::{JobActor, JobArgs};
pub use messages::{BuildMessage, JobMessage, SupervisorMessage};
pub use persistence::{write_workspace_file, BranchStore, PersistenceError};
pub use registry::{global_registry, ActorRegistry};
pub use supervisor::{start_supervisor, Supervisor, SupervisorArgs};

/// Re-export ractor types for convenience.
pub use ractor::{concurrency, Actor, ActorRef, RpcReplyPort};
