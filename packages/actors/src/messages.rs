//! Message types for actor communication.

use kiln_core::{BranchState, BuildStatus, Job, JobDetails, LogPage};
use ractor::RpcReplyPort;

/// Messages for the Supervisor.
#[derive(Debug)]
pub enum SupervisorMessage {
    /// List the workspace's jobs.
    ListJobs { reply: RpcReplyPort<Vec<Job>> },

    /// Add a job to the workspace and start watching it.
    AddJob {
        job: Box<Job>,
        reply: RpcReplyPort<Result<Job, String>>,
    },

    /// Remove a job and stop its actor. Running builds are not
    /// interrupted; they finish against the detached actor.
    RemoveJob {
        name: String,
        reply: RpcReplyPort<Result<(), String>>,
    },
}

/// Messages for a JobActor.
#[derive(Debug)]
pub enum JobMessage {
    /// Compare remote branch heads against the last seen commits and
    /// start builds for branches that moved. Sent by the interval
    /// ticker and by the on-demand poll endpoint alike.
    Poll,

    /// Get the job's configuration plus per-branch state.
    GetDetails { reply: RpcReplyPort<JobDetails> },

    /// Get one branch's state.
    GetBranch {
        branch: String,
        reply: RpcReplyPort<Option<BranchState>>,
    },

    /// Build a branch's tip unconditionally.
    ForceBuild {
        branch: String,
        reply: RpcReplyPort<Result<u64, String>>,
    },

    /// Read a window of a build's log.
    GetBuildLog {
        branch: String,
        number: u64,
        start: u32,
        num_lines: u32,
        reply: RpcReplyPort<Result<LogPage, String>>,
    },

    /// Kill a running build.
    AbortBuild {
        branch: String,
        number: u64,
        reply: RpcReplyPort<Result<(), String>>,
    },

    /// A build actor finished; record the outcome.
    BuildFinished {
        branch: String,
        number: u64,
        status: BuildStatus,
    },
}

/// Messages for a BuildActor.
#[derive(Debug)]
pub enum BuildMessage {
    /// Kill the build's child process.
    Abort,

    /// The child process exited (or was killed); report and stop.
    Exited { status: BuildStatus },
}
