//! Branch and build server functions.

use dioxus::prelude::*;
use kiln_core::{BranchState, LogPage};

/// Get one branch's state for a job.
#[get("/jobs/:name/branches/:branch")]
pub async fn get_branch(name: String, branch: String) -> Result<Option<BranchState>, ServerFnError> {
    #[cfg(feature = "server")]
    {
        use actors::global_registry;
        use actors::JobMessage;

        crate::ensure_initialized()
            .await
            .map_err(|e| ServerFnError::new(format!("Initialization failed: {}", e)))?;

        let Some(job) = global_registry().get_job(&name) else {
            return Ok(None);
        };

        let (tx, rx) = actors::concurrency::oneshot();
        job.send_message(JobMessage::GetBranch {
            branch,
            reply: tx.into(),
        })
        .map_err(|e| ServerFnError::new(format!("Failed to send message: {}", e)))?;

        rx.await
            .map_err(|_| ServerFnError::new("Failed to receive response"))
    }

    #[cfg(not(feature = "server"))]
    {
        let _ = (name, branch);
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Build a branch's tip unconditionally, bypassing the head comparison.
#[post("/jobs/:name/branches/:branch/builds")]
pub async fn force_build(name: String, branch: String) -> Result<u64, ServerFnError> {
    #[cfg(feature = "server")]
    {
        use actors::global_registry;
        use actors::JobMessage;

        crate::ensure_initialized()
            .await
            .map_err(|e| ServerFnError::new(format!("Initialization failed: {}", e)))?;

        let job = global_registry()
            .get_job(&name)
            .ok_or_else(|| ServerFnError::new("Not found"))?;

        let (tx, rx) = actors::concurrency::oneshot();
        job.send_message(JobMessage::ForceBuild {
            branch,
            reply: tx.into(),
        })
        .map_err(|e| ServerFnError::new(format!("Failed to send message: {}", e)))?;

        rx.await
            .map_err(|_| ServerFnError::new("Failed to receive response"))?
            .map_err(ServerFnError::new)
    }

    #[cfg(not(feature = "server"))]
    {
        let _ = (name, branch);
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Read a window of a build's log.
#[get("/jobs/:name/branches/:branch/builds/:number/log")]
pub async fn build_log(
    name: String,
    branch: String,
    number: u64,
    start: u32,
    num_lines: u32,
) -> Result<LogPage, ServerFnError> {
    #[cfg(feature = "server")]
    {
        use actors::global_registry;
        use actors::JobMessage;

        crate::ensure_initialized()
            .await
            .map_err(|e| ServerFnError::new(format!("Initialization failed: {}", e)))?;

        let job = global_registry()
            .get_job(&name)
            .ok_or_else(|| ServerFnError::new("Not found"))?;

        let (tx, rx) = actors::concurrency::oneshot();
        job.send_message(JobMessage::GetBuildLog {
            branch,
            number,
            start,
            num_lines,
            reply: tx.into(),
        })
        .map_err(|e| ServerFnError::new(format!("Failed to send message: {}", e)))?;

        rx.await
            .map_err(|_| ServerFnError::new("Failed to receive response"))?
            .map_err(ServerFnError::new)
    }

    #[cfg(not(feature = "server"))]
    {
        let _ = (name, branch, number, start, num_lines);
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Kill a running build.
#[post("/jobs/:name/branches/:branch/builds/:number/abort")]
pub async fn abort_build(name: String, branch: String, number: u64) -> Result<(), ServerFnError> {
    #[cfg(feature = "server")]
    {
        use actors::global_registry;
        use actors::JobMessage;

        crate::ensure_initialized()
            .await
            .map_err(|e| ServerFnError::new(format!("Initialization failed: {}", e)))?;

        let job = global_registry()
            .get_job(&name)
            .ok_or_else(|| ServerFnError::new("Not found"))?;

        let (tx, rx) = actors::concurrency::oneshot();
        job.send_message(JobMessage::AbortBuild {
            branch,
            number,
            reply: tx.into(),
        })
        .map_err(|e| ServerFnError::new(format!("Failed to send message: {}", e)))?;

        rx.await
            .map_err(|_| ServerFnError::new("Failed to receive response"))?
            .map_err(ServerFnError::new)
    }

    #[cfg(not(feature = "server"))]
    {
        let _ = (name, branch, number);
        Err(ServerFnError::new("Server-only function"))
    }
}
