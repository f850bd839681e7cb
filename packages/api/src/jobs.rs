//! Job management server functions.

use dioxus::prelude::*;
use kiln_core::{Job, JobDetails};
use serde_json::Value as JsonValue;

/// List the workspace's jobs.
#[get("/jobs")]
pub async fn list_jobs() -> Result<Vec<Job>, ServerFnError> {
    #[cfg(feature = "server")]
    {
        use actors::global_registry;
        use actors::SupervisorMessage;

        crate::ensure_initialized()
            .await
            .map_err(|e| ServerFnError::new(format!("Initialization failed: {}", e)))?;

        let supervisor = global_registry()
            .get_supervisor()
            .ok_or_else(|| ServerFnError::new("Supervisor not available"))?;

        let (tx, rx) = actors::concurrency::oneshot();
        supervisor
            .send_message(SupervisorMessage::ListJobs { reply: tx.into() })
            .map_err(|e| ServerFnError::new(format!("Failed to send message: {}", e)))?;

        rx.await
            .map_err(|_| ServerFnError::new("Failed to receive response"))
    }

    #[cfg(not(feature = "server"))]
    {
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Trigger an on-demand poll of a job's repository.
///
/// Fire-and-forget: the poll itself runs in the job actor; the reply is a
/// small ack the caller may log and drop.
#[post("/jobs/:name/poll")]
pub async fn poll_job(name: String) -> Result<JsonValue, ServerFnError> {
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

        job.send_message(JobMessage::Poll)
            .map_err(|e| ServerFnError::new(format!("Failed to send message: {}", e)))?;

        Ok(serde_json::json!({ "status": "OK" }))
    }

    #[cfg(not(feature = "server"))]
    {
        let _ = name;
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Get a job's configuration and per-branch state.
#[get("/jobs/:name")]
pub async fn get_job(name: String) -> Result<Option<JobDetails>, ServerFnError> {
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
        job.send_message(JobMessage::GetDetails { reply: tx.into() })
            .map_err(|e| ServerFnError::new(format!("Failed to send message: {}", e)))?;

        rx.await
            .map(Some)
            .map_err(|_| ServerFnError::new("Failed to receive response"))
    }

    #[cfg(not(feature = "server"))]
    {
        let _ = name;
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Add a job to the workspace. This updates the workspace manifest.
#[post("/jobs")]
pub async fn create_job(job: Job) -> Result<Job, ServerFnError> {
    #[cfg(feature = "server")]
    {
        use actors::global_registry;
        use actors::SupervisorMessage;

        crate::ensure_initialized()
            .await
            .map_err(|e| ServerFnError::new(format!("Initialization failed: {}", e)))?;

        let supervisor = global_registry()
            .get_supervisor()
            .ok_or_else(|| ServerFnError::new("Supervisor not available"))?;

        let (tx, rx) = actors::concurrency::oneshot();
        supervisor
            .send_message(SupervisorMessage::AddJob {
                job: Box::new(job),
                reply: tx.into(),
            })
            .map_err(|e| ServerFnError::new(format!("Failed to send message: {}", e)))?;

        rx.await
            .map_err(|_| ServerFnError::new("Failed to receive response"))?
            .map_err(ServerFnError::new)
    }

    #[cfg(not(feature = "server"))]
    {
        let _ = job;
        Err(ServerFnError::new("Server-only function"))
    }
}

/// Remove a job from the workspace. This updates the workspace manifest.
/// Builds already running are not interrupted.
#[post("/jobs/:name/delete")]
pub async fn delete_job(name: String) -> Result<(), ServerFnError> {
    #[cfg(feature = "server")]
    {
        use actors::global_registry;
        use actors::SupervisorMessage;

        crate::ensure_initialized()
            .await
            .map_err(|e| ServerFnError::new(format!("Initialization failed: {}", e)))?;

        let supervisor = global_registry()
            .get_supervisor()
            .ok_or_else(|| ServerFnError::new("Supervisor not available"))?;

        let (tx, rx) = actors::concurrency::oneshot();
        supervisor
            .send_message(SupervisorMessage::RemoveJob {
                name,
                reply: tx.into(),
            })
            .map_err(|e| ServerFnError::new(format!("Failed to send message: {}", e)))?;

        rx.await
            .map_err(|_| ServerFnError::new("Failed to receive response"))?
            .map_err(ServerFnError::new)
    }

    #[cfg(not(feature = "server"))]
    {
        let _ = name;
        Err(ServerFnError::new("Server-only function"))
    }
}
