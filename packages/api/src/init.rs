//! Server bootstrap for the workspace supervisor.

use std::path::PathBuf;

use actors::{global_registry, start_supervisor};
use kiln_core::Workspace;
use tokio::sync::OnceCell;

static INIT: OnceCell<Result<(), String>> = OnceCell::const_new();

/// Directory the workspace lives in, from `KILN_WORKSPACE`.
fn workspace_dir() -> PathBuf {
    std::env::var("KILN_WORKSPACE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./workspace"))
}

/// Initialize the workspace supervisor.
///
/// This should be called once at server startup before handling requests.
pub async fn init_workspace() -> Result<(), String> {
    let dir = workspace_dir();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| format!("cannot create workspace dir: {}", e))?;
    let dir = dir
        .canonicalize()
        .map_err(|e| format!("cannot resolve workspace dir: {}", e))?;

    let workspace = Workspace::load(&dir).map_err(|e| e.to_string())?;
    tracing::info!(
        dir = %dir.display(),
        jobs = workspace.jobs.len(),
        "Initializing workspace"
    );

    let (supervisor, _handle) = start_supervisor(workspace, dir)
        .await
        .map_err(|e| e.to_string())?;
    global_registry().register_supervisor(supervisor);

    tracing::info!("Workspace initialized");
    Ok(())
}

/// Run initialization exactly once, however many requests race to it.
pub(crate) async fn ensure_initialized() -> Result<(), String> {
    INIT.get_or_init(|| async { init_workspace().await })
        .await
        .clone()
}
