//! Supervisor actor owning the workspace and its job actors.

use std::collections::HashMap;
use std::path::PathBuf;

use kiln_core::{Job, Workspace};
use ractor::{Actor, ActorProcessingErr, ActorRef};

use crate::job_actor::{JobActor, JobArgs};
use crate::messages::{JobMessage, SupervisorMessage};
use crate::persistence::write_workspace_file;
use crate::registry::global_registry;

/// Arguments for starting the supervisor.
pub struct SupervisorArgs {
    /// The workspace loaded from its manifest.
    pub workspace: Workspace,
    /// Directory the workspace lives in; job state nests under it.
    pub dir: PathBuf,
}

/// State for the supervisor actor.
pub struct SupervisorState {
    /// The workspace as currently configured.
    pub workspace: Workspace,
    /// Workspace directory.
    pub dir: PathBuf,
    /// All job actors by job name.
    pub jobs: HashMap<String, ActorRef<JobMessage>>,
}

async fn spawn_job_actor(
    state: &mut SupervisorState,
    job: Job,
) -> Result<ActorRef<JobMessage>, ActorProcessingErr> {
    let dir = state.dir.join(&job.name);
    tokio::fs::create_dir_all(&dir).await?;

    let name = job.name.clone();
    let (actor, _handle) = Actor::spawn(None, JobActor, JobArgs { job, dir })
        .await
        .map_err(|e| ActorProcessingErr::from(format!("Failed to spawn job actor: {}", e)))?;

    global_registry().register_job(&name, actor.clone());
    state.jobs.insert(name, actor.clone());
    Ok(actor)
}

/// Supervisor actor that owns the workspace.
pub struct Supervisor;

impl Actor for Supervisor {
    type Msg = SupervisorMessage;
    type State = SupervisorState;
    type Arguments = SupervisorArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: SupervisorArgs,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            jobs = args.workspace.jobs.len(),
            dir = %args.dir.display(),
            "Starting workspace supervisor"
        );

        let mut state = SupervisorState {
            workspace: args.workspace,
            dir: args.dir,
            jobs: HashMap::new(),
        };

        for job in state.workspace.jobs.clone() {
            spawn_job_actor(&mut state, job).await?;
        }

        Ok(state)
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SupervisorMessage::ListJobs { reply } => {
                let _ = reply.send(state.workspace.jobs.clone());
            }

            SupervisorMessage::AddJob { job, reply } => {
                let job = *job;
                if let Err(e) = job.validate() {
                    let _ = reply.send(Err(e.to_string()));
                    return Ok(());
                }
                if state.workspace.job(&job.name).is_some() {
                    let _ = reply.send(Err("Job with this name already exists".to_string()));
                    return Ok(());
                }

                if let Err(e) = spawn_job_actor(state, job.clone()).await {
                    let _ = reply.send(Err(format!("Failed to start job: {}", e)));
                    return Ok(());
                }
                state.workspace.jobs.push(job.clone());

                match write_workspace_file(&state.dir, &state.workspace).await {
                    Ok(()) => {
                        tracing::info!(job = %job.name, "job added");
                        let _ = reply.send(Ok(job));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(format!("Failed to write manifest: {}", e)));
                    }
                }
            }

            SupervisorMessage::RemoveJob { name, reply } => {
                // Stopping the actor stops polling; builds already running
                // finish on their own and report into the void.
                if let Some(actor) = state.jobs.remove(&name) {
                    actor.stop(None);
                }
                global_registry().unregister_job(&name);
                state.workspace.jobs.retain(|j| j.name != name);

                match write_workspace_file(&state.dir, &state.workspace).await {
                    Ok(()) => {
                        tracing::info!(job = %name, "job removed");
                        let _ = reply.send(Ok(()));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(format!("Failed to write manifest: {}", e)));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Start the supervisor over a loaded workspace.
pub async fn start_supervisor(
    workspace: Workspace,
    dir: PathBuf,
) -> Result<(ActorRef<SupervisorMessage>, ractor::concurrency::JoinHandle<()>), ractor::SpawnErr> {
    Actor::spawn(None, Supervisor, SupervisorArgs { workspace, dir }).await
}
