//! Job actor: polls one repository and starts builds for moved heads.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

use kiln_core::{BranchState, BuildStatus, Job, JobDetails, LogPage};
use ractor::{Actor, ActorProcessingErr, ActorRef};

use crate::build_actor::{BuildActor, BuildArgs};
use crate::git;
use crate::messages::{BuildMessage, JobMessage};
use crate::persistence::BranchStore;

/// Arguments for starting a job actor.
pub struct JobArgs {
    /// Validated job configuration.
    pub job: Job,
    /// Directory owned by this job; one subdirectory per branch.
    pub dir: PathBuf,
}

/// State for a job actor.
pub struct JobActorState {
    job: Job,
    dir: PathBuf,
    branches: HashMap<String, BranchState>,
    /// Build actors currently running, keyed by branch and build number.
    running: HashMap<(String, u64), ActorRef<BuildMessage>>,
}

impl JobActorState {
    fn store(&self, branch: &str) -> BranchStore {
        BranchStore::new(self.dir.join(branch))
    }

    async fn save_branch(&self, branch: &str) {
        if let Some(state) = self.branches.get(branch)
            && let Err(e) = self.store(branch).save(state).await
        {
            tracing::warn!(job = %self.job.name, branch = %branch, error = %e, "failed to save branch state");
        }
    }

    /// Allocate a build number, record it, clone the checkout, and hand it
    /// to a build actor. A failed clone is recorded as a failed build.
    async fn start_build(
        &mut self,
        myself: &ActorRef<JobMessage>,
        branch: &str,
        commit: Option<String>,
    ) -> Result<u64, String> {
        let store = self.store(branch);
        store.init().await.map_err(|e| e.to_string())?;
        let number = store
            .next_build_number()
            .await
            .map_err(|e| e.to_string())?;

        let build_dir = store.build_dir(number);
        if build_dir.exists() {
            tokio::fs::remove_dir_all(&build_dir)
                .await
                .map_err(|e| e.to_string())?;
        }
        let checkout = build_dir.join("repo");
        tokio::fs::create_dir_all(&checkout)
            .await
            .map_err(|e| e.to_string())?;

        self.branches
            .entry(branch.to_string())
            .or_default()
            .record_build(number, commit.clone());
        self.save_branch(branch).await;

        let url = self.job.repo_url.clone();
        let auth = self.job.auth.clone();
        let branch_name = branch.to_string();
        let commit_for_clone = commit.clone();
        let checkout_for_clone = checkout.clone();
        let cloned = tokio::task::spawn_blocking(move || {
            git::clone_commit(
                &url,
                &branch_name,
                commit_for_clone.as_deref(),
                &checkout_for_clone,
                auth.as_ref(),
            )
        })
        .await;

        match cloned {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(job = %self.job.name, branch = %branch, number, error = %e, "checkout failed");
                if let Some(state) = self.branches.get_mut(branch) {
                    state.finish_build(number, BuildStatus::Failed);
                }
                self.save_branch(branch).await;
                return Ok(number);
            }
            Err(e) => return Err(format!("checkout task failed: {}", e)),
        }

        tracing::info!(job = %self.job.name, branch = %branch, number, commit = ?commit, "build started");
        let args = BuildArgs {
            script: self.job.build_script.clone(),
            dir: checkout,
            log_path: build_dir.join("log.txt"),
            branch: branch.to_string(),
            number,
            parent: myself.clone(),
        };
        match Actor::spawn(None, BuildActor, args).await {
            Ok((actor, _handle)) => {
                self.running.insert((branch.to_string(), number), actor);
            }
            Err(e) => {
                tracing::warn!(job = %self.job.name, branch = %branch, number, error = %e, "failed to spawn build");
                if let Some(state) = self.branches.get_mut(branch) {
                    state.finish_build(number, BuildStatus::Failed);
                }
                self.save_branch(branch).await;
            }
        }
        Ok(number)
    }
}

/// Actor watching one job's repository.
pub struct JobActor;

impl Actor for JobActor {
    type Msg = JobMessage;
    type State = JobActorState;
    type Arguments = JobArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: JobArgs,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(job = %args.job.name, "Starting job actor");
        tokio::fs::create_dir_all(&args.dir).await?;

        // Pick up branch state persisted by earlier runs.
        let mut branches = HashMap::new();
        let mut entries = tokio::fs::read_dir(&args.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let branch = entry.file_name().to_string_lossy().into_owned();
            match BranchStore::new(entry.path()).load().await {
                Ok(Some(state)) => {
                    branches.insert(branch, state);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(job = %args.job.name, branch = %branch, error = %e, "failed to load branch state");
                }
            }
        }

        if args.job.poll_interval_seconds > 0 {
            let myself_clone = myself.clone();
            let period = Duration::from_secs(args.job.poll_interval_seconds);
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                // The first tick completes immediately; the first poll
                // should wait a full period.
                interval.tick().await;
                loop {
                    interval.tick().await;
                    if myself_clone.send_message(JobMessage::Poll).is_err() {
                        break;
                    }
                }
            });
        }

        Ok(JobActorState {
            job: args.job,
            dir: args.dir,
            branches,
            running: HashMap::new(),
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            JobMessage::Poll => {
                let job = state.job.clone();
                tracing::debug!(job = %job.name, "polling branch heads");
                let heads = tokio::task::spawn_blocking(move || {
                    git::list_remote_heads(&job.repo_url, job.auth.as_ref())
                })
                .await;

                let heads = match heads {
                    Ok(Ok(heads)) => heads,
                    Ok(Err(e)) => {
                        tracing::warn!(job = %state.job.name, error = %e, "poll failed");
                        return Ok(());
                    }
                    Err(e) => {
                        tracing::warn!(job = %state.job.name, error = %e, "poll task failed");
                        return Ok(());
                    }
                };

                for (branch, head) in &heads {
                    if !state.job.builds_branch(branch) {
                        continue;
                    }
                    let up_to_date = state
                        .branches
                        .get(branch)
                        .is_some_and(|b| b.last_seen_commit.as_deref() == Some(head.as_str()));
                    if up_to_date {
                        continue;
                    }
                    if let Err(e) = state.start_build(&myself, branch, Some(head.clone())).await {
                        tracing::warn!(job = %state.job.name, branch = %branch, error = %e, "build not started");
                    }
                }

                // Branches deleted on the remote are forgotten.
                state.branches.retain(|name, _| heads.contains_key(name));
            }

            JobMessage::GetDetails { reply } => {
                let branches: BTreeMap<String, BranchState> = state
                    .branches
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                let _ = reply.send(JobDetails {
                    job: state.job.clone(),
                    branches,
                });
            }

            JobMessage::GetBranch { branch, reply } => {
                let _ = reply.send(state.branches.get(&branch).cloned());
            }

            JobMessage::ForceBuild { branch, reply } => {
                let result = state.start_build(&myself, &branch, None).await;
                let _ = reply.send(result);
            }

            JobMessage::GetBuildLog {
                branch,
                number,
                start,
                num_lines,
                reply,
            } => {
                let status = state
                    .branches
                    .get(&branch)
                    .and_then(|b| b.build(number))
                    .map(|b| b.status);

                let log_path = state
                    .store(&branch)
                    .build_dir(number)
                    .join("log.txt");
                if !log_path.exists() {
                    let _ = reply.send(Ok(LogPage {
                        lines: vec![],
                        has_more: false,
                        status,
                    }));
                    return Ok(());
                }

                let page = match tokio::fs::read_to_string(&log_path).await {
                    Ok(contents) => {
                        let mut lines: Vec<String> = contents
                            .lines()
                            .skip(start as usize)
                            .take(num_lines as usize + 1)
                            .map(String::from)
                            .collect();
                        let has_more = lines.len() > num_lines as usize;
                        lines.truncate(num_lines as usize);
                        Ok(LogPage {
                            lines,
                            has_more,
                            status,
                        })
                    }
                    Err(e) => Err(format!("failed to read log: {}", e)),
                };
                let _ = reply.send(page);
            }

            JobMessage::AbortBuild {
                branch,
                number,
                reply,
            } => {
                match state.running.get(&(branch.clone(), number)) {
                    Some(actor) => {
                        let result = actor
                            .send_message(BuildMessage::Abort)
                            .map_err(|e| e.to_string());
                        let _ = reply.send(result);
                    }
                    None => {
                        let _ = reply.send(Err("build is not running".to_string()));
                    }
                }
            }

            JobMessage::BuildFinished {
                branch,
                number,
                status,
            } => {
                tracing::info!(job = %state.job.name, branch = %branch, number, status = %status, "build finished");
                state.running.remove(&(branch.clone(), number));
                if let Some(branch_state) = state.branches.get_mut(&branch) {
                    branch_state.finish_build(number, status);
                }
                state.save_branch(&branch).await;
            }
        }

        Ok(())
    }
}
