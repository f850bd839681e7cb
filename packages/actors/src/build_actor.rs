//! Build actor: runs one build script and streams its log.

use std::path::PathBuf;
use std::process::Stdio;

use kiln_core::BuildStatus;
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::oneshot;

use crate::messages::{BuildMessage, JobMessage};

/// Arguments for starting a build actor.
///
/// The checkout has already been cloned into `dir`; the script path is
/// resolved inside it.
pub struct BuildArgs {
    /// Build script invocation as written in the job config.
    pub script: String,
    /// Checkout directory the script runs in.
    pub dir: PathBuf,
    /// Log file receiving prefixed stdout/stderr lines.
    pub log_path: PathBuf,
    /// Branch being built.
    pub branch: String,
    /// Per-branch build number.
    pub number: u64,
    /// Job actor to report the final status to.
    pub parent: ActorRef<JobMessage>,
}

/// State for a build actor.
pub struct BuildActorState {
    branch: String,
    number: u64,
    parent: ActorRef<JobMessage>,
    /// Firing this kills the child process.
    kill: Option<oneshot::Sender<()>>,
}

/// Copy one std stream into the log file, one prefixed line per line.
async fn pump_lines(stream: impl AsyncRead + Unpin, log_path: PathBuf, tag: &'static str) {
    let file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .await;
    let mut file = match file {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(path = %log_path.display(), error = %e, "cannot open build log");
            return;
        }
    };

    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let _ = file
            .write_all(format!("[{}] {}\n", tag, line).as_bytes())
            .await;
    }
}

fn report(parent: &ActorRef<JobMessage>, branch: &str, number: u64, status: BuildStatus) {
    let _ = parent.send_message(JobMessage::BuildFinished {
        branch: branch.to_string(),
        number,
        status,
    });
}

/// Actor running one build script.
pub struct BuildActor;

impl Actor for BuildActor {
    type Msg = BuildMessage;
    type State = BuildActorState;
    type Arguments = BuildArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: BuildArgs,
    ) -> Result<Self::State, ActorProcessingErr> {
        let mut parts: Vec<String> = args
            .script
            .split_whitespace()
            .map(String::from)
            .collect();
        if parts.is_empty() {
            report(&args.parent, &args.branch, args.number, BuildStatus::Failed);
            return Err(ActorProcessingErr::from("empty build script"));
        }
        let program = args.dir.join(parts.remove(0));

        let mut command = Command::new(program);
        command
            .args(parts)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // children that never flush their std streams (python, mostly)
            // still need to produce line-by-line logs
            .env("PYTHONUNBUFFERED", "1")
            .current_dir(&args.dir)
            .kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(
                    branch = %args.branch,
                    number = args.number,
                    error = %e,
                    "build script failed to start"
                );
                report(&args.parent, &args.branch, args.number, BuildStatus::Failed);
                return Err(ActorProcessingErr::from(format!(
                    "failed to start build script: {}",
                    e
                )));
            }
        };

        tracing::info!(branch = %args.branch, number = args.number, "build script started");

        // stdout/stderr handles are taken by the pumps; wait() below only
        // reaps the process.
        let out_pump = child
            .stdout
            .take()
            .map(|s| tokio::spawn(pump_lines(s, args.log_path.clone(), "out")));
        let err_pump = child
            .stderr
            .take()
            .map(|s| tokio::spawn(pump_lines(s, args.log_path.clone(), "err")));

        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let myself_clone = myself.clone();
        tokio::spawn(async move {
            let status = tokio::select! {
                result = child.wait() => match result {
                    Ok(exit) if exit.success() => BuildStatus::Succeeded,
                    _ => BuildStatus::Failed,
                },
                _ = kill_rx => {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    BuildStatus::Aborted
                }
            };

            // Let the pumps hit EOF so the log is complete before the
            // status lands.
            if let Some(pump) = out_pump {
                let _ = pump.await;
            }
            if let Some(pump) = err_pump {
                let _ = pump.await;
            }

            let _ = myself_clone.send_message(BuildMessage::Exited { status });
        });

        Ok(BuildActorState {
            branch: args.branch,
            number: args.number,
            parent: args.parent,
            kill: Some(kill_tx),
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            BuildMessage::Abort => {
                if let Some(kill) = state.kill.take() {
                    tracing::info!(branch = %state.branch, number = state.number, "aborting build");
                    let _ = kill.send(());
                }
            }

            BuildMessage::Exited { status } => {
                report(&state.parent, &state.branch, state.number, status);
                myself.stop(None);
            }
        }

        Ok(())
    }
}
