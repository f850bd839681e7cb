//! Poll semantics against a local repository: moved heads start builds,
//! unchanged heads do not.

use std::error::Error;
use std::path::Path;
use std::time::Duration;

use actors::{concurrency, git, Actor, ActorRef, JobActor, JobArgs, JobMessage};
use git2::{Repository, RepositoryInitOptions, Signature};
use kiln_core::{BranchState, BuildStatus, Job};

fn init_repo(dir: &Path) -> Result<Repository, git2::Error> {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    Repository::init_opts(dir, &opts)
}

/// Commit a `build.sh` with the executable bit set, returning the commit id.
fn commit_build_script(repo: &Repository, contents: &str) -> Result<String, Box<dyn Error>> {
    let sig = Signature::now("kiln", "kiln@example.com")?;
    let blob = repo.blob(contents.as_bytes())?;

    let mut tree = repo.treebuilder(None)?;
    tree.insert("build.sh", blob, 0o100755)?;
    let tree = repo.find_tree(tree.write()?)?;

    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    let oid = repo.commit(Some("HEAD"), &sig, &sig, "update build script", &tree, &parents)?;
    Ok(oid.to_string())
}

fn local_job(repo_dir: &Path) -> Job {
    Job {
        name: "local".into(),
        repo_url: repo_dir.to_string_lossy().into_owned(),
        branch: None,
        branches: Some(vec!["main".into()]),
        ignore_branches: None,
        build_script: "build.sh".into(),
        poll_interval_seconds: 3600,
        auth: None,
    }
}

async fn branch_state(
    actor: &ActorRef<JobMessage>,
    branch: &str,
) -> Result<Option<BranchState>, Box<dyn Error>> {
    let (tx, rx) = concurrency::oneshot();
    actor.send_message(JobMessage::GetBranch {
        branch: branch.into(),
        reply: tx.into(),
    })?;
    Ok(rx.await?)
}

/// Wait until the branch has `count` builds and all of them have settled.
async fn wait_for_builds(
    actor: &ActorRef<JobMessage>,
    branch: &str,
    count: usize,
) -> Result<BranchState, Box<dyn Error>> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(15);
    loop {
        if let Some(state) = branch_state(actor, branch).await?
            && state.builds.len() == count
            && state.builds.iter().all(|b| b.status.is_terminal())
        {
            return Ok(state);
        }
        if tokio::time::Instant::now() > deadline {
            return Err("timed out waiting for builds to settle".into());
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[test]
fn lists_heads_and_clones_pinned_commits() -> Result<(), Box<dyn Error>> {
    let repo_dir = tempfile::tempdir()?;
    let repo = init_repo(repo_dir.path())?;
    let first = commit_build_script(&repo, "#!/bin/sh\necho one\n")?;
    let second = commit_build_script(&repo, "#!/bin/sh\necho two\n")?;

    let url = repo_dir.path().to_string_lossy().into_owned();
    let heads = git::list_remote_heads(&url, None)?;
    assert_eq!(heads.get("main"), Some(&second));

    // A pinned clone checks out the requested commit, not the tip.
    let checkout = tempfile::tempdir()?;
    let dir = checkout.path().join("repo");
    git::clone_commit(&url, "main", Some(first.as_str()), &dir, None)?;
    let script = std::fs::read_to_string(dir.join("build.sh"))?;
    assert!(script.contains("echo one"));
    Ok(())
}

#[tokio::test]
async fn poll_builds_moved_heads_and_skips_unchanged() -> Result<(), Box<dyn Error>> {
    let repo_dir = tempfile::tempdir()?;
    let repo = init_repo(repo_dir.path())?;
    let first = commit_build_script(&repo, "#!/bin/sh\necho built\n")?;

    let job_dir = tempfile::tempdir()?;
    let (actor, _handle) = Actor::spawn(
        None,
        JobActor,
        JobArgs {
            job: local_job(repo_dir.path()),
            dir: job_dir.path().to_path_buf(),
        },
    )
    .await?;

    actor.send_message(JobMessage::Poll)?;
    let state = wait_for_builds(&actor, "main", 1).await?;
    assert_eq!(state.last_seen_commit, Some(first.clone()));
    assert_eq!(state.builds[0].number, 1);
    assert_eq!(state.builds[0].commit, Some(first));
    assert_eq!(state.builds[0].status, BuildStatus::Succeeded);

    // An unchanged head polls clean. The query behind branch_state is
    // queued after the poll, so the state it returns is post-poll.
    actor.send_message(JobMessage::Poll)?;
    let state = branch_state(&actor, "main")
        .await?
        .ok_or("branch state missing")?;
    assert_eq!(state.builds.len(), 1);

    // A moved head is picked up by the next poll.
    let second = commit_build_script(&repo, "#!/bin/sh\necho built again\n")?;
    actor.send_message(JobMessage::Poll)?;
    let state = wait_for_builds(&actor, "main", 2).await?;
    assert_eq!(state.last_seen_commit, Some(second.clone()));
    assert_eq!(state.builds[1].number, 2);
    assert_eq!(state.builds[1].commit, Some(second));

    let log = std::fs::read_to_string(job_dir.path().join("main/2/log.txt"))?;
    assert!(log.contains("[out] built again"));
    Ok(())
}

#[tokio::test]
async fn force_build_runs_the_tip_without_moving_the_head() -> Result<(), Box<dyn Error>> {
    let repo_dir = tempfile::tempdir()?;
    let repo = init_repo(repo_dir.path())?;
    commit_build_script(&repo, "#!/bin/sh\necho one\necho two\necho three\n")?;

    let job_dir = tempfile::tempdir()?;
    let (actor, _handle) = Actor::spawn(
        None,
        JobActor,
        JobArgs {
            job: local_job(repo_dir.path()),
            dir: job_dir.path().to_path_buf(),
        },
    )
    .await?;

    let (tx, rx) = concurrency::oneshot();
    actor.send_message(JobMessage::ForceBuild {
        branch: "main".into(),
        reply: tx.into(),
    })?;
    assert_eq!(rx.await??, 1);

    let state = wait_for_builds(&actor, "main", 1).await?;
    assert_eq!(state.builds[0].status, BuildStatus::Succeeded);
    // Forced builds are unpinned and leave the poll state alone.
    assert!(state.builds[0].commit.is_none());
    assert!(state.last_seen_commit.is_none());

    // Log pages window the captured output.
    let (tx, rx) = concurrency::oneshot();
    actor.send_message(JobMessage::GetBuildLog {
        branch: "main".into(),
        number: 1,
        start: 1,
        num_lines: 1,
        reply: tx.into(),
    })?;
    let page = rx.await??;
    assert_eq!(page.lines, vec!["[out] two"]);
    assert!(page.has_more);
    assert_eq!(page.status, Some(BuildStatus::Succeeded));
    Ok(())
}
