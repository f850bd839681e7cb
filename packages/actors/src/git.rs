//! Git operations for polling and checkouts.
//!
//! Everything here is blocking libgit2 work; callers run these on the
//! blocking pool via `tokio::task::spawn_blocking`.

use std::collections::HashMap;
use std::path::Path;

use git2::build::RepoBuilder;
use git2::{Direction, FetchOptions, RemoteCallbacks, Repository};
use kiln_core::GitAuth;
use tempfile::TempDir;

/// Failure talking to a repository.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn callbacks(auth: Option<&GitAuth>) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(
        move |_url: &str, user_from_url: Option<&str>, _cred: git2::CredentialType| match auth {
            Some(GitAuth::PrivateKey { path, passphrase }) => git2::Cred::ssh_key(
                user_from_url.unwrap_or("git"),
                None,
                Path::new(path),
                passphrase.as_deref(),
            ),
            None => git2::Cred::default(),
        },
    );
    callbacks
}

/// List remote branch heads as `branch name -> commit hash`.
///
/// Uses a throwaway local repository purely to open an authenticated
/// connection; nothing is fetched.
pub fn list_remote_heads(
    url: &str,
    auth: Option<&GitAuth>,
) -> Result<HashMap<String, String>, GitError> {
    let tmp_dir = TempDir::new()?;
    let repo = Repository::init(tmp_dir.path())?;

    let mut remote = repo.remote("origin", url)?;
    let connection = remote.connect_auth(Direction::Fetch, Some(callbacks(auth)), None)?;

    let mut heads = HashMap::new();
    for head in connection.list()? {
        if let Some(branch) = head.name().strip_prefix("refs/heads/") {
            heads.insert(branch.to_string(), head.oid().to_string());
        }
    }
    Ok(heads)
}

/// Clone a branch into `dir`, optionally pinned to a specific commit.
pub fn clone_commit(
    url: &str,
    branch: &str,
    commit: Option<&str>,
    dir: &Path,
    auth: Option<&GitAuth>,
) -> Result<(), GitError> {
    let mut fetch = FetchOptions::new();
    fetch.remote_callbacks(callbacks(auth));

    let repo = RepoBuilder::new()
        .fetch_options(fetch)
        .branch(branch)
        .clone(url, dir)?;

    if let Some(commit) = commit {
        let oid = git2::Oid::from_str(commit)?;
        let commit_obj = repo.find_commit(oid)?;

        repo.branch(commit, &commit_obj, false)?;
        let obj = repo.revparse_single(&format!("refs/heads/{commit}"))?;
        repo.checkout_tree(&obj, None)?;
        repo.set_head(&format!("refs/heads/{commit}"))?;
    }

    Ok(())
}
