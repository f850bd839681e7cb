//! File-based persistence for workspace and branch state.
//!
//! The workspace manifest and each branch's state file are written via a
//! temp file and rename so a crash never leaves a torn file behind.

use std::path::{Path, PathBuf};

use kiln_core::{BranchState, Workspace, WORKSPACE_FILE};
use tokio::fs;

/// Failure reading or writing persisted state.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("manifest error: {0}")]
    Manifest(String),
}

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PersistenceError> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, contents).await?;
    fs::rename(&temp_path, path).await?;
    Ok(())
}

/// Rewrite the workspace manifest in `dir`.
pub async fn write_workspace_file(dir: &Path, workspace: &Workspace) -> Result<(), PersistenceError> {
    let yaml = workspace
        .to_yaml()
        .map_err(|e| PersistenceError::Manifest(e.to_string()))?;
    let path = dir.join(WORKSPACE_FILE);
    write_atomic(&path, yaml.as_bytes()).await?;
    tracing::debug!(path = %path.display(), "workspace manifest written");
    Ok(())
}

/// Persisted state for one branch of one job.
///
/// Layout under the branch directory:
/// - `state.json` - the serialized [`BranchState`]
/// - `build_num.txt` - the last issued build number
/// - `<n>/` - one directory per build (checkout + log)
pub struct BranchStore {
    dir: PathBuf,
}

impl BranchStore {
    /// Create a store rooted at a branch directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Ensure the branch directory exists.
    pub async fn init(&self) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    fn state_path(&self) -> PathBuf {
        self.dir.join("state.json")
    }

    /// Directory holding one build's checkout and log.
    pub fn build_dir(&self, number: u64) -> PathBuf {
        self.dir.join(number.to_string())
    }

    /// Load the branch state, if any was saved.
    pub async fn load(&self) -> Result<Option<BranchState>, PersistenceError> {
        let path = self.state_path();
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Save the branch state.
    pub async fn save(&self, state: &BranchState) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(state)?;
        write_atomic(&self.state_path(), json.as_bytes()).await
    }

    /// Issue the next build number, persisting the counter.
    pub async fn next_build_number(&self) -> Result<u64, PersistenceError> {
        let path = self.dir.join("build_num.txt");
        let next = if path.exists() {
            let n: u64 = fs::read_to_string(&path)
                .await?
                .trim()
                .parse()
                .unwrap_or_default();
            n + 1
        } else {
            1
        };
        fs::write(&path, next.to_string()).await?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::BuildStatus;

    #[tokio::test]
    async fn branch_state_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BranchStore::new(tmp.path().join("main"));
        store.init().await.unwrap();

        assert!(store.load().await.unwrap().is_none());

        let mut state = BranchState::default();
        state.record_build(1, Some("abc".into()));
        state.finish_build(1, BuildStatus::Succeeded);
        store.save(&state).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn build_numbers_increment_and_persist() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BranchStore::new(tmp.path().join("main"));
        store.init().await.unwrap();

        assert_eq!(store.next_build_number().await.unwrap(), 1);
        assert_eq!(store.next_build_number().await.unwrap(), 2);

        // A fresh store over the same directory continues the sequence.
        let store = BranchStore::new(tmp.path().join("main"));
        assert_eq!(store.next_build_number().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn workspace_manifest_is_rewritten() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = Workspace::default();
        write_workspace_file(tmp.path(), &ws).await.unwrap();
        let loaded = Workspace::load(tmp.path()).unwrap();
        assert_eq!(loaded, ws);
    }
}
