//! Per-branch build history types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Job;

/// Final or in-flight status of one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    /// Build script is running.
    Building,
    /// Script exited successfully.
    Succeeded,
    /// Script exited with a failure, or never started.
    Failed,
    /// Build was killed on request.
    Aborted,
}

impl BuildStatus {
    /// Check if the build has reached a final state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BuildStatus::Building)
    }

    /// Get a simple status string for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStatus::Building => "building",
            BuildStatus::Succeeded => "succeeded",
            BuildStatus::Failed => "failed",
            BuildStatus::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One build of one branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Per-branch build number, monotonically increasing.
    pub number: u64,
    /// Commit the build checked out; absent for forced tip builds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    /// Current status.
    pub status: BuildStatus,
    /// When the build started.
    pub started_at: DateTime<Utc>,
}

/// State of one watched branch: the last head we acted on plus history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BranchState {
    /// Head commit of the most recent poll that triggered a build.
    #[serde(default)]
    pub last_seen_commit: Option<String>,
    /// Build history, oldest first.
    #[serde(default)]
    pub builds: Vec<BuildRecord>,
}

impl BranchState {
    /// Record the start of a build, updating `last_seen_commit` when the
    /// build is pinned to a specific head.
    pub fn record_build(&mut self, number: u64, commit: Option<String>) {
        if commit.is_some() {
            self.last_seen_commit = commit.clone();
        }
        self.builds.push(BuildRecord {
            number,
            commit,
            status: BuildStatus::Building,
            started_at: Utc::now(),
        });
    }

    /// Mark a build's final status. Unknown numbers are ignored.
    pub fn finish_build(&mut self, number: u64, status: BuildStatus) {
        if let Some(b) = self.builds.iter_mut().find(|b| b.number == number) {
            b.status = status;
        }
    }

    /// Look up a build by number.
    pub fn build(&self, number: u64) -> Option<&BuildRecord> {
        self.builds.iter().find(|b| b.number == number)
    }
}

/// A windowed read of one build's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogPage {
    pub lines: Vec<String>,
    pub has_more: bool,
    /// Status of the build the log belongs to, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BuildStatus>,
}

/// A job's configuration together with its per-branch state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetails {
    pub job: Job,
    pub branches: BTreeMap<String, BranchState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_terminality() {
        assert!(!BuildStatus::Building.is_terminal());
        assert!(BuildStatus::Succeeded.is_terminal());
        assert!(BuildStatus::Failed.is_terminal());
        assert!(BuildStatus::Aborted.is_terminal());
    }

    #[test]
    fn records_and_finishes_builds() {
        let mut state = BranchState::default();
        state.record_build(1, Some("abc123".into()));
        assert_eq!(state.last_seen_commit.as_deref(), Some("abc123"));
        assert_eq!(state.build(1).unwrap().status, BuildStatus::Building);

        // Forced builds carry no commit and leave the head untouched.
        state.record_build(2, None);
        assert_eq!(state.last_seen_commit.as_deref(), Some("abc123"));

        state.finish_build(1, BuildStatus::Succeeded);
        assert_eq!(state.build(1).unwrap().status, BuildStatus::Succeeded);

        // Finishing an unknown build is a no-op.
        state.finish_build(99, BuildStatus::Failed);
        assert_eq!(state.builds.len(), 2);
    }
}
