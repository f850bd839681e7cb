//! Job and workspace types for configured builds.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Name of the workspace manifest inside the workspace directory.
pub const WORKSPACE_FILE: &str = "kiln.yaml";

/// Authentication for git fetches, if the repository requires it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GitAuth {
    PrivateKey {
        path: String,
        passphrase: Option<String>,
    },
}

/// A build job: one watched repository and the script to run on changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Name of the job, must be unique within a workspace.
    pub name: String,
    /// Git fetch URL.
    pub repo_url: String,
    /// DEPRECATED: kept for compatibility with v0.1.x manifests.
    /// `branch = "x"` is equivalent to `branches = ["x"]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Which branches to build; omit to build all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<String>>,
    /// Which branches to ignore; omit to ignore none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_branches: Option<Vec<String>>,
    /// Path to the script inside the repository which runs the build.
    pub build_script: String,
    /// Interval in seconds between automatic polls.
    pub poll_interval_seconds: u64,
    /// Authentication for git fetches, if required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<GitAuth>,
}

impl Job {
    /// Check the job configuration, normalizing nothing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let listed = self.branches.as_ref().map(|b| b.len()).unwrap_or(0);
        if listed == 0 && self.branch.is_none() {
            return Err(ValidationError::NoBranches);
        }
        if listed > 0 && self.branch.is_some() {
            return Err(ValidationError::BranchConflict);
        }
        if self.repo_url.trim().is_empty() {
            return Err(ValidationError::EmptyRepoUrl);
        }
        if self.build_script.trim().is_empty() {
            return Err(ValidationError::EmptyBuildScript);
        }
        if self.poll_interval_seconds == 0 {
            return Err(ValidationError::ZeroPollInterval);
        }
        Ok(())
    }

    /// Whether a remote branch is selected for building.
    ///
    /// An empty `branches` list (after folding in the deprecated `branch`
    /// field) means every branch; `ignore_branches` always wins.
    pub fn builds_branch(&self, name: &str) -> bool {
        if let Some(ignored) = &self.ignore_branches
            && ignored.iter().any(|b| b == name)
        {
            return false;
        }
        let mut selected: Vec<&str> = self
            .branches
            .iter()
            .flatten()
            .map(|b| b.as_str())
            .collect();
        if selected.is_empty()
            && let Some(b) = &self.branch
        {
            selected.push(b.as_str());
        }
        selected.is_empty() || selected.iter().any(|b| *b == name)
    }
}

/// Invalid job configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no branches to build")]
    NoBranches,
    #[error("cannot set both branch and branches; use branches, as branch is deprecated")]
    BranchConflict,
    #[error("repository url is empty")]
    EmptyRepoUrl,
    #[error("build script path is empty")]
    EmptyBuildScript,
    #[error("poll interval must be > 0")]
    ZeroPollInterval,
}

/// A workspace containing build jobs, backed by `kiln.yaml` on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub jobs: Vec<Job>,
}

impl Workspace {
    /// Load the workspace manifest from a directory.
    ///
    /// A missing manifest yields an empty workspace; the file is created
    /// on the first mutation.
    pub fn load(dir: &Path) -> Result<Self, WorkspaceError> {
        let path = dir.join(WORKSPACE_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let yaml = std::fs::read_to_string(&path)?;
        Ok(serde_yaml::from_str(&yaml)?)
    }

    /// Serialize the workspace to its manifest format.
    pub fn to_yaml(&self) -> Result<String, WorkspaceError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Look up a job by name.
    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.name == name)
    }
}

/// Failure reading or writing the workspace manifest.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("workspace io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("workspace manifest error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job {
            name: "site".into(),
            repo_url: "https://example.com/site.git".into(),
            branch: None,
            branches: Some(vec!["main".into()]),
            ignore_branches: None,
            build_script: "ci/build.sh".into(),
            poll_interval_seconds: 60,
            auth: None,
        }
    }

    #[test]
    fn validates_a_well_formed_job() {
        assert_eq!(job().validate(), Ok(()));
    }

    #[test]
    fn rejects_missing_branches() {
        let mut j = job();
        j.branches = None;
        assert_eq!(j.validate(), Err(ValidationError::NoBranches));

        // The deprecated single-branch field still satisfies the rule.
        j.branch = Some("main".into());
        assert_eq!(j.validate(), Ok(()));
    }

    #[test]
    fn rejects_branch_and_branches_together() {
        let mut j = job();
        j.branch = Some("main".into());
        assert_eq!(j.validate(), Err(ValidationError::BranchConflict));
    }

    #[test]
    fn rejects_blank_fields_and_zero_interval() {
        let mut j = job();
        j.repo_url = "  ".into();
        assert_eq!(j.validate(), Err(ValidationError::EmptyRepoUrl));

        let mut j = job();
        j.build_script = "".into();
        assert_eq!(j.validate(), Err(ValidationError::EmptyBuildScript));

        let mut j = job();
        j.poll_interval_seconds = 0;
        assert_eq!(j.validate(), Err(ValidationError::ZeroPollInterval));
    }

    #[test]
    fn branch_selection_honors_selectors() {
        let mut j = job();
        assert!(j.builds_branch("main"));
        assert!(!j.builds_branch("dev"));

        j.branches = None;
        j.branch = Some("release".into());
        assert!(j.builds_branch("release"));
        assert!(!j.builds_branch("main"));

        // No selectors at all builds everything except ignores.
        j.branch = None;
        j.ignore_branches = Some(vec!["wip".into()]);
        assert!(j.builds_branch("main"));
        assert!(!j.builds_branch("wip"));

        // Ignores win over explicit selection.
        j.branches = Some(vec!["wip".into()]);
        assert!(!j.builds_branch("wip"));
    }

    #[test]
    fn parses_a_manifest() {
        let yaml = r#"
jobs:
  - name: site
    repo_url: git@example.com:site.git
    branches: [main, release]
    build_script: ci/build.sh
    poll_interval_seconds: 300
    auth:
      PrivateKey:
        path: /home/ci/.ssh/id_ed25519
        passphrase: null
"#;
        let ws: Workspace = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(ws.jobs.len(), 1);
        let j = &ws.jobs[0];
        assert_eq!(j.name, "site");
        assert_eq!(j.branches.as_deref(), Some(&["main".to_string(), "release".to_string()][..]));
        assert!(matches!(j.auth, Some(GitAuth::PrivateKey { .. })));
        assert_eq!(j.validate(), Ok(()));
    }
}
