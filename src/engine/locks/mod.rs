//! Deployment Lock Detection
//!
//! A deployment lock is held when the reserved branch `branch-deploy-lock`
//! exists and carries a readable `lock.json` at its head. The two resources are
//! fetched separately and every combination resolves to a [`LockState`]:
//!
//! | branch    | lock file          | result                 |
//! |-----------|--------------------|------------------------|
//! | missing   | -                  | unlocked               |
//! | present   | missing            | unlocked               |
//! | present   | undecodable        | unlocked (warning)     |
//! | present   | decodes            | locked                 |
//! | present   | other store error  | error                  |
//!
//! A corrupt lock file counts as no lock at all. A non-404 failure while
//! probing the branch is logged and the file probe still runs, unless the
//! checker is in strict mode.

mod descriptor;

pub use descriptor::{DecodeError, LockDescriptor};

use crate::engine::github::{GitHubError, RepoRef, RepoStore};
use crate::engine::reporter::Reporter;
use thiserror::Error;

pub const LOCK_BRANCH: &str = "branch-deploy-lock";
pub const LOCK_FILE: &str = "lock.json";

const NO_LOCK: &str = "lock does not exist";
const FOUND_LOCK: &str = "lock exists";

/// Outcome of a single check. Nothing is cached between checks.
#[derive(Debug, Clone, PartialEq)]
pub enum LockState {
    Unlocked,
    Locked {
        holder: Option<String>,
        descriptor: LockDescriptor,
    },
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::Locked { .. })
    }

    pub fn holder(&self) -> Option<&str> {
        match self {
            LockState::Locked { holder, .. } => holder.as_deref(),
            LockState::Unlocked => None,
        }
    }

    pub fn descriptor(&self) -> Option<&LockDescriptor> {
        match self {
            LockState::Locked { descriptor, .. } => Some(descriptor),
            LockState::Unlocked => None,
        }
    }

    /// Write the `locked` output and, when known, the `branch` output.
    pub fn report<R: Reporter + ?Sized>(&self, reporter: &mut R) -> std::io::Result<()> {
        reporter.set_output("locked", if self.is_locked() { "true" } else { "false" })?;
        if let Some(holder) = self.holder() {
            reporter.set_output("branch", holder)?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Failed to probe lock branch {branch}: {source}")]
    BranchProbe {
        branch: String,
        #[source]
        source: GitHubError,
    },
    #[error("Failed to read lock file {path}: {source}")]
    Store {
        path: String,
        #[source]
        source: GitHubError,
    },
    #[error("Failed to write outputs: {0}")]
    Report(#[from] std::io::Error),
}

/// Reads the lock state of a repository through a [`RepoStore`].
pub struct LockChecker<S> {
    store: S,
    lock_branch: String,
    lock_file: String,
    strict_branch_probe: bool,
}

impl<S: RepoStore> LockChecker<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            lock_branch: LOCK_BRANCH.to_string(),
            lock_file: LOCK_FILE.to_string(),
            strict_branch_probe: false,
        }
    }

    pub fn with_lock_branch(mut self, branch: &str) -> Self {
        self.lock_branch = branch.to_string();
        self
    }

    pub fn with_lock_file(mut self, path: &str) -> Self {
        self.lock_file = path.to_string();
        self
    }

    /// Treat non-404 branch probe failures as fatal instead of falling
    /// through to the file probe.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_branch_probe = strict;
        self
    }

    pub fn lock_branch(&self) -> &str {
        &self.lock_branch
    }

    pub fn lock_file(&self) -> &str {
        &self.lock_file
    }

    /// Run a check and write the decision to the reporter's outputs.
    pub async fn check<R: Reporter + ?Sized>(
        &self,
        repo: &RepoRef,
        reporter: &mut R,
    ) -> Result<LockState, CheckError> {
        let state = self.probe(repo, reporter).await?;
        state.report(reporter)?;
        Ok(state)
    }

    /// Resolve the lock state, emitting diagnostics only.
    pub async fn probe<R: Reporter + ?Sized>(
        &self,
        repo: &RepoRef,
        reporter: &mut R,
    ) -> Result<LockState, CheckError> {
        match self.store.get_branch(repo, &self.lock_branch).await {
            Ok(branch) => {
                tracing::debug!(repo = %repo, sha = %branch.commit.sha, "lock branch found");
            }
            Err(e) if e.is_not_found() => {
                reporter.info(NO_LOCK);
                return Ok(LockState::Unlocked);
            }
            Err(e) if self.strict_branch_probe => {
                return Err(CheckError::BranchProbe {
                    branch: self.lock_branch.clone(),
                    source: e,
                });
            }
            Err(e) => {
                reporter.warning(&format!(
                    "could not verify lock branch {}: {} - checking for lock file anyway",
                    self.lock_branch, e
                ));
            }
        }

        let file = match self
            .store
            .get_content(repo, &self.lock_file, &self.lock_branch)
            .await
        {
            Ok(file) => file,
            Err(e) if e.is_not_found() => {
                reporter.info(NO_LOCK);
                return Ok(LockState::Unlocked);
            }
            Err(e) => {
                return Err(CheckError::Store {
                    path: self.lock_file.clone(),
                    source: e,
                });
            }
        };

        let descriptor = match LockDescriptor::decode(&file) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                reporter.warning(&e.to_string());
                reporter.warning("lock file exists, but cannot be decoded - setting locked to false");
                return Ok(LockState::Unlocked);
            }
        };

        reporter.info(FOUND_LOCK);
        Ok(LockState::Locked {
            holder: descriptor.holder(),
            descriptor,
        })
    }
}
