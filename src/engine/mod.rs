// deploy-lock Engine - Core module structure
pub mod cli;
pub mod config;
pub mod github;
pub mod keystore;
pub mod locks;
pub mod reporter;

pub use config::Config;
pub use github::{GitHubClient, RepoRef, RepoStore};
pub use locks::{CheckError, LockChecker, LockState};
pub use reporter::{ActionsReporter, RecordingReporter, Reporter};
