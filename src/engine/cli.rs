//! deploy-lock CLI Module
//! Command-line interface for deployment lock checks

pub mod formatter;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "deploy-lock")]
#[command(version)]
#[command(about = "Check the branch-hosted deployment lock of a GitHub repository", long_about = None)]
pub struct Cli {
    /// Config file (defaults to ./deploylock.config.json when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (json for scripting)
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether the deployment lock is held
    Check {
        /// Repository as OWNER/NAME (defaults to GITHUB_REPOSITORY)
        #[arg(short, long)]
        repo: Option<String>,

        /// GitHub token (defaults to GITHUB_TOKEN, then the keyring)
        #[arg(short, long)]
        token: Option<String>,

        /// GitHub API root (defaults to GITHUB_API_URL or api.github.com)
        #[arg(long)]
        api_url: Option<String>,

        /// Fail when the lock branch cannot be probed for reasons other than 404
        #[arg(long)]
        strict: bool,
    },

    /// GitHub token management
    Auth {
        /// GitHub API root the token belongs to
        #[arg(long, global = true)]
        api_url: Option<String>,

        #[command(subcommand)]
        action: AuthAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Store a token in the OS keyring
    SetToken {
        /// Personal access token with read access to the repository
        token: String,
    },

    /// Remove the stored token
    Clear,

    /// Show whether a token is available
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_check() {
        let cli = Cli::parse_from([
            "deploy-lock",
            "--format",
            "json",
            "check",
            "--repo",
            "octo/widgets",
            "--strict",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Check { repo, token, strict, .. } => {
                assert_eq!(repo.as_deref(), Some("octo/widgets"));
                assert_eq!(token, None);
                assert!(strict);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_auth() {
        let cli = Cli::parse_from(["deploy-lock", "auth", "set-token", "ghp_abc"]);
        assert!(matches!(
            cli.command,
            Commands::Auth {
                action: AuthAction::SetToken { .. },
                ..
            }
        ));
    }
}
