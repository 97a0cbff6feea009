//! deploy-lock CLI - Main entry point for CLI binary
//!
//! This binary provides the `deploy-lock` tool used from CI jobs and terminals.

use anyhow::{Context, Result};
use clap::Parser;
use deploy_lock::engine::{
    cli::formatter::{summary_json, CliFormatter},
    cli::{AuthAction, Cli, Commands, OutputFormat},
    config::{self, Config},
    github::GitHubClient,
    keystore::Keystore,
    locks::LockChecker,
    reporter::ActionsReporter,
};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run_cli(cli) {
        CliFormatter::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Lock diagnostics are shown at info level by default.
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "warn,deploy_lock=debug"
    } else {
        "warn,deploy_lock=info"
    }
}

/// Logs go to stderr so stdout stays usable for `--format json`.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_cli(cli: Cli) -> Result<()> {
    let json_output = cli.format == OutputFormat::Json;
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Check {
            repo,
            token,
            api_url,
            strict,
        } => {
            let mut config = config;
            if let Some(repo) = repo {
                config.repository = Some(repo);
            }
            if let Some(api_url) = api_url {
                config.api_url = api_url;
            }
            config.strict_branch_probe |= strict;
            cmd_check(&config, token, json_output)?;
        }
        Commands::Auth { api_url, action } => {
            let api_url = api_url.unwrap_or(config.api_url);
            cmd_auth(action, &api_url, json_output)?;
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            let cwd = std::env::current_dir().context("resolving current directory")?;
            Config::load(&cwd)?
        }
    };
    Ok(config.with_env())
}

/// Explicit flag, then CI environment, then the keyring.
fn resolve_token(flag: Option<String>, api_url: &str) -> Option<String> {
    if let Some(token) = flag.or_else(config::token_from_env) {
        return Some(token);
    }
    match Keystore::new(api_url).get_github_token() {
        Ok(token) => token,
        Err(e) => {
            tracing::debug!("keyring unavailable: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn cmd_check(config: &Config, token: Option<String>, json: bool) -> Result<()> {
    let repo = config.repo_ref()?;

    let mut client = GitHubClient::new()
        .with_api_url(&config.api_url)
        .with_timeout(config.timeout())?;
    match resolve_token(token, &config.api_url) {
        Some(token) => client.set_token(token),
        None => tracing::debug!("no GitHub token, using anonymous access"),
    }

    let checker = LockChecker::new(client)
        .with_lock_branch(&config.lock_branch)
        .with_lock_file(&config.lock_file)
        .strict(config.strict_branch_probe);

    // With --format json the summary already carries the outputs.
    let reporter = ActionsReporter::from_env();
    let fallback: Box<dyn Write> = if json && reporter.output_file().is_none() {
        Box::new(io::sink())
    } else {
        Box::new(io::stdout())
    };
    let mut reporter = reporter.with_fallback(fallback);
    let state = checker
        .check(&repo, &mut reporter)
        .await
        .with_context(|| format!("checking deployment lock on {}", repo))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary_json(&repo.to_string(), &state))?);
    } else {
        CliFormatter::lock_summary(&repo.to_string(), &state, chrono::Utc::now());
    }

    Ok(())
}

fn cmd_auth(action: AuthAction, api_url: &str, json: bool) -> Result<()> {
    let keystore = Keystore::new(api_url);

    match action {
        AuthAction::SetToken { token } => {
            keystore.store_github_token(token.trim())?;
            if json {
                println!("{}", serde_json::json!({ "stored": true, "account": keystore.account() }));
            } else {
                CliFormatter::success(&format!("Token stored for {}", keystore.account()));
            }
        }
        AuthAction::Clear => {
            let removed = keystore.delete_github_token()?;
            if json {
                println!("{}", serde_json::json!({ "removed": removed }));
            } else if removed {
                CliFormatter::success("Token removed");
            } else {
                CliFormatter::info("No stored token");
            }
        }
        AuthAction::Status => {
            let from_env = config::token_from_env().is_some();
            let stored = keystore.get_github_token()?.is_some();
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "env_token": from_env, "stored_token": stored, "account": keystore.account() })
                );
            } else {
                CliFormatter::header("Authentication");
                CliFormatter::kv("environment token", if from_env { "yes" } else { "no" });
                CliFormatter::kv("keyring token", if stored { "yes" } else { "no" });
                CliFormatter::kv("account", keystore.account());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_shows_lock_diagnostics() {
        let filter = default_filter(false);
        assert!(filter.contains("deploy_lock=info"));
        assert!(EnvFilter::try_new(filter).is_ok());
        assert!(EnvFilter::try_new(default_filter(true)).is_ok());
    }

    #[test]
    fn test_token_flag_wins() {
        assert_eq!(
            resolve_token(Some("from-flag".to_string()), "https://api.github.com"),
            Some("from-flag".to_string())
        );
    }
}
