//! CLI Output Formatting Module
//! Provides consistent, colorized output for terminal UX

use crate::engine::locks::LockState;
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde_json::{json, Value};

pub struct CliFormatter;

impl CliFormatter {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green().bold(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue().bold(), message);
    }

    /// Print a section header
    pub fn header(title: &str) {
        println!("\n{}", title.bright_cyan().bold());
        println!("{}", "─".repeat(title.chars().count()).bright_black());
    }

    /// Print a key-value pair
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", key.bright_white().bold(), value);
    }

    /// Print the result of a lock check
    pub fn lock_summary(repo: &str, state: &LockState, now: DateTime<Utc>) {
        Self::header(&format!("Deployment lock: {}", repo));

        let Some(descriptor) = state.descriptor() else {
            Self::success("unlocked");
            return;
        };

        Self::warning("locked");
        for (key, value) in summary_rows(state, now) {
            if key != "locked" {
                Self::kv(key, &value);
            }
        }
        if descriptor.sticky() == Some(true) {
            Self::item("sticky lock, must be removed manually");
        }
    }

    /// Print a list item
    pub fn item(text: &str) {
        println!("  {} {}", "•".bright_black(), text);
    }
}

/// Key/value rows describing a lock state, in display order.
pub fn summary_rows(state: &LockState, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
    let mut rows = vec![("locked", state.is_locked().to_string())];
    let Some(descriptor) = state.descriptor() else {
        return rows;
    };

    if let Some(holder) = state.holder() {
        rows.push(("branch", holder.to_string()));
    }
    if let Some(by) = descriptor.created_by() {
        rows.push(("created by", by));
    }
    if let Some(at) = descriptor.created_at() {
        let age = descriptor.age_string(now).unwrap_or_default();
        rows.push(("created at", format!("{} ({} ago)", at.to_rfc3339(), age)));
    }
    if let Some(env) = descriptor.environment() {
        rows.push(("environment", env));
    }
    if let Some(reason) = descriptor.reason() {
        rows.push(("reason", reason));
    }
    if let Some(link) = descriptor.link() {
        rows.push(("link", link));
    }
    rows
}

/// JSON form of a lock state for `--format json`
pub fn summary_json(repo: &str, state: &LockState) -> Value {
    let descriptor = state.descriptor();
    json!({
        "repository": repo,
        "locked": state.is_locked(),
        "branch": state.holder(),
        "created_by": descriptor.and_then(|d| d.created_by()),
        "created_at": descriptor.and_then(|d| d.created_at()).map(|t| t.to_rfc3339()),
        "reason": descriptor.and_then(|d| d.reason()),
        "environment": descriptor.and_then(|d| d.environment()),
        "sticky": descriptor.and_then(|d| d.sticky()),
    })
}
