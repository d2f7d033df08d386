//! CLI command implementations
//!
//! Each command builds its request from the resolved invocation and talks
//! to the coordinator only through the mediator. Errors are returned to
//! `main`, which maps them to exit status 1.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::mediator::Mediator;
use crate::models::ReadMode;
use crate::registry::{Invocation, DEFAULT_MODE, MODE};

pub mod add;
pub mod list;
pub mod stat;

/// Run the resolved subcommand
pub async fn execute(invocation: &Invocation, mediator: &Mediator) -> Result<()> {
    match invocation.command() {
        "stat" => stat::execute(invocation, mediator).await,
        "list" => list::execute(invocation, mediator).await,
        "add" => add::execute(invocation, mediator).await,
        other => anyhow::bail!("'{}' has no coordinator operation in this client", other),
    }
}

fn read_mode(invocation: &Invocation) -> Result<ReadMode> {
    invocation
        .value(MODE)
        .unwrap_or(DEFAULT_MODE)
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .context("Invalid progress template")?,
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

fn format_time(unix_secs: i64) -> String {
    chrono::DateTime::from_timestamp(unix_secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}
