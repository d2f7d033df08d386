//! Stat command - show metadata of a remote file or directory

use anyhow::{Context, Result};
use colored::Colorize;

use super::{format_size, format_time, read_mode};
use crate::mediator::Mediator;
use crate::models::StatRequest;
use crate::registry::{Invocation, DES};

pub async fn execute(invocation: &Invocation, mediator: &Mediator) -> Result<()> {
    let path = invocation.require(DES)?;
    let mode = read_mode(invocation)?;

    let request = StatRequest {
        path: path.to_string(),
        is_latest: mode.is_latest(),
    };

    let reply = mediator
        .check_and_stat(&request)
        .await
        .with_context(|| format!("Failed to stat {}", path))?;

    let kind = if reply.is_directory {
        "directory".blue()
    } else {
        "file".normal()
    };

    println!("{}", "File Information".cyan().bold());
    println!();
    println!("  {} {}", "Path:".bright_black(), path.cyan());
    println!("  {} {}", "Name:".bright_black(), reply.file_name.green());
    println!("  {} {}", "Type:".bright_black(), kind);
    println!("  {} {}", "Size:".bright_black(), format_size(reply.size));
    println!("  {} {}", "Modified:".bright_black(), format_time(reply.mod_time));
    println!("  {} {}", "Read mode:".bright_black(), mode);

    Ok(())
}
