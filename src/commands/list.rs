//! List command - show the entries of a remote directory

use anyhow::{Context, Result};
use colored::Colorize;

use super::{format_size, format_time, read_mode};
use crate::mediator::Mediator;
use crate::models::ListRequest;
use crate::registry::{Invocation, DES};

pub async fn execute(invocation: &Invocation, mediator: &Mediator) -> Result<()> {
    let path = invocation.require(DES)?;
    let mode = read_mode(invocation)?;

    let request = ListRequest {
        path: path.to_string(),
        is_latest: mode.is_latest(),
    };

    let reply = mediator
        .check_and_list(&request)
        .await
        .with_context(|| format!("Failed to list {}", path))?;

    println!("{} {}", "Directory".cyan().bold(), path.cyan());
    println!();

    if reply.files.is_empty() {
        println!("  {}", "(empty directory)".bright_black());
        return Ok(());
    }

    println!(
        "  {:<5} {:>10}  {:<19}  {}",
        "Type".bright_black(),
        "Size".bright_black(),
        "Modified".bright_black(),
        "Name".bright_black()
    );
    println!("  {}", "━".repeat(60).bright_black());

    for file in &reply.files {
        if file.is_directory {
            println!(
                "  {:<5} {:>10}  {:<19}  {}",
                "dir",
                "-",
                format_time(file.mod_time),
                format!("{}/", file.file_name).blue()
            );
        } else {
            println!(
                "  {:<5} {:>10}  {:<19}  {}",
                "file",
                format_size(file.size),
                format_time(file.mod_time),
                file.file_name
            );
        }
    }

    println!();
    println!(
        "  {}",
        format!("{} entries (read mode: {})", reply.files.len(), mode).bright_black()
    );

    Ok(())
}
