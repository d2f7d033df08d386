//! Add command - reserve a remote path and place a local file's chunks
//!
//! Chunk data travels to the storage nodes over the data-transfer path,
//! which this client does not carry. Once the placement is printed the
//! lease and directory lock are handed back to the coordinator.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use super::{format_size, spinner};
use crate::mediator::Mediator;
use crate::models::PrepareAddRequest;
use crate::registry::{Invocation, DES, SRC};
use crate::workflow;

pub async fn execute(invocation: &Invocation, mediator: &Mediator) -> Result<()> {
    let src = invocation.require(SRC)?;
    let des = invocation.require(DES)?;

    let metadata = tokio::fs::metadata(src)
        .await
        .with_context(|| format!("Failed to read local file {}", src))?;
    if metadata.is_dir() {
        anyhow::bail!("{} is a directory", src);
    }

    let file_name = Path::new(src)
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid local file name: {}", src))?;

    let request = PrepareAddRequest {
        path: des.to_string(),
        file_name: file_name.to_string(),
        size: metadata.len(),
    };

    println!("{}", "Adding File".cyan().bold());
    println!();
    println!("  {} {}", "Local:".bright_black(), src);
    println!("  {} {}", "Remote:".bright_black(), des.cyan());
    println!("  {} {}", "Size:".bright_black(), format_size(request.size));
    println!();

    let pb = spinner("Allocating storage nodes...")?;
    let plan = match workflow::plan_add(mediator, &request).await {
        Ok(plan) => plan,
        Err(err) => {
            pb.finish_and_clear();
            return Err(err).with_context(|| format!("Failed to add {} to {}", src, des));
        }
    };
    pb.finish_with_message(format!(
        "{} {} chunk(s) placed",
        "✓".green(),
        plan.chunks.len()
    ));

    println!();
    println!("  {} {}", "File node:".bright_black(), plan.file_node_id.cyan());
    for chunk in &plan.chunks {
        let nodes: Vec<String> = chunk
            .nodes
            .nodes()
            .map(|(id, addr)| format!("{}@{}", id, addr))
            .collect();
        println!(
            "    {} {}",
            format!("chunk {}:", chunk.index).bright_black(),
            nodes.join(", ")
        );
    }
    println!();

    let released = workflow::release(mediator, &plan.file_node_id)
        .await
        .context("Failed to release add reservation")?;

    if released.lease && released.directory {
        println!("  {}", "Reservation released".bright_black());
    } else {
        println!(
            "  {}",
            "Coordinator did not confirm the reservation release".yellow()
        );
    }

    Ok(())
}
