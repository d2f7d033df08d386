//! dfs - command-line client for the distributed file system
//!
//! Usage: dfs <command> [-option value]...

use anyhow::Result;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use dfs_client::{commands, Mediator, Registry};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let registry = Registry::standard()?;
    let invocation = registry.resolve(std::env::args_os());

    commands::execute(&invocation, Mediator::shared()).await
}
