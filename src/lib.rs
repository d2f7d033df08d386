//! dfs client - command mediation for a chunked distributed file system
//!
//! The registry turns process arguments into a validated invocation, the
//! mediator forwards structured requests to the coordinator, and the
//! command handlers glue the two together for the `dfs` binary.

pub mod commands;
pub mod config;
pub mod mediator;
pub mod models;
pub mod registry;
pub mod workflow;

pub use mediator::{Mediator, MediatorError};
pub use registry::{Invocation, Registry, RegistryError};
