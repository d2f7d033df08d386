//! Request mediator - forwards each request to the coordinator
//!
//! Every operation resolves the coordinator address, opens a fresh
//! connection, issues exactly one call and hands back the reply or the
//! failure. Nothing is retried, cached or compensated here; callers own
//! recovery (see `workflow` for the add sequence).
//!
//! Calls go to an HTTP/JSON gateway in front of the coordinator:
//! `POST /{Service}/{Method}` with a camelCase JSON body, one route per
//! coordinator RPC. The coordinator's native gRPC protocol is not spoken.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

use crate::config;
use crate::models::{
    AllocateNodesReply, AllocateNodesRequest, ListReply, ListRequest, PrepareAddReply,
    PrepareAddRequest, ReleaseLeaseReply, ReleaseLeaseRequest, StatReply, StatRequest,
    UnlockDirectoryReply, UnlockDirectoryRequest,
};

#[derive(Debug, Error)]
pub enum MediatorError {
    #[error("failed to resolve coordinator endpoint: {0}")]
    Endpoint(String),

    #[error("failed to connect to coordinator at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} failed: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} rejected by coordinator ({status}): {message}")]
    Rejected {
        method: &'static str,
        status: u16,
        message: String,
    },

    #[error("{method} returned an invalid reply: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

/// A coordinator service method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub service: &'static str,
    pub method: &'static str,
}

impl Route {
    const fn new(service: &'static str, method: &'static str) -> Self {
        Self { service, method }
    }

    pub fn path(&self) -> String {
        format!("/{}/{}", self.service, self.method)
    }
}

/// Coordinator routes, one per mediator operation
pub mod routes {
    use super::Route;

    pub const CHECK_ARGS_FOR_ADD: Route = Route::new("MasterAddService", "CheckArgs4Add");
    pub const CHECK_AND_STAT: Route = Route::new("MasterStatService", "CheckAndStat");
    pub const CHECK_AND_LIST: Route = Route::new("MasterListService", "CheckAndList");
    pub const GET_DATA_NODES_FOR_ADD: Route = Route::new("MasterAddService", "GetDataNodes4Add");
    pub const UNLOCK_DIRECTORY_FOR_ADD: Route = Route::new("MasterAddService", "UnlockDic4Add");
    pub const RELEASE_LEASE_FOR_ADD: Route = Route::new("MasterAddService", "ReleaseLease4Add");
}

/// Where the coordinator lives, asked before every call
pub trait EndpointResolver: Send + Sync {
    fn resolve(&self) -> Result<String, MediatorError>;
}

/// Reads `master_addr` + `master_port` from configuration on each call
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigEndpoint;

impl EndpointResolver for ConfigEndpoint {
    fn resolve(&self) -> Result<String, MediatorError> {
        config::load_config()
            .map(|config| config.master_endpoint())
            .map_err(|e| MediatorError::Endpoint(format!("{:#}", e)))
    }
}

/// A fixed `host:port`
#[derive(Debug, Clone)]
pub struct FixedEndpoint(String);

impl FixedEndpoint {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }
}

impl EndpointResolver for FixedEndpoint {
    fn resolve(&self) -> Result<String, MediatorError> {
        Ok(self.0.clone())
    }
}

/// Stateless client for the coordinator's remote operations
pub struct Mediator {
    resolver: Box<dyn EndpointResolver>,
}

impl Default for Mediator {
    fn default() -> Self {
        Self::new()
    }
}

impl Mediator {
    /// Mediator addressed through configuration
    pub fn new() -> Self {
        Self::with_resolver(ConfigEndpoint)
    }

    pub fn with_resolver(resolver: impl EndpointResolver + 'static) -> Self {
        Self {
            resolver: Box::new(resolver),
        }
    }

    /// Process-wide instance, built on first use
    pub fn shared() -> &'static Mediator {
        static SHARED: OnceLock<Mediator> = OnceLock::new();
        SHARED.get_or_init(Mediator::new)
    }

    /// Validate an add against coordinator state before any data moves
    pub async fn check_and_prepare_add(
        &self,
        request: &PrepareAddRequest,
    ) -> Result<PrepareAddReply, MediatorError> {
        self.call(routes::CHECK_ARGS_FOR_ADD, request).await
    }

    pub async fn check_and_stat(&self, request: &StatRequest) -> Result<StatReply, MediatorError> {
        self.call(routes::CHECK_AND_STAT, request).await
    }

    pub async fn check_and_list(&self, request: &ListRequest) -> Result<ListReply, MediatorError> {
        self.call(routes::CHECK_AND_LIST, request).await
    }

    /// Storage nodes assigned to receive one chunk of a new file
    pub async fn allocate_nodes_for_add(
        &self,
        request: &AllocateNodesRequest,
    ) -> Result<AllocateNodesReply, MediatorError> {
        self.call(routes::GET_DATA_NODES_FOR_ADD, request).await
    }

    pub async fn unlock_directory_for_add(
        &self,
        request: &UnlockDirectoryRequest,
    ) -> Result<UnlockDirectoryReply, MediatorError> {
        self.call(routes::UNLOCK_DIRECTORY_FOR_ADD, request).await
    }

    pub async fn release_lease_for_add(
        &self,
        request: &ReleaseLeaseRequest,
    ) -> Result<ReleaseLeaseReply, MediatorError> {
        self.call(routes::RELEASE_LEASE_FOR_ADD, request).await
    }

    async fn call<Req, Reply>(&self, route: Route, request: &Req) -> Result<Reply, MediatorError>
    where
        Req: Serialize,
        Reply: DeserializeOwned,
    {
        let method = route.method;
        let addr = self.resolver.resolve()?;
        let url = format!("http://{}{}", addr, route.path());

        tracing::debug!(%url, method, "calling coordinator");

        // No idle connections: each call dials and drops its own.
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()
            .map_err(|source| MediatorError::Transport { method, source })?;

        let response = client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|source| {
                if source.is_connect() {
                    MediatorError::Connect {
                        addr: addr.clone(),
                        source,
                    }
                } else {
                    MediatorError::Transport { method, source }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.text().await {
                Ok(body) => body.trim().to_string(),
                Err(e) => format!("<unreadable body: {}>", e),
            };
            return Err(MediatorError::Rejected {
                method,
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Reply>()
            .await
            .map_err(|source| MediatorError::Decode { method, source })
    }
}
