#![allow(dead_code)]

//! Canned-response coordinator for integration tests.
//!
//! Answers each `POST /{Service}/{Method}` with a fixed status and body and
//! records every request it sees, in arrival order.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use futures::{stream, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use dfs_client::mediator::Route;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub struct Canned {
    path: String,
    status: u16,
    body: String,
    cut_off: bool,
}

pub fn ok(route: Route, body: Value) -> Canned {
    Canned {
        path: route.path(),
        status: 200,
        body: body.to_string(),
        cut_off: false,
    }
}

pub fn fail(route: Route, status: u16, message: &str) -> Canned {
    Canned {
        path: route.path(),
        status,
        body: message.to_string(),
        cut_off: false,
    }
}

/// Sends the status and the first part of `message`, then drops the
/// connection before the body is complete
pub fn cut_off(route: Route, status: u16, message: &str) -> Canned {
    Canned {
        cut_off: true,
        ..fail(route, status, message)
    }
}

#[derive(Clone, Default)]
struct StubState {
    calls: Arc<Mutex<Vec<Recorded>>>,
}

impl StubState {
    fn record(&self, path: String, body: &Bytes) {
        let body = serde_json::from_slice(body).unwrap_or(Value::Null);
        self.calls.lock().unwrap().push(Recorded { path, body });
    }
}

pub struct CoordinatorStub {
    pub addr: SocketAddr,
    state: StubState,
    handle: tokio::task::JoinHandle<()>,
}

impl CoordinatorStub {
    pub async fn start(canned: Vec<Canned>) -> Self {
        let state = StubState::default();

        let mut app = Router::new();
        for Canned {
            path,
            status,
            body,
            cut_off,
        } in canned
        {
            let status = StatusCode::from_u16(status).expect("valid status");
            let route = path.clone();
            app = app.route(
                &route,
                post(move |State(state): State<StubState>, request: Bytes| {
                    let path = path.clone();
                    let body = body.clone();
                    async move {
                        state.record(path, &request);
                        if cut_off {
                            // first chunk is flushed before the stream fails
                            let head = stream::once(async move { Ok(Bytes::from(body)) });
                            let lost = stream::once(async {
                                tokio::time::sleep(Duration::from_millis(50)).await;
                                Err(std::io::Error::other("connection lost"))
                            });
                            (status, Body::from_stream(head.chain(lost))).into_response()
                        } else {
                            (status, [(header::CONTENT_TYPE, "application/json")], body)
                                .into_response()
                        }
                    }
                }),
            );
        }
        let app = app
            .fallback(|State(state): State<StubState>, uri: Uri, request: Bytes| async move {
                state.record(uri.path().to_string(), &request);
                (StatusCode::NOT_FOUND, "no such route")
            })
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// `host:port` as the mediator dials it
    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }
}

impl Drop for CoordinatorStub {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// An address with nothing listening on it
pub fn unreachable_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("ephemeral addr");
    drop(listener);
    addr.to_string()
}
