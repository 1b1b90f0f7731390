//! # MedConnect API Stub
//!
//! An in-memory implementation of the MedConnect REST API.
//!
//! Handles:
//! - the routes the client binds (auth, cases, answers, users, hospitals, conversations,
//!   leaderboard and the admin broadcast) under `/api`
//! - bearer-token auth with opaque `tok-<uuid>` tokens
//! - a request log so tests can assert exactly which calls were made
//!
//! Passwords are stored as given and nothing is persisted. This is a development and test
//! backend, not a production one.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod extract;
pub mod routes;
pub mod store;

use axum::extract::{Request, State};
use axum::http::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

pub use error::{StubError, StubResult};
pub use store::Store;

/// Every route is served below this prefix.
pub const API_PREFIX: &str = "/api";

/// Listen address used when `MEDCONNECT_STUB_ADDR` is unset.
pub const DEFAULT_ADDR: &str = "127.0.0.1:4000";

pub const ADDR_ENV: &str = "MEDCONNECT_STUB_ADDR";

/// One entry of the request log. `path` is relative to [`API_PREFIX`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

/// Shared state for all handlers.
#[derive(Clone, Default)]
pub struct StubState {
    pub(crate) store: Arc<RwLock<Store>>,
    log: Arc<Mutex<Vec<LoggedRequest>>>,
}

impl StubState {
    /// An empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend with demo users, a hospital and a few cases.
    pub fn seeded() -> Self {
        Self::with_store(Store::seeded())
    }

    pub fn with_store(store: Store) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            log: Arc::default(),
        }
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<LoggedRequest> {
        self.log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// How many requests matched `method` and `path`.
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn record(&self, request: &Request) {
        let path = request.uri().path();
        let entry = LoggedRequest {
            method: request.method().to_string(),
            path: path.strip_prefix(API_PREFIX).unwrap_or(path).to_string(),
            query: request.uri().query().map(str::to_owned),
            authorization: header(request, AUTHORIZATION),
            content_type: header(request, CONTENT_TYPE),
        };
        tracing::debug!("{} {}", entry.method, entry.path);
        if let Ok(mut log) = self.log.lock() {
            log.push(entry);
        }
    }
}

fn header(request: &Request, name: HeaderName) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

async fn record_request(State(state): State<StubState>, request: Request, next: Next) -> Response {
    state.record(&request);
    next.run(request).await
}

/// The full application: API routes under [`API_PREFIX`], request logging and permissive CORS.
pub fn router(state: StubState) -> Router {
    Router::new()
        .nest(API_PREFIX, routes::api())
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn_with_state(state.clone(), record_request)),
        )
        .with_state(state)
}

/// Serve the stub on an already-bound listener until the task is dropped.
pub async fn serve(listener: tokio::net::TcpListener, state: StubState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}
