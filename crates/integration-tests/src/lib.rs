//! Integration tests for the RocketShoes cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! The tests need no external services: [`StubApi`] serves the storefront
//! endpoints from an in-process `axum` server bound to an ephemeral port.
//!
//! # Test Categories
//!
//! - `api_client` - HTTP lookups, error mapping, auth and caching
//! - `cart_flow` - Cart manager end to end over HTTP and file storage

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::Router;
use axum::extract::{Path, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

use rocketshoes_cart::ApiConfig;

#[derive(Default)]
struct StubState {
    stock: HashMap<i32, u32>,
    products: HashMap<i32, Value>,
    overrides: HashMap<String, (StatusCode, String)>,
    token: Option<String>,
    requests: Vec<String>,
}

type SharedState = Arc<Mutex<StubState>>;

/// In-process stand-in for the storefront API.
///
/// Serves `GET /stock/{id}` and `GET /products/{id}` from data registered by
/// the test. Unknown ids answer 404. The server stops when the stub is
/// dropped.
pub struct StubApi {
    state: SharedState,
    addr: SocketAddr,
    server: JoinHandle<()>,
}

impl StubApi {
    /// Start a stub server on `127.0.0.1` with an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> io::Result<Self> {
        let state = SharedState::default();

        let app = Router::new()
            .route("/stock/{id}", get(stock))
            .route("/products/{id}", get(product))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            state,
            addr,
            server,
        })
    }

    /// Base URL of the stub.
    ///
    /// # Panics
    ///
    /// Panics if the bound address does not form a URL.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("socket address is a valid URL")
    }

    /// API configuration pointing at the stub with default settings.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(self.base_url())
    }

    /// Register the stock amount for a product.
    pub fn set_stock(&self, id: i32, amount: u32) {
        self.lock().stock.insert(id, amount);
    }

    /// Register a product.
    pub fn add_product(&self, id: i32, title: &str, price: f64) {
        let record = json!({
            "id": id,
            "title": title,
            "price": price,
            "image": format!("https://cdn.rocketshoes.test/{id}.jpg"),
        });
        self.lock().products.insert(id, record);
    }

    /// Register a product with stock in one call.
    pub fn add_product_in_stock(&self, id: i32, title: &str, price: f64, amount: u32) {
        self.add_product(id, title, price);
        self.set_stock(id, amount);
    }

    /// Answer every request to `path` with `status` and a raw `body`.
    pub fn respond(&self, path: &str, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.lock()
            .overrides
            .insert(path.to_string(), (status, body.to_string()));
    }

    /// Drop a previous [`StubApi::respond`] override.
    pub fn clear_response(&self, path: &str) {
        self.lock().overrides.remove(path);
    }

    /// Reject requests without `Authorization: Bearer {token}` with 401.
    pub fn require_token(&self, token: &str) {
        self.lock().token = Some(token.to_string());
    }

    /// Number of requests received for `path`.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> usize {
        self.lock().requests.iter().filter(|p| *p == path).count()
    }

    /// Number of requests received in total.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    fn lock(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for StubApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn stock(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    serve(&state, &format!("/stock/{id}"), &headers, |s| {
        s.stock.get(&id).map(|amount| json!({ "id": id, "amount": amount }))
    })
}

async fn product(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    serve(&state, &format!("/products/{id}"), &headers, |s| {
        s.products.get(&id).cloned()
    })
}

fn serve(
    state: &SharedState,
    path: &str,
    headers: &HeaderMap,
    find: impl FnOnce(&StubState) -> Option<Value>,
) -> Response {
    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    state.requests.push(path.to_string());

    if let Some(token) = &state.token {
        let expected = format!("Bearer {token}");
        let presented = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
        if presented != Some(expected.as_str()) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    if let Some((status, body)) = state.overrides.get(path) {
        return (*status, [(CONTENT_TYPE, "application/json")], body.clone()).into_response();
    }

    match find(&state) {
        Some(record) => axum::Json(record).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
