//! Integration tests for the RocketShoes cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! No external services are needed: [`FakeShop`] serves the products and
//! stock endpoints from memory on an ephemeral local port, and counts hits
//! so tests can assert what was (and was not) cached.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

/// In-memory products/stock API.
#[derive(Default)]
pub struct FakeShop {
    stock: Mutex<HashMap<i32, i64>>,
    products: Mutex<HashMap<i32, serde_json::Value>>,
    rate_limited: AtomicBool,
    last_authorization: Mutex<Option<String>>,
    stock_hits: AtomicUsize,
    product_hits: AtomicUsize,
}

impl FakeShop {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a product with its stock level, in the shape the REST API serves.
    pub fn add_product(&self, id: i32, title: &str, price: f64, stock: i64) {
        self.products.lock().unwrap().insert(
            id,
            json!({
                "id": id,
                "title": title,
                "price": price,
                "image": format!("https://rocketseat-cdn.example.test/sneakers/{id}.jpg"),
            }),
        );
        self.set_stock(id, stock);
    }

    pub fn set_stock(&self, id: i32, amount: i64) {
        self.stock.lock().unwrap().insert(id, amount);
    }

    /// Make every request answer 429 until turned off.
    pub fn set_rate_limited(&self, on: bool) {
        self.rate_limited.store(on, Ordering::SeqCst);
    }

    #[must_use]
    pub fn last_authorization(&self) -> Option<String> {
        self.last_authorization.lock().unwrap().clone()
    }

    #[must_use]
    pub fn stock_hits(&self) -> usize {
        self.stock_hits.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn product_hits(&self) -> usize {
        self.product_hits.load(Ordering::SeqCst)
    }

    fn record(&self, headers: &HeaderMap) -> Option<Response> {
        *self.last_authorization.lock().unwrap() = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        self.rate_limited.load(Ordering::SeqCst).then(|| {
            (StatusCode::TOO_MANY_REQUESTS, [(header::RETRY_AFTER, "30")]).into_response()
        })
    }
}

async fn stock(
    State(shop): State<Arc<FakeShop>>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    shop.stock_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(limited) = shop.record(&headers) {
        return limited;
    }

    let amount = shop.stock.lock().unwrap().get(&id).copied();
    match amount {
        Some(amount) => Json(json!({ "id": id, "amount": amount })).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn product(
    State(shop): State<Arc<FakeShop>>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Response {
    shop.product_hits.fetch_add(1, Ordering::SeqCst);
    if let Some(limited) = shop.record(&headers) {
        return limited;
    }

    let product = shop.products.lock().unwrap().get(&id).cloned();
    match product {
        Some(product) => Json(product).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serve `shop` under `prefix` (e.g. `""` or `"/api"`) and return the base URL.
pub async fn serve(shop: Arc<FakeShop>, prefix: &str) -> String {
    let routes = Router::new()
        .route("/stock/{id}", get(stock))
        .route("/products/{id}", get(product))
        .with_state(shop);

    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(prefix, routes)
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}{prefix}")
}
