//! Integration tests for the Eglys storefront.
//!
//! Tests drive the full router (middleware, extractors, handlers, services)
//! in-process with `tower::ServiceExt::oneshot`, on the in-memory backend.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p eglys-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - Health and product listing
//! - `auth` - Registration and login
//! - `cart` - Cart mutations
//! - `checkout` - Checkout and order history
//! - `postgres` - Storage behavior on `PostgreSQL` (ignored unless a database
//!   is available; run with `--ignored`)

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use eglys_storefront::config::CheckoutConfig;
use eglys_storefront::db::{Backend, MemoryStore};
use eglys_storefront::routes;
use eglys_storefront::state::AppState;

/// A response as seen by a client.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// JSON body, or the raw text as a JSON string if it is not JSON.
    pub body: Value,
}

/// The storefront application over a fresh in-memory store.
pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    /// App seeded with the standard catalog and no users.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::with_default_catalog()))
    }

    /// App over the given store.
    #[must_use]
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        let backend = Backend::in_memory(Arc::clone(&store));
        let state = AppState::with_checkout_config(CheckoutConfig::default(), backend);

        Self {
            router: routes::app(state),
            store,
        }
    }

    /// Send a request and collect the response.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    #[allow(clippy::unwrap_used)]
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// `GET` a path.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    #[allow(clippy::unwrap_used)]
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// `DELETE` a path.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    #[allow(clippy::unwrap_used)]
    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// `POST` a JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    #[allow(clippy::unwrap_used)]
    pub async fn post(&self, uri: &str, body: &Value) -> TestResponse {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Register a customer and return the new user ID.
    ///
    /// # Panics
    ///
    /// Panics if registration is rejected.
    pub async fn register(&self, email: &str) -> i64 {
        let response = self
            .post(
                "/auth/register",
                &json!({
                    "firstName": "Ana",
                    "lastName": "Pérez",
                    "phone": "+56 9 1234 5678",
                    "email": email,
                    "address": "Av. Siempre Viva 742",
                    "password": "hunter22",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"].as_i64().unwrap_or_default()
    }

    /// Add a product to a user's cart.
    ///
    /// # Panics
    ///
    /// Panics if the line is rejected.
    pub async fn add_to_cart(&self, user: i64, product: i64, qty: i64) -> Value {
        let response = self
            .post(
                "/cart/add",
                &json!({ "userId": user, "productId": product, "qty": qty }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body
    }

    /// Check out a user's cart.
    pub async fn checkout(&self, user: i64) -> TestResponse {
        self.post("/checkout", &json!({ "userId": user })).await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Assert the standard error body and return its message.
///
/// # Panics
///
/// Panics if the response is not an error with the expected status and code.
pub fn assert_error(response: &TestResponse, status: StatusCode, code: &str) -> String {
    assert_eq!(response.status, status, "{:?}", response.body);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["code"], code);
    response.body["message"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}
