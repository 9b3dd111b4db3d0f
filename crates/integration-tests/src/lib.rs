//! Integration tests for Stockroom.
//!
//! Tests drive the full axum router with `tower::ServiceExt::oneshot`
//! against the in-memory store, so they need no database or running server.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stockroom-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Bearer token and admin checks
//! - `catalog` - Categories and products
//! - `cart` - Cart items and stock checks
//! - `checkout` - Order placement, payment outcomes, concurrency
//! - `orders` - Order listing and visibility

#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use stockroom_api::db::{CatalogStore, MemoryStore, UserStore};
use stockroom_api::models::{Category, NewProduct, Product, User};
use stockroom_api::services::auth::{Claims, TokenKeys};
use stockroom_api::services::checkout::DEFAULT_PAYMENT_TIMEOUT;
use stockroom_api::services::payment::FixedPaymentProcessor;
use stockroom_api::state::AppState;
use stockroom_api::{RateLimits, app};
use stockroom_core::{Email, Price};

/// Signing secret shared by the app under test and the token helpers.
pub const TEST_SECRET: &str = "integration-secret-7d41c9e2b8a05f36";

/// A response with its body decoded.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
    /// The body as JSON, or `Null` if it is empty or not JSON.
    pub json: Value,
}

impl TestResponse {
    /// The `detail` message of an error body.
    #[must_use]
    pub fn detail(&self) -> &str {
        self.json
            .get("detail")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// An app wired to an in-memory store and a fixed payment processor.
pub struct TestApp {
    pub store: MemoryStore,
    pub payments: FixedPaymentProcessor,
    pub state: AppState,
    keys: TokenKeys,
    router: Router,
}

impl TestApp {
    /// App whose processor always answers with `payments`.
    #[must_use]
    pub fn new(payments: FixedPaymentProcessor) -> Self {
        Self::with_timeout(payments, DEFAULT_PAYMENT_TIMEOUT)
    }

    /// App with a custom payment timeout.
    #[must_use]
    pub fn with_timeout(payments: FixedPaymentProcessor, timeout: Duration) -> Self {
        let store = MemoryStore::new();
        let keys = TokenKeys::new(&SecretString::from(TEST_SECRET));
        let state = AppState::new(
            Arc::new(store.clone()),
            keys.clone(),
            Arc::new(payments.clone()),
            timeout,
        );
        let router = app(state.clone(), RateLimits::Disabled);

        Self {
            store,
            payments,
            state,
            keys,
            router,
        }
    }

    /// App with an approving processor.
    #[must_use]
    pub fn approving() -> Self {
        Self::new(FixedPaymentProcessor::approving())
    }

    /// Create a user and a valid token for it.
    pub async fn user(&self, email: &str, is_admin: bool) -> (User, String) {
        let email = Email::parse(email).expect("valid test email");
        let user = self
            .store
            .create_user(&email, is_admin)
            .await
            .expect("create test user");
        let token = self
            .keys
            .issue(&email, chrono::Duration::minutes(5))
            .expect("issue test token");
        (user, token)
    }

    /// Create a category directly in the store.
    pub async fn category(&self, name: &str) -> Category {
        self.store
            .create_category(name)
            .await
            .expect("create test category")
    }

    /// Create a product directly in the store.
    pub async fn product(
        &self,
        category: &Category,
        name: &str,
        price: Decimal,
        stock: i32,
    ) -> Product {
        self.store
            .create_product(&NewProduct {
                name: name.to_owned(),
                description: None,
                price: Price::new(price).expect("non-negative test price"),
                stock,
                category_id: category.id,
            })
            .await
            .expect("create test product")
    }

    /// Current stock of a product.
    pub async fn stock(&self, product: &Product) -> i32 {
        self.store
            .product(product.id)
            .await
            .expect("read product")
            .expect("product exists")
            .stock
    }

    /// Send a request through the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        send(self.router.clone(), method, uri, token, body).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        self.request(Method::PUT, uri, token, body).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// A clone of the router, for driving concurrent requests.
    #[must_use]
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Send one request to `router` and decode the response.
pub async fn send(
    router: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = router.oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    let text = String::from_utf8_lossy(&bytes).into_owned();
    let json = serde_json::from_str(&text).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        text,
        json,
    }
}

/// Sign arbitrary claims with `secret`, bypassing [`TokenKeys`].
#[must_use]
pub fn raw_token(sub: &str, exp: i64, secret: &str) -> String {
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &Claims {
            sub: sub.to_owned(),
            exp,
        },
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("encode test token")
}
