//! Common test utilities for integration tests
//!
//! - In-memory app construction with a fast password work factor
//! - Request helpers returning `(status, json)`
//! - Account helpers (signup, login)

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use tasklist_api::{
    app::{build_router, AppState},
    config::Config,
};
use tasklist_shared::store::Stores;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const TEST_PASSWORD: &str = "hunter22";

/// Test context holding a fully wired router over in-memory stores
pub struct TestContext {
    pub app: Router,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// Builds a context with extra configuration entries
    pub fn with_env(extra: &[(&str, &str)]) -> Self {
        Self::build(extra, Stores::in_memory())
    }

    /// Builds a context over caller-supplied stores
    pub fn with_stores(stores: Stores) -> Self {
        Self::build(&[], stores)
    }

    fn build(extra: &[(&str, &str)], stores: Stores) -> Self {
        let mut env: HashMap<String, String> = [
            ("JWT_SECRET", TEST_SECRET),
            ("PASSWORD_HASH_MEMORY_KIB", "1024"),
            ("PASSWORD_HASH_ITERATIONS", "1"),
            ("PASSWORD_HASH_LANES", "1"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        for (k, v) in extra {
            env.insert(k.to_string(), v.to_string());
        }

        let config = Config::from_lookup(move |key| env.get(key).cloned())
            .expect("test config should parse");
        let state = AppState::new(stores, config);
        let app = build_router(state.clone());

        Self { app, state }
    }

    /// Sends a request and returns the status and parsed JSON body
    ///
    /// Non-JSON bodies come back as `Value::String`.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        (status, body)
    }

    /// Sends a request with an optional JSON body and `x-auth-token`
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("x-auth-token", token);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        self.send(request).await
    }

    /// Creates an account and asserts success
    pub async fn signup(&self, username: &str) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/users/signup",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": TEST_PASSWORD,
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
        body
    }

    /// Logs in and returns the token and user id
    pub async fn login(&self, username: &str) -> (String, String) {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/users/login",
                None,
                Some(json!({ "username": username, "password": TEST_PASSWORD })),
            )
            .await;

        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        let token = body["token"].as_str().expect("token").to_string();
        let id = body["user"]["id"].as_str().expect("user id").to_string();
        (token, id)
    }

    /// Signs up and logs in, returning the token
    pub async fn register(&self, username: &str) -> String {
        self.signup(username).await;
        self.login(username).await.0
    }

    /// Creates a task and returns its JSON representation
    pub async fn add_task(&self, token: &str, body: Value) -> Value {
        let (status, body) = self
            .call(Method::POST, "/api/tasks/add", Some(token), Some(body))
            .await;

        assert_eq!(status, StatusCode::CREATED, "add task failed: {}", body);
        body["task"].clone()
    }
}
