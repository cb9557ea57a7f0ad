//! Shared helpers for API integration tests
//!
//! Every test builds the real router over fresh in-memory stores and drives
//! it in-process with `tower::Service::call`.

#![allow(dead_code)]

use std::collections::HashMap;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use motopay_api::{
    app::{build_router, AppState},
    config::Config,
};
use motopay_shared::store::Stores;
use serde_json::{json, Value};
use tower::Service as _;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const PASSWORD: &str = "pw12345678";

/// Configuration with test defaults plus the given overrides
pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("DATABASE_URL".to_string(), "postgresql://localhost/motopay_test".to_string()),
        ("JWT_SECRET".to_string(), TEST_SECRET.to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    Config::from_lookup(|key| vars.get(key).cloned()).expect("test config should load")
}

/// A signed-up user
#[derive(Debug, Clone)]
pub struct Account {
    pub user_id: Uuid,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub struct TestContext {
    pub app: Router,
    pub state: AppState,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(test_config(&[]))
    }

    pub fn with_config(config: Config) -> Self {
        let state = AppState::new(Stores::in_memory(), config);
        let app = build_router(state.clone());

        Self { app, state }
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// Non-JSON bodies come back as `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, body)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn signup(&self, email: &str) -> Account {
        let (status, body) = self
            .post(
                "/auth/signup",
                None,
                json!({ "email": email, "password": PASSWORD, "name": "Test Driver" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");

        let data = &body["data"];
        Account {
            user_id: data["user"]["id"].as_str().unwrap().parse().unwrap(),
            email: email.to_string(),
            access_token: data["access_token"].as_str().unwrap().to_string(),
            refresh_token: data["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a company and returns its id
    pub async fn create_company(&self, account: &Account, name: &str) -> String {
        let (status, body) = self
            .post(
                "/companies",
                Some(&account.access_token),
                json!({ "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "company creation failed: {body}");

        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Creates a vehicle and returns its id
    pub async fn create_vehicle(&self, account: &Account, name: &str) -> String {
        let (status, body) = self
            .post(
                "/vehicles",
                Some(&account.access_token),
                json!({ "name": name, "plate": "abc1d23" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "vehicle creation failed: {body}");

        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Records a transaction and returns the created record
    pub async fn create_transaction(&self, account: &Account, body: Value) -> Value {
        let (status, body) = self
            .post("/transactions", Some(&account.access_token), body)
            .await;
        assert_eq!(status, StatusCode::CREATED, "transaction creation failed: {body}");

        body["data"].clone()
    }
}
