//! Test harness for driving the HTTP router against in-memory stores.
//!
//! Requests go through `tower::ServiceExt::oneshot`, so no port is bound and
//! every test owns its own stores.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use lobby_core::common::UserId;
use lobby_core::domains::auth::JwtService;
use lobby_core::kernel::TestDependencies;
use lobby_core::server::{router, AxumAppState};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test_secret";
pub const TEST_ISSUER: &str = "lobby-server";

pub struct TestApp {
    pub deps: TestDependencies,
    pub router: Router,
    jwt_service: JwtService,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_deps(TestDependencies::new())
    }

    pub fn with_deps(deps: TestDependencies) -> Self {
        let state = AxumAppState::new(
            deps.server_deps(),
            JwtService::new(TEST_SECRET, TEST_ISSUER.to_string()),
            None,
        );

        Self {
            deps,
            router: router(state),
            jwt_service: JwtService::new(TEST_SECRET, TEST_ISSUER.to_string()),
        }
    }

    /// A signed token for a brand new registered user.
    pub fn token_for(&self, name: &str) -> String {
        self.jwt_service
            .create_token(UserId::new(), name.to_string(), false)
            .expect("Failed to sign test token")
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    /// Create a lobby as a fresh guest. Returns (lobby id, code, token).
    pub async fn create_lobby(&self, name: &str) -> (String, String, String) {
        let res = self
            .post("/lobby/create", None, json!({ "name": name }))
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "create failed: {}", res.body);

        (
            res.str("lobbyId"),
            res.str("code"),
            res.str("guestToken"),
        )
    }

    /// Join by code as a fresh guest. Returns the guest's token.
    pub async fn join_lobby(&self, code: &str, name: &str) -> String {
        let res = self
            .post("/lobby/join", None, json!({ "code": code, "name": name }))
            .await;
        assert_eq!(res.status, StatusCode::OK, "join failed: {}", res.body);
        res.str("guestToken")
    }

    pub async fn submit_vibe(&self, lobby_id: &str, token: &str) {
        let res = self
            .post(
                &format!("/lobby/{}/vibe-check", lobby_id),
                Some(token),
                json!({
                    "mealVolume": "regular",
                    "budget": "moderate",
                    "mood": "any",
                    "distance": "flexible"
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "vibe failed: {}", res.body);
    }

    pub async fn swipe(&self, lobby_id: &str, token: &str, restaurant_id: &str, direction: &str) {
        let res = self
            .post(
                &format!("/lobby/{}/swipe", lobby_id),
                Some(token),
                json!({ "restaurantId": restaurant_id, "direction": direction }),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "swipe failed: {}", res.body);
    }

    pub async fn vote(&self, lobby_id: &str, token: &str, restaurant_id: &str) -> TestResponse {
        self.post(
            &format!("/lobby/{}/vote", lobby_id),
            Some(token),
            json!({ "restaurantId": restaurant_id }),
        )
        .await
    }
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    pub fn str(&self, field: &str) -> String {
        self.body[field]
            .as_str()
            .unwrap_or_else(|| panic!("missing string field {} in {}", field, self.body))
            .to_string()
    }

    pub fn error_kind(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}
