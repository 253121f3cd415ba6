//! Shared setup for router-level integration tests.
//!
//! Everything runs against the in-memory store and a pinned clock, so no
//! database or network is needed.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt};
use http_body_util::BodyExt;
use tower::ServiceExt;

use petmeds_api::auth::jwt::create_session_token;
use petmeds_api::auth::provider::{IdentityProvider, VerifiedIdentity};
use petmeds_api::config::{parse_timezone, Config};
use petmeds_api::day::FixedClock;
use petmeds_api::db::MemoryStore;
use petmeds_api::error::{AppError, AppResult};
use petmeds_api::{build_router, AppState};

pub const OWNER: &str = "owner@example.com";

pub fn config(timezone: &str) -> Config {
    Config {
        database_url: None,
        host: "127.0.0.1".into(),
        port: 0,
        frontend_url: "http://localhost:3000".into(),
        session_secret: "integration-secret".into(),
        session_ttl_secs: 3600,
        google_client_id: String::new(),
        google_client_secret: String::new(),
        oauth_redirect_url: "http://localhost:8080/api/auth/callback/google".into(),
        reference_timezone: parse_timezone(timezone).expect("valid timezone"),
        allowed_emails: vec![OWNER.into()],
    }
}

/// Never reached by the meds routes.
struct NoProvider;

impl IdentityProvider for NoProvider {
    fn authorize_url(&self, _state: &str) -> String {
        "https://idp.invalid/authorize".into()
    }

    fn exchange_code<'a>(&'a self, _code: &'a str) -> BoxFuture<'a, AppResult<VerifiedIdentity>> {
        async { Err(AppError::Unauthorized) }.boxed()
    }
}

/// The app as it would run at instant `now` in `timezone`.
pub struct TestContext {
    pub store: MemoryStore,
    config: Config,
}

impl TestContext {
    pub fn new(timezone: &str) -> Self {
        Self {
            store: MemoryStore::with_allowed([OWNER]),
            config: config(timezone),
        }
    }

    pub fn app_at(&self, now: &str) -> Router {
        let now = DateTime::parse_from_rfc3339(now)
            .expect("valid instant")
            .with_timezone(&Utc);
        let state = AppState::new(
            Arc::new(self.config.clone()),
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            Arc::new(NoProvider),
            Arc::new(FixedClock::new(now)),
        );
        build_router(state)
    }

    pub fn auth_header_value(&self) -> String {
        let token = create_session_token(OWNER, &self.config).expect("session token");
        format!("Bearer {}", token.access_token)
    }
}

pub async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let req = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
