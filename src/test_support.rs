use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{header, Request},
    Router,
};
use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt};

use crate::auth::jwt::create_session_token;
use crate::auth::provider::{IdentityProvider, VerifiedIdentity};
use crate::config::{Config, DEFAULT_REFERENCE_TIMEZONE};
use crate::day::FixedClock;
use crate::db::MemoryStore;
use crate::error::{AppError, AppResult};
use crate::{build_router, AppState};

pub const OWNER: &str = "owner@example.com";

pub fn test_config() -> Config {
    Config {
        database_url: None,
        host: "127.0.0.1".into(),
        port: 0,
        frontend_url: "http://localhost:3000".into(),
        session_secret: "test-session-secret".into(),
        session_ttl_secs: 3600,
        google_client_id: "test-client".into(),
        google_client_secret: "test-client-secret".into(),
        oauth_redirect_url: "http://localhost:8080/api/auth/callback/google".into(),
        reference_timezone: crate::config::parse_timezone(DEFAULT_REFERENCE_TIMEZONE)
            .expect("default timezone"),
        allowed_emails: vec![OWNER.into()],
    }
}

/// Accepts the code `"good-code"` and reports `identity` for it.
pub struct StubProvider {
    pub identity: VerifiedIdentity,
}

impl IdentityProvider for StubProvider {
    fn authorize_url(&self, state: &str) -> String {
        format!("https://idp.test/authorize?state={}", state)
    }

    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, AppResult<VerifiedIdentity>> {
        async move {
            if code == "good-code" {
                Ok(self.identity.clone())
            } else {
                Err(AppError::Unauthorized)
            }
        }
        .boxed()
    }
}

pub fn test_app(store: &MemoryStore, now: &str, identity: VerifiedIdentity) -> Router {
    let now = DateTime::parse_from_rfc3339(now)
        .expect("valid instant")
        .with_timezone(&Utc);
    let state = AppState::new(
        Arc::new(test_config()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(StubProvider { identity }),
        Arc::new(FixedClock::new(now)),
    );
    build_router(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
}

pub fn owner_identity() -> VerifiedIdentity {
    VerifiedIdentity {
        email: OWNER.into(),
        email_verified: true,
    }
}

pub fn bearer(email: &str) -> String {
    let token = create_session_token(email, &test_config()).expect("session token");
    format!("Bearer {}", token.access_token)
}

pub fn request(method: &str, uri: &str, auth: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}
