use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::jwt::verify_session_token;
use crate::models::session::RequestContext;
use crate::AppState;

/// Attach a [`RequestContext`] to the request. A missing or invalid session
/// yields an anonymous context; the service decides what that may do.
pub async fn attach_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let ctx = match token.map(|t| verify_session_token(t, &state.config)) {
        Some(Ok(claims)) => {
            RequestContext::authenticated(claims.principal()).with_expiry(claims.expires_at())
        }
        Some(Err(_)) => {
            tracing::debug!(path = %req.uri().path(), "Rejected session token");
            RequestContext::anonymous()
        }
        None => RequestContext::anonymous(),
    };

    req.extensions_mut().insert(ctx);
    next.run(req).await
}
