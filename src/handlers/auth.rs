use axum::{
    extract::{Query, State},
    response::Redirect,
    Extension, Json,
};
use chrono::Utc;

use crate::auth::{
    jwt::{create_session_token, SessionToken},
    oauth_state::{issue_state, verify_state},
};
use crate::dto::{OAuthCallbackQuery, SessionInfoResponse};
use crate::error::{AppError, AppResult};
use crate::models::session::RequestContext;
use crate::AppState;

/// Start federated sign-in.
pub async fn signin(State(state): State<AppState>) -> Redirect {
    let oauth_state = issue_state(&state.config.session_secret, Utc::now());
    Redirect::to(&state.identity.authorize_url(&oauth_state))
}

/// Finish federated sign-in. Only allow-listed, verified emails get a session.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> AppResult<Json<SessionToken>> {
    if let Some(error) = query.error.as_deref() {
        tracing::warn!(error = %error, "Identity provider returned an error");
        return Err(AppError::Unauthorized);
    }

    let oauth_state = query.state.as_deref().unwrap_or_default();
    if !verify_state(&state.config.session_secret, oauth_state, Utc::now()) {
        tracing::warn!("Sign-in callback with invalid or expired state");
        return Err(AppError::Unauthorized);
    }

    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::Validation("Missing authorization code".into()))?;

    let identity = state.identity.exchange_code(code).await?;
    if !identity.email_verified {
        tracing::warn!(email = %identity.email, "Sign-in with unverified email");
        return Err(AppError::Forbidden);
    }

    let allowed = state
        .allow_list
        .is_allowed(&identity.email)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    if !allowed {
        tracing::warn!(email = %identity.email, "User not authorized");
        return Err(AppError::Forbidden);
    }

    tracing::info!(email = %identity.email, "Session issued");
    let token = create_session_token(&identity.email, &state.config)?;
    Ok(Json(token))
}

pub async fn session(
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Json<SessionInfoResponse>> {
    let principal = ctx.require_principal()?;
    Ok(Json(SessionInfoResponse {
        email: principal.email.clone(),
        expires_at: ctx.expires_at(),
    }))
}
