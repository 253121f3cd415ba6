use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// Verified end-user identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub email: String,
}

/// Request-scoped context handed to every service call. Built fresh per
/// request by the session middleware.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    principal: Option<Principal>,
    expires_at: Option<DateTime<Utc>>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// When the session behind this request stops being accepted.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn require_principal(&self) -> AppResult<&Principal> {
        self.principal.as_ref().ok_or(AppError::Unauthorized)
    }
}
