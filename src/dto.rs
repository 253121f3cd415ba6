//! # Request/Response DTOs
//!
//! API contract types that are not domain models.
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body
//! - `*Query`    → deserialized from query string
//! - `*Response` → serialized to client JSON

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Meds
// ============================================================================

/// POST /meds and POST /meds/reset
///
/// `medType` is kept as a raw value so that an unknown or non-string value is
/// reported as a validation error by the service, after the caller check.
#[derive(Debug, Default, Deserialize)]
pub struct MedTypeRequest {
    #[serde(rename = "medType", default)]
    pub med_type: Option<serde_json::Value>,
}

impl MedTypeRequest {
    pub fn med_type(&self) -> &str {
        self.med_type
            .as_ref()
            .and_then(|v| v.as_str())
            .unwrap_or_default()
    }
}

// ============================================================================
// Auth
// ============================================================================

/// GET /api/auth/callback/google
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user cancels or consent fails
    pub error: Option<String>,
}

/// GET /api/auth/session
#[derive(Debug, Serialize)]
pub struct SessionInfoResponse {
    pub email: String,
    pub expires_at: Option<DateTime<Utc>>,
}
