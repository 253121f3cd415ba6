//! Federated identity. The core only needs a verified email per sign-in.

use anyhow::Context;
use futures_util::future::{BoxFuture, FutureExt};
use serde::Deserialize;

use crate::config::Config;
use crate::error::{AppError, AppResult};

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifiedIdentity {
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
}

pub trait IdentityProvider: Send + Sync {
    /// Where to send the browser to start sign-in.
    fn authorize_url(&self, state: &str) -> String;

    /// Trade an authorization code for the user's identity.
    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, AppResult<VerifiedIdentity>>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct GoogleProvider {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl GoogleProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_url: config.oauth_redirect_url.clone(),
        }
    }

    async fn fetch_identity(&self, code: &str) -> anyhow::Result<VerifiedIdentity> {
        let token: TokenResponse = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("token request failed")?
            .error_for_status()
            .context("token endpoint rejected the code")?
            .json()
            .await
            .context("malformed token response")?;

        let identity = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .context("userinfo request failed")?
            .error_for_status()
            .context("userinfo endpoint rejected the token")?
            .json()
            .await
            .context("malformed userinfo response")?;

        Ok(identity)
    }
}

impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, state: &str) -> String {
        let url = reqwest::Url::parse_with_params(
            GOOGLE_AUTHORIZE_URL,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
                ("prompt", "select_account"),
            ],
        );
        match url {
            Ok(url) => url.to_string(),
            Err(_) => GOOGLE_AUTHORIZE_URL.to_string(),
        }
    }

    fn exchange_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, AppResult<VerifiedIdentity>> {
        async move {
            self.fetch_identity(code).await.map_err(|e| {
                tracing::warn!(error = %e, "Identity provider exchange failed");
                AppError::Unauthorized
            })
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_config;

    #[test]
    fn test_authorize_url_carries_state_and_client() {
        let mut config = test_config();
        config.google_client_id = "client-123".into();
        let provider = GoogleProvider::new(&config);

        let url = reqwest::Url::parse(&provider.authorize_url("abc.123.def")).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["state"], "abc.123.def");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["redirect_uri"], config.oauth_redirect_url);
    }

    #[test]
    fn test_userinfo_deserializes() {
        let json = r#"{"sub":"1","email":"owner@example.com","email_verified":true,"name":"Owner"}"#;
        let identity: VerifiedIdentity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.email, "owner@example.com");
        assert!(identity.email_verified);
    }

    #[test]
    fn test_userinfo_unverified_by_default() {
        let identity: VerifiedIdentity =
            serde_json::from_str(r#"{"email":"owner@example.com"}"#).unwrap();
        assert!(!identity.email_verified);
    }
}
