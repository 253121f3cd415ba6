use std::env;

use chrono_tz::Tz;

pub const DEFAULT_REFERENCE_TIMEZONE: &str = "America/Los_Angeles";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub session_secret: String,
    pub session_ttl_secs: i64,

    pub google_client_id: String,
    pub google_client_secret: String,
    pub oauth_redirect_url: String,

    /// Civil timezone that decides which calendar day "today" is.
    pub reference_timezone: Tz,

    // Seeds the in-memory allow-list when no database is configured
    pub allowed_emails: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            session_secret: env::var("SESSION_SECRET").expect("SESSION_SECRET must be set"),
            session_ttl_secs: env::var("SESSION_TTL_SECS")
                .unwrap_or_else(|_| "2592000".into()) // 30 days
                .parse()
                .expect("SESSION_TTL_SECS must be a number"),

            google_client_id: env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            oauth_redirect_url: env::var("OAUTH_REDIRECT_URL").unwrap_or_else(|_| {
                "http://localhost:8080/api/auth/callback/google".into()
            }),

            reference_timezone: parse_timezone(
                &env::var("REFERENCE_TIMEZONE")
                    .unwrap_or_else(|_| DEFAULT_REFERENCE_TIMEZONE.into()),
            )
            .expect("REFERENCE_TIMEZONE must be an IANA timezone name"),

            allowed_emails: env::var("ALLOWED_EMAILS")
                .map(|s| parse_email_list(&s))
                .unwrap_or_default(),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Resolve a named zone such as `America/Los_Angeles`. Fixed offsets are not
/// accepted because they would ignore daylight-saving transitions.
pub fn parse_timezone(name: &str) -> anyhow::Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("invalid timezone {name:?}: {e}"))
}

fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
