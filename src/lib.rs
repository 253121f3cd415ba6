pub mod auth;
pub mod config;
pub mod day;
pub mod db;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use auth::provider::{GoogleProvider, IdentityProvider};
use auth::rate_limit::RateLimitState;
use config::Config;
use day::{Clock, DayResolver, SystemClock};
use db::{AllowList, MedStore, MemoryStore, PgStore};
use services::MedService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub meds: MedService,
    pub store: Arc<dyn MedStore>,
    pub allow_list: Arc<dyn AllowList>,
    pub identity: Arc<dyn IdentityProvider>,
    pub rate_limiter: RateLimitState,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn MedStore>,
        allow_list: Arc<dyn AllowList>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let days = DayResolver::new(clock, config.reference_timezone);
        Self {
            meds: MedService::new(store.clone(), days),
            config,
            store,
            allow_list,
            identity,
            rate_limiter: RateLimitState::new(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/signin", get(handlers::auth::signin))
        .route("/api/auth/callback/google", get(handlers::auth::callback))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let session_routes = Router::new()
        .route("/api/auth/session", get(handlers::auth::session))
        .route(
            "/meds",
            get(handlers::meds::get_today).post(handlers::meds::mark_given),
        )
        .route("/meds/reset", post(handlers::meds::reset_given))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::attach_session,
        ));

    let mut app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .merge(auth_routes)
        .merge(session_routes);

    match state.config.frontend_url.parse::<axum::http::HeaderValue>() {
        Ok(origin) => {
            let cors = CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true);
            app = app.layer(cors);
        }
        Err(_) => {
            tracing::warn!(frontend_url = %state.config.frontend_url, "FRONTEND_URL is not a valid origin; CORS disabled");
        }
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "petmeds_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());
    tracing::info!(timezone = %config.reference_timezone, "Reference timezone");

    let (store, allow_list): (Arc<dyn MedStore>, Arc<dyn AllowList>) =
        match &config.database_url {
            Some(url) => {
                let pg = PgStore::connect(url).await?;
                pg.run_migrations().await?;
                tracing::info!("Database migrations applied");
                let pg = Arc::new(pg);
                let store: Arc<dyn MedStore> = pg.clone();
                let allow_list: Arc<dyn AllowList> = pg;
                (store, allow_list)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory store, data is lost on restart");
                let mem = Arc::new(MemoryStore::with_allowed(&config.allowed_emails));
                let store: Arc<dyn MedStore> = mem.clone();
                let allow_list: Arc<dyn AllowList> = mem;
                (store, allow_list)
            }
        };

    let identity: Arc<dyn IdentityProvider> = Arc::new(GoogleProvider::new(&config));
    let state = AppState::new(
        config.clone(),
        store,
        allow_list,
        identity,
        Arc::new(SystemClock),
    );

    state.rate_limiter.spawn_cleanup_worker();

    let app = build_router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    // Client IP is needed for rate limiting
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
