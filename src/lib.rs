pub mod appresult;
pub mod audit;
pub mod config;
pub mod db;
pub mod events;
pub mod profiles;
pub mod projection;
pub mod res;
pub mod session;
pub mod timezones;

use axum::{debug_handler, extract::FromRef, routing::get, Router};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

pub use appresult::{AppError, AppResult};
pub use config::Config;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
}

/// Builds the full application: every route under `/api/v1` plus the
/// session, CORS and tracing layers.
pub fn app(state: AppState, config: &Config) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.session_idle_minutes,
        )));

    let api = Router::new()
        .merge(events::router())
        .merge(audit::router())
        .merge(profiles::router())
        .merge(timezones::router())
        .merge(session::router());

    Router::new()
        .route("/", get(hello))
        .nest("/api/v1", api)
        .fallback(res::route_not_found)
        .with_state(state)
        .layer(session_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[debug_handler]
async fn hello() -> &'static str {
    "Event scheduling API is running"
}
