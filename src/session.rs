//! Who the caller is acting as, and which profiles they have switched on.
//!
//! The actor is a profile id bound to the cookie session. An `X-Actor-Id`
//! header overrides it for callers that don't keep cookies.

use axum::{
    debug_handler,
    extract::{FromRequestParts, State},
    http::request::Parts,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    profiles, projection,
    res::{self, Json, Query},
    AppError, AppResult, AppState,
};

pub const ACTOR_ID: &str = "actor_id";
pub const ACTOR_HEADER: &str = "x-actor-id";

/// The resolved actor, if any. Each operation that uses it looks it up.
pub struct Actor(pub Option<Uuid>);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(header) = parts.headers.get(ACTOR_HEADER) {
            let actor_id = header
                .to_str()
                .ok()
                .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
                .ok_or_else(|| AppError::validation("X-Actor-Id must be a profile id"))?;
            return Ok(Actor(Some(actor_id)));
        }

        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::Internal(anyhow::anyhow!(msg)))?;
        Ok(Actor(session.get::<Uuid>(ACTOR_ID).await?))
    }
}

impl Actor {
    pub fn required(self) -> AppResult<Uuid> {
        self.0.ok_or_else(|| AppError::not_found("Actor"))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", get(active_profiles).post(set_active_profiles))
        .route("/session/actor", post(enter).delete(leave))
        .route("/session/events", get(active_events))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnterBody {
    profile_id: Uuid,
}

#[debug_handler(state = AppState)]
async fn enter(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(EnterBody { profile_id }): Json<EnterBody>,
) -> AppResult<impl IntoResponse> {
    let profile = profiles::get(&db_pool, profile_id).await?;
    session.insert(ACTOR_ID, profile.id).await?;

    tracing::info!(actor_id = %profile.id, "actor bound to session");
    Ok(res::ok("Acting as profile", profile))
}

#[debug_handler]
async fn leave(session: Session) -> AppResult<impl IntoResponse> {
    let previous = session.remove::<Uuid>(ACTOR_ID).await?;
    Ok(res::ok("Session cleared", previous))
}

#[debug_handler(state = AppState)]
async fn active_profiles(
    State(db_pool): State<SqlitePool>,
    actor: Actor,
) -> AppResult<impl IntoResponse> {
    let active = profiles::get_active_profiles(&db_pool, actor.required()?).await?;
    Ok(res::ok("Active profiles fetched successfully", active))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActiveBody {
    #[serde(default)]
    active_profiles: Vec<Uuid>,
}

#[debug_handler(state = AppState)]
async fn set_active_profiles(
    State(db_pool): State<SqlitePool>,
    actor: Actor,
    Json(ActiveBody { active_profiles }): Json<ActiveBody>,
) -> AppResult<impl IntoResponse> {
    let active = profiles::set_active_profiles(&db_pool, actor.required()?, &active_profiles).await?;
    Ok(res::ok("Active profiles updated successfully", active))
}

#[derive(Debug, Deserialize)]
struct DisplayQuery {
    timezone: Option<String>,
}

#[debug_handler(state = AppState)]
async fn active_events(
    State(db_pool): State<SqlitePool>,
    actor: Actor,
    Query(DisplayQuery { timezone }): Query<DisplayQuery>,
) -> AppResult<impl IntoResponse> {
    let view = projection::events_for_actor(&db_pool, actor.required()?, timezone.as_deref()).await?;
    Ok(res::ok("Events for active profiles fetched successfully", view))
}
