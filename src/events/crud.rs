use axum::{debug_handler, extract::State, response::IntoResponse};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    projection,
    res::{self, Json, Path},
    session::Actor,
    AppResult,
};

use super::{
    model::{EventChanges, NewEvent},
    store,
};

#[debug_handler]
pub(crate) async fn new_event(
    State(db_pool): State<SqlitePool>,
    Json(new): Json<NewEvent>,
) -> AppResult<impl IntoResponse> {
    let event = store::create(&db_pool, new).await?;
    Ok(res::created("Event created successfully", event))
}

#[debug_handler]
pub(crate) async fn events(State(db_pool): State<SqlitePool>) -> AppResult<impl IntoResponse> {
    let events = projection::events_details(&db_pool, store::list(&db_pool).await?).await?;
    Ok(res::ok("Events fetched successfully", events))
}

#[debug_handler]
pub(crate) async fn event(
    State(db_pool): State<SqlitePool>,
    Path(event_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let event = projection::event_details(&db_pool, store::get(&db_pool, event_id).await?).await?;
    Ok(res::ok("Event fetched successfully", event))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReplaceBody {
    #[serde(flatten)]
    changes: EventChanges,
    updated_by: Option<Uuid>,
}

/// `updatedBy` in the body wins over the session's actor.
#[debug_handler]
pub(crate) async fn replace_event(
    State(db_pool): State<SqlitePool>,
    Path(event_id): Path<Uuid>,
    Actor(actor): Actor,
    Json(ReplaceBody { changes, updated_by }): Json<ReplaceBody>,
) -> AppResult<impl IntoResponse> {
    let replaced = store::replace(&db_pool, event_id, &changes, updated_by.or(actor)).await?;
    Ok(res::ok("Event updated successfully", replaced.event))
}

#[debug_handler]
pub(crate) async fn patch_event(
    State(db_pool): State<SqlitePool>,
    Path(event_id): Path<Uuid>,
    Json(changes): Json<EventChanges>,
) -> AppResult<impl IntoResponse> {
    let event = store::patch(&db_pool, event_id, &changes).await?;
    Ok(res::ok("Event partially updated", event))
}

#[debug_handler]
pub(crate) async fn delete_event(
    State(db_pool): State<SqlitePool>,
    Path(event_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let event = store::delete(&db_pool, event_id).await?;
    Ok(res::ok("Event deleted successfully", event))
}
