use axum::{debug_handler, extract::State, response::IntoResponse};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{projection, res::{self, Path, Query}, AppResult};

#[derive(Debug, Deserialize)]
pub(crate) struct DisplayQuery {
    timezone: Option<String>,
}

#[debug_handler]
pub(crate) async fn profile_events(
    Path(profile_id): Path<Uuid>,
    Query(DisplayQuery { timezone }): Query<DisplayQuery>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<impl IntoResponse> {
    let view = projection::events_for_profile(&db_pool, profile_id, timezone.as_deref()).await?;
    Ok(res::ok("Events for profile fetched successfully", view))
}
