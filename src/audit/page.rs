use axum::{debug_handler, extract::State, response::IntoResponse};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{res::{self, Path, Query}, AppResult};

use super::log as engine;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LogQuery {
    user_timezone: Option<String>,
}

#[debug_handler]
pub(crate) async fn logs(
    State(db_pool): State<SqlitePool>,
    Path(event_id): Path<Uuid>,
    Query(LogQuery { user_timezone }): Query<LogQuery>,
) -> AppResult<impl IntoResponse> {
    let logs = engine::list_for_event(&db_pool, event_id, user_timezone.as_deref()).await?;
    Ok(res::ok("Event logs fetched successfully", logs))
}

#[debug_handler]
pub(crate) async fn log(
    State(db_pool): State<SqlitePool>,
    Path((event_id, log_id)): Path<(Uuid, Uuid)>,
    Query(LogQuery { user_timezone }): Query<LogQuery>,
) -> AppResult<impl IntoResponse> {
    let log = engine::get_one(&db_pool, event_id, log_id, user_timezone.as_deref()).await?;
    Ok(res::ok("Log entry fetched successfully", log))
}
