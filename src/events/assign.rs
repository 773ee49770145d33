use axum::{debug_handler, extract::State, response::IntoResponse};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{res::{self, Json, Path}, AppResult};

use super::store;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssignBody {
    #[serde(default)]
    profile_ids: Vec<Uuid>,
}

#[debug_handler]
pub(crate) async fn assign(
    State(db_pool): State<SqlitePool>,
    Path(event_id): Path<Uuid>,
    Json(AssignBody { profile_ids }): Json<AssignBody>,
) -> AppResult<impl IntoResponse> {
    let event = store::assign_profiles(&db_pool, event_id, &profile_ids).await?;
    Ok(res::ok("Profiles assigned successfully", event))
}

#[debug_handler]
pub(crate) async fn unassign(
    State(db_pool): State<SqlitePool>,
    Path((event_id, profile_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let event = store::unassign_profile(&db_pool, event_id, profile_id).await?;
    Ok(res::ok("Profile unassigned successfully", event))
}
