use axum::{debug_handler, extract::State, response::IntoResponse};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{res::{self, Json, Path}, AppResult};

use super::registry::{self, ProfileChanges};

#[debug_handler]
pub(crate) async fn profiles(State(db_pool): State<SqlitePool>) -> AppResult<impl IntoResponse> {
    let profiles = registry::list(&db_pool).await?;
    Ok(res::ok("Profiles fetched successfully", profiles))
}

#[debug_handler]
pub(crate) async fn profile(
    Path(profile_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<impl IntoResponse> {
    let profile = registry::get(&db_pool, profile_id).await?;
    Ok(res::ok("Profile fetched successfully", profile))
}

#[debug_handler]
pub(crate) async fn update_profile(
    Path(profile_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    Json(changes): Json<ProfileChanges>,
) -> AppResult<impl IntoResponse> {
    let profile = registry::update(&db_pool, profile_id, &changes).await?;
    Ok(res::ok("Profile updated successfully", profile))
}
