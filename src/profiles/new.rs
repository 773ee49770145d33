use axum::{debug_handler, extract::State, response::IntoResponse};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{res::{self, Json}, AppResult};

use super::registry;

#[derive(Debug, Deserialize)]
pub(crate) struct NewProfileBody {
    #[serde(default)]
    name: String,
    timezone: Option<String>,
}

#[debug_handler]
pub(crate) async fn new_profile(
    State(db_pool): State<SqlitePool>,
    Json(NewProfileBody { name, timezone }): Json<NewProfileBody>,
) -> AppResult<impl IntoResponse> {
    let profile = registry::create(&db_pool, &name, timezone.as_deref()).await?;
    Ok(res::created("Profile created successfully", profile))
}
