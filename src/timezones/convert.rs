use axum::{debug_handler, extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    profiles::{self, Profile},
    res::{self, Json, Path},
    AppError, AppResult,
};

use super::zone;

#[debug_handler]
pub(crate) async fn supported_timezones() -> impl IntoResponse {
    res::ok("Supported timezones fetched successfully", zone::list_zones())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConvertBody {
    timestamp_utc: Option<String>,
    timezone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Conversion {
    original: String,
    converted: String,
    timezone: String,
    utc_offset: String,
    dst_active: bool,
}

#[debug_handler]
pub(crate) async fn convert(
    Json(ConvertBody { timestamp_utc, timezone }): Json<ConvertBody>,
) -> AppResult<impl IntoResponse> {
    let (Some(original), Some(timezone)) = (timestamp_utc, timezone) else {
        return Err(AppError::validation("timestampUtc and timezone are required"));
    };

    let instant = DateTime::parse_from_rfc3339(original.trim())
        .map_err(|err| AppError::validation(format!("timestampUtc {original:?}: {err}")))?
        .with_timezone(&Utc);
    let zoned = zone::to_zone(instant, &timezone)?;

    Ok(res::ok(
        "Timestamp converted successfully",
        Conversion {
            original,
            converted: zoned.local.to_rfc3339(),
            timezone: zoned.timezone,
            utc_offset: zoned.utc_offset,
            dst_active: zoned.dst_active,
        },
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileTimezone {
    profile_id: Uuid,
    name: String,
    timezone: String,
}

impl From<Profile> for ProfileTimezone {
    fn from(profile: Profile) -> Self {
        Self {
            profile_id: profile.id,
            name: profile.name,
            timezone: profile.timezone,
        }
    }
}

#[debug_handler]
pub(crate) async fn profile_timezone(
    State(db_pool): State<SqlitePool>,
    Path(profile_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let profile = profiles::get(&db_pool, profile_id).await?;
    Ok(res::ok(
        "Profile timezone fetched successfully",
        ProfileTimezone::from(profile),
    ))
}

#[derive(Debug, Deserialize)]
pub(crate) struct TimezoneBody {
    timezone: Option<String>,
}

#[debug_handler]
pub(crate) async fn update_profile_timezone(
    State(db_pool): State<SqlitePool>,
    Path(profile_id): Path<Uuid>,
    Json(TimezoneBody { timezone }): Json<TimezoneBody>,
) -> AppResult<impl IntoResponse> {
    let Some(timezone) = timezone.filter(|tz| !tz.trim().is_empty()) else {
        return Err(AppError::validation("timezone is required"));
    };

    let profile = profiles::set_timezone(&db_pool, profile_id, &timezone).await?;
    Ok(res::ok(
        "Profile timezone updated successfully",
        ProfileTimezone::from(profile),
    ))
}
