mod convert;
pub mod zone;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub use zone::{is_valid_zone, list_zones, parse_zone, to_utc, to_zone, ZonedInstant, DEFAULT_ZONE};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/timezones", get(convert::supported_timezones))
        .route("/timezone/convert", post(convert::convert))
        .route(
            "/timezone/{profile_id}",
            get(convert::profile_timezone).patch(convert::update_profile_timezone),
        )
}
