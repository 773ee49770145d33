use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz, TZ_VARIANTS};
use serde::Serialize;

use crate::{AppError, AppResult};

pub const DEFAULT_ZONE: &str = "UTC";

/// Every zone identifier the service accepts, sorted.
pub fn list_zones() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = TZ_VARIANTS.iter().map(|tz| tz.name()).collect();
    names.sort_unstable();
    names
}

pub fn is_valid_zone(id: &str) -> bool {
    parse_zone(id).is_ok()
}

pub fn parse_zone(id: &str) -> AppResult<Tz> {
    id.parse::<Tz>()
        .map_err(|_| AppError::InvalidTimezone(id.to_owned()))
}

/// Validates an optional zone, falling back to UTC when it's absent or blank.
pub fn zone_or_default(id: Option<&str>) -> AppResult<String> {
    match id.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => parse_zone(id).map(|tz| tz.name().to_owned()),
        None => Ok(DEFAULT_ZONE.to_owned()),
    }
}

/// An instant seen from one zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZonedInstant {
    pub utc: DateTime<Utc>,
    pub local: DateTime<FixedOffset>,
    pub timezone: String,
    pub utc_offset: String,
    pub dst_active: bool,
}

pub fn to_zone(instant: DateTime<Utc>, zone_id: &str) -> AppResult<ZonedInstant> {
    let tz = parse_zone(zone_id)?;
    let zoned = instant.with_timezone(&tz);

    Ok(ZonedInstant {
        utc: instant,
        local: zoned.fixed_offset(),
        timezone: tz.name().to_owned(),
        utc_offset: zoned.format("%:z").to_string(),
        dst_active: !zoned.offset().dst_offset().is_zero(),
    })
}

pub fn project(instant: DateTime<Utc>, tz: Tz) -> DateTime<FixedOffset> {
    instant.with_timezone(&tz).fixed_offset()
}

/// Resolves a wall-clock time in `zone_id` to the instant it names.
///
/// During a fall-back overlap the earlier of the two instants wins. A local
/// time skipped by a spring-forward gap doesn't exist and is rejected.
pub fn to_utc(local: NaiveDateTime, zone_id: &str) -> AppResult<DateTime<Utc>> {
    let tz = parse_zone(zone_id)?;

    match tz.from_local_datetime(&local) {
        LocalResult::Single(zoned) => Ok(zoned.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(AppError::validation(format!(
            "{local} does not exist in {zone_id}"
        ))),
    }
}
