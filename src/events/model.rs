use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{db, timezones::zone, AppError, AppResult};

/// A scheduled event. Start and end are absolute instants; `timezone` only
/// records the zone the event was authored in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub timezone: String,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub profiles: BTreeSet<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_utc: Option<DateTime<Utc>>,
    pub end_utc: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
    #[serde(default, alias = "profileIds")]
    pub profiles: Vec<Uuid>,
    pub created_by: Option<Uuid>,
}

/// Fields a replace or patch may touch. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventChanges {
    pub title: Option<String>,
    /// `Some(None)` clears the description; JSON `null` deserializes to it.
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub timezone: Option<String>,
    pub start_utc: Option<DateTime<Utc>>,
    pub end_utc: Option<DateTime<Utc>>,
    #[serde(alias = "profileIds")]
    pub profiles: Option<Vec<Uuid>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn check_range(start_utc: DateTime<Utc>, end_utc: DateTime<Utc>) -> AppResult<()> {
    if end_utc <= start_utc {
        return Err(AppError::validation("endUtc must be after startUtc"));
    }
    Ok(())
}

fn clean_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_owned)
}

impl NewEvent {
    pub fn into_event(self, now: DateTime<Utc>) -> AppResult<Event> {
        let title = self.title.as_deref().map(str::trim).unwrap_or_default();
        let (false, Some(start_utc), Some(end_utc)) = (title.is_empty(), self.start_utc, self.end_utc)
        else {
            return Err(AppError::validation("Missing required fields"));
        };

        let start_utc = db::truncate(start_utc);
        let end_utc = db::truncate(end_utc);
        check_range(start_utc, end_utc)?;

        Ok(Event {
            id: Uuid::now_v7(),
            title: title.to_owned(),
            description: clean_description(self.description.as_deref()),
            timezone: zone::zone_or_default(self.timezone.as_deref())?,
            start_utc,
            end_utc,
            profiles: self.profiles.into_iter().collect(),
            created_by: self.created_by,
            created_at: now,
            updated_at: now,
        })
    }
}

impl EventChanges {
    /// Applies the supplied fields to `event`. Start and end are only checked
    /// against each other when both are supplied; a lone boundary is not
    /// compared with the stored one.
    pub fn apply(&self, event: &mut Event, now: DateTime<Utc>) -> AppResult<()> {
        let title = match self.title.as_deref().map(str::trim) {
            Some("") => return Err(AppError::validation("title cannot be empty")),
            other => other.map(str::to_owned),
        };
        let timezone = match self.timezone.as_deref() {
            Some(tz) => Some(zone::parse_zone(tz.trim())?.name().to_owned()),
            None => None,
        };
        let start_utc = self.start_utc.map(db::truncate);
        let end_utc = self.end_utc.map(db::truncate);
        if let (Some(start_utc), Some(end_utc)) = (start_utc, end_utc) {
            check_range(start_utc, end_utc)?;
        }

        if let Some(title) = title {
            event.title = title;
        }
        if let Some(description) = &self.description {
            event.description = clean_description(description.as_deref());
        }
        if let Some(timezone) = timezone {
            event.timezone = timezone;
        }
        if let Some(start_utc) = start_utc {
            event.start_utc = start_utc;
        }
        if let Some(end_utc) = end_utc {
            event.end_utc = end_utc;
        }
        if let Some(profiles) = &self.profiles {
            event.profiles = profiles.iter().copied().collect();
        }
        event.updated_at = now;

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct EventRow {
    id: String,
    title: String,
    description: Option<String>,
    timezone: String,
    start_utc: i64,
    end_utc: i64,
    created_by: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl EventRow {
    pub(super) fn id(&self) -> AppResult<Uuid> {
        db::parse_id(&self.id)
    }

    pub(super) fn into_event(self, profiles: BTreeSet<Uuid>) -> AppResult<Event> {
        Ok(Event {
            id: db::parse_id(&self.id)?,
            title: self.title,
            description: self.description,
            timezone: self.timezone,
            start_utc: db::from_millis(self.start_utc)?,
            end_utc: db::from_millis(self.end_utc)?,
            profiles,
            created_by: self.created_by.as_deref().map(db::parse_id).transpose()?,
            created_at: db::from_millis(self.created_at)?,
            updated_at: db::from_millis(self.updated_at)?,
        })
    }
}
