//! Read-only views of events with their instants projected into a display
//! zone. Stored values are never touched.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    events::{self, Event},
    profiles::{self, Profile, ProfileSummary},
    timezones::zone,
    AppResult,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedEvent {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// The zone the event was authored in, not the display zone.
    pub timezone: String,
    pub profiles: BTreeSet<Uuid>,
    pub created_by: Option<Uuid>,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub start_local: DateTime<FixedOffset>,
    pub end_local: DateTime<FixedOffset>,
    pub created_at_local: DateTime<FixedOffset>,
    pub updated_at_local: DateTime<FixedOffset>,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileEvents {
    pub profile: Profile,
    pub display_timezone: String,
    pub events: Vec<ProjectedEvent>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEvents {
    pub actor_id: Uuid,
    pub active_profiles: BTreeSet<Uuid>,
    pub display_timezone: String,
    pub events: Vec<ProjectedEvent>,
}

/// An event with the profiles it references resolved to summaries. Ids that
/// don't resolve are left out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub assigned_profiles: Vec<ProfileSummary>,
    pub created_by_profile: Option<ProfileSummary>,
}

fn attach(event: Event, known: &BTreeMap<Uuid, ProfileSummary>) -> EventDetails {
    EventDetails {
        assigned_profiles: event
            .profiles
            .iter()
            .filter_map(|id| known.get(id).cloned())
            .collect(),
        created_by_profile: event.created_by.and_then(|id| known.get(&id).cloned()),
        event,
    }
}

fn referenced(event: &Event) -> impl Iterator<Item = Uuid> + '_ {
    event.profiles.iter().copied().chain(event.created_by)
}

pub async fn event_details(db_pool: &SqlitePool, event: Event) -> AppResult<EventDetails> {
    let known = profiles::summaries(db_pool, &referenced(&event).collect()).await?;
    Ok(attach(event, &known))
}

/// Resolves the profiles of every event in a single lookup.
pub async fn events_details(db_pool: &SqlitePool, events: Vec<Event>) -> AppResult<Vec<EventDetails>> {
    let ids: BTreeSet<Uuid> = events.iter().flat_map(referenced).collect();
    let known = profiles::summaries(db_pool, &ids).await?;
    Ok(events.into_iter().map(|event| attach(event, &known)).collect())
}

pub fn project_event(event: &Event, tz: Tz) -> ProjectedEvent {
    ProjectedEvent {
        id: event.id,
        title: event.title.clone(),
        description: event.description.clone(),
        timezone: event.timezone.clone(),
        profiles: event.profiles.clone(),
        created_by: event.created_by,
        start_utc: event.start_utc,
        end_utc: event.end_utc,
        start_local: zone::project(event.start_utc, tz),
        end_local: zone::project(event.end_utc, tz),
        created_at_local: zone::project(event.created_at, tz),
        updated_at_local: zone::project(event.updated_at, tz),
        duration_minutes: (event.end_utc - event.start_utc).num_minutes(),
    }
}

/// An explicit, non-blank zone wins; otherwise the profile's own.
fn resolve_zone(requested: Option<&str>, profile: &Profile) -> AppResult<Tz> {
    match requested.map(str::trim).filter(|id| !id.is_empty()) {
        Some(id) => zone::parse_zone(id),
        None => zone::parse_zone(&profile.timezone),
    }
}

pub async fn events_for_profile(
    db_pool: &SqlitePool,
    profile_id: Uuid,
    display_zone: Option<&str>,
) -> AppResult<ProfileEvents> {
    let profile = profiles::get(db_pool, profile_id).await?;
    let tz = resolve_zone(display_zone, &profile)?;

    let events = events::list_for_profiles(db_pool, &BTreeSet::from([profile_id]))
        .await?
        .iter()
        .map(|event| project_event(event, tz))
        .collect();

    Ok(ProfileEvents {
        profile,
        display_timezone: tz.name().to_owned(),
        events,
    })
}

/// Events visible to an actor: those assigned to any of its active profiles,
/// shown in the actor's zone unless one is requested.
pub async fn events_for_actor(
    db_pool: &SqlitePool,
    actor_id: Uuid,
    display_zone: Option<&str>,
) -> AppResult<ActiveEvents> {
    let actor = profiles::get(db_pool, actor_id).await?;
    let tz = resolve_zone(display_zone, &actor)?;
    let active = profiles::get_active_profiles(db_pool, actor_id).await?.active_profiles;

    let events = events::list_for_profiles(db_pool, &active)
        .await?
        .iter()
        .map(|event| project_event(event, tz))
        .collect();

    Ok(ActiveEvents {
        actor_id,
        active_profiles: active,
        display_timezone: tz.name().to_owned(),
        events,
    })
}
