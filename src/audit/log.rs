//! Immutable before/after records of event replacements.
//!
//! Rows are only ever inserted. Nothing in the crate updates or deletes them,
//! including deleting the event they describe.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{
    db,
    events::Event,
    profiles::{self, ProfileSummary},
    timezones::zone,
    AppError, AppResult,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLog {
    pub id: Uuid,
    pub event_id: Uuid,
    pub updated_by: Option<Uuid>,
    pub before: Value,
    pub after: Value,
    pub timestamp_utc: DateTime<Utc>,
}

/// A log entry with its editor resolved, optionally with its commit instant
/// seen from a display zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogView {
    #[serde(flatten)]
    pub log: EventLog,
    pub updated_by_profile: Option<ProfileSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_local: Option<DateTime<FixedOffset>>,
}

#[derive(sqlx::FromRow)]
struct EventLogRow {
    id: String,
    event_id: String,
    updated_by: Option<String>,
    before_snapshot: String,
    after_snapshot: String,
    timestamp_utc: i64,
}

impl TryFrom<EventLogRow> for EventLog {
    type Error = AppError;

    fn try_from(row: EventLogRow) -> AppResult<Self> {
        Ok(EventLog {
            id: db::parse_id(&row.id)?,
            event_id: db::parse_id(&row.event_id)?,
            updated_by: row.updated_by.as_deref().map(db::parse_id).transpose()?,
            before: serde_json::from_str(&row.before_snapshot)?,
            after: serde_json::from_str(&row.after_snapshot)?,
            timestamp_utc: db::from_millis(row.timestamp_utc)?,
        })
    }
}

/// Persists one log entry. Both snapshots are serialized here, so the stored
/// record shares nothing with the live event.
///
/// Runs on the caller's connection so it can join the transaction that wrote
/// the event.
pub async fn record(
    conn: &mut SqliteConnection,
    event_id: Uuid,
    updated_by: Option<Uuid>,
    before: &Event,
    after: &Event,
) -> AppResult<EventLog> {
    let log = EventLog {
        id: Uuid::now_v7(),
        event_id,
        updated_by,
        before: serde_json::to_value(before)?,
        after: serde_json::to_value(after)?,
        timestamp_utc: db::now(),
    };

    sqlx::query(
        "INSERT INTO event_logs (id,event_id,updated_by,before_snapshot,after_snapshot,timestamp_utc) VALUES (?,?,?,?,?,?)",
    )
    .bind(log.id.to_string())
    .bind(log.event_id.to_string())
    .bind(log.updated_by.map(|id| id.to_string()))
    .bind(log.before.to_string())
    .bind(log.after.to_string())
    .bind(db::to_millis(log.timestamp_utc))
    .execute(&mut *conn)
    .await?;

    tracing::debug!(event_id = %event_id, log_id = %log.id, "audit record written");
    Ok(log)
}

fn display_zone(zone_id: Option<&str>) -> AppResult<Option<chrono_tz::Tz>> {
    zone_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(zone::parse_zone)
        .transpose()
}

async fn editors(db_pool: &SqlitePool, logs: &[EventLog]) -> AppResult<BTreeMap<Uuid, ProfileSummary>> {
    let ids: BTreeSet<Uuid> = logs.iter().filter_map(|log| log.updated_by).collect();
    profiles::summaries(db_pool, &ids).await
}

fn view(log: EventLog, tz: Option<chrono_tz::Tz>, editors: &BTreeMap<Uuid, ProfileSummary>) -> LogView {
    LogView {
        updated_by_profile: log.updated_by.and_then(|id| editors.get(&id).cloned()),
        timestamp_local: tz.map(|tz| zone::project(log.timestamp_utc, tz)),
        log,
    }
}

/// Newest first. An event that no longer exists still lists its history.
pub async fn list_for_event(
    db_pool: &SqlitePool,
    event_id: Uuid,
    zone_id: Option<&str>,
) -> AppResult<Vec<LogView>> {
    let tz = display_zone(zone_id)?;

    let logs = sqlx::query_as::<_, EventLogRow>(
        "SELECT id,event_id,updated_by,before_snapshot,after_snapshot,timestamp_utc FROM event_logs WHERE event_id=? ORDER BY timestamp_utc DESC, id DESC",
    )
    .bind(event_id.to_string())
    .fetch_all(db_pool)
    .await?
    .into_iter()
    .map(EventLog::try_from)
    .collect::<AppResult<Vec<_>>>()?;

    let editors = editors(db_pool, &logs).await?;
    Ok(logs.into_iter().map(|log| view(log, tz, &editors)).collect())
}

pub async fn get_one(
    db_pool: &SqlitePool,
    event_id: Uuid,
    log_id: Uuid,
    zone_id: Option<&str>,
) -> AppResult<LogView> {
    let tz = display_zone(zone_id)?;

    let row = sqlx::query_as::<_, EventLogRow>(
        "SELECT id,event_id,updated_by,before_snapshot,after_snapshot,timestamp_utc FROM event_logs WHERE id=? AND event_id=?",
    )
    .bind(log_id.to_string())
    .bind(event_id.to_string())
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Log entry"))?;

    let log = EventLog::try_from(row)?;
    let editors = editors(db_pool, std::slice::from_ref(&log)).await?;
    Ok(view(log, tz, &editors))
}
