use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{
    audit::{self, EventLog},
    db, profiles, AppError, AppResult,
};

use super::model::{Event, EventChanges, EventRow, NewEvent};

const SELECT_EVENTS: &str =
    "SELECT id,title,description,timezone,start_utc,end_utc,created_by,created_at,updated_at FROM events";

// One row per assignment, or a single row with a null profile_id.
const SELECT_ASSIGNED: &str = "SELECT e.id,e.title,e.description,e.timezone,e.start_utc,e.end_utc,e.created_by,e.created_at,e.updated_at,ep.profile_id \
     FROM events e LEFT JOIN event_profiles ep ON ep.event_id=e.id";

async fn assigned(conn: &mut SqliteConnection, event_id: Uuid) -> AppResult<BTreeSet<Uuid>> {
    sqlx::query_as::<_, (String,)>("SELECT profile_id FROM event_profiles WHERE event_id=?")
        .bind(event_id.to_string())
        .fetch_all(&mut *conn)
        .await?
        .iter()
        .map(|(id,)| db::parse_id(id))
        .collect()
}

async fn fetch(conn: &mut SqliteConnection, id: Uuid) -> AppResult<Option<Event>> {
    let Some(row) = sqlx::query_as::<_, EventRow>(&format!("{SELECT_EVENTS} WHERE id=?"))
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let profiles = assigned(conn, id).await?;
    row.into_event(profiles).map(Some)
}

async fn load(conn: &mut SqliteConnection, id: Uuid) -> AppResult<Event> {
    fetch(conn, id).await?.ok_or_else(|| AppError::not_found("Event"))
}

async fn write_assignments(conn: &mut SqliteConnection, event: &Event) -> AppResult<()> {
    sqlx::query("DELETE FROM event_profiles WHERE event_id=?")
        .bind(event.id.to_string())
        .execute(&mut *conn)
        .await?;
    for profile_id in &event.profiles {
        sqlx::query("INSERT INTO event_profiles (event_id,profile_id) VALUES (?,?)")
            .bind(event.id.to_string())
            .bind(profile_id.to_string())
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn write(conn: &mut SqliteConnection, event: &Event) -> AppResult<()> {
    sqlx::query(
        "UPDATE events SET title=?, description=?, timezone=?, start_utc=?, end_utc=?, created_by=?, updated_at=? WHERE id=?",
    )
    .bind(&event.title)
    .bind(&event.description)
    .bind(&event.timezone)
    .bind(db::to_millis(event.start_utc))
    .bind(db::to_millis(event.end_utc))
    .bind(event.created_by.map(|id| id.to_string()))
    .bind(db::to_millis(event.updated_at))
    .bind(event.id.to_string())
    .execute(&mut *conn)
    .await?;

    write_assignments(conn, event).await
}

async fn touch(conn: &mut SqliteConnection, id: Uuid) -> AppResult<()> {
    sqlx::query("UPDATE events SET updated_at=? WHERE id=?")
        .bind(db::to_millis(db::now()))
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct AssignedRow {
    #[sqlx(flatten)]
    event: EventRow,
    profile_id: Option<String>,
}

/// Folds joined rows back into events. Rows of one event must be adjacent.
fn group(rows: Vec<AssignedRow>) -> AppResult<Vec<Event>> {
    let mut grouped: Vec<(Uuid, EventRow, BTreeSet<Uuid>)> = Vec::new();
    for AssignedRow { event, profile_id } in rows {
        let id = event.id()?;
        if grouped.last().is_none_or(|(last, ..)| *last != id) {
            grouped.push((id, event, BTreeSet::new()));
        }
        if let (Some(profile_id), Some((.., profiles))) = (profile_id, grouped.last_mut()) {
            profiles.insert(db::parse_id(&profile_id)?);
        }
    }

    grouped
        .into_iter()
        .map(|(_, row, profiles)| row.into_event(profiles))
        .collect()
}

/// Profile ids are stored as given; they don't have to exist yet.
pub async fn create(db_pool: &SqlitePool, new: NewEvent) -> AppResult<Event> {
    let event = new.into_event(db::now())?;

    let mut tx = db::begin_write(db_pool).await?;
    sqlx::query(
        "INSERT INTO events (id,title,description,timezone,start_utc,end_utc,created_by,created_at,updated_at) VALUES (?,?,?,?,?,?,?,?,?)",
    )
    .bind(event.id.to_string())
    .bind(&event.title)
    .bind(&event.description)
    .bind(&event.timezone)
    .bind(db::to_millis(event.start_utc))
    .bind(db::to_millis(event.end_utc))
    .bind(event.created_by.map(|id| id.to_string()))
    .bind(db::to_millis(event.created_at))
    .bind(db::to_millis(event.updated_at))
    .execute(&mut *tx)
    .await?;
    write_assignments(&mut tx, &event).await?;
    tx.commit().await?;

    tracing::info!(event_id = %event.id, timezone = %event.timezone, "event created");
    Ok(event)
}

pub async fn get(db_pool: &SqlitePool, id: Uuid) -> AppResult<Event> {
    let mut conn = db_pool.acquire().await?;
    load(&mut conn, id).await
}

/// All events, earliest start first.
pub async fn list(db_pool: &SqlitePool) -> AppResult<Vec<Event>> {
    let rows = sqlx::query_as::<_, AssignedRow>(&format!(
        "{SELECT_ASSIGNED} ORDER BY e.start_utc ASC, e.id ASC"
    ))
    .fetch_all(db_pool)
    .await?;
    group(rows)
}

/// Events assigned to any of `profile_ids`, earliest start first.
pub async fn list_for_profiles(db_pool: &SqlitePool, profile_ids: &BTreeSet<Uuid>) -> AppResult<Vec<Event>> {
    if profile_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, AssignedRow>(&format!(
        "{SELECT_ASSIGNED} WHERE e.id IN (SELECT event_id FROM event_profiles WHERE profile_id IN (SELECT value FROM json_each(?))) \
         ORDER BY e.start_utc ASC, e.id ASC"
    ))
    .bind(db::id_list(profile_ids)?)
    .fetch_all(db_pool)
    .await?;
    group(rows)
}

#[derive(Debug, Clone, Serialize)]
pub struct Replaced {
    pub event: Event,
    pub log: EventLog,
}

/// Full update. The new state and its audit record commit together, event
/// first.
pub async fn replace(
    db_pool: &SqlitePool,
    id: Uuid,
    changes: &EventChanges,
    updated_by: Option<Uuid>,
) -> AppResult<Replaced> {
    if let Some(editor) = updated_by {
        if profiles::find(db_pool, editor).await?.is_none() {
            return Err(AppError::validation("updatedBy must be an existing profile"));
        }
    }

    let mut tx = db::begin_write(db_pool).await?;

    let before = load(&mut tx, id).await?;
    let mut after = before.clone();
    changes.apply(&mut after, db::now())?;

    write(&mut tx, &after).await?;
    let log = audit::record(&mut tx, id, updated_by, &before, &after).await?;
    tx.commit().await?;

    tracing::info!(event_id = %id, log_id = %log.id, "event replaced");
    Ok(Replaced { event: after, log })
}

/// Partial update. Unlike [`replace`] this writes no audit record.
pub async fn patch(db_pool: &SqlitePool, id: Uuid, changes: &EventChanges) -> AppResult<Event> {
    let mut tx = db::begin_write(db_pool).await?;

    let mut event = load(&mut tx, id).await?;
    changes.apply(&mut event, db::now())?;
    write(&mut tx, &event).await?;
    tx.commit().await?;

    tracing::info!(event_id = %id, "event patched");
    Ok(event)
}

/// Removes the event and its assignments. Its audit records stay.
pub async fn delete(db_pool: &SqlitePool, id: Uuid) -> AppResult<Event> {
    let mut tx = db::begin_write(db_pool).await?;

    let event = load(&mut tx, id).await?;
    sqlx::query("DELETE FROM events WHERE id=?")
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(event_id = %id, "event deleted");
    Ok(event)
}

/// Adds `profile_ids` to the assigned set. Ids already assigned are left as
/// they are, so repeating a call changes nothing.
pub async fn assign_profiles(db_pool: &SqlitePool, id: Uuid, profile_ids: &[Uuid]) -> AppResult<Event> {
    if profile_ids.is_empty() {
        return Err(AppError::validation("profileIds must be a non-empty array"));
    }
    get(db_pool, id).await?;

    let profile_ids: BTreeSet<Uuid> = profile_ids.iter().copied().collect();
    profiles::ensure_all_exist(db_pool, &profile_ids).await?;

    let mut tx = db::begin_write(db_pool).await?;
    load(&mut tx, id).await?;
    for profile_id in &profile_ids {
        sqlx::query("INSERT OR IGNORE INTO event_profiles (event_id,profile_id) VALUES (?,?)")
            .bind(id.to_string())
            .bind(profile_id.to_string())
            .execute(&mut *tx)
            .await?;
    }
    touch(&mut tx, id).await?;
    let event = load(&mut tx, id).await?;
    tx.commit().await?;

    tracing::info!(event_id = %id, assigned = event.profiles.len(), "profiles assigned");
    Ok(event)
}

/// Removing a profile that isn't assigned is not an error.
pub async fn unassign_profile(db_pool: &SqlitePool, id: Uuid, profile_id: Uuid) -> AppResult<Event> {
    let mut tx = db::begin_write(db_pool).await?;

    load(&mut tx, id).await?;
    let removed = sqlx::query("DELETE FROM event_profiles WHERE event_id=? AND profile_id=?")
        .bind(id.to_string())
        .bind(profile_id.to_string())
        .execute(&mut *tx)
        .await?
        .rows_affected();
    touch(&mut tx, id).await?;
    let event = load(&mut tx, id).await?;
    tx.commit().await?;

    tracing::info!(event_id = %id, profile_id = %profile_id, removed, "profile unassigned");
    Ok(event)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};
    use proptest::prelude::*;

    use serde_json::Value;

    use super::*;
    use crate::Config;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn draft(title: &str) -> NewEvent {
        NewEvent {
            title: Some(title.into()),
            start_utc: Some(utc("2025-10-18T10:00:00Z")),
            end_utc: Some(utc("2025-10-18T12:00:00Z")),
            timezone: Some("Asia/Kolkata".into()),
            ..NewEvent::default()
        }
    }

    async fn log_count(db_pool: &SqlitePool) -> i64 {
        sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM event_logs")
            .fetch_one(db_pool)
            .await
            .unwrap()
            .0
    }

    #[tokio::test]
    async fn create_stores_instants_exactly() {
        let db_pool = db::in_memory().await.unwrap();
        let start = utc("2025-10-18T10:00:00.250Z");
        let end = utc("2025-10-18T12:00:00.999Z");

        let event = create(
            &db_pool,
            NewEvent { start_utc: Some(start), end_utc: Some(end), ..draft("Launch") },
        )
        .await
        .unwrap();

        let stored = get(&db_pool, event.id).await.unwrap();
        assert_eq!(stored.start_utc, start);
        assert_eq!(stored.end_utc, end);
        assert_eq!(stored.timezone, "Asia/Kolkata");
        assert_eq!(stored, event);
        assert_eq!(log_count(&db_pool).await, 0);
    }

    #[tokio::test]
    async fn create_accepts_unknown_profile_ids() {
        let db_pool = db::in_memory().await.unwrap();
        let ghost = Uuid::now_v7();

        let event = create(&db_pool, NewEvent { profiles: vec![ghost], ..draft("Ghosts") })
            .await
            .unwrap();
        assert_eq!(get(&db_pool, event.id).await.unwrap().profiles, BTreeSet::from([ghost]));
    }

    #[tokio::test]
    async fn list_orders_by_start() {
        let db_pool = db::in_memory().await.unwrap();
        let late = create(
            &db_pool,
            NewEvent {
                start_utc: Some(utc("2025-10-19T10:00:00Z")),
                end_utc: Some(utc("2025-10-19T11:00:00Z")),
                ..draft("Late")
            },
        )
        .await
        .unwrap();
        let early = create(&db_pool, draft("Early")).await.unwrap();

        let ids: Vec<Uuid> = list(&db_pool).await.unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);
    }

    #[tokio::test]
    async fn missing_event_is_not_found() {
        let db_pool = db::in_memory().await.unwrap();
        let id = Uuid::now_v7();

        assert!(matches!(get(&db_pool, id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            replace(&db_pool, id, &EventChanges::default(), None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(patch(&db_pool, id, &EventChanges::default()).await, Err(AppError::NotFound(_))));
        assert!(matches!(delete(&db_pool, id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            unassign_profile(&db_pool, id, Uuid::now_v7()).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(log_count(&db_pool).await, 0);
    }

    #[tokio::test]
    async fn replace_records_before_and_after() {
        let db_pool = db::in_memory().await.unwrap();
        let editor = profiles::create(&db_pool, "p1", None).await.unwrap();
        let event = create(&db_pool, draft("Old")).await.unwrap();

        let changes = EventChanges { title: Some("New".into()), ..EventChanges::default() };
        let Replaced { event: after, log } = replace(&db_pool, event.id, &changes, Some(editor.id))
            .await
            .unwrap();

        assert_eq!(after.title, "New");
        assert_eq!(log.event_id, event.id);
        assert_eq!(log.updated_by, Some(editor.id));
        assert_eq!(log.before["title"], "Old");
        assert_eq!(log.after["title"], "New");
        assert_eq!(serde_json::from_value::<Event>(log.before.clone()).unwrap(), event);
        assert_eq!(serde_json::from_value::<Event>(log.after.clone()).unwrap(), after);
        assert_eq!(get(&db_pool, event.id).await.unwrap(), after);
        assert_eq!(log_count(&db_pool).await, 1);

        let views = audit::list_for_event(&db_pool, event.id, None).await.unwrap();
        assert_eq!(views[0].updated_by_profile.as_ref().map(|p| p.name.as_str()), Some("p1"));
    }

    #[tokio::test]
    async fn replace_rejects_unknown_editor() {
        let db_pool = db::in_memory().await.unwrap();
        let event = create(&db_pool, draft("Old")).await.unwrap();

        let changes = EventChanges { title: Some("New".into()), ..EventChanges::default() };
        let err = replace(&db_pool, event.id, &changes, Some(Uuid::now_v7())).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(get(&db_pool, event.id).await.unwrap(), event);
        assert_eq!(log_count(&db_pool).await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_replaces_on_a_shared_file_all_commit() {
        let path = std::env::temp_dir().join(format!("chronicle-{}.db", Uuid::now_v7()));
        let config = Config {
            database_url: format!("sqlite://{}?mode=rwc", path.display()),
            db_max_connections: 8,
            ..Config::default()
        };
        let db_pool = db::connect(&config).await.unwrap();
        let event = create(&db_pool, draft("Busy")).await.unwrap();

        let writers: Vec<_> = (0..16)
            .map(|n| {
                let db_pool = db_pool.clone();
                tokio::spawn(async move {
                    let changes = EventChanges { title: Some(format!("take {n}")), ..EventChanges::default() };
                    replace(&db_pool, event.id, &changes, None).await
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let logs = audit::list_for_event(&db_pool, event.id, None).await.unwrap();
        assert_eq!(logs.len(), 16);
        let befores: Vec<&Value> = logs.iter().map(|l| &l.log.before["title"]).collect();
        let afters: BTreeSet<String> = logs.iter().map(|l| l.log.after["title"].to_string()).collect();
        assert_eq!(afters.len(), 16);
        // each write saw the previous one, so exactly one started from the original
        assert_eq!(befores.iter().filter(|title| **title == "Busy").count(), 1);
        let stored = get(&db_pool, event.id).await.unwrap();
        assert!(afters.contains(&Value::from(stored.title).to_string()));

        db_pool.close().await;
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn lists_more_events_than_sqlite_can_bind() {
        let db_pool = db::in_memory().await.unwrap();
        let owner = Uuid::now_v7();
        sqlx::query(
            "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 33000) \
             INSERT INTO events (id,title,description,timezone,start_utc,end_utc,created_by,created_at,updated_at) \
             SELECT printf('00000000-0000-7000-8000-%012d', i), 'bulk', NULL, 'UTC', i * 60000, i * 60000 + 30000, NULL, 0, 0 FROM n",
        )
        .execute(&db_pool)
        .await
        .unwrap();
        sqlx::query("INSERT INTO event_profiles (event_id,profile_id) SELECT id, ? FROM events")
            .bind(owner.to_string())
            .execute(&db_pool)
            .await
            .unwrap();

        let all = list(&db_pool).await.unwrap();
        assert_eq!(all.len(), 33_000);
        assert!(all.windows(2).all(|w| w[0].start_utc < w[1].start_utc));
        assert!(all.iter().all(|e| e.profiles == BTreeSet::from([owner])));

        let owned = list_for_profiles(&db_pool, &BTreeSet::from([owner])).await.unwrap();
        assert_eq!(owned.len(), 33_000);
    }

    #[tokio::test]
    async fn later_changes_never_rewrite_a_stored_log() {
        let db_pool = db::in_memory().await.unwrap();
        let event = create(&db_pool, draft("v1")).await.unwrap();

        let first = replace(
            &db_pool,
            event.id,
            &EventChanges { title: Some("v2".into()), ..EventChanges::default() },
            None,
        )
        .await
        .unwrap();
        patch(&db_pool, event.id, &EventChanges { title: Some("v3".into()), ..EventChanges::default() })
            .await
            .unwrap();
        replace(
            &db_pool,
            event.id,
            &EventChanges { title: Some("v4".into()), ..EventChanges::default() },
            None,
        )
        .await
        .unwrap();

        let logs = audit::list_for_event(&db_pool, event.id, None).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].log.before["title"], "v3");
        assert_eq!(logs[0].log.after["title"], "v4");
        assert_eq!(logs[1].log, first.log);
        assert_eq!(logs[1].log.updated_by, None);
    }

    #[tokio::test]
    async fn failed_replace_writes_nothing() {
        let db_pool = db::in_memory().await.unwrap();
        let event = create(&db_pool, draft("Keep")).await.unwrap();

        let changes = EventChanges {
            start_utc: Some(utc("2025-10-18T12:00:00Z")),
            end_utc: Some(utc("2025-10-18T11:00:00Z")),
            ..EventChanges::default()
        };
        let err = replace(&db_pool, event.id, &changes, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(get(&db_pool, event.id).await.unwrap(), event);
        assert_eq!(log_count(&db_pool).await, 0);
    }

    #[tokio::test]
    async fn patch_writes_no_log() {
        let db_pool = db::in_memory().await.unwrap();
        let event = create(&db_pool, draft("Draft")).await.unwrap();

        let patched = patch(
            &db_pool,
            event.id,
            &EventChanges { description: Some(Some("agenda".into())), ..EventChanges::default() },
        )
        .await
        .unwrap();

        assert_eq!(patched.description.as_deref(), Some("agenda"));
        assert_eq!(patched.title, "Draft");
        assert_eq!(get(&db_pool, event.id).await.unwrap(), patched);
        assert_eq!(log_count(&db_pool).await, 0);
    }

    #[tokio::test]
    async fn delete_keeps_history() {
        let db_pool = db::in_memory().await.unwrap();
        let event = create(&db_pool, draft("Doomed")).await.unwrap();
        replace(
            &db_pool,
            event.id,
            &EventChanges { title: Some("Still doomed".into()), ..EventChanges::default() },
            None,
        )
        .await
        .unwrap();

        let deleted = delete(&db_pool, event.id).await.unwrap();
        assert_eq!(deleted.title, "Still doomed");
        assert!(matches!(get(&db_pool, event.id).await, Err(AppError::NotFound(_))));
        assert_eq!(log_count(&db_pool).await, 1);
        assert_eq!(audit::list_for_event(&db_pool, event.id, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn assign_merges_as_a_set() {
        let db_pool = db::in_memory().await.unwrap();
        let a = profiles::create(&db_pool, "a", None).await.unwrap();
        let b = profiles::create(&db_pool, "b", None).await.unwrap();
        let event = create(&db_pool, draft("Sync")).await.unwrap();

        let once = assign_profiles(&db_pool, event.id, &[a.id, a.id, b.id]).await.unwrap();
        assert_eq!(once.profiles, BTreeSet::from([a.id, b.id]));

        let twice = assign_profiles(&db_pool, event.id, &[a.id]).await.unwrap();
        assert_eq!(twice.profiles, once.profiles);
        assert!(twice.updated_at >= event.updated_at);
        assert_eq!(log_count(&db_pool).await, 0);
    }

    #[tokio::test]
    async fn assign_validates_input() {
        let db_pool = db::in_memory().await.unwrap();
        let a = profiles::create(&db_pool, "a", None).await.unwrap();
        let event = create(&db_pool, draft("Sync")).await.unwrap();

        let err = assign_profiles(&db_pool, event.id, &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = assign_profiles(&db_pool, Uuid::now_v7(), &[a.id]).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = assign_profiles(&db_pool, event.id, &[a.id, Uuid::now_v7()])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Some profiles not found");
        assert!(get(&db_pool, event.id).await.unwrap().profiles.is_empty());
    }

    #[tokio::test]
    async fn unassign_is_silent_for_non_members() {
        let db_pool = db::in_memory().await.unwrap();
        let a = profiles::create(&db_pool, "a", None).await.unwrap();
        let b = profiles::create(&db_pool, "b", None).await.unwrap();
        let event = create(&db_pool, draft("Sync")).await.unwrap();
        assign_profiles(&db_pool, event.id, &[a.id]).await.unwrap();

        let unchanged = unassign_profile(&db_pool, event.id, b.id).await.unwrap();
        assert_eq!(unchanged.profiles, BTreeSet::from([a.id]));

        let emptied = unassign_profile(&db_pool, event.id, a.id).await.unwrap();
        assert!(emptied.profiles.is_empty());
        assert_eq!(log_count(&db_pool).await, 0);
    }

    #[tokio::test]
    async fn lists_events_of_given_profiles() {
        let db_pool = db::in_memory().await.unwrap();
        let (a, b, c) = (Uuid::now_v7(), Uuid::now_v7(), Uuid::now_v7());
        let first = create(&db_pool, NewEvent { profiles: vec![a, b], ..draft("one") }).await.unwrap();
        let second = create(&db_pool, NewEvent { profiles: vec![b], ..draft("two") }).await.unwrap();
        create(&db_pool, NewEvent { profiles: vec![c], ..draft("three") }).await.unwrap();

        let for_a = list_for_profiles(&db_pool, &BTreeSet::from([a])).await.unwrap();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].profiles, BTreeSet::from([a, b]));

        let ids: BTreeSet<Uuid> = list_for_profiles(&db_pool, &BTreeSet::from([a, b]))
            .await
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, BTreeSet::from([first.id, second.id]));
        assert!(list_for_profiles(&db_pool, &BTreeSet::new()).await.unwrap().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn create_validates_ordering(start_ms in 0i64..4_000_000_000_000i64, delta_ms in -100_000i64..100_000i64) {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let start = DateTime::from_timestamp_millis(start_ms).unwrap();
            let end = start + Duration::milliseconds(delta_ms);

            let result = runtime.block_on(async {
                let db_pool = db::in_memory().await.unwrap();
                let created = create(
                    &db_pool,
                    NewEvent { start_utc: Some(start), end_utc: Some(end), ..draft("prop") },
                )
                .await;
                match created {
                    Ok(event) => Ok(get(&db_pool, event.id).await.unwrap()),
                    Err(err) => Err(err),
                }
            });

            if delta_ms > 0 {
                let stored = result.unwrap();
                prop_assert_eq!(stored.start_utc, start);
                prop_assert_eq!(stored.end_utc, end);
            } else {
                prop_assert!(matches!(result, Err(AppError::Validation(_))));
            }
        }
    }
}
