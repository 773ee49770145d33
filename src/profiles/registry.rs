use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{db, timezones::zone, AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: String,
    name: String,
    timezone: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> AppResult<Self> {
        Ok(Profile {
            id: db::parse_id(&row.id)?,
            name: row.name,
            timezone: row.timezone,
            created_at: db::from_millis(row.created_at)?,
            updated_at: db::from_millis(row.updated_at)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub timezone: Option<String>,
}

fn clean_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Invalid name provided"));
    }
    Ok(name.to_owned())
}

pub async fn create(db_pool: &SqlitePool, name: &str, timezone: Option<&str>) -> AppResult<Profile> {
    let name = clean_name(name)?;
    let timezone = zone::zone_or_default(timezone)?;
    let now = db::now();

    let profile = Profile {
        id: Uuid::now_v7(),
        name,
        timezone,
        created_at: now,
        updated_at: now,
    };

    sqlx::query("INSERT INTO profiles (id,name,timezone,created_at,updated_at) VALUES (?,?,?,?,?)")
        .bind(profile.id.to_string())
        .bind(&profile.name)
        .bind(&profile.timezone)
        .bind(db::to_millis(profile.created_at))
        .bind(db::to_millis(profile.updated_at))
        .execute(db_pool)
        .await?;

    tracing::info!(profile_id = %profile.id, timezone = %profile.timezone, "profile created");
    Ok(profile)
}

pub async fn find(db_pool: &SqlitePool, id: Uuid) -> AppResult<Option<Profile>> {
    sqlx::query_as::<_, ProfileRow>(
        "SELECT id,name,timezone,created_at,updated_at FROM profiles WHERE id=?",
    )
    .bind(id.to_string())
    .fetch_optional(db_pool)
    .await?
    .map(Profile::try_from)
    .transpose()
}

pub async fn get(db_pool: &SqlitePool, id: Uuid) -> AppResult<Profile> {
    find(db_pool, id).await?.ok_or_else(|| AppError::not_found("Profile"))
}

/// Newest first.
pub async fn list(db_pool: &SqlitePool) -> AppResult<Vec<Profile>> {
    sqlx::query_as::<_, ProfileRow>(
        "SELECT id,name,timezone,created_at,updated_at FROM profiles ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(db_pool)
    .await?
    .into_iter()
    .map(Profile::try_from)
    .collect()
}

pub async fn update(db_pool: &SqlitePool, id: Uuid, changes: &ProfileChanges) -> AppResult<Profile> {
    let mut profile = get(db_pool, id).await?;

    if let Some(name) = &changes.name {
        profile.name = clean_name(name)?;
    }
    if let Some(timezone) = &changes.timezone {
        profile.timezone = zone::parse_zone(timezone.trim())?.name().to_owned();
    }
    profile.updated_at = db::now();

    sqlx::query("UPDATE profiles SET name=?, timezone=?, updated_at=? WHERE id=?")
        .bind(&profile.name)
        .bind(&profile.timezone)
        .bind(db::to_millis(profile.updated_at))
        .bind(profile.id.to_string())
        .execute(db_pool)
        .await?;

    tracing::info!(profile_id = %profile.id, "profile updated");
    Ok(profile)
}

pub async fn set_timezone(db_pool: &SqlitePool, id: Uuid, timezone: &str) -> AppResult<Profile> {
    let changes = ProfileChanges {
        name: None,
        timezone: Some(timezone.to_owned()),
    };
    update(db_pool, id, &changes).await
}

/// What a referencing record shows of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: Uuid,
    pub name: String,
    pub timezone: String,
}

/// Summaries of the `ids` that resolve to a stored profile. Unknown ids are
/// left out.
pub async fn summaries(
    db_pool: &SqlitePool,
    ids: &BTreeSet<Uuid>,
) -> AppResult<BTreeMap<Uuid, ProfileSummary>> {
    if ids.is_empty() {
        return Ok(BTreeMap::new());
    }

    sqlx::query_as::<_, (String, String, String)>(
        "SELECT id,name,timezone FROM profiles WHERE id IN (SELECT value FROM json_each(?))",
    )
    .bind(db::id_list(ids)?)
    .fetch_all(db_pool)
    .await?
    .into_iter()
    .map(|(id, name, timezone)| -> AppResult<(Uuid, ProfileSummary)> {
        let id = db::parse_id(&id)?;
        Ok((id, ProfileSummary { id, name, timezone }))
    })
    .collect()
}

pub async fn existing(db_pool: &SqlitePool, ids: &BTreeSet<Uuid>) -> AppResult<BTreeSet<Uuid>> {
    Ok(summaries(db_pool, ids).await?.into_keys().collect())
}

pub async fn ensure_all_exist(db_pool: &SqlitePool, ids: &BTreeSet<Uuid>) -> AppResult<()> {
    if existing(db_pool, ids).await?.len() != ids.len() {
        return Err(AppError::validation("Some profiles not found"));
    }
    Ok(())
}
