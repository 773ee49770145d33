use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{db, AppError, AppResult};

use super::registry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveProfiles {
    pub actor_id: Uuid,
    pub name: String,
    pub active_profiles: BTreeSet<Uuid>,
}

async fn stored(db_pool: &SqlitePool, actor_id: Uuid) -> AppResult<BTreeSet<Uuid>> {
    sqlx::query_as::<_, (String,)>("SELECT profile_id FROM active_profiles WHERE actor_id=?")
        .bind(actor_id.to_string())
        .fetch_all(db_pool)
        .await?
        .iter()
        .map(|(id,)| db::parse_id(id))
        .collect()
}

/// Replaces the actor's active set outright.
pub async fn set_active_profiles(
    db_pool: &SqlitePool,
    actor_id: Uuid,
    profile_ids: &[Uuid],
) -> AppResult<ActiveProfiles> {
    if profile_ids.is_empty() {
        return Err(AppError::validation("activeProfiles must be a non-empty array"));
    }

    let actor = registry::find(db_pool, actor_id)
        .await?
        .ok_or_else(|| AppError::not_found("Actor"))?;

    let active: BTreeSet<Uuid> = profile_ids.iter().copied().collect();
    registry::ensure_all_exist(db_pool, &active).await?;

    let mut tx = db::begin_write(db_pool).await?;
    sqlx::query("DELETE FROM active_profiles WHERE actor_id=?")
        .bind(actor_id.to_string())
        .execute(&mut *tx)
        .await?;
    for profile_id in &active {
        sqlx::query("INSERT INTO active_profiles (actor_id,profile_id) VALUES (?,?)")
            .bind(actor_id.to_string())
            .bind(profile_id.to_string())
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    tracing::info!(actor_id = %actor_id, count = active.len(), "active profiles replaced");
    Ok(ActiveProfiles {
        actor_id,
        name: actor.name,
        active_profiles: active,
    })
}

pub async fn get_active_profiles(db_pool: &SqlitePool, actor_id: Uuid) -> AppResult<ActiveProfiles> {
    let actor = registry::find(db_pool, actor_id)
        .await?
        .ok_or_else(|| AppError::not_found("Actor"))?;

    Ok(ActiveProfiles {
        actor_id,
        name: actor.name,
        active_profiles: stored(db_pool, actor_id).await?,
    })
}
