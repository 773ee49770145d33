use std::{collections::BTreeSet, str::FromStr, time::Duration};

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Sqlite, SqlitePool, Transaction,
};
use uuid::Uuid;

use crate::{AppResult, Config};

pub async fn connect(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .with_context(|| format!("bad DATABASE_URL {:?}", config.database_url))?
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let db_pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect_with(options)
        .await
        .context("connecting to the database")?;

    migrate(&db_pool).await?;
    Ok(db_pool)
}

/// A private in-memory database. One connection, because every SQLite
/// `:memory:` connection is its own database.
pub async fn in_memory() -> anyhow::Result<SqlitePool> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true))
        .await?;

    migrate(&db_pool).await?;
    Ok(db_pool)
}

pub async fn migrate(db_pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db_pool)
        .await
        .context("running migrations")
}

/// Opens a transaction holding SQLite's write lock from the start. Writers
/// queue on the busy timeout rather than colliding on a lock upgrade.
pub async fn begin_write(db_pool: &SqlitePool) -> AppResult<Transaction<'static, Sqlite>> {
    Ok(db_pool.begin_with("BEGIN IMMEDIATE").await?)
}

// Instants are stored as epoch milliseconds.

pub fn to_millis(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

pub fn from_millis(millis: i64) -> AppResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .with_context(|| format!("stored instant {millis} out of range"))
        .map_err(Into::into)
}

/// Drops anything finer than a millisecond, which storage can't keep.
pub fn truncate(instant: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(instant.timestamp_millis()).unwrap_or(instant)
}

pub fn now() -> DateTime<Utc> {
    truncate(Utc::now())
}

/// A JSON array of ids, bound as a single parameter and read back with
/// `json_each(?)`.
pub fn id_list(ids: &BTreeSet<Uuid>) -> AppResult<String> {
    Ok(serde_json::to_string(ids)?)
}

pub fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw)
        .with_context(|| format!("stored id {raw:?} is not a uuid"))
        .map_err(Into::into)
}
