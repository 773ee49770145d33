use anyhow::Context;

/// Process configuration, read from the environment after `.env` is loaded.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub session_idle_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://chronicle.db?mode=rwc".to_owned(),
            bind_addr: "0.0.0.0:8080".to_owned(),
            db_max_connections: 16,
            session_idle_minutes: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS must be a positive integer, got {raw:?}"))?,
            None => defaults.db_max_connections,
        };
        let session_idle_minutes = match lookup("SESSION_IDLE_MINUTES") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("SESSION_IDLE_MINUTES must be an integer, got {raw:?}"))?,
            None => defaults.session_idle_minutes,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            db_max_connections,
            session_idle_minutes,
        })
    }
}
