use std::{str::FromStr, time::Duration};

use anyhow::Context;
use serde::Deserialize;

/// Which `UserStore` implementation the service runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => Ok(Self::Memory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            other => anyhow::bail!("unknown store backend `{other}` (expected `memory` or `postgres`)"),
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Connection string, preferring an explicit `DATABASE_URL`.
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}?sslmode=disable",
                self.user, self.password, self.host, self.port, self.name
            ),
        }
    }
}

// Keeps the password out of startup logs.
impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub service_name: String,
    pub log_level: String,
    pub json_logs: bool,
    pub store: StoreBackend,
    pub database: DatabaseConfig,
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| var(key).unwrap_or_else(|| default.to_string());

        let port = parse_or(&var, "PORT", 8001)?;
        let store = match var("STORE_BACKEND") {
            Some(raw) => raw.parse().context("invalid STORE_BACKEND")?,
            None => StoreBackend::Postgres,
        };

        let database = DatabaseConfig {
            url: var("DATABASE_URL"),
            host: or("DB_HOST", "postgres"),
            port: parse_or(&var, "DB_PORT", 5432)?,
            user: or("DB_USER", "microservices"),
            password: or("DB_PASSWORD", "microservices123"),
            name: or("DB_NAME", "microservices"),
            max_connections: parse_nonzero(&var, "DB_MAX_CONNECTIONS", 10)?,
        };

        Ok(Self {
            host: or("APP_HOST", "0.0.0.0"),
            port,
            service_name: or("SERVICE_NAME", "user-service"),
            log_level: or("LOG_LEVEL", "info").to_lowercase(),
            json_logs: var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false),
            store,
            database,
            request_timeout: Duration::from_secs(parse_nonzero(&var, "REQUEST_TIMEOUT_SECS", 15)?),
            shutdown_grace: Duration::from_secs(parse_or(&var, "SHUTDOWN_GRACE_SECS", 30)?),
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid {key}: `{raw}`")),
        None => Ok(default),
    }
}

/// A zero pool never hands out a connection and a zero timeout fails every request.
fn parse_nonzero<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr + Default + PartialEq,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    let value = parse_or(var, key, default)?;
    if value == T::default() {
        anyhow::bail!("{key} must be greater than zero");
    }
    Ok(value)
}
