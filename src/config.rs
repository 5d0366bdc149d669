use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;

/// Shortest accepted HS256 signing secret, in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime, one year.
pub const MAX_JWT_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_open_connections: u32,
    pub max_idle_connections: u32,
    pub connection_max_lifetime: Duration,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // argon2 crate defaults for Argon2id
        Self {
            memory_kib: 19_456,
            iterations: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub read_timeout: Duration,
    pub auth_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .context("DATABASE_URL is not set")?;

        let secret = lookup("JWT_SECRET")
            .filter(|v| !v.is_empty())
            .context("JWT_SECRET is not set")?;
        if secret.len() < MIN_JWT_SECRET_LEN {
            bail!("JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} bytes");
        }

        let database = DatabaseConfig {
            url,
            max_open_connections: parse_or(&lookup, "DB_MAX_OPEN_CONNS", 25)?,
            max_idle_connections: parse_or(&lookup, "DB_MAX_IDLE_CONNS", 5)?,
            connection_max_lifetime: Duration::from_secs(parse_or(
                &lookup,
                "DB_CONN_MAX_LIFETIME_SECS",
                300,
            )?),
            acquire_timeout: Duration::from_secs(parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECS", 10)?),
        };
        if database.max_idle_connections > database.max_open_connections {
            bail!("DB_MAX_IDLE_CONNS cannot exceed DB_MAX_OPEN_CONNS");
        }

        let jwt = JwtConfig {
            secret,
            ttl_hours: parse_or(&lookup, "JWT_TTL_HOURS", 24)?,
        };
        if !(1..=MAX_JWT_TTL_HOURS).contains(&jwt.ttl_hours) {
            bail!("JWT_TTL_HOURS must be between 1 and {MAX_JWT_TTL_HOURS}");
        }

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: parse_or(&lookup, "PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib)?,
            iterations: parse_or(&lookup, "PASSWORD_HASH_ITERATIONS", defaults.iterations)?,
        };

        let port_key = if lookup("PORT").is_some() { "PORT" } else { "APP_PORT" };
        let server = ServerConfig {
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, port_key, 8080)?,
            read_timeout: positive_secs(&lookup, "READ_TIMEOUT_SECS", 10)?,
            auth_timeout: positive_secs(&lookup, "AUTH_TIMEOUT_SECS", 30)?,
        };

        Ok(Self {
            database,
            jwt,
            password,
            server,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} is invalid ({raw}): {e}")),
        None => Ok(default),
    }
}

fn positive_secs<F>(lookup: &F, key: &str, default: u64) -> anyhow::Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_or(lookup, key, default)?;
    if secs == 0 {
        bail!("{key} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
