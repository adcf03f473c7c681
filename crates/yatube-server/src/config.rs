use std::collections::HashSet;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::TimeDelta;
use thiserror::Error;
use yatube_feed::cache::{DEFAULT_TTL_SECS, MAX_TTL_SECS};
use yatube_feed::pagination::DEFAULT_PAGE_SIZE;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YATUBE_JWT_SECRET is unset or still a placeholder; it must match the auth service's secret")]
    MissingSecret,

    #[error("{name}={value:?} is not a valid value")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub page_size: NonZeroU32,
    pub cache_ttl: TimeDelta,
    pub cache_purge_secs: u64,
    pub admins: HashSet<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("YATUBE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::MissingSecret);
        }

        let cache_ttl_secs: i64 = parse_or(&lookup, "YATUBE_CACHE_TTL_SECS", DEFAULT_TTL_SECS)?;
        let cache_ttl = Some(cache_ttl_secs)
            .filter(|secs| (0..=MAX_TTL_SECS).contains(secs))
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| ConfigError::Invalid {
                name: "YATUBE_CACHE_TTL_SECS",
                value: cache_ttl_secs.to_string(),
            })?;

        let cache_purge_secs: u64 = parse_or(&lookup, "YATUBE_CACHE_PURGE_SECS", 60)?;
        if cache_purge_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "YATUBE_CACHE_PURGE_SECS",
                value: "0".into(),
            });
        }

        let admins = lookup("YATUBE_ADMINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            host: lookup("YATUBE_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "YATUBE_PORT", 8000)?,
            db_path: lookup("YATUBE_DB_PATH").unwrap_or_else(|| "yatube.db".into()).into(),
            jwt_secret,
            // NonZeroU32 refuses "0" on its own.
            page_size: parse_or(&lookup, "YATUBE_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            cache_ttl,
            cache_purge_secs,
            admins,
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(ConfigError::Invalid { name, value }),
        },
    }
}
