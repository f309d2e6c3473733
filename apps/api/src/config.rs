use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Everything has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres holding the `resumes` and `jobs` tables. Unset → in-memory demo store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// JSON taxonomy file. Unset → built-in vocabulary.
    pub taxonomy_path: Option<PathBuf>,
    pub max_text_bytes: usize,
    pub extraction_cache_capacity: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 5)?,
            taxonomy_path: optional_env("TAXONOMY_PATH").map(PathBuf::from),
            max_text_bytes: parse_env("MAX_TEXT_BYTES", 200_000)?,
            extraction_cache_capacity: parse_env("EXTRACTION_CACHE_CAPACITY", 1024)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} must be a valid number, got '{raw}'"))
}
