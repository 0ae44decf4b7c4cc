use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, Context};
use tracing::info;
use url::Url;

use crate::domain::order::{BulkOrderSettings, CommitMode};
use crate::utils::CircuitBreakerConfig;

const DEFAULT_MAX_UPLOAD_BYTES: &str = "5242880";

pub struct Config {
    pub http_host: String,
    pub http_port: u16,
    pub metrics_port: u16,
    pub database_url: Option<String>,
    pub seed_path: Option<PathBuf>,
    pub tracking_base_url: Url,
    pub tracking_ttl_days: i64,
    pub payload_secret: Option<String>,
    pub commit_mode: CommitMode,
    pub max_upload_bytes: usize,
    pub mailer_failure_threshold: u32,
    pub mailer_open_secs: u64,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let config = Self {
            http_host: try_load(&lookup, "HTTP_HOST", "0.0.0.0")?,
            http_port: try_load(&lookup, "HTTP_PORT", "8080")?,
            metrics_port: try_load(&lookup, "METRICS_PORT", "9090")?,
            database_url: optional(&lookup, "DATABASE_URL"),
            seed_path: optional(&lookup, "SEED_PATH").map(PathBuf::from),
            tracking_base_url: try_load(&lookup, "TRACKING_BASE_URL", "http://localhost:3000/track-order")?,
            tracking_ttl_days: try_load(&lookup, "TRACKING_TTL_DAYS", "7")?,
            payload_secret: optional(&lookup, "PAYLOAD_SECRET"),
            commit_mode: try_load(&lookup, "BULK_ORDER_COMMIT", "all_or_nothing")?,
            max_upload_bytes: try_load(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            mailer_failure_threshold: try_load(&lookup, "MAILER_FAILURE_THRESHOLD", "5")?,
            mailer_open_secs: try_load(&lookup, "MAILER_OPEN_SECS", "30")?,
        };

        if config.tracking_ttl_days <= 0 {
            return Err(anyhow!("TRACKING_TTL_DAYS must be positive"));
        }
        if config.mailer_failure_threshold == 0 {
            return Err(anyhow!("MAILER_FAILURE_THRESHOLD must be at least 1"));
        }

        Ok(config)
    }

    pub fn bulk_order_settings(&self) -> BulkOrderSettings {
        BulkOrderSettings {
            commit_mode: self.commit_mode,
            tracking_ttl: chrono::Duration::days(self.tracking_ttl_days),
            tracking_base_url: self.tracking_base_url.clone(),
        }
    }

    pub fn mailer_breaker(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.mailer_failure_threshold,
            open_for: Duration::from_secs(self.mailer_open_secs),
            ..CircuitBreakerConfig::default()
        }
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = optional(lookup, key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.trim()
        .parse()
        .map_err(|e: T::Err| anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value: {raw}"))
}
