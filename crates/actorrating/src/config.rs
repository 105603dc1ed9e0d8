use std::collections::HashMap;

use chrono::TimeDelta;

use crate::ratelimit::{ActionKind, ActionPolicy};

// Typed runtime configuration, loaded once at startup from the environment
// (and `.env` when present). Prefixed keys win over the short fallback keys.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub api_addr: Option<String>,
    pub migrate_on_startup: bool,
    pub log_filter: String,
    pub rate_limit_timeout_ms: u64,
    pub rate_limit_retention_hours: i64,
    pub rate_limit_sweep_secs: u64,
    pub rate_limit_overrides: HashMap<ActionKind, ActionPolicy>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL is missing"))?;

        let api_addr = match env_or_fallback("ACTORRATING_API_ADDR", "API_ADDR") {
            Some(v) => normalize_optional_addr(&v),
            None => Some("0.0.0.0:8080".to_string()),
        };

        let migrate_on_startup = env_bool("ACTORRATING_MIGRATE_ON_STARTUP").unwrap_or(false);

        let log_filter =
            env_or_fallback("ACTORRATING_LOG", "RUST_LOG").unwrap_or_else(|| "info".to_string());

        let rate_limit_timeout_ms = env_parse("ACTORRATING_RATE_LIMIT_TIMEOUT_MS")?.unwrap_or(2000);
        let rate_limit_retention_hours =
            env_parse("ACTORRATING_RATE_LIMIT_RETENTION_HOURS")?.unwrap_or(24);
        retention_from_hours(rate_limit_retention_hours)
            .map_err(|e| anyhow::anyhow!("ACTORRATING_RATE_LIMIT_RETENTION_HOURS: {e}"))?;
        let rate_limit_sweep_secs = env_parse("ACTORRATING_RATE_LIMIT_SWEEP_SECS")?.unwrap_or(3600);

        let mut rate_limit_overrides = HashMap::new();
        for action in ActionKind::ALL {
            let key = format!("ACTORRATING_RATE_LIMIT_{}", action.env_suffix());
            if let Some(raw) = std::env::var(&key).ok().filter(|s| !s.trim().is_empty()) {
                let policy = parse_policy_override(action, &raw)
                    .map_err(|e| anyhow::anyhow!("{key}: {e}"))?;
                rate_limit_overrides.insert(action, policy);
            }
        }

        Ok(Self {
            database_url,
            api_addr,
            migrate_on_startup,
            log_filter,
            rate_limit_timeout_ms,
            rate_limit_retention_hours,
            rate_limit_sweep_secs,
            rate_limit_overrides,
        })
    }

    pub fn rate_limit_retention(&self) -> anyhow::Result<TimeDelta> {
        retention_from_hours(self.rate_limit_retention_hours)
    }
}

/// Retention horizon for rate-limit counters. Must be positive; a cutoff in
/// the future would delete live windows.
pub fn retention_from_hours(hours: i64) -> anyhow::Result<TimeDelta> {
    if hours <= 0 {
        anyhow::bail!("retention must be > 0 hours, got {hours}");
    }
    TimeDelta::try_hours(hours)
        .ok_or_else(|| anyhow::anyhow!("retention of {hours} hours is out of range"))
}

/// Parses `<max_requests>/<window_ms>`. The fail policy keeps the action's
/// reference default.
pub fn parse_policy_override(action: ActionKind, raw: &str) -> anyhow::Result<ActionPolicy> {
    let (max, window) = raw
        .trim()
        .split_once('/')
        .ok_or_else(|| anyhow::anyhow!("expected <max_requests>/<window_ms>, got {raw:?}"))?;

    let max_requests: i64 = max
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("max_requests is not an integer: {max:?}"))?;
    let window_ms: i64 = window
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("window_ms is not an integer: {window:?}"))?;

    if max_requests < 0 {
        anyhow::bail!("max_requests must be >= 0");
    }
    if window_ms <= 0 {
        anyhow::bail!("window_ms must be > 0");
    }

    Ok(ActionPolicy {
        max_requests,
        window_ms,
        ..ActionPolicy::reference(action)
    })
}

fn env_or_fallback(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| std::env::var(fallback).ok().filter(|s| !s.trim().is_empty()))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> anyhow::Result<Option<T>> {
    match std::env::var(key).ok().filter(|s| !s.trim().is_empty()) {
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{key} has an invalid value: {v:?}")),
        None => Ok(None),
    }
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn normalize_optional_addr(value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    if matches!(v.to_lowercase().as_str(), "0" | "off" | "false" | "none") {
        return None;
    }
    Some(v.to_string())
}
