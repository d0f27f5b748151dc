// ⚙️ Configuration - read once at startup, passed down explicitly

use crate::registry::DEFAULT_REGISTRY_URL;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_CACHE_MAX_AGE: u64 = 3600;
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Service configuration sourced from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeConfig {
    pub bind_addr: SocketAddr,
    pub registry_url: String,
    pub upstream_timeout: Duration,
    /// Seconds intermediate caches may keep a badge
    pub cache_max_age: u64,
    pub embed_logo: bool,
    pub log_filter: String,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        BadgeConfig {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            embed_logo: true,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl BadgeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = parse_var(&lookup, "ANPR_BADGE_BIND", DEFAULT_BIND)?;
        let registry_url = lookup("ANPR_BADGE_REGISTRY_URL")
            .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string());
        let timeout_secs: u64 = parse_var(
            &lookup,
            "ANPR_BADGE_UPSTREAM_TIMEOUT_SECS",
            &DEFAULT_UPSTREAM_TIMEOUT_SECS.to_string(),
        )?;
        let cache_max_age = parse_var(
            &lookup,
            "ANPR_BADGE_CACHE_MAX_AGE",
            &DEFAULT_CACHE_MAX_AGE.to_string(),
        )?;
        let embed_logo = parse_var(&lookup, "ANPR_BADGE_EMBED_LOGO", "true")?;
        let log_filter =
            lookup("ANPR_BADGE_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        if timeout_secs == 0 {
            anyhow::bail!("ANPR_BADGE_UPSTREAM_TIMEOUT_SECS must be greater than zero");
        }

        Ok(BadgeConfig {
            bind_addr,
            registry_url,
            upstream_timeout: Duration::from_secs(timeout_secs),
            cache_max_age,
            embed_logo,
            log_filter,
        })
    }

    /// `Cache-Control` value for successful badges
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.cache_max_age)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: &str) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.trim()
        .parse()
        .with_context(|| format!("parse {}={:?}", key, raw))
}

// ============================================================================
// TESTS
// ============================================================================
