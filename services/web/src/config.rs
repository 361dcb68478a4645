//! Service configuration
//!
//! Values come from `CATALOG_*` environment variables layered over the
//! defaults below, e.g. `CATALOG_BIND_ADDRESS=127.0.0.1:8080`.

use anyhow::Result;
use auth::{SessionConfig, SweepPolicy};
use chrono::TimeDelta;
use config::{Config, Environment};
use serde::Deserialize;
use std::time::Duration;

/// 30 days
const DEFAULT_SESSION_MAX_AGE: i64 = 60 * 60 * 24 * 30;

/// Catalog service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP listener binds to
    pub bind_address: String,
    /// Name of the cookie carrying the session id
    pub session_cookie: String,
    /// Lifetime of a login session and its cookie, in seconds
    pub session_max_age: i64,
    /// Seconds between creation-driven cleanup checks
    pub session_cleanup_interval: u64,
    /// Seconds a triggered sweep waits before running
    pub session_sweep_delay: u64,
    /// Cron schedule for sweeps; when set, logins no longer trigger them
    pub session_sweep_schedule: Option<String>,
    /// Maximum number of tracks returned by listings and searches
    pub result_limit: i64,
    /// User granted the admin role at startup
    pub admin_username: Option<String>,
}

impl AppConfig {
    /// Load the configuration from defaults and `CATALOG_*` variables
    pub fn from_env() -> Result<Self> {
        let config = Config::builder()
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("session_cookie", "sid")?
            .set_default("session_max_age", DEFAULT_SESSION_MAX_AGE)?
            .set_default("session_cleanup_interval", 3600_u64)?
            .set_default("session_sweep_delay", 5_u64)?
            .set_default("result_limit", 50_i64)?
            .add_source(Environment::with_prefix("CATALOG").try_parsing(true))
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        if config.session_max_age <= 0 {
            anyhow::bail!("CATALOG_SESSION_MAX_AGE must be positive");
        }
        if config.result_limit <= 0 {
            anyhow::bail!("CATALOG_RESULT_LIMIT must be positive");
        }
        Ok(config)
    }

    /// Session registry settings derived from this configuration
    pub fn session_config(&self) -> Result<SessionConfig> {
        let sweep = match self.session_sweep_schedule {
            Some(_) => SweepPolicy::External,
            None => {
                let interval = i64::try_from(self.session_cleanup_interval)
                    .ok()
                    .and_then(TimeDelta::try_seconds)
                    .ok_or_else(|| {
                        anyhow::anyhow!("CATALOG_SESSION_CLEANUP_INTERVAL is too large")
                    })?;

                SweepPolicy::OnCreate {
                    interval,
                    delay: Duration::from_secs(self.session_sweep_delay),
                }
            }
        };

        Ok(SessionConfig { sweep })
    }
}
