//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `crmflow.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{FixedOffset, Weekday};
use serde::Deserialize;

use crmflow_domain::automation::is_http_url;
use crmflow_domain::schedule::ScheduleRules;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Run pacing, scheduling and local action settings.
    pub engine: EngineConfig,
    /// Outbound delivery settings.
    pub outbound: OutboundConfig,
    /// Global webhook endpoints keyed by platform tag (`zapier`, `slack`, …).
    pub integrations: HashMap<String, String>,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pause between two contacts of one run, in milliseconds.
    pub pacing_ms: u64,
    /// Scheduler tick interval, in seconds.
    pub tick_secs: u64,
    /// Day `weekly_report` automations run on (`sun`, `monday`, …).
    pub report_weekday: String,
    /// Offset from UTC, in minutes, that calendar triggers are read in.
    pub utc_offset_minutes: i32,
    /// Users `assign_user` picks from.
    pub assignees: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutboundConfig {
    /// Upper bound on one webhook call, in seconds.
    pub timeout_secs: u64,
    /// Open deep links on the desktop instead of only logging them.
    pub launch_links: bool,
}

impl Config {
    /// Load configuration from `crmflow.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("crmflow.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CRMFLOW_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("CRMFLOW_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("CRMFLOW_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("CRMFLOW_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("CRMFLOW_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.engine.tick_secs == 0 {
            return Err(ConfigError::Validation(
                "tick interval must be non-zero".to_string(),
            ));
        }
        self.schedule_rules()?;
        if let Some((platform, _)) = self
            .integrations
            .iter()
            .find(|(_, endpoint)| !is_http_url(endpoint))
        {
            return Err(ConfigError::Validation(format!(
                "endpoint for {platform} must be an http(s) URL"
            )));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    #[must_use]
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.engine.pacing_ms)
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.engine.tick_secs)
    }

    #[must_use]
    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.outbound.timeout_secs)
    }

    /// Calendar rules of the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an unknown weekday or an
    /// offset of a day or more.
    pub fn schedule_rules(&self) -> Result<ScheduleRules, ConfigError> {
        let utc_offset = self
            .engine
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "utc offset of {} minutes is out of range",
                    self.engine.utc_offset_minutes
                ))
            })?;
        Ok(ScheduleRules {
            report_weekday: self.report_weekday()?,
            utc_offset,
        })
    }

    /// Parse the designated weekly report day.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for anything that is not a weekday.
    pub fn report_weekday(&self) -> Result<Weekday, ConfigError> {
        self.engine.report_weekday.parse().map_err(|_| {
            ConfigError::Validation(format!(
                "unknown weekday {:?}",
                self.engine.report_weekday
            ))
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:crmflow.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "crmflowd=info,crmflow_app=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pacing_ms: 2000,
            tick_secs: 300,
            report_weekday: "sun".to_string(),
            utc_offset_minutes: 0,
            assignees: Vec::new(),
        }
    }
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            launch_links: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
