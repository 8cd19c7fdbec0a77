use anyhow::Result;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;

use crate::errors::{AppError, AppResult};
use crate::utils::cron_helper;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub correction: CorrectionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: Option<u32>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Cron timetable and per job kind timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// When false, `serve` runs without the cron timer (manual triggers only)
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,
    /// IANA timezone name the timetable is evaluated in
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_daily_crawl")]
    pub daily_crawl: String,
    #[serde(default = "default_daily_publish")]
    pub daily_publish: String,
    #[serde(default = "default_weekly_crawl")]
    pub weekly_crawl: String,
    #[serde(default = "default_weekly_publish")]
    pub weekly_publish: String,
    #[serde(default = "default_daily_correction")]
    pub daily_correction: String,
    #[serde(default = "default_crawl_timeout", with = "duration_serde::duration")]
    pub crawl_timeout: Duration,
    #[serde(default = "default_publish_timeout", with = "duration_serde::duration")]
    pub publish_timeout: Duration,
    #[serde(default = "default_correction_timeout", with = "duration_serde::duration")]
    pub correction_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            timezone: default_timezone(),
            daily_crawl: default_daily_crawl(),
            daily_publish: default_daily_publish(),
            weekly_crawl: default_weekly_crawl(),
            weekly_publish: default_weekly_publish(),
            daily_correction: default_daily_correction(),
            crawl_timeout: default_crawl_timeout(),
            publish_timeout: default_publish_timeout(),
            correction_timeout: default_correction_timeout(),
        }
    }
}

impl SchedulerConfig {
    pub fn tz(&self) -> AppResult<Tz> {
        parse_timezone(&self.timezone)
    }

    /// `(name, spec)` for every timetable entry
    pub fn cron_specs(&self) -> [(&'static str, &str); 5] {
        [
            ("daily_crawl", self.daily_crawl.as_str()),
            ("daily_publish", self.daily_publish.as_str()),
            ("weekly_crawl", self.weekly_crawl.as_str()),
            ("weekly_publish", self.weekly_publish.as_str()),
            ("daily_correction", self.daily_correction.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrectionConfig {
    /// Timezone used to decide what "today" is for the detector. Falls back
    /// to the scheduler timezone when unset.
    pub timezone: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }

    /// Check every cron spec, timezone and timeout before anything is wired
    pub fn validate(&self) -> AppResult<()> {
        if self.database.url.trim().is_empty() {
            return Err(AppError::configuration("database.url must not be empty"));
        }
        if self.database.max_connections == Some(0) {
            return Err(AppError::configuration(
                "database.max_connections must be greater than zero",
            ));
        }

        for (_, spec) in self.scheduler.cron_specs() {
            cron_helper::parse_schedule(spec)?;
        }
        self.scheduler.tz()?;
        self.correction_timezone()?;

        for (name, timeout) in [
            ("crawl_timeout", self.scheduler.crawl_timeout),
            ("publish_timeout", self.scheduler.publish_timeout),
            ("correction_timeout", self.scheduler.correction_timeout),
        ] {
            if timeout.is_zero() {
                return Err(AppError::configuration(format!(
                    "scheduler.{name} must be greater than zero"
                )));
            }
        }

        Ok(())
    }

    pub fn correction_timezone(&self) -> AppResult<Tz> {
        match &self.correction.timezone {
            Some(name) => parse_timezone(name),
            None => self.scheduler.tz(),
        }
    }
}

fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.parse::<Tz>()
        .map_err(|e| AppError::configuration(format!("Invalid timezone '{name}': {e}")))
}
