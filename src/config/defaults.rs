/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
use std::time::Duration;

// Database defaults
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./showtrack.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

// Scheduler timetable, six-field cron with seconds first
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_DAILY_CRAWL: &str = "0 0 8,12,20 * * *";
pub const DEFAULT_DAILY_PUBLISH: &str = "0 30 20 * * *";
pub const DEFAULT_WEEKLY_CRAWL: &str = "0 0 6 * * Mon";
pub const DEFAULT_WEEKLY_PUBLISH: &str = "0 0 7 * * Mon";
pub const DEFAULT_DAILY_CORRECTION: &str = "0 0 2 * * *";

// Per job kind timeouts
pub const DEFAULT_CRAWL_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_CORRECTION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

// Serde default functions
pub fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

pub fn default_max_connections() -> Option<u32> {
    Some(DEFAULT_MAX_CONNECTIONS)
}

pub fn default_scheduler_enabled() -> bool {
    true
}

pub fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

pub fn default_daily_crawl() -> String {
    DEFAULT_DAILY_CRAWL.to_string()
}

pub fn default_daily_publish() -> String {
    DEFAULT_DAILY_PUBLISH.to_string()
}

pub fn default_weekly_crawl() -> String {
    DEFAULT_WEEKLY_CRAWL.to_string()
}

pub fn default_weekly_publish() -> String {
    DEFAULT_WEEKLY_PUBLISH.to_string()
}

pub fn default_daily_correction() -> String {
    DEFAULT_DAILY_CORRECTION.to_string()
}

pub fn default_crawl_timeout() -> Duration {
    DEFAULT_CRAWL_TIMEOUT
}

pub fn default_publish_timeout() -> Duration {
    DEFAULT_PUBLISH_TIMEOUT
}

pub fn default_correction_timeout() -> Duration {
    DEFAULT_CORRECTION_TIMEOUT
}
