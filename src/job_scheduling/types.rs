//! Job scheduling type definitions

use chrono::{DateTime, Utc};
use cron::Schedule;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::SchedulerConfig;
use crate::config::duration_serde;

/// Kind of work the scheduler runs; at most one of each is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Crawl,
    Publish,
    Correction,
}

impl JobKind {
    pub const ALL: [JobKind; 3] = [JobKind::Crawl, JobKind::Publish, JobKind::Correction];
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Crawl => write!(f, "crawl"),
            JobKind::Publish => write!(f, "publish"),
            JobKind::Correction => write!(f, "correction"),
        }
    }
}

/// Entries of the cron timetable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimetableJob {
    DailyCrawl,
    DailyPublish,
    WeeklyCrawl,
    WeeklyPublish,
    DailyCorrection,
}

impl TimetableJob {
    pub fn kind(&self) -> JobKind {
        match self {
            TimetableJob::DailyCrawl | TimetableJob::WeeklyCrawl => JobKind::Crawl,
            TimetableJob::DailyPublish | TimetableJob::WeeklyPublish => JobKind::Publish,
            TimetableJob::DailyCorrection => JobKind::Correction,
        }
    }

    /// Configuration key, e.g. `daily_crawl`
    pub fn name(&self) -> &'static str {
        match self {
            TimetableJob::DailyCrawl => "daily_crawl",
            TimetableJob::DailyPublish => "daily_publish",
            TimetableJob::WeeklyCrawl => "weekly_crawl",
            TimetableJob::WeeklyPublish => "weekly_publish",
            TimetableJob::DailyCorrection => "daily_correction",
        }
    }

    /// Used in log lines and errors
    pub fn label(&self) -> &'static str {
        match self {
            TimetableJob::DailyCrawl => "daily crawl",
            TimetableJob::DailyPublish => "daily publish",
            TimetableJob::WeeklyCrawl => "weekly crawl",
            TimetableJob::WeeklyPublish => "weekly publish",
            TimetableJob::DailyCorrection => "daily correction",
        }
    }

    /// Cron expression configured for this entry
    pub fn spec<'a>(&self, config: &'a SchedulerConfig) -> &'a str {
        match self {
            TimetableJob::DailyCrawl => &config.daily_crawl,
            TimetableJob::DailyPublish => &config.daily_publish,
            TimetableJob::WeeklyCrawl => &config.weekly_crawl,
            TimetableJob::WeeklyPublish => &config.weekly_publish,
            TimetableJob::DailyCorrection => &config.daily_correction,
        }
    }

    pub const ALL: [TimetableJob; 5] = [
        TimetableJob::DailyCrawl,
        TimetableJob::DailyPublish,
        TimetableJob::WeeklyCrawl,
        TimetableJob::WeeklyPublish,
        TimetableJob::DailyCorrection,
    ];
}

/// A validated timetable entry
#[derive(Debug, Clone)]
pub struct TimetableEntry {
    pub job: TimetableJob,
    pub spec: String,
    pub schedule: Schedule,
}

/// Per job kind timeouts applied by the scheduler's wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTimeouts {
    #[serde(with = "duration_serde::duration")]
    pub crawl: Duration,
    #[serde(with = "duration_serde::duration")]
    pub publish: Duration,
    #[serde(with = "duration_serde::duration")]
    pub correction: Duration,
}

impl JobTimeouts {
    pub fn for_kind(&self, kind: JobKind) -> Duration {
        match kind {
            JobKind::Crawl => self.crawl,
            JobKind::Publish => self.publish,
            JobKind::Correction => self.correction,
        }
    }
}

impl From<&SchedulerConfig> for JobTimeouts {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            crawl: config.crawl_timeout,
            publish: config.publish_timeout,
            correction: config.correction_timeout,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobKindStatus {
    pub kind: JobKind,
    pub in_flight: bool,
    pub last_success_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_since_last_success: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatus {
    /// Whether the cron timer is active
    pub running: bool,
    pub jobs: Vec<JobKindStatus>,
}

impl SchedulerStatus {
    pub fn job(&self, kind: JobKind) -> Option<&JobKindStatus> {
        self.jobs.iter().find(|j| j.kind == kind)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextRun {
    pub job: TimetableJob,
    pub spec: String,
    pub next_run: Option<DateTime<Utc>>,
}
