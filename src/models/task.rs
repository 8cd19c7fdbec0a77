//! Durable background task records
//!
//! A task moves strictly forward: `queued -> running -> success | failed`.
//! The transition helpers below are the only places the lifecycle fields
//! are written, so the invariants hold for every record the core persists:
//! `started_at` is set on entering `running`, `finished_at` is set once on
//! entering a terminal state, and `error` is non-empty iff the task failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a task does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    RefreshAll,
    CrawlByStatus,
    /// Refresh request queued by a detection pass for one stale show
    Correction,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::RefreshAll => write!(f, "refresh_all"),
            TaskKind::CrawlByStatus => write!(f, "crawl_by_status"),
            TaskKind::Correction => write!(f, "correction"),
        }
    }
}

impl std::str::FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "refresh_all" => Ok(TaskKind::RefreshAll),
            "crawl_by_status" => Ok(TaskKind::CrawlByStatus),
            "correction" => Ok(TaskKind::Correction),
            _ => Err(format!("Invalid task kind: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Queued,
    Running,
    Success,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Success | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Queued => write!(f, "queued"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Success => write!(f, "success"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queued" => Ok(TaskStatus::Queued),
            "running" => Ok(TaskStatus::Running),
            "success" => Ok(TaskStatus::Success),
            "failed" => Ok(TaskStatus::Failed),
            _ => Err(format!("Invalid task status: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub kind: TaskKind,
    pub status: TaskStatus,
    /// Opaque to the core; JSON produced by whoever created the task
    pub parameters: String,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// A fresh `queued` record
    pub fn queued(kind: TaskKind, parameters: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            status: TaskStatus::Queued,
            parameters: parameters.into(),
            error: None,
            started_at: None,
            finished_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn mark_running(&mut self, now: DateTime<Utc>) {
        self.status = TaskStatus::Running;
        self.started_at = Some(now);
    }

    /// Move into a terminal state. A no-op when already terminal, so
    /// `finished_at` is written exactly once.
    pub fn mark_finished(&mut self, now: DateTime<Utc>, outcome: Result<(), String>) {
        if self.status.is_terminal() {
            return;
        }

        // Clock steps must not produce a window that ends before it starts
        let finished_at = match self.started_at {
            Some(started_at) if now < started_at => started_at,
            Some(_) => now,
            None => {
                self.started_at = Some(now);
                now
            }
        };
        self.finished_at = Some(finished_at);

        match outcome {
            Ok(()) => {
                self.status = TaskStatus::Success;
                self.error = None;
            }
            Err(message) => {
                self.status = TaskStatus::Failed;
                self.error = Some(if message.trim().is_empty() {
                    "task failed without an error message".to_string()
                } else {
                    message
                });
            }
        }
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }
}
