use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A show in the catalog, together with the cadence state the correction
/// service maintains on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub id: Uuid,
    /// Identifier of the show at the upstream metadata source
    pub external_id: i64,
    pub name: String,
    /// Upstream airing status, e.g. "Returning Series" or "Ended"
    pub status: String,

    /// Custom staleness threshold in days, replacing the computed one
    pub refresh_threshold_override: Option<u32>,
    /// When the last detection pass flagged this show as stale
    pub stale_detected_at: Option<DateTime<Utc>>,
    /// Human-readable summary of the last detection outcome
    pub last_correction_result: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Show {
    pub fn new(external_id: i64, name: impl Into<String>, status: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            external_id,
            name: name.into(),
            status: status.into(),
            refresh_threshold_override: None,
            stale_detected_at: None,
            last_correction_result: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_stale(&self) -> bool {
        self.stale_detected_at.is_some()
    }

    /// Record a detection hit
    pub fn mark_stale(&mut self, now: DateTime<Utc>, days_overdue: i64) {
        self.stale_detected_at = Some(now);
        self.last_correction_result = format!("Detected: {days_overdue} days overdue");
        self.updated_at = now;
    }

    pub fn clear_stale(&mut self) {
        self.stale_detected_at = None;
        self.last_correction_result.clear();
        self.updated_at = Utc::now();
    }
}
