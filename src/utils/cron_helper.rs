//! Cron utility functions for validating timetable entries and calculating
//! next fire times
//!
//! Timetable specs use six fields, seconds first
//! (`sec min hour day-of-month month day-of-week`), or one of the
//! `@`-descriptors such as `@daily`. The `cron` crate also accepts a
//! trailing year field; that form is rejected here so configuration stays
//! portable.

use chrono::{DateTime, TimeZone, Utc};
use cron::Schedule;
use std::str::FromStr;

use crate::errors::{AppError, AppResult};

const CRON_FIELD_COUNT: usize = 6;

/// Parse and validate a timetable cron expression
pub fn parse_schedule(spec: &str) -> AppResult<Schedule> {
    let trimmed = spec.trim();
    let invalid = |message: String| AppError::InvalidCronSpec {
        spec: spec.to_string(),
        message,
    };

    if trimmed.is_empty() {
        return Err(invalid("expression is empty".to_string()));
    }

    if !trimmed.starts_with('@') {
        let fields = trimmed.split_whitespace().count();
        if fields != CRON_FIELD_COUNT {
            return Err(invalid(format!(
                "expected {CRON_FIELD_COUNT} fields (sec min hour dom month dow), found {fields}"
            )));
        }
    }

    Schedule::from_str(trimmed).map_err(|e| invalid(e.to_string()))
}

/// Next fire time strictly after `after`, evaluated in `tz`
pub fn next_fire_after<Tz: TimeZone>(
    schedule: &Schedule,
    tz: &Tz,
    after: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    schedule
        .after(&after.with_timezone(tz))
        .next()
        .map(|next| next.with_timezone(&Utc))
}
