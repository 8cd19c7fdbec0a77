//! Staleness detection for a single show
//!
//! Pure computation over a show's sorted air dates. The only input that is
//! not part of the show itself is "today", which [`Detector::detect`]
//! derives from the configured timezone and [`Detector::detect_on`] takes
//! explicitly.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pattern::UpdatePattern;

/// Fewer dates than this cannot describe a cadence
pub const MIN_EPISODE_DATES: usize = 3;

/// Only the most recent dates are analyzed
pub const ANALYSIS_WINDOW: usize = 10;

pub const MAX_PRIORITY: i64 = 100;

/// A show whose latest episode is older than its threshold allows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleShowInfo {
    pub show_id: Uuid,
    pub external_id: i64,
    pub show_name: String,
    pub normal_interval_days: i64,
    pub days_overdue: i64,
    pub latest_episode_date: NaiveDate,
    /// `days_overdue` capped at 100
    pub priority: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct Detector {
    timezone: Tz,
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Detector {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Current calendar date in the detector's timezone
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    pub fn detect(
        &self,
        show_id: Uuid,
        external_id: i64,
        show_name: &str,
        sorted_dates: &[NaiveDate],
        custom_threshold: Option<u32>,
    ) -> Option<StaleShowInfo> {
        self.detect_on(
            show_id,
            external_id,
            show_name,
            sorted_dates,
            custom_threshold,
            self.today(),
        )
    }

    /// `sorted_dates` must be in ascending order. Returns `None` when the show
    /// is not stale or there is not enough history to judge.
    pub fn detect_on(
        &self,
        show_id: Uuid,
        external_id: i64,
        show_name: &str,
        sorted_dates: &[NaiveDate],
        custom_threshold: Option<u32>,
        today: NaiveDate,
    ) -> Option<StaleShowInfo> {
        if sorted_dates.len() < MIN_EPISODE_DATES {
            return None;
        }

        let window = &sorted_dates[sorted_dates.len().saturating_sub(ANALYSIS_WINDOW)..];
        let gaps: Vec<i64> = window
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).num_days())
            .filter(|&days| days > 0)
            .collect();

        let pattern = UpdatePattern::from_gaps(&gaps)?;
        let threshold_days = custom_threshold
            .map(i64::from)
            .unwrap_or(pattern.threshold_days);

        let latest_episode_date = *window.last()?;
        let days_since_latest = (today - latest_episode_date).num_days();
        if days_since_latest <= threshold_days {
            return None;
        }

        let days_overdue = days_since_latest - threshold_days;
        Some(StaleShowInfo {
            show_id,
            external_id,
            show_name: show_name.to_string(),
            normal_interval_days: pattern.mode_days,
            days_overdue,
            latest_episode_date,
            priority: days_overdue.min(MAX_PRIORITY),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// `count` dates `step` days apart, the last one on `last`
    fn cadence(last: NaiveDate, step: i64, count: usize) -> Vec<NaiveDate> {
        (0..count)
            .rev()
            .map(|i| last - Duration::days(step * i as i64))
            .collect()
    }

    fn detect(dates: &[NaiveDate], custom: Option<u32>, today: NaiveDate) -> Option<StaleShowInfo> {
        Detector::default().detect_on(Uuid::nil(), 1399, "Show", dates, custom, today)
    }

    #[test]
    fn test_fewer_than_three_dates_is_never_stale() {
        let last = date(2020, 1, 1);
        let today = date(2024, 1, 1);
        assert!(detect(&[], None, today).is_none());
        assert!(detect(&cadence(last, 7, 2), None, today).is_none());
    }

    #[test]
    fn test_same_day_releases_have_no_cadence() {
        let d = date(2023, 5, 1);
        assert!(detect(&[d, d, d, d], None, date(2024, 5, 1)).is_none());
    }

    #[test]
    fn test_weekly_show_boundary() {
        let last = date(2024, 3, 4);
        let dates = cadence(last, 7, 5);

        // threshold is round(7 * 1.5) = 11
        assert!(detect(&dates, None, last + Duration::days(11)).is_none());

        let stale = detect(&dates, None, last + Duration::days(12)).unwrap();
        assert_eq!(stale.days_overdue, 1);
        assert_eq!(stale.priority, 1);
        assert_eq!(stale.normal_interval_days, 7);
        assert_eq!(stale.latest_episode_date, last);
    }

    #[test]
    fn test_hiatus_does_not_change_the_cadence() {
        let first_half = cadence(date(2023, 6, 1), 7, 4);
        let second_half = cadence(date(2023, 9, 20), 7, 3);
        let dates: Vec<NaiveDate> = first_half.into_iter().chain(second_half).collect();

        let stale = detect(&dates, None, date(2023, 12, 31)).unwrap();
        assert_eq!(stale.normal_interval_days, 7);
        assert_eq!(stale.days_overdue, (date(2023, 12, 31) - date(2023, 9, 20)).num_days() - 11);
    }

    #[test]
    fn test_only_season_breaks_use_fallback_threshold() {
        let last = date(2022, 1, 1);
        let dates = cadence(last, 100, 4);

        assert!(detect(&dates, None, last + Duration::days(10)).is_none());
        let stale = detect(&dates, None, last + Duration::days(11)).unwrap();
        assert_eq!(stale.normal_interval_days, 7);
        assert_eq!(stale.days_overdue, 1);
    }

    #[test]
    fn test_custom_threshold_overrides_pattern() {
        let last = date(2024, 3, 4);
        let dates = cadence(last, 7, 5);
        let today = last + Duration::days(20);

        assert!(detect(&dates, Some(30), today).is_none());

        let stale = detect(&dates, Some(3), today).unwrap();
        assert_eq!(stale.days_overdue, 17);
    }

    #[test]
    fn test_only_last_ten_dates_are_analyzed() {
        // Old daily releases followed by ten fortnightly ones
        let old = cadence(date(2020, 1, 10), 1, 10);
        let recent = cadence(date(2021, 1, 1), 14, 10);
        let dates: Vec<NaiveDate> = old.into_iter().chain(recent).collect();

        let stale = detect(&dates, None, date(2021, 1, 1) + Duration::days(22)).unwrap();
        assert_eq!(stale.normal_interval_days, 14);
        assert_eq!(stale.days_overdue, 1);
    }

    #[rstest]
    #[case(12, 1)]
    #[case(61, 50)]
    #[case(111, 100)]
    #[case(511, 100)]
    fn test_priority_is_capped(#[case] days_since: i64, #[case] expected: i64) {
        let last = date(2024, 1, 1);
        let dates = cadence(last, 7, 5);
        let stale = detect(&dates, None, last + Duration::days(days_since)).unwrap();
        assert_eq!(stale.priority, expected);
    }

    #[test]
    fn test_future_dates_are_not_stale() {
        let last = date(2030, 1, 1);
        assert!(detect(&cadence(last, 7, 5), None, date(2024, 1, 1)).is_none());
    }
}
