//! Release cadence analysis
//!
//! Turns the day gaps between consecutive episodes into the show's normal
//! update interval and the staleness threshold derived from it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Gaps longer than this are treated as a season break, not a cadence
pub const GAP_SEASON_DAYS: i64 = 60;

/// Cadence assumed when every gap was a season break
pub const FALLBACK_MODE_DAYS: i64 = 7;
pub const FALLBACK_THRESHOLD_DAYS: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePattern {
    /// Most frequent gap between episodes, in days
    pub mode_days: i64,
    /// Days without a new episode after which the show counts as stale
    pub threshold_days: i64,
    /// Number of gaps the mode was computed from
    pub sample_size: usize,
    /// True when at least one gap was discarded as a season break
    pub had_gap_season: bool,
}

impl UpdatePattern {
    /// Analyze positive day gaps. Returns `None` for an empty input.
    pub fn from_gaps(gaps: &[i64]) -> Option<Self> {
        if gaps.is_empty() {
            return None;
        }

        let regular: Vec<i64> = gaps
            .iter()
            .copied()
            .filter(|&gap| gap <= GAP_SEASON_DAYS)
            .collect();

        if regular.is_empty() {
            return Some(Self {
                mode_days: FALLBACK_MODE_DAYS,
                threshold_days: FALLBACK_THRESHOLD_DAYS,
                sample_size: gaps.len(),
                had_gap_season: true,
            });
        }

        let mode_days = mode(&regular);
        Some(Self {
            mode_days,
            threshold_days: threshold_for(mode_days),
            sample_size: regular.len(),
            had_gap_season: regular.len() < gaps.len(),
        })
    }
}

/// `round(mode * 1.5)` with halves rounded away from zero: 7 gives 11, 5 gives 8
pub fn threshold_for(mode_days: i64) -> i64 {
    (mode_days * 3 + 1) / 2
}

/// Most frequent value; on a tie the smallest value wins
fn mode(values: &[i64]) -> i64 {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for &value in values {
        *counts.entry(value).or_default() += 1;
    }

    counts
        .into_iter()
        .max_by(|(a_value, a_count), (b_value, b_count)| {
            a_count.cmp(b_count).then_with(|| b_value.cmp(a_value))
        })
        .map(|(value, _)| value)
        .unwrap_or(FALLBACK_MODE_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 2)]
    #[case(3, 5)]
    #[case(5, 8)]
    #[case(7, 11)]
    #[case(14, 21)]
    #[case(60, 90)]
    fn test_threshold_rounds_half_away_from_zero(#[case] mode: i64, #[case] expected: i64) {
        assert_eq!(threshold_for(mode), expected);
        assert_eq!(threshold_for(mode), (mode as f64 * 1.5).round() as i64);
    }

    #[test]
    fn test_weekly_show_with_hiatus() {
        let pattern = UpdatePattern::from_gaps(&[7, 7, 7, 90, 7]).unwrap();
        assert_eq!(pattern.mode_days, 7);
        assert_eq!(pattern.threshold_days, 11);
        assert_eq!(pattern.sample_size, 4);
        assert!(pattern.had_gap_season);
    }

    #[test]
    fn test_only_season_breaks_falls_back_to_weekly() {
        let pattern = UpdatePattern::from_gaps(&[120, 95]).unwrap();
        assert_eq!(
            pattern,
            UpdatePattern {
                mode_days: 7,
                threshold_days: 10,
                sample_size: 2,
                had_gap_season: true,
            }
        );
    }

    #[test]
    fn test_gap_of_exactly_sixty_days_is_regular() {
        let pattern = UpdatePattern::from_gaps(&[60, 60]).unwrap();
        assert_eq!(pattern.mode_days, 60);
        assert!(!pattern.had_gap_season);
    }

    #[test]
    fn test_tie_prefers_smallest_gap() {
        assert_eq!(UpdatePattern::from_gaps(&[14, 7, 14, 7]).unwrap().mode_days, 7);
        assert_eq!(UpdatePattern::from_gaps(&[3, 1, 2]).unwrap().mode_days, 1);
    }

    #[test]
    fn test_empty_gaps_have_no_pattern() {
        assert!(UpdatePattern::from_gaps(&[]).is_none());
    }
}
