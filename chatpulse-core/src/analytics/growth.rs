//! Whether activity is accelerating, steady or declining.
//!
//! The record sequence is split at `floor(n / 2)` and the halves' totals are
//! compared. Consistency scores how erratic the day-to-day movement is.

use serde::{Deserialize, Serialize};

use super::stats::percentage;
use crate::types::DailyActivityRecord;

/// Days needed before a trend is classified.
pub const MIN_RECORDS: usize = 7;

/// Changes within this many percent count as flat.
const STABLE_BAND: f64 = 5.0;

/// Changes beyond this many percent are accelerating/declining.
const STRONG_CHANGE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Stable,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthTrendKind {
    Accelerating,
    Steady,
    Declining,
    /// Not enough history to tell
    Stagnant,
}

impl GrowthTrendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrowthTrendKind::Accelerating => "accelerating",
            GrowthTrendKind::Steady => "steady",
            GrowthTrendKind::Declining => "declining",
            GrowthTrendKind::Stagnant => "stagnant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthTrend {
    /// True when fewer than [`MIN_RECORDS`] days were supplied
    pub insufficient_data: bool,
    pub first_half_total: i64,
    pub second_half_total: i64,
    pub change: i64,
    /// `change / first_half_total * 100`, 0 when the first half is silent
    pub change_percent: f64,
    pub direction: Direction,
    pub trend: GrowthTrendKind,
    /// 0-100, higher means steadier day-to-day activity
    pub consistency: f64,
}

impl GrowthTrend {
    /// Sentinel for windows too short to classify.
    pub fn insufficient() -> Self {
        Self {
            insufficient_data: true,
            first_half_total: 0,
            second_half_total: 0,
            change: 0,
            change_percent: 0.0,
            direction: Direction::Stable,
            trend: GrowthTrendKind::Stagnant,
            consistency: 0.0,
        }
    }
}

pub fn analyze_growth(daily: &[DailyActivityRecord]) -> GrowthTrend {
    if daily.len() < MIN_RECORDS {
        return GrowthTrend::insufficient();
    }

    let (first, second) = daily.split_at(daily.len() / 2);
    let first_half_total: i64 = first.iter().map(|r| r.total_messages).sum();
    let second_half_total: i64 = second.iter().map(|r| r.total_messages).sum();
    let change = second_half_total - first_half_total;
    let change_percent = percentage(change, first_half_total);

    let (direction, trend) = classify(change_percent);
    let consistency = consistency_score(daily);

    tracing::debug!(
        change_percent,
        trend = trend.as_str(),
        consistency,
        "Classified growth trend"
    );

    GrowthTrend {
        insufficient_data: false,
        first_half_total,
        second_half_total,
        change,
        change_percent,
        direction,
        trend,
        consistency,
    }
}

fn classify(change_percent: f64) -> (Direction, GrowthTrendKind) {
    if change_percent.abs() < STABLE_BAND {
        return (Direction::Stable, GrowthTrendKind::Steady);
    }
    let direction = if change_percent > 0.0 {
        Direction::Up
    } else {
        Direction::Down
    };
    let trend = if change_percent > STRONG_CHANGE {
        GrowthTrendKind::Accelerating
    } else if change_percent < -STRONG_CHANGE {
        GrowthTrendKind::Declining
    } else {
        GrowthTrendKind::Steady
    };
    (direction, trend)
}

/// `max(0, 100 - mean(|delta_i| / value_{i-1}) * 100)`.
///
/// A step away from a zero day contributes no variation.
fn consistency_score(daily: &[DailyActivityRecord]) -> f64 {
    if daily.len() < 2 {
        return 100.0;
    }
    let variations: Vec<f64> = daily
        .windows(2)
        .map(|pair| {
            let previous = pair[0].total_messages;
            if previous == 0 {
                0.0
            } else {
                (pair[1].total_messages - previous).abs() as f64 / previous as f64
            }
        })
        .collect();
    let avg_variation = variations.iter().sum::<f64>() / variations.len() as f64;
    (100.0 - avg_variation * 100.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;
    use chrono::Duration;

    fn series(values: &[i64]) -> Vec<DailyActivityRecord> {
        let start = parse_date("2024-01-01").unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| DailyActivityRecord::new(start + Duration::days(i as i64), v, 1))
            .collect()
    }

    #[test]
    fn test_insufficient_data() {
        for n in 0..MIN_RECORDS {
            let result = analyze_growth(&series(&vec![10; n]));
            assert!(result.insufficient_data);
            assert_eq!(result.trend, GrowthTrendKind::Stagnant);
        }
        assert!(!analyze_growth(&series(&[10; 7])).insufficient_data);
    }

    #[test]
    fn test_accelerating() {
        let result = analyze_growth(&series(&[10, 10, 10, 10, 15, 15, 15, 15]));
        assert_eq!(result.first_half_total, 40);
        assert_eq!(result.second_half_total, 60);
        assert_eq!(result.change, 20);
        assert_eq!(result.change_percent, 50.0);
        assert_eq!(result.direction, Direction::Up);
        assert_eq!(result.trend, GrowthTrendKind::Accelerating);
    }

    #[test]
    fn test_declining() {
        let result = analyze_growth(&series(&[20, 20, 20, 20, 10, 10, 10, 10]));
        assert_eq!(result.change_percent, -50.0);
        assert_eq!(result.direction, Direction::Down);
        assert_eq!(result.trend, GrowthTrendKind::Declining);
    }

    #[test]
    fn test_moderate_change_is_steady_with_direction() {
        let result = analyze_growth(&series(&[10, 10, 10, 10, 11, 11, 11, 11]));
        assert_eq!(result.change_percent, 10.0);
        assert_eq!(result.direction, Direction::Up);
        assert_eq!(result.trend, GrowthTrendKind::Steady);
    }

    #[test]
    fn test_flat_is_stable() {
        let result = analyze_growth(&series(&[10; 8]));
        assert_eq!(result.direction, Direction::Stable);
        assert_eq!(result.trend, GrowthTrendKind::Steady);
        assert_eq!(result.consistency, 100.0);
    }

    #[test]
    fn test_silent_first_half() {
        let result = analyze_growth(&series(&[0, 0, 0, 0, 5, 5, 5, 5]));
        assert_eq!(result.change_percent, 0.0);
        assert_eq!(result.direction, Direction::Stable);
    }

    #[test]
    fn test_consistency() {
        // every step doubles or halves: variations 1.0, 0.5, 1.0, 0.5, ...
        let erratic = analyze_growth(&series(&[10, 20, 10, 20, 10, 20, 10]));
        assert_eq!(erratic.consistency, 25.0);

        let wild = analyze_growth(&series(&[1, 10, 1, 10, 1, 10, 1]));
        assert_eq!(wild.consistency, 0.0);
    }
}
