//! Busiest day of a window and how far it stands out.
//!
//! ## Metrics Produced
//!
//! | Field | Description |
//! |-------|-------------|
//! | `peak_messages` | Highest daily `total_messages` (first occurrence wins) |
//! | `average` | Mean of every *other* day, 0 when the peak is the only day |
//! | `ratio` | `peak / average` to one decimal, 1 when `average` is 0 |
//! | `intensity` | low / medium / high / extreme from `ratio` |
//! | `improvement_percent` | `(peak - average) / average * 100`, rounded |
//! | `estimated_duration_hours` | `min(round(ratio * 2), 12)` |
//! | `peak_hour` | Busiest hour of the peak day, when hourly data exists |
//!
//! `estimated_duration_hours` is a heuristic derived from the ratio alone. It
//! is not measured from hourly activity and should be presented as an
//! estimate. `peak_hour` is the measured counterpart.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::stats::{mean, round_int, round_to};
use crate::types::DailyActivityRecord;

/// Upper bound on the duration heuristic.
const MAX_ESTIMATED_HOURS: i64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakIntensity {
    Low,
    Medium,
    High,
    Extreme,
}

impl PeakIntensity {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= 5.0 {
            PeakIntensity::Extreme
        } else if ratio >= 3.0 {
            PeakIntensity::High
        } else if ratio >= 2.0 {
            PeakIntensity::Medium
        } else {
            PeakIntensity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeakIntensity::Low => "low",
            PeakIntensity::Medium => "medium",
            PeakIntensity::High => "high",
            PeakIntensity::Extreme => "extreme",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakResult {
    /// Date of the peak; None for an empty window
    pub date: Option<NaiveDate>,
    pub peak_messages: i64,
    pub average: f64,
    pub ratio: f64,
    pub intensity: PeakIntensity,
    pub estimated_duration_hours: i64,
    pub improvement_percent: i64,
    pub peak_hour: Option<u8>,
}

impl Default for PeakResult {
    fn default() -> Self {
        Self {
            date: None,
            peak_messages: 0,
            average: 0.0,
            ratio: 1.0,
            intensity: PeakIntensity::Low,
            estimated_duration_hours: duration_heuristic(1.0),
            improvement_percent: 0,
            peak_hour: None,
        }
    }
}

fn duration_heuristic(ratio: f64) -> i64 {
    round_int(ratio * 2.0).min(MAX_ESTIMATED_HOURS)
}

/// Find the peak day. An empty slice yields [`PeakResult::default`].
pub fn detect_peak(daily: &[DailyActivityRecord]) -> PeakResult {
    let mut peak_index: Option<usize> = None;
    for (i, record) in daily.iter().enumerate() {
        if peak_index.map_or(true, |p| record.total_messages > daily[p].total_messages) {
            peak_index = Some(i);
        }
    }
    let Some(peak_index) = peak_index else {
        return PeakResult::default();
    };
    let peak = &daily[peak_index];

    let others: Vec<f64> = daily
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != peak_index)
        .map(|(_, r)| r.total_messages as f64)
        .collect();
    let average = mean(&others);
    let peak_value = peak.total_messages as f64;

    let (ratio, improvement_percent) = if average > 0.0 {
        (
            round_to(peak_value / average, 1),
            round_int((peak_value - average) / average * 100.0),
        )
    } else {
        (1.0, 0)
    };

    PeakResult {
        date: Some(peak.date),
        peak_messages: peak.total_messages,
        average,
        ratio,
        intensity: PeakIntensity::from_ratio(ratio),
        estimated_duration_hours: duration_heuristic(ratio),
        improvement_percent,
        peak_hour: peak.peak_hour(),
    }
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
    fn test_extreme_peak() {
        let result = detect_peak(&series(&[10, 10, 100, 10]));
        assert_eq!(result.peak_messages, 100);
        assert_eq!(result.date, Some(parse_date("2024-01-03").unwrap()));
        assert_eq!(result.average, 10.0);
        assert_eq!(result.ratio, 10.0);
        assert_eq!(result.intensity, PeakIntensity::Extreme);
        assert_eq!(result.improvement_percent, 900);
        assert_eq!(result.estimated_duration_hours, 12);
    }

    #[test]
    fn test_empty_is_defined_zero_result() {
        let result = detect_peak(&[]);
        assert_eq!(result, PeakResult::default());
        assert_eq!(result.date, None);
        assert_eq!(result.ratio, 1.0);
    }

    #[test]
    fn test_single_day_has_no_average() {
        let result = detect_peak(&series(&[40]));
        assert_eq!(result.peak_messages, 40);
        assert_eq!(result.average, 0.0);
        assert_eq!(result.ratio, 1.0);
        assert_eq!(result.improvement_percent, 0);
        assert_eq!(result.intensity, PeakIntensity::Low);
    }

    #[test]
    fn test_first_occurrence_wins_ties() {
        let result = detect_peak(&series(&[5, 30, 30, 5]));
        assert_eq!(result.date, Some(parse_date("2024-01-02").unwrap()));
        // average over the other three days includes the tied day
        assert!((result.average - 40.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_never_below_one() {
        for values in [vec![1, 2, 3], vec![7, 7, 7], vec![0, 9, 1, 1], vec![3, 0]] {
            let result = detect_peak(&series(&values));
            if result.average > 0.0 {
                assert!(result.ratio >= 1.0, "ratio {} for {:?}", result.ratio, values);
            }
        }
    }

    #[test]
    fn test_intensity_buckets() {
        assert_eq!(PeakIntensity::from_ratio(1.9), PeakIntensity::Low);
        assert_eq!(PeakIntensity::from_ratio(2.0), PeakIntensity::Medium);
        assert_eq!(PeakIntensity::from_ratio(3.0), PeakIntensity::High);
        assert_eq!(PeakIntensity::from_ratio(4.9), PeakIntensity::High);
        assert_eq!(PeakIntensity::from_ratio(5.0), PeakIntensity::Extreme);
    }

    #[test]
    fn test_duration_heuristic_is_capped() {
        let result = detect_peak(&series(&[10, 25]));
        assert_eq!(result.ratio, 2.5);
        assert_eq!(result.estimated_duration_hours, 5);
        assert_eq!(result.intensity, PeakIntensity::Medium);
        assert_eq!(result.improvement_percent, 150);
    }

    #[test]
    fn test_peak_hour_reported() {
        let mut records = series(&[10, 50]);
        records[1].hourly_activity.insert(20, 35);
        records[1].hourly_activity.insert(8, 15);
        assert_eq!(detect_peak(&records).peak_hour, Some(20));
    }
}
