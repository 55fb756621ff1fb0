//! Statistically abnormal days.
//!
//! Each day's `total_messages` is scored against the window's population mean
//! and standard deviation. Days beyond the z-score threshold are reported as
//! spikes (above the mean) or drops (below it). A flat series has zero
//! deviation and is never anomalous.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::stats::{mean, population_std_dev};
use crate::types::DailyActivityRecord;

/// Days needed before anything is scored.
pub const MIN_RECORDS: usize = 3;

/// Default `|z|` above which a day is anomalous.
pub const DEFAULT_Z_THRESHOLD: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    Spike,
    Drop,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyKind::Spike => "spike",
            AnomalyKind::Drop => "drop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub date: NaiveDate,
    pub value: i64,
    /// Window mean of `total_messages`
    pub average: f64,
    /// Window population standard deviation
    pub stddev: f64,
    pub z_score: f64,
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
}

/// Flag days whose `|z| > z_threshold`, in date order.
///
/// Returns an empty list for fewer than [`MIN_RECORDS`] days.
pub fn detect_anomalies(daily: &[DailyActivityRecord], z_threshold: f64) -> Vec<Anomaly> {
    if daily.len() < MIN_RECORDS {
        return Vec::new();
    }

    let values: Vec<f64> = daily.iter().map(|r| r.total_messages as f64).collect();
    let average = mean(&values);
    let stddev = population_std_dev(&values, average);
    if stddev == 0.0 {
        return Vec::new();
    }

    let anomalies: Vec<Anomaly> = daily
        .iter()
        .zip(&values)
        .filter_map(|(record, &value)| {
            let z_score = (value - average) / stddev;
            if z_score.abs() <= z_threshold {
                return None;
            }
            Some(Anomaly {
                date: record.date,
                value: record.total_messages,
                average,
                stddev,
                z_score,
                kind: if z_score > 0.0 {
                    AnomalyKind::Spike
                } else {
                    AnomalyKind::Drop
                },
            })
        })
        .collect();

    if !anomalies.is_empty() {
        tracing::debug!(
            count = anomalies.len(),
            average,
            stddev,
            "Detected anomalous days"
        );
    }

    anomalies
}
