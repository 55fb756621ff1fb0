//! First half vs second half of a window.
//!
//! The record sequence is cut at `floor(day_count / 2)` records. The cut is by
//! record order, so with gaps in the data the halves need not cover the same
//! number of calendar days.

use serde::{Deserialize, Serialize};

use super::stats::round_int;
use crate::dates::DateRange;
use crate::types::{AnalysisWindow, DailyActivityRecord, Period};

/// Aggregates for one half of the window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HalfSummary {
    /// First and last record dates in this half (None when empty)
    pub span: Option<DateRange>,
    /// Number of daily records in this half
    pub records: usize,
    /// Sum of `total_messages`
    pub messages: i64,
    /// Mean `active_members` per record, rounded
    pub members: i64,
    /// Mean messages per record, rounded
    pub avg_daily: i64,
}

impl HalfSummary {
    fn from_records(records: &[DailyActivityRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }
        let len = records.len() as f64;
        let messages: i64 = records.iter().map(|r| r.total_messages).sum();
        let active: i64 = records.iter().map(|r| r.active_members).sum();

        Self {
            span: Some(DateRange {
                start: records[0].date,
                end: records[records.len() - 1].date,
            }),
            records: records.len(),
            messages,
            members: round_int(active as f64 / len),
            avg_daily: round_int(messages as f64 / len),
        }
    }
}

/// Change from the first half to the second.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodChange {
    /// `second.messages - first.messages`
    pub messages: i64,
    /// Rounded percentage relative to the first half
    pub percent_change: i64,
}

impl PeriodChange {
    /// Percent change with the zero-baseline fallbacks.
    ///
    /// A quiet first half followed by any activity reads as +100%; two quiet
    /// halves read as 0%.
    pub fn calc_percent(first: i64, second: i64) -> i64 {
        if first > 0 {
            round_int((second - first) as f64 / first as f64 * 100.0)
        } else if second > 0 {
            100
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub first_half: HalfSummary,
    pub second_half: HalfSummary,
    pub change: PeriodChange,
}

impl PeriodComparison {
    pub fn for_window(window: &AnalysisWindow) -> Self {
        compare_periods(window.daily(), window.period())
    }
}

/// Compare the first and second half of `daily` over `period`.
pub fn compare_periods(daily: &[DailyActivityRecord], period: &Period) -> PeriodComparison {
    let midpoint = ((period.day_count.max(0) / 2) as usize).min(daily.len());
    let (first, second) = daily.split_at(midpoint);

    let first_half = HalfSummary::from_records(first);
    let second_half = HalfSummary::from_records(second);
    let change = PeriodChange {
        messages: second_half.messages - first_half.messages,
        percent_change: PeriodChange::calc_percent(first_half.messages, second_half.messages),
    };

    tracing::debug!(
        midpoint,
        first = first_half.messages,
        second = second_half.messages,
        percent_change = change.percent_change,
        "Compared window halves"
    );

    PeriodComparison {
        first_half,
        second_half,
        change,
    }
}
