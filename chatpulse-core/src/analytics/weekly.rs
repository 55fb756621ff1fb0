//! Week-level view of a window.
//!
//! Weeks are consecutive 7-day spans starting at the period start, not
//! calendar weeks. Averages divide by the days in the span, so a day without a
//! record counts as a quiet day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::stats::round_to;
use crate::dates::DateRange;
use crate::types::{AnalysisWindow, DailyActivityRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakDay {
    pub date: NaiveDate,
    pub total_messages: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub week: DateRange,
    pub day_count: i64,
    /// Daily records that fell in this week
    pub records: usize,
    pub total_messages: i64,
    pub avg_messages: f64,
    pub avg_active_members: f64,
    /// Busiest day of the week, first one wins on ties
    pub peak_day: Option<PeakDay>,
}

pub fn aggregate_weeks(window: &AnalysisWindow) -> Vec<WeeklySummary> {
    let mut remaining = window.daily();
    window
        .period()
        .range()
        .weeks()
        .into_iter()
        .map(|week| {
            let split = remaining
                .iter()
                .position(|r| r.date > week.end)
                .unwrap_or(remaining.len());
            let (in_week, rest) = remaining.split_at(split);
            remaining = rest;
            summarize_week(week, in_week)
        })
        .collect()
}

fn summarize_week(week: DateRange, records: &[DailyActivityRecord]) -> WeeklySummary {
    let day_count = week.day_count();
    let total_messages: i64 = records.iter().map(|r| r.total_messages).sum();
    let active: i64 = records.iter().map(|r| r.active_members).sum();

    let mut peak_day: Option<PeakDay> = None;
    for record in records {
        if peak_day.map_or(true, |p| record.total_messages > p.total_messages) {
            peak_day = Some(PeakDay {
                date: record.date,
                total_messages: record.total_messages,
            });
        }
    }

    WeeklySummary {
        week,
        day_count,
        records: records.len(),
        total_messages,
        avg_messages: round_to(total_messages as f64 / day_count as f64, 1),
        avg_active_members: round_to(active as f64 / day_count as f64, 1),
        peak_day,
    }
}
