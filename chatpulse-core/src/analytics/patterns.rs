//! When a group talks: hour-of-day and weekday distributions, streaks.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::AnalysisWindow;

/// Time-based activity patterns for a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPatterns {
    /// Messages by hour of day (0-23), summed over the window
    pub hourly_distribution: [i64; 24],
    /// Busiest hour; None when no hourly data was supplied
    pub peak_hour: Option<u8>,
    /// Messages by weekday (0=Monday, 6=Sunday)
    pub weekday_distribution: [i64; 7],
    /// Busiest weekday (0=Monday); None for a silent window
    pub busiest_weekday: Option<u8>,
    pub streaks: StreakStats,
}

/// Streaks of consecutive days with at least one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakStats {
    /// Streak ending on the last day of the period
    pub current_streak_days: i64,
    pub longest_streak_days: i64,
    pub longest_streak_start: Option<NaiveDate>,
    pub active_days: i64,
    pub total_days: i64,
}

impl StreakStats {
    /// Share of days with activity.
    pub fn activity_percentage(&self) -> f64 {
        if self.total_days == 0 {
            0.0
        } else {
            (self.active_days as f64 / self.total_days as f64) * 100.0
        }
    }
}

impl ActivityPatterns {
    /// Get weekday name from index.
    pub fn weekday_name(day: u8) -> &'static str {
        match day {
            0 => "Monday",
            1 => "Tuesday",
            2 => "Wednesday",
            3 => "Thursday",
            4 => "Friday",
            5 => "Saturday",
            6 => "Sunday",
            _ => "Unknown",
        }
    }

    /// Format an hour for display (e.g., "2-3pm").
    pub fn hour_display(hour: u8) -> String {
        let format_hour = |h: u8| -> String {
            match h {
                0 => "12am".to_string(),
                1..=11 => format!("{}am", h),
                12 => "12pm".to_string(),
                13..=23 => format!("{}pm", h - 12),
                _ => format!("{}h", h),
            }
        };
        format!("{}-{}", format_hour(hour), format_hour((hour + 1) % 24))
    }
}

pub fn analyze_patterns(window: &AnalysisWindow) -> ActivityPatterns {
    let mut hourly_distribution = [0i64; 24];
    let mut weekday_distribution = [0i64; 7];

    for record in window.daily() {
        for (&hour, &count) in &record.hourly_activity {
            if let Some(slot) = hourly_distribution.get_mut(hour as usize) {
                *slot += count;
            }
        }
        weekday_distribution[record.date.weekday().num_days_from_monday() as usize] +=
            record.total_messages;
    }

    ActivityPatterns {
        hourly_distribution,
        peak_hour: first_max(&hourly_distribution).map(|h| h as u8),
        weekday_distribution,
        busiest_weekday: first_max(&weekday_distribution).map(|d| d as u8),
        streaks: calculate_streaks(window),
    }
}

/// Index of the first strictly positive maximum.
fn first_max(values: &[i64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, &v) in values.iter().enumerate() {
        if v > 0 && best.map_or(true, |b| v > values[b]) {
            best = Some(i);
        }
    }
    best
}

/// Walk every calendar day of the period; days without a record are quiet.
fn calculate_streaks(window: &AnalysisWindow) -> StreakStats {
    let by_date: HashMap<NaiveDate, i64> = window
        .daily()
        .iter()
        .map(|r| (r.date, r.total_messages))
        .collect();

    let mut stats = StreakStats {
        total_days: window.period().day_count,
        ..Default::default()
    };
    let mut streak = 0i64;
    let mut streak_start: Option<NaiveDate> = None;

    for day in window.period().range().days() {
        if by_date.get(&day).copied().unwrap_or(0) > 0 {
            stats.active_days += 1;
            if streak == 0 {
                streak_start = Some(day);
            }
            streak += 1;
            if streak > stats.longest_streak_days {
                stats.longest_streak_days = streak;
                stats.longest_streak_start = streak_start;
            }
        } else {
            streak = 0;
        }
    }
    // the running streak at the end of the loop is the one touching `end`
    stats.current_streak_days = streak;

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;
    use crate::types::DailyActivityRecord;
    use chrono::Duration;

    fn window(values: &[i64]) -> AnalysisWindow {
        // 2024-01-01 is a Monday
        let start = parse_date("2024-01-01").unwrap();
        let daily = values
            .iter()
            .enumerate()
            .map(|(i, &v)| DailyActivityRecord::new(start + Duration::days(i as i64), v, 1))
            .collect();
        AnalysisWindow::new(
            "g1",
            "Group",
            start,
            start + Duration::days(values.len() as i64 - 1),
            daily,
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_streaks() {
        let patterns = analyze_patterns(&window(&[1, 1, 0, 1, 1, 1, 0, 2, 3]));
        let streaks = &patterns.streaks;
        assert_eq!(streaks.longest_streak_days, 3);
        assert_eq!(streaks.longest_streak_start, Some(parse_date("2024-01-04").unwrap()));
        assert_eq!(streaks.current_streak_days, 2);
        assert_eq!(streaks.active_days, 7);
        assert_eq!(streaks.total_days, 9);
    }

    #[test]
    fn test_streak_broken_at_end() {
        let patterns = analyze_patterns(&window(&[1, 1, 1, 0]));
        assert_eq!(patterns.streaks.current_streak_days, 0);
        assert_eq!(patterns.streaks.longest_streak_days, 3);
        assert_eq!(patterns.streaks.activity_percentage(), 75.0);
    }

    #[test]
    fn test_weekday_distribution() {
        let patterns = analyze_patterns(&window(&[5, 1, 1, 1, 1, 9, 1, 5]));
        // Monday appears twice: 5 + 5
        assert_eq!(patterns.weekday_distribution[0], 10);
        assert_eq!(patterns.weekday_distribution[5], 9);
        assert_eq!(patterns.busiest_weekday, Some(0));
        assert_eq!(ActivityPatterns::weekday_name(0), "Monday");
    }

    #[test]
    fn test_hourly_distribution() {
        let mut w = window(&[10, 10]);
        assert_eq!(analyze_patterns(&w).peak_hour, None);

        let start = parse_date("2024-01-01").unwrap();
        let mut first = DailyActivityRecord::new(start, 10, 1);
        first.hourly_activity.insert(9, 4);
        first.hourly_activity.insert(21, 6);
        let mut second = DailyActivityRecord::new(start + Duration::days(1), 10, 1);
        second.hourly_activity.insert(9, 7);
        second.hourly_activity.insert(22, 3);
        w = AnalysisWindow::new(
            "g1",
            "Group",
            start,
            start + Duration::days(1),
            vec![first, second],
            vec![],
        )
        .unwrap();

        let patterns = analyze_patterns(&w);
        assert_eq!(patterns.hourly_distribution[9], 11);
        assert_eq!(patterns.hourly_distribution[21], 6);
        assert_eq!(patterns.peak_hour, Some(9));
    }

    #[test]
    fn test_hour_display() {
        assert_eq!(ActivityPatterns::hour_display(0), "12am-1am");
        assert_eq!(ActivityPatterns::hour_display(14), "2pm-3pm");
        assert_eq!(ActivityPatterns::hour_display(23), "11pm-12am");
    }
}
