//! Date range helpers shared by the analyzers.
//!
//! Ranges are inclusive on both ends: a range from Jan 1 to Jan 1 covers one
//! day.

use crate::error::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Wire format for calendar days.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const DATE_FORMAT_HINT: &str = "YYYY-MM-DD";

/// Parse a `YYYY-MM-DD` calendar day.
///
/// Anything else fails with [`Error::DateParse`] instead of being coerced into
/// a neighbouring bucket.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|_| Error::DateParse {
        input: input.to_string(),
        expected: DATE_FORMAT_HINT,
    })
}

/// Format a day for display (e.g., "Mar 04").
pub fn format_day(date: NaiveDate) -> String {
    date.format("%b %d").to_string()
}

/// Inclusive span of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(Error::InvalidWindow(format!(
                "range end {} is before start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Number of days covered, counting both ends.
    pub fn day_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Split into two contiguous halves.
    ///
    /// The first half holds `floor(day_count / 2)` days, so a one-day range
    /// has no first half and odd ranges give the extra day to the second.
    pub fn bisect(&self) -> (Option<DateRange>, DateRange) {
        let first_len = self.day_count() / 2;
        if first_len == 0 {
            return (None, *self);
        }
        let first_end = self.start + Duration::days(first_len - 1);
        let first = DateRange {
            start: self.start,
            end: first_end,
        };
        let second = DateRange {
            start: first_end + Duration::days(1),
            end: self.end,
        };
        (Some(first), second)
    }

    /// Consecutive 7-day spans starting at `start`; the last may be shorter.
    pub fn weeks(&self) -> Vec<DateRange> {
        let mut weeks = Vec::with_capacity((self.day_count() as usize + 6) / 7);
        let mut cursor = Some(self.start);
        while let Some(start) = cursor.filter(|c| *c <= self.end) {
            let week_end = start
                .checked_add_signed(Duration::days(6))
                .map_or(self.end, |end| end.min(self.end));
            weeks.push(DateRange {
                start,
                end: week_end,
            });
            cursor = week_end.checked_add_signed(Duration::days(1));
        }
        weeks
    }

    /// Iterate every day in the range.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.day_count()).map(move |offset| start + Duration::days(offset))
    }

    /// Format for display (e.g., "Jan 01 - Jan 15, 2024").
    ///
    /// The year is repeated on both ends when the range crosses a year.
    pub fn display(&self) -> String {
        if self.start.year() == self.end.year() {
            format!(
                "{} - {}, {}",
                format_day(self.start),
                format_day(self.end),
                self.end.year()
            )
        } else {
            format!(
                "{}, {} - {}, {}",
                format_day(self.start),
                self.start.year(),
                format_day(self.end),
                self.end.year()
            )
        }
    }
}
