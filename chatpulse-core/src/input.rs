//! Window documents handed over by the data-access layer.
//!
//! The document keeps dates as strings and counts as signed integers so that
//! bad input surfaces as [`Error::DateParse`] or [`Error::InvalidWindow`]
//! instead of a generic decode failure.
//!
//! ```json
//! {
//!   "group_id": "g-42",
//!   "group_name": "Book Club",
//!   "period": { "start": "2024-01-01", "end": "2024-01-30" },
//!   "daily": [
//!     { "date": "2024-01-01", "total_messages": 120, "active_members": 8,
//!       "hourly_activity": { "9": 30, "21": 90 } }
//!   ],
//!   "members": [
//!     { "name": "Ana", "message_count": 64, "word_count": 900, "media_count": 3,
//!       "daily_breakdown": [ { "date": "2024-01-01", "message_count": 12 } ] }
//!   ]
//! }
//! ```

use crate::dates::parse_date;
use crate::error::{Error, Result};
use crate::types::{AnalysisWindow, DailyActivityRecord, DailyMessageCount, MemberActivityRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowDocument {
    pub group_id: String,
    #[serde(default)]
    pub group_name: String,
    pub period: PeriodDocument,
    #[serde(default)]
    pub daily: Vec<DailyDocument>,
    #[serde(default)]
    pub members: Vec<MemberDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodDocument {
    pub start: String,
    pub end: String,
    /// Optional; checked against `end - start + 1` when present
    #[serde(default)]
    pub day_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyDocument {
    pub date: String,
    pub total_messages: i64,
    pub active_members: i64,
    #[serde(default)]
    pub hourly_activity: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDocument {
    pub name: String,
    pub message_count: i64,
    #[serde(default)]
    pub word_count: i64,
    #[serde(default)]
    pub media_count: i64,
    #[serde(default)]
    pub daily_breakdown: Vec<DailyCountDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyCountDocument {
    pub date: String,
    pub message_count: i64,
}

impl WindowDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse dates and validate into an [`AnalysisWindow`].
    pub fn into_window(self) -> Result<AnalysisWindow> {
        let start = parse_date(&self.period.start)?;
        let end = parse_date(&self.period.end)?;

        if let Some(claimed) = self.period.day_count {
            let actual = (end - start).num_days() + 1;
            if claimed != actual {
                return Err(Error::InvalidWindow(format!(
                    "period day_count {} does not match {} .. {} ({} days)",
                    claimed, start, end, actual
                )));
            }
        }

        let daily = self
            .daily
            .into_iter()
            .map(DailyDocument::into_record)
            .collect::<Result<Vec<_>>>()?;
        let members = self
            .members
            .into_iter()
            .map(MemberDocument::into_record)
            .collect::<Result<Vec<_>>>()?;

        AnalysisWindow::new(self.group_id, self.group_name, start, end, daily, members)
    }
}

impl DailyDocument {
    fn into_record(self) -> Result<DailyActivityRecord> {
        let date = parse_date(&self.date)?;
        let mut hourly_activity = BTreeMap::new();
        for (label, count) in self.hourly_activity {
            let hour: u8 = label.trim().parse().map_err(|_| {
                Error::InvalidWindow(format!("invalid hour label {:?} on {}", label, date))
            })?;
            hourly_activity.insert(hour, count);
        }
        Ok(DailyActivityRecord {
            date,
            total_messages: self.total_messages,
            active_members: self.active_members,
            hourly_activity,
        })
    }
}

impl MemberDocument {
    fn into_record(self) -> Result<MemberActivityRecord> {
        let daily_breakdown = self
            .daily_breakdown
            .into_iter()
            .map(|entry| {
                Ok(DailyMessageCount {
                    date: parse_date(&entry.date)?,
                    message_count: entry.message_count,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(MemberActivityRecord {
            name: self.name,
            message_count: self.message_count,
            word_count: self.word_count,
            media_count: self.media_count,
            daily_breakdown,
        })
    }
}

/// Read and validate a window document from disk.
pub fn load_window(path: &Path) -> Result<AnalysisWindow> {
    let window = WindowDocument::from_path(path)?.into_window()?;
    tracing::debug!(
        path = %path.display(),
        group_id = window.group_id(),
        days = window.daily().len(),
        members = window.members().len(),
        "Loaded analysis window"
    );
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "group_id": "g-42",
        "group_name": "Book Club",
        "period": { "start": "2024-01-01", "end": "2024-01-03", "day_count": 3 },
        "daily": [
            { "date": "2024-01-01", "total_messages": 12, "active_members": 2,
              "hourly_activity": { "9": 4, "21": 8 } },
            { "date": "2024-01-03", "total_messages": 5, "active_members": 1 }
        ],
        "members": [
            { "name": "Ana", "message_count": 10,
              "daily_breakdown": [
                { "date": "2024-01-01", "message_count": 6 },
                { "date": "2024-01-03", "message_count": 4 }
              ] },
            { "name": "Ben", "message_count": 6,
              "daily_breakdown": [ { "date": "2024-01-01", "message_count": 6 } ] }
        ]
    }"#;

    #[test]
    fn test_into_window() {
        let window = WindowDocument::from_json(SAMPLE)
            .unwrap()
            .into_window()
            .unwrap();
        assert_eq!(window.group_name(), "Book Club");
        assert_eq!(window.period().day_count, 3);
        assert_eq!(window.daily()[0].hourly_activity.get(&21), Some(&8));
        assert_eq!(window.members()[1].daily_breakdown.len(), 1);
    }

    #[test]
    fn test_malformed_date_is_date_parse_error() {
        let json = SAMPLE.replace("\"2024-01-03\", \"day_count\"", "\"01/03/2024\", \"day_count\"");
        let err = WindowDocument::from_json(&json)
            .unwrap()
            .into_window()
            .unwrap_err();
        assert!(matches!(err, Error::DateParse { .. }), "got {err:?}");
    }

    #[test]
    fn test_day_count_mismatch() {
        let json = SAMPLE.replace("\"day_count\": 3", "\"day_count\": 4");
        let err = WindowDocument::from_json(&json)
            .unwrap()
            .into_window()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidWindow(_)));
    }

    #[test]
    fn test_bad_hour_label() {
        let json = SAMPLE.replace("\"9\": 4", "\"morning\": 4");
        let err = WindowDocument::from_json(&json)
            .unwrap()
            .into_window()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidWindow(_)));
    }

    #[test]
    fn test_negative_count() {
        let json = SAMPLE.replace("\"total_messages\": 5", "\"total_messages\": -5");
        let err = WindowDocument::from_json(&json)
            .unwrap()
            .into_window()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidWindow(_)));
    }
}
