//! Core domain types for chatpulse
//!
//! An [`AnalysisWindow`] is the immutable snapshot of one group's activity
//! over one date range. Every analyzer borrows it read-only; nothing in the
//! core mutates it after construction.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Group** | A chat group whose exported log was aggregated into counters |
//! | **Member** | A participant, keyed by display name |
//! | **Daily record** | Counters for one calendar day of the group |
//! | **Window** | The daily and member records for one date range |
//!
//! ### Group totals vs member totals
//!
//! A day's `total_messages` need not equal the sum of member message counts.
//! System notices and unattributed messages are counted by the group but by no
//! member, so the two totals are never reconciled.
//!
//! ### Member identity
//!
//! Members are keyed by display name. Two people sharing a name collapse into
//! one record and a rename splits one person into two; the aggregation step
//! upstream owns that trade-off. A window carrying the same name twice is
//! rejected.

use crate::dates::DateRange;
use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

// ============================================
// Daily records
// ============================================

/// Counters for one calendar day of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyActivityRecord {
    pub date: NaiveDate,
    pub total_messages: i64,
    pub active_members: i64,
    /// Messages per hour of day (0-23). Hours without messages may be absent.
    #[serde(default)]
    pub hourly_activity: BTreeMap<u8, i64>,
}

impl DailyActivityRecord {
    /// Record without hourly detail.
    pub fn new(date: NaiveDate, total_messages: i64, active_members: i64) -> Self {
        Self {
            date,
            total_messages,
            active_members,
            hourly_activity: BTreeMap::new(),
        }
    }

    /// Busiest hour of the day, first one wins on ties.
    pub fn peak_hour(&self) -> Option<u8> {
        let mut best: Option<(u8, i64)> = None;
        for (&hour, &count) in &self.hourly_activity {
            if count > 0 && best.map_or(true, |(_, c)| count > c) {
                best = Some((hour, count));
            }
        }
        best.map(|(hour, _)| hour)
    }
}

// ============================================
// Member records
// ============================================

/// Messages a member sent on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMessageCount {
    pub date: NaiveDate,
    pub message_count: i64,
}

/// Activity totals for one member over the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberActivityRecord {
    /// Display name, also used as the member key
    pub name: String,
    pub message_count: i64,
    #[serde(default)]
    pub word_count: i64,
    #[serde(default)]
    pub media_count: i64,
    #[serde(default)]
    pub daily_breakdown: Vec<DailyMessageCount>,
}

impl MemberActivityRecord {
    /// Member with only a message count.
    pub fn new(name: impl Into<String>, message_count: i64) -> Self {
        Self {
            name: name.into(),
            message_count,
            word_count: 0,
            media_count: 0,
            daily_breakdown: Vec::new(),
        }
    }
}

// ============================================
// Period
// ============================================

/// Inclusive date range of a window, with its day count precomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// `end - start + 1`
    pub day_count: i64,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let range = DateRange::new(start, end)?;
        Ok(Self::from(range))
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start,
            end: self.end,
        }
    }
}

impl From<DateRange> for Period {
    fn from(range: DateRange) -> Self {
        Self {
            start: range.start,
            end: range.end,
            day_count: range.day_count(),
        }
    }
}

// ============================================
// Analysis window
// ============================================

/// One group's activity over one date range.
///
/// Construction validates the input; afterwards the window is read-only.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisWindow {
    group_id: String,
    group_name: String,
    period: Period,
    daily: Vec<DailyActivityRecord>,
    members: Vec<MemberActivityRecord>,
}

impl AnalysisWindow {
    /// Validate and build a window.
    ///
    /// Fails with [`Error::InvalidWindow`] when `end < start`, a count is
    /// negative, a daily record falls outside the period, daily dates are not
    /// strictly ascending, a member name repeats, an hour key exceeds 23, or
    /// a day reports more active members than the member breakdowns account
    /// for. Windows whose message totals would overflow an `i64` are rejected
    /// too.
    pub fn new(
        group_id: impl Into<String>,
        group_name: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        daily: Vec<DailyActivityRecord>,
        members: Vec<MemberActivityRecord>,
    ) -> Result<Self> {
        let period = Period::new(start, end)?;
        let range = period.range();

        validate_daily(&daily, &range)?;
        validate_members(&members, &range)?;
        validate_active_members(&daily, &members)?;
        validate_totals(&daily, &members)?;

        Ok(Self {
            group_id: group_id.into(),
            group_name: group_name.into(),
            period,
            daily,
            members,
        })
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn period(&self) -> &Period {
        &self.period
    }

    /// Daily records in ascending date order.
    pub fn daily(&self) -> &[DailyActivityRecord] {
        &self.daily
    }

    pub fn members(&self) -> &[MemberActivityRecord] {
        &self.members
    }

    /// Sum of group-level daily message counts.
    pub fn total_messages(&self) -> i64 {
        self.daily.iter().map(|d| d.total_messages).sum()
    }
}

fn validate_daily(daily: &[DailyActivityRecord], range: &DateRange) -> Result<()> {
    let mut previous: Option<NaiveDate> = None;
    for record in daily {
        if !range.contains(record.date) {
            return Err(Error::InvalidWindow(format!(
                "daily record {} lies outside {} .. {}",
                record.date, range.start, range.end
            )));
        }
        if let Some(prev) = previous {
            if record.date <= prev {
                return Err(Error::InvalidWindow(format!(
                    "daily record {} is not after {}",
                    record.date, prev
                )));
            }
        }
        previous = Some(record.date);

        if record.total_messages < 0 || record.active_members < 0 {
            return Err(Error::InvalidWindow(format!(
                "negative count on {}",
                record.date
            )));
        }
        for (&hour, &count) in &record.hourly_activity {
            if hour > 23 {
                return Err(Error::InvalidWindow(format!(
                    "hour {} out of range on {}",
                    hour, record.date
                )));
            }
            if count < 0 {
                return Err(Error::InvalidWindow(format!(
                    "negative hourly count at hour {} on {}",
                    hour, record.date
                )));
            }
        }
    }
    Ok(())
}

fn validate_members(members: &[MemberActivityRecord], range: &DateRange) -> Result<()> {
    let mut names = HashSet::new();
    for member in members {
        // display name is the member key
        if !names.insert(member.name.as_str()) {
            return Err(Error::InvalidWindow(format!(
                "duplicate member {:?}",
                member.name
            )));
        }
        if member.message_count < 0 || member.word_count < 0 || member.media_count < 0 {
            return Err(Error::InvalidWindow(format!(
                "negative count for member {:?}",
                member.name
            )));
        }
        for entry in &member.daily_breakdown {
            if entry.message_count < 0 {
                return Err(Error::InvalidWindow(format!(
                    "negative daily count for member {:?} on {}",
                    member.name, entry.date
                )));
            }
            if !range.contains(entry.date) {
                return Err(Error::InvalidWindow(format!(
                    "member {:?} has activity on {} outside the window",
                    member.name, entry.date
                )));
            }
        }
    }
    Ok(())
}

/// Every total an analyzer takes over the window must fit in an `i64`.
fn validate_totals(
    daily: &[DailyActivityRecord],
    members: &[MemberActivityRecord],
) -> Result<()> {
    checked_total(daily.iter().map(|d| d.total_messages))?;
    checked_total(daily.iter().map(|d| d.active_members))?;
    checked_total(daily.iter().flat_map(|d| d.hourly_activity.values().copied()))?;
    checked_total(members.iter().map(|m| m.message_count))?;
    Ok(())
}

fn checked_total(mut counts: impl Iterator<Item = i64>) -> Result<i64> {
    counts.try_fold(0i64, |acc, n| {
        acc.checked_add(n)
            .ok_or_else(|| Error::InvalidWindow("counts overflow".to_string()))
    })
}

/// `active_members` may not exceed the members seen that day.
///
/// Only checked when at least one member carries a daily breakdown; without
/// breakdowns there is nothing to count against.
fn validate_active_members(
    daily: &[DailyActivityRecord],
    members: &[MemberActivityRecord],
) -> Result<()> {
    if members.iter().all(|m| m.daily_breakdown.is_empty()) {
        return Ok(());
    }

    let mut seen: HashMap<NaiveDate, HashSet<&str>> = HashMap::new();
    for member in members {
        for entry in member.daily_breakdown.iter().filter(|e| e.message_count > 0) {
            seen.entry(entry.date).or_default().insert(member.name.as_str());
        }
    }

    for record in daily {
        let present = seen.get(&record.date).map_or(0, |names| names.len()) as i64;
        if record.active_members > present {
            return Err(Error::InvalidWindow(format!(
                "{} reports {} active members but only {} appear in member breakdowns",
                record.date, record.active_members, present
            )));
        }
    }
    Ok(())
}
