//! Participation inequality across members.
//!
//! ## Metrics Produced
//!
//! | Field | Description |
//! |-------|-------------|
//! | `top3_percentage` | Share of messages sent by the three most active members |
//! | `top_fifth_percentage` | Share sent by the most active 20% of members (at least one) |
//! | `diversity_index` | Simpson index `1 - sum(p_i^2)`, two decimals |
//! | `gini_coefficient` | 0 = perfectly equal, approaching 1 = one voice |
//! | `level` | balanced / moderate / concentrated / monopolized from `top3_percentage` |
//!
//! ## Gini
//!
//! Computed from the ascending sort with the closed form
//!
//! ```text
//! gini = (2 * sum(i * x_i) - (n + 1) * sum(x_i)) / (n * sum(x_i))
//! ```
//!
//! where `i` is the 1-based rank. This equals the mean absolute pairwise
//! difference `sum_ij |x_i - x_j| / (2 n^2 mean)` without the quadratic loop.
//!
//! ## Example
//!
//! Members with 50, 30 and 20 messages:
//! - `top3_percentage`: 100
//! - `diversity_index`: 1 - (0.25 + 0.09 + 0.04) = 0.62
//! - `gini_coefficient`: 0.2

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::stats::{percentage, round_int, round_to};
use crate::types::MemberActivityRecord;

/// Members listed in `top_members` unless configured otherwise.
pub const DEFAULT_TOP_MEMBERS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcentrationLevel {
    Balanced,
    Moderate,
    Concentrated,
    Monopolized,
}

impl ConcentrationLevel {
    pub fn from_top3_percentage(top3: i64) -> Self {
        if top3 > 80 {
            ConcentrationLevel::Monopolized
        } else if top3 > 60 {
            ConcentrationLevel::Concentrated
        } else if top3 > 40 {
            ConcentrationLevel::Moderate
        } else {
            ConcentrationLevel::Balanced
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConcentrationLevel::Balanced => "balanced",
            ConcentrationLevel::Moderate => "moderate",
            ConcentrationLevel::Concentrated => "concentrated",
            ConcentrationLevel::Monopolized => "monopolized",
        }
    }
}

/// Which "heavy contributors" share the concentration insight reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcentrationBasis {
    /// Top three members regardless of group size
    #[default]
    TopThree,
    /// Top 20% of members, rounded up
    TopFifth,
}

impl ConcentrationBasis {
    pub fn share(&self, result: &ConcentrationResult) -> i64 {
        match self {
            ConcentrationBasis::TopThree => result.top3_percentage,
            ConcentrationBasis::TopFifth => result.top_fifth_percentage,
        }
    }

    pub fn variable_name(&self) -> &'static str {
        match self {
            ConcentrationBasis::TopThree => "top3_percentage",
            ConcentrationBasis::TopFifth => "top_fifth_percentage",
        }
    }
}

impl std::str::FromStr for ConcentrationBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top_three" => Ok(ConcentrationBasis::TopThree),
            "top_fifth" => Ok(ConcentrationBasis::TopFifth),
            _ => Err(format!("unknown concentration basis: {}", s)),
        }
    }
}

/// One member's share, for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberShare {
    pub name: String,
    pub message_count: i64,
    /// Percent of member messages, one decimal
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationResult {
    pub member_count: usize,
    /// Sum of member message counts (may differ from the group total)
    pub total_messages: i64,
    pub top3_percentage: i64,
    /// Number of members in the top fifth
    pub top_fifth_count: usize,
    pub top_fifth_percentage: i64,
    pub diversity_index: f64,
    pub gini_coefficient: f64,
    pub level: ConcentrationLevel,
    pub top_members: Vec<MemberShare>,
}

/// Measure how concentrated participation is.
///
/// When members sent no messages at all every metric is 0 and the level is
/// balanced.
pub fn analyze_concentration(
    members: &[MemberActivityRecord],
    top_n: usize,
) -> ConcentrationResult {
    let mut ranked: Vec<&MemberActivityRecord> = members.iter().collect();
    ranked.sort_by(|a, b| match b.message_count.cmp(&a.message_count) {
        Ordering::Equal => a.name.cmp(&b.name),
        other => other,
    });

    let total: i64 = ranked.iter().map(|m| m.message_count).sum();
    let top_fifth_count = top_fifth_size(ranked.len());

    if total == 0 {
        return ConcentrationResult {
            member_count: ranked.len(),
            total_messages: 0,
            top3_percentage: 0,
            top_fifth_count,
            top_fifth_percentage: 0,
            diversity_index: 0.0,
            gini_coefficient: 0.0,
            level: ConcentrationLevel::Balanced,
            top_members: ranked
                .iter()
                .take(top_n)
                .map(|m| MemberShare {
                    name: m.name.clone(),
                    message_count: m.message_count,
                    percentage: 0.0,
                })
                .collect(),
        };
    }

    let top3: i64 = ranked.iter().take(3).map(|m| m.message_count).sum();
    let top_fifth: i64 = ranked
        .iter()
        .take(top_fifth_count)
        .map(|m| m.message_count)
        .sum();
    let top3_percentage = round_int(percentage(top3, total));

    let counts: Vec<i64> = ranked.iter().map(|m| m.message_count).collect();

    let result = ConcentrationResult {
        member_count: ranked.len(),
        total_messages: total,
        top3_percentage,
        top_fifth_count,
        top_fifth_percentage: round_int(percentage(top_fifth, total)),
        diversity_index: simpson_diversity(&counts, total),
        gini_coefficient: gini_coefficient(&counts),
        level: ConcentrationLevel::from_top3_percentage(top3_percentage),
        top_members: ranked
            .iter()
            .take(top_n)
            .map(|m| MemberShare {
                name: m.name.clone(),
                message_count: m.message_count,
                percentage: round_to(percentage(m.message_count, total), 1),
            })
            .collect(),
    };

    tracing::debug!(
        members = result.member_count,
        top3 = result.top3_percentage,
        gini = result.gini_coefficient,
        "Computed participation concentration"
    );

    result
}

/// `ceil(n * 0.2)`, at least one member when there are any.
fn top_fifth_size(member_count: usize) -> usize {
    if member_count == 0 {
        0
    } else {
        ((member_count + 4) / 5).max(1)
    }
}

/// Simpson diversity `1 - sum(p_i^2)`, rounded to two decimals.
fn simpson_diversity(counts: &[i64], total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let concentration: f64 = counts
        .iter()
        .map(|&c| {
            let share = c as f64 / total;
            share * share
        })
        .sum();
    round_to(1.0 - concentration, 2).clamp(0.0, 1.0)
}

/// Gini coefficient via the sorted closed form, O(n log n).
pub fn gini_coefficient(counts: &[i64]) -> f64 {
    let n = counts.len();
    let sum: i64 = counts.iter().sum();
    if n == 0 || sum == 0 {
        return 0.0;
    }

    let mut ascending = counts.to_vec();
    ascending.sort_unstable();

    let weighted: f64 = ascending
        .iter()
        .enumerate()
        .map(|(i, &x)| (i as f64 + 1.0) * x as f64)
        .sum();
    let n_f = n as f64;
    let sum_f = sum as f64;

    let gini = (2.0 * weighted - (n_f + 1.0) * sum_f) / (n_f * sum_f);
    gini.clamp(0.0, 1.0)
}
