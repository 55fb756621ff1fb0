//! Built-in insight rules.
//!
//! Each [`InsightDefinition`] is bound to exactly one analyzer through its
//! [`InsightKind`]. Resolving a kind runs that analyzer, picks the compared
//! value, and decides the trend when the rule fires. Dispatch is an exhaustive
//! `match`, so adding a kind without wiring it up does not compile.
//!
//! | id | compared value | rule | trend when fired |
//! |----|----------------|------|------------------|
//! | `participation_decline` | `percent_change` | `<= -20` | `critical` at `<= -30`, else `down` |
//! | `activity_peak` | `peak_improvement_percent` | `>= 150` | `up` |
//! | `member_concentration` | `top3_percentage` (or top fifth) | `>= 80` | `warning` |
//! | `growth_acceleration` | `growth_change_percent`, direction up | `>= 25` | `up` |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analytics::concentration::DEFAULT_TOP_MEMBERS;
use crate::analytics::{
    analyze_concentration, analyze_growth, detect_peak, ConcentrationBasis, ConcentrationResult,
    Direction, GrowthTrend, PeakResult, PeriodComparison, WindowMetrics,
};
use crate::types::AnalysisWindow;

/// Tolerance for `==` / `!=` on computed values.
const EQ_EPSILON: f64 = 1e-9;

/// `participation_decline` escalates to critical at or below this change.
const CRITICAL_DECLINE_PERCENT: f64 = -30.0;

// ============================================
// Definition vocabulary
// ============================================

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Sort rank, 0 = most urgent.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Engagement,
    Activity,
    Members,
    Growth,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl ComparisonOperator {
    pub fn apply(&self, value: f64, threshold: f64) -> bool {
        match self {
            ComparisonOperator::Gt => value > threshold,
            ComparisonOperator::Lt => value < threshold,
            ComparisonOperator::Ge => value >= threshold,
            ComparisonOperator::Le => value <= threshold,
            ComparisonOperator::Eq => (value - threshold).abs() < EQ_EPSILON,
            ComparisonOperator::Ne => (value - threshold).abs() >= EQ_EPSILON,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::Eq => "==",
            ComparisonOperator::Ne => "!=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Stable,
    Warning,
    Critical,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
            Trend::Warning => "warning",
            Trend::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InsightMetadata {
    /// Expected accuracy of the rule, in percent
    pub accuracy: u8,
    pub complexity: Complexity,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InsightFormula {
    pub variables: &'static [&'static str],
    pub threshold: f64,
    pub operator: ComparisonOperator,
}

/// Which analyzer backs a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    ParticipationDecline,
    ActivityPeak,
    MemberConcentration,
    GrowthAcceleration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightDefinition {
    pub kind: InsightKind,
    pub id: &'static str,
    pub category: InsightCategory,
    pub title: &'static str,
    pub description: &'static str,
    pub priority: Priority,
    pub formula: InsightFormula,
    pub metadata: InsightMetadata,
}

const INSIGHTS: &[InsightDefinition] = &[
    InsightDefinition {
        kind: InsightKind::ParticipationDecline,
        id: "participation_decline",
        category: InsightCategory::Engagement,
        title: "Participation decline",
        description: "Messages in the second half of the period fell by 20% or more.",
        priority: Priority::High,
        formula: InsightFormula {
            variables: &["percent_change"],
            threshold: -20.0,
            operator: ComparisonOperator::Le,
        },
        metadata: InsightMetadata {
            accuracy: 90,
            complexity: Complexity::Simple,
        },
    },
    InsightDefinition {
        kind: InsightKind::ActivityPeak,
        id: "activity_peak",
        category: InsightCategory::Activity,
        title: "Activity peak",
        description: "The busiest day ran at least 150% above the other days.",
        priority: Priority::Medium,
        formula: InsightFormula {
            variables: &["peak_messages", "peak_average"],
            threshold: 150.0,
            operator: ComparisonOperator::Ge,
        },
        metadata: InsightMetadata {
            accuracy: 85,
            complexity: Complexity::Simple,
        },
    },
    InsightDefinition {
        kind: InsightKind::MemberConcentration,
        id: "member_concentration",
        category: InsightCategory::Members,
        title: "Member concentration",
        description: "A small core of members sends 80% or more of all messages.",
        priority: Priority::Medium,
        formula: InsightFormula {
            variables: &["top3_percentage"],
            threshold: 80.0,
            operator: ComparisonOperator::Ge,
        },
        metadata: InsightMetadata {
            accuracy: 80,
            complexity: Complexity::Moderate,
        },
    },
    InsightDefinition {
        kind: InsightKind::GrowthAcceleration,
        id: "growth_acceleration",
        category: InsightCategory::Growth,
        title: "Growth acceleration",
        description: "Activity grew by 25% or more between the two halves of the record history.",
        priority: Priority::Low,
        formula: InsightFormula {
            variables: &["growth_change_percent", "growth_direction"],
            threshold: 25.0,
            operator: ComparisonOperator::Ge,
        },
        metadata: InsightMetadata {
            accuracy: 75,
            complexity: Complexity::Moderate,
        },
    },
];

/// All built-in insight definitions.
pub fn list_insights() -> &'static [InsightDefinition] {
    INSIGHTS
}

pub fn find_insight(id: &str) -> Option<&'static InsightDefinition> {
    INSIGHTS.iter().find(|d| d.id == id)
}

// ============================================
// Evaluation
// ============================================

/// Evaluation switches, usually taken from configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsightOptions {
    pub concentration_basis: ConcentrationBasis,
    /// Insight ids skipped by [`get_active_insights`]
    pub disabled: Vec<String>,
}

impl InsightOptions {
    pub fn is_enabled(&self, id: &str) -> bool {
        !self.disabled.iter().any(|d| d == id)
    }
}

/// Result of evaluating one insight against one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedInsight {
    pub id: String,
    pub title: String,
    pub category: InsightCategory,
    pub priority: Priority,
    /// Inputs the decision was based on
    pub variables: BTreeMap<String, f64>,
    /// Value compared against the threshold
    pub value: f64,
    pub threshold: Option<f64>,
    pub operator: Option<ComparisonOperator>,
    /// Source of a custom formula
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    pub triggered: bool,
    pub trend: Trend,
}

/// What a kind resolved to for one window.
struct Resolution {
    variables: BTreeMap<String, f64>,
    value: f64,
    /// Extra condition beyond the threshold comparison
    gate: bool,
}

impl Resolution {
    fn new(value: f64, variables: &[(&str, f64)]) -> Self {
        Self {
            variables: variables
                .iter()
                .map(|(name, v)| (name.to_string(), *v))
                .collect(),
            value,
            gate: true,
        }
    }
}

impl InsightKind {
    /// Run the backing analyzer on the window.
    fn resolve(&self, window: &AnalysisWindow, options: &InsightOptions) -> Resolution {
        match self {
            InsightKind::ParticipationDecline => {
                Self::participation(&PeriodComparison::for_window(window))
            }
            InsightKind::ActivityPeak => Self::peak(&detect_peak(window.daily())),
            InsightKind::MemberConcentration => Self::concentration(
                &analyze_concentration(window.members(), DEFAULT_TOP_MEMBERS),
                options.concentration_basis,
            ),
            InsightKind::GrowthAcceleration => Self::growth(&analyze_growth(window.daily())),
        }
    }

    /// Reuse analyzer results that were already computed.
    fn resolve_from(&self, metrics: &WindowMetrics, options: &InsightOptions) -> Resolution {
        match self {
            InsightKind::ParticipationDecline => Self::participation(&metrics.comparison),
            InsightKind::ActivityPeak => Self::peak(&metrics.peak),
            InsightKind::MemberConcentration => {
                Self::concentration(&metrics.concentration, options.concentration_basis)
            }
            InsightKind::GrowthAcceleration => Self::growth(&metrics.growth),
        }
    }

    fn participation(cmp: &PeriodComparison) -> Resolution {
        let percent = cmp.change.percent_change as f64;
        Resolution::new(
            percent,
            &[
                ("first_half_messages", cmp.first_half.messages as f64),
                ("second_half_messages", cmp.second_half.messages as f64),
                ("percent_change", percent),
            ],
        )
    }

    fn peak(peak: &PeakResult) -> Resolution {
        let improvement = peak.improvement_percent as f64;
        Resolution::new(
            improvement,
            &[
                ("peak_messages", peak.peak_messages as f64),
                ("peak_average", peak.average),
                ("peak_improvement_percent", improvement),
            ],
        )
    }

    fn concentration(result: &ConcentrationResult, basis: ConcentrationBasis) -> Resolution {
        let share = basis.share(result) as f64;
        Resolution::new(share, &[(basis.variable_name(), share)])
    }

    fn growth(growth: &GrowthTrend) -> Resolution {
        let direction = match growth.direction {
            Direction::Up => 1.0,
            Direction::Down => -1.0,
            Direction::Stable => 0.0,
        };
        let mut resolution = Resolution::new(
            growth.change_percent,
            &[
                ("growth_change_percent", growth.change_percent),
                ("growth_direction", direction),
            ],
        );
        resolution.gate = !growth.insufficient_data && growth.direction == Direction::Up;
        resolution
    }

    /// Trend reported for a resolved value.
    fn trend(&self, value: f64, triggered: bool) -> Trend {
        if !triggered {
            return Trend::Stable;
        }
        match self {
            InsightKind::ParticipationDecline => {
                if value <= CRITICAL_DECLINE_PERCENT {
                    Trend::Critical
                } else {
                    Trend::Down
                }
            }
            InsightKind::ActivityPeak => Trend::Up,
            InsightKind::MemberConcentration => Trend::Warning,
            InsightKind::GrowthAcceleration => Trend::Up,
        }
    }
}

impl InsightDefinition {
    fn finish(&self, resolution: Resolution) -> ComputedInsight {
        let triggered = resolution.gate
            && self
                .formula
                .operator
                .apply(resolution.value, self.formula.threshold);
        ComputedInsight {
            id: self.id.to_string(),
            title: self.title.to_string(),
            category: self.category,
            priority: self.priority,
            variables: resolution.variables,
            value: resolution.value,
            threshold: Some(self.formula.threshold),
            operator: Some(self.formula.operator),
            expression: None,
            triggered,
            trend: self.kind.trend(resolution.value, triggered),
        }
    }
}

/// Evaluate one definition against a window.
pub fn evaluate(
    definition: &InsightDefinition,
    window: &AnalysisWindow,
    options: &InsightOptions,
) -> ComputedInsight {
    definition.finish(definition.kind.resolve(window, options))
}

/// Evaluate one definition against precomputed analyzer results.
pub fn evaluate_with_metrics(
    definition: &InsightDefinition,
    metrics: &WindowMetrics,
    options: &InsightOptions,
) -> ComputedInsight {
    definition.finish(definition.kind.resolve_from(metrics, options))
}

/// Order by priority, most urgent first; ties keep their input order.
pub fn sort_by_priority(insights: &mut [ComputedInsight]) {
    insights.sort_by_key(|i| i.priority.rank());
}

/// Evaluate every enabled definition and keep the ones that fired.
pub fn get_active_insights(
    window: &AnalysisWindow,
    options: &InsightOptions,
) -> Vec<ComputedInsight> {
    let mut active: Vec<ComputedInsight> = INSIGHTS
        .iter()
        .filter(|d| options.is_enabled(d.id))
        .map(|d| evaluate(d, window, options))
        .filter(|i| i.triggered)
        .collect();
    sort_by_priority(&mut active);

    tracing::debug!(
        group_id = window.group_id(),
        active = active.len(),
        "Evaluated insight registry"
    );
    active
}
