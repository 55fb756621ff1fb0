//! Insight rules evaluated over analyzer output.
//!
//! Built-in rules live in [`registry`]; user rules are [`custom`] insights
//! written in the [`formula`] language.

pub mod custom;
pub mod formula;
pub mod registry;

pub use custom::CustomInsight;
pub use formula::{Formula, Value};
pub use registry::{
    evaluate, evaluate_with_metrics, find_insight, get_active_insights, list_insights,
    sort_by_priority, ComparisonOperator, Complexity, ComputedInsight, InsightCategory,
    InsightDefinition, InsightFormula, InsightKind, InsightMetadata, InsightOptions, Priority,
    Trend,
};
