//! Full report for one analysis window.
//!
//! Runs every analyzer once, evaluates the built-in insight registry against
//! those results, then evaluates configured custom insights against the
//! resolved metric variables. A custom insight whose formula fails is recorded
//! in [`WindowReport::formula_errors`] and the rest of the report is kept.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::anomaly::{detect_anomalies, Anomaly};
use super::comparison::PeriodComparison;
use super::concentration::{analyze_concentration, ConcentrationResult};
use super::growth::{analyze_growth, GrowthTrend};
use super::metrics_registry::resolve_variables;
use super::patterns::{analyze_patterns, ActivityPatterns};
use super::peak::{detect_peak, PeakResult};
use super::weekly::{aggregate_weeks, WeeklySummary};
use super::AnalyzerOptions;
use crate::insights::{
    evaluate_with_metrics, list_insights, sort_by_priority, ComputedInsight, CustomInsight,
    InsightOptions,
};
use crate::types::{AnalysisWindow, Period};

/// Analyzer results backing both the report and insight evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowMetrics {
    pub comparison: PeriodComparison,
    pub peak: PeakResult,
    pub concentration: ConcentrationResult,
    pub anomalies: Vec<Anomaly>,
    pub growth: GrowthTrend,
    pub patterns: ActivityPatterns,
}

impl WindowMetrics {
    pub fn compute(window: &AnalysisWindow, options: &AnalyzerOptions) -> Self {
        Self {
            comparison: PeriodComparison::for_window(window),
            peak: detect_peak(window.daily()),
            concentration: analyze_concentration(window.members(), options.top_members),
            anomalies: detect_anomalies(window.daily(), options.anomaly_z_threshold),
            growth: analyze_growth(window.daily()),
            patterns: analyze_patterns(window),
        }
    }
}

/// A custom insight that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaFailure {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowReport {
    pub group_id: String,
    pub group_name: String,
    pub period: Period,
    pub total_messages: i64,
    pub member_count: usize,

    pub comparison: PeriodComparison,
    pub peak: PeakResult,
    pub concentration: ConcentrationResult,
    pub anomalies: Vec<Anomaly>,
    pub growth: GrowthTrend,
    pub weekly: Vec<WeeklySummary>,
    pub patterns: ActivityPatterns,

    /// Every enabled built-in insight, fired or not, in registry order
    pub insights: Vec<ComputedInsight>,
    /// Fired built-in and custom insights, most urgent first
    pub active_insights: Vec<ComputedInsight>,
    /// Every custom insight that evaluated
    pub custom_insights: Vec<ComputedInsight>,
    pub formula_errors: Vec<FormulaFailure>,
}

impl WindowReport {
    /// Resolved metric variables in the shape custom formulas see them.
    pub fn variables(&self, window: &AnalysisWindow) -> BTreeMap<String, f64> {
        resolve_variables(window, &self.metrics())
    }

    fn metrics(&self) -> WindowMetrics {
        WindowMetrics {
            comparison: self.comparison.clone(),
            peak: self.peak.clone(),
            concentration: self.concentration.clone(),
            anomalies: self.anomalies.clone(),
            growth: self.growth.clone(),
            patterns: self.patterns.clone(),
        }
    }
}

/// Analyze one window end to end.
pub fn generate_report(
    window: &AnalysisWindow,
    analyzer: &AnalyzerOptions,
    insight_options: &InsightOptions,
    custom: &[CustomInsight],
) -> WindowReport {
    let metrics = WindowMetrics::compute(window, analyzer);

    let insights: Vec<ComputedInsight> = list_insights()
        .iter()
        .filter(|d| insight_options.is_enabled(d.id))
        .map(|d| evaluate_with_metrics(d, &metrics, insight_options))
        .collect();

    let vars = resolve_variables(window, &metrics);
    let mut custom_insights = Vec::new();
    let mut formula_errors = Vec::new();
    for insight in custom
        .iter()
        .filter(|c| insight_options.is_enabled(&c.id))
    {
        match insight.evaluate(&vars) {
            Ok(computed) => custom_insights.push(computed),
            Err(e) => {
                warn!(
                    group_id = window.group_id(),
                    insight = %insight.id,
                    error = %e,
                    "Skipping custom insight"
                );
                formula_errors.push(FormulaFailure {
                    id: insight.id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let mut active_insights: Vec<ComputedInsight> = insights
        .iter()
        .chain(custom_insights.iter())
        .filter(|i| i.triggered)
        .cloned()
        .collect();
    sort_by_priority(&mut active_insights);

    info!(
        group_id = window.group_id(),
        days = window.period().day_count,
        total_messages = window.total_messages(),
        active_insights = active_insights.len(),
        formula_errors = formula_errors.len(),
        "Generated window report"
    );

    WindowReport {
        group_id: window.group_id().to_string(),
        group_name: window.group_name().to_string(),
        period: *window.period(),
        total_messages: window.total_messages(),
        member_count: window.members().len(),
        weekly: aggregate_weeks(window),
        comparison: metrics.comparison,
        peak: metrics.peak,
        concentration: metrics.concentration,
        anomalies: metrics.anomalies,
        growth: metrics.growth,
        patterns: metrics.patterns,
        insights,
        active_insights,
        custom_insights,
        formula_errors,
    }
}
