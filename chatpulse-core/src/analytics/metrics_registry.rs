//! Metric variables a window resolves to.
//!
//! This is the complete namespace available to custom insight formulas. A
//! formula that names anything else is rejected before evaluation.

use serde::Serialize;
use std::collections::BTreeMap;

use super::growth::Direction;
use super::report::WindowMetrics;
use crate::types::AnalysisWindow;

/// Type of metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricValueType {
    Integer,
    Float,
}

impl MetricValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricValueType::Integer => "integer",
            MetricValueType::Float => "float",
        }
    }
}

/// Descriptor for a metric variable.
#[derive(Debug, Clone, Serialize)]
pub struct MetricDescriptor {
    pub analyzer: &'static str,
    pub name: &'static str,
    pub value_type: MetricValueType,
    pub summary: &'static str,
}

const fn metric(
    analyzer: &'static str,
    name: &'static str,
    value_type: MetricValueType,
    summary: &'static str,
) -> MetricDescriptor {
    MetricDescriptor {
        analyzer,
        name,
        value_type,
        summary,
    }
}

use MetricValueType::{Float, Integer};

const ALL_METRICS: &[MetricDescriptor] = &[
    metric("window", "total_messages", Integer, "Group-level messages in the window."),
    metric("window", "day_count", Integer, "Calendar days in the period."),
    metric("window", "record_count", Integer, "Days with a daily record."),
    metric("window", "member_count", Integer, "Members with a member record."),
    metric("comparison", "first_half_messages", Integer, "Messages in the first half."),
    metric("comparison", "second_half_messages", Integer, "Messages in the second half."),
    metric("comparison", "first_half_members", Integer, "Mean active members per day, first half."),
    metric(
        "comparison",
        "second_half_members",
        Integer,
        "Mean active members per day, second half.",
    ),
    metric("comparison", "message_change", Integer, "Second half minus first half messages."),
    metric("comparison", "percent_change", Integer, "Rounded percent change between halves."),
    metric("peak", "peak_messages", Integer, "Messages on the busiest day."),
    metric("peak", "peak_average", Float, "Mean messages on all other days."),
    metric("peak", "peak_ratio", Float, "Busiest day divided by the average."),
    metric(
        "peak",
        "peak_improvement_percent",
        Integer,
        "How far the busiest day exceeds the average, in percent.",
    ),
    metric(
        "concentration",
        "top3_percentage",
        Integer,
        "Share of messages from the top three members.",
    ),
    metric(
        "concentration",
        "top_fifth_percentage",
        Integer,
        "Share of messages from the top 20% of members.",
    ),
    metric("concentration", "diversity_index", Float, "Simpson diversity of member shares."),
    metric("concentration", "gini_coefficient", Float, "Gini inequality of member message counts."),
    metric("anomaly", "anomaly_count", Integer, "Days flagged as anomalous."),
    metric("anomaly", "spike_count", Integer, "Anomalous days above the mean."),
    metric("anomaly", "drop_count", Integer, "Anomalous days below the mean."),
    metric(
        "growth",
        "growth_change_percent",
        Float,
        "Percent change between halves of the record sequence.",
    ),
    metric(
        "growth",
        "growth_direction",
        Integer,
        "1 when growing, -1 when shrinking, 0 when flat.",
    ),
    metric("growth", "growth_consistency", Float, "Day-to-day steadiness, 0-100."),
    metric("patterns", "active_days", Integer, "Days with at least one message."),
    metric("patterns", "longest_streak", Integer, "Longest run of consecutive active days."),
    metric("patterns", "current_streak", Integer, "Active-day run ending on the last day."),
];

/// List all registered metrics.
pub fn list_metrics() -> Vec<MetricDescriptor> {
    ALL_METRICS.to_vec()
}

/// List metrics produced by one analyzer.
pub fn list_metrics_for_analyzer(analyzer: &str) -> Vec<MetricDescriptor> {
    ALL_METRICS
        .iter()
        .filter(|m| m.analyzer == analyzer)
        .cloned()
        .collect()
}

pub fn is_known_metric(name: &str) -> bool {
    ALL_METRICS.iter().any(|m| m.name == name)
}

/// Resolve every registered metric for a window.
pub fn resolve_variables(
    window: &AnalysisWindow,
    metrics: &WindowMetrics,
) -> BTreeMap<String, f64> {
    let cmp = &metrics.comparison;
    let peak = &metrics.peak;
    let conc = &metrics.concentration;
    let growth = &metrics.growth;
    let streaks = &metrics.patterns.streaks;
    let spikes = metrics
        .anomalies
        .iter()
        .filter(|a| a.kind == super::anomaly::AnomalyKind::Spike)
        .count();

    let values: [(&str, f64); 27] = [
        ("total_messages", window.total_messages() as f64),
        ("day_count", window.period().day_count as f64),
        ("record_count", window.daily().len() as f64),
        ("member_count", window.members().len() as f64),
        ("first_half_messages", cmp.first_half.messages as f64),
        ("second_half_messages", cmp.second_half.messages as f64),
        ("first_half_members", cmp.first_half.members as f64),
        ("second_half_members", cmp.second_half.members as f64),
        ("message_change", cmp.change.messages as f64),
        ("percent_change", cmp.change.percent_change as f64),
        ("peak_messages", peak.peak_messages as f64),
        ("peak_average", peak.average),
        ("peak_ratio", peak.ratio),
        ("peak_improvement_percent", peak.improvement_percent as f64),
        ("top3_percentage", conc.top3_percentage as f64),
        ("top_fifth_percentage", conc.top_fifth_percentage as f64),
        ("diversity_index", conc.diversity_index),
        ("gini_coefficient", conc.gini_coefficient),
        ("anomaly_count", metrics.anomalies.len() as f64),
        ("spike_count", spikes as f64),
        ("drop_count", (metrics.anomalies.len() - spikes) as f64),
        ("growth_change_percent", growth.change_percent),
        (
            "growth_direction",
            match growth.direction {
                Direction::Up => 1.0,
                Direction::Down => -1.0,
                Direction::Stable => 0.0,
            },
        ),
        ("growth_consistency", growth.consistency),
        ("active_days", streaks.active_days as f64),
        ("longest_streak", streaks.longest_streak_days as f64),
        ("current_streak", streaks.current_streak_days as f64),
    ];

    values
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::AnalyzerOptions;
    use crate::dates::parse_date;
    use crate::types::{DailyActivityRecord, MemberActivityRecord};
    use chrono::Duration;

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = ALL_METRICS.iter().map(|m| m.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL_METRICS.len());
    }

    #[test]
    fn test_resolved_variables_match_registry() {
        let start = parse_date("2024-01-01").unwrap();
        let daily = (0..10)
            .map(|i| DailyActivityRecord::new(start + Duration::days(i), 10 + i, 2))
            .collect();
        let window = AnalysisWindow::new(
            "g1",
            "Group",
            start,
            start + Duration::days(9),
            daily,
            vec![
                MemberActivityRecord::new("ana", 60),
                MemberActivityRecord::new("ben", 40),
            ],
        )
        .unwrap();
        let metrics = WindowMetrics::compute(&window, &AnalyzerOptions::default());
        let vars = resolve_variables(&window, &metrics);

        assert_eq!(vars.len(), ALL_METRICS.len());
        for descriptor in ALL_METRICS {
            assert!(vars.contains_key(descriptor.name), "{}", descriptor.name);
        }
        assert_eq!(vars["total_messages"], 145.0);
        assert_eq!(vars["member_count"], 2.0);
        assert_eq!(vars["top3_percentage"], 100.0);
    }

    #[test]
    fn test_list_for_analyzer() {
        let peak = list_metrics_for_analyzer("peak");
        assert_eq!(peak.len(), 4);
        assert!(is_known_metric("gini_coefficient"));
        assert!(!is_known_metric("nonsense"));
    }
}
