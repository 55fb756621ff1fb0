//! Integration tests for the window loading and report pipeline
//!
//! These tests use fixture files in `tests/fixtures/` to verify the
//! end-to-end flow from a window document to a finished report.

use chatpulse_core::analytics::{
    generate_report, AnalyzerOptions, AnomalyKind, ConcentrationBasis, WindowReport,
};
use chatpulse_core::insights::{get_active_insights, InsightOptions, Priority, Trend};
use chatpulse_core::{input, AnalysisWindow, Config, Error};
use std::path::PathBuf;

/// Get the path to a fixture file
fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn load(name: &str) -> AnalysisWindow {
    input::load_window(&fixture_path(name)).expect("fixture should load")
}

fn default_report(window: &AnalysisWindow) -> WindowReport {
    generate_report(
        window,
        &AnalyzerOptions::default(),
        &InsightOptions::default(),
        &[],
    )
}

fn active_ids(report: &WindowReport) -> Vec<&str> {
    report
        .active_insights
        .iter()
        .map(|i| i.id.as_str())
        .collect()
}

// ============================================
// Loading
// ============================================

#[test]
fn test_load_declining_fixture() {
    chatpulse_core::logging::init_test();
    let window = load("declining_group.json");

    assert_eq!(window.group_id(), "g-declining");
    assert_eq!(window.period().day_count, 30);
    assert_eq!(window.daily().len(), 30);
    assert_eq!(window.members().len(), 10);
    assert_eq!(window.total_messages(), 2550);
}

#[test]
fn test_inverted_period_rejected() {
    let err = input::load_window(&fixture_path("inverted_period.json")).unwrap_err();
    assert!(matches!(err, Error::InvalidWindow(_)), "got {err:?}");
}

#[test]
fn test_bad_date_rejected() {
    let err = input::load_window(&fixture_path("bad_date.json")).unwrap_err();
    match err {
        Error::DateParse { input, .. } => assert_eq!(input, "03/02/2024"),
        other => panic!("expected DateParse, got {other:?}"),
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let err = input::load_window(&fixture_path("does-not-exist.json")).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

// ============================================
// Reports
// ============================================

#[test]
fn test_declining_group_report() {
    let window = load("declining_group.json");
    let report = default_report(&window);

    assert_eq!(report.comparison.first_half.messages, 1500);
    assert_eq!(report.comparison.second_half.messages, 1050);
    assert_eq!(report.comparison.change.percent_change, -30);
    assert!(report.anomalies.is_empty());
    assert_eq!(report.weekly.len(), 5);
    assert_eq!(report.concentration.top3_percentage, 80);
    assert_eq!(report.patterns.streaks.longest_streak_days, 30);

    assert_eq!(
        active_ids(&report),
        vec!["participation_decline", "member_concentration"]
    );
    let decline = &report.active_insights[0];
    assert_eq!(decline.priority, Priority::High);
    assert_eq!(decline.trend, Trend::Critical);
}

#[test]
fn test_concentration_basis_changes_outcome() {
    let window = load("declining_group.json");
    let top_fifth = InsightOptions {
        concentration_basis: ConcentrationBasis::TopFifth,
        ..Default::default()
    };

    let default_ids: Vec<String> = get_active_insights(&window, &InsightOptions::default())
        .into_iter()
        .map(|i| i.id)
        .collect();
    let fifth_ids: Vec<String> = get_active_insights(&window, &top_fifth)
        .into_iter()
        .map(|i| i.id)
        .collect();

    assert!(default_ids.contains(&"member_concentration".to_string()));
    assert!(!fifth_ids.contains(&"member_concentration".to_string()));
}

#[test]
fn test_spike_group_report() {
    let window = load("spike_group.json");
    let report = default_report(&window);

    assert_eq!(report.peak.peak_messages, 200);
    assert_eq!(report.peak.improvement_percent, 863);
    assert_eq!(report.peak.ratio, 9.6);
    assert_eq!(report.peak.peak_hour, Some(20));
    assert_eq!(report.patterns.peak_hour, Some(20));

    assert_eq!(report.anomalies.len(), 1);
    assert_eq!(report.anomalies[0].kind, AnomalyKind::Spike);
    assert_eq!(report.anomalies[0].value, 200);

    assert_eq!(report.comparison.change.percent_change, -53);
    assert_eq!(report.concentration.top3_percentage, 65);

    assert_eq!(report.weekly.len(), 2);
    assert_eq!(report.weekly[0].total_messages, 320);
    assert_eq!(report.weekly[1].total_messages, 150);

    assert_eq!(
        active_ids(&report),
        vec!["participation_decline", "activity_peak"]
    );
}

#[test]
fn test_custom_insights_from_config() {
    let config: Config = toml::from_str(
        r#"
[analytics]
disabled_insights = ["participation_decline"]

[[insights.custom]]
id = "launch_spike"
title = "Launch spike"
expression = "spike_count >= 1 && peak_ratio > 5"
priority = "critical"

[[insights.custom]]
id = "crowded"
title = "Crowded"
expression = "member_count > 50"
"#,
    )
    .unwrap();
    config.validate().unwrap();

    let window = load("spike_group.json");
    let report = generate_report(
        &window,
        &config.analyzer_options(),
        &config.insight_options(),
        &config.insights.custom,
    );

    assert!(report.formula_errors.is_empty());
    assert_eq!(report.custom_insights.len(), 2);
    assert_eq!(active_ids(&report), vec!["launch_spike", "activity_peak"]);
    assert_eq!(report.active_insights[0].trend, Trend::Warning);
}

#[test]
fn test_report_serializes_to_json() {
    let window = load("spike_group.json");
    let report = default_report(&window);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["group_id"], "g-spike");
    assert_eq!(json["period"]["start"], "2024-02-01");
    assert_eq!(json["anomalies"][0]["type"], "spike");
    assert_eq!(json["active_insights"][0]["trend"], "critical");

    let back: WindowReport = serde_json::from_value(json).unwrap();
    assert_eq!(back.active_insights, report.active_insights);
}

#[test]
fn test_windows_analyzed_in_parallel() {
    let windows = vec![load("declining_group.json"), load("spike_group.json")];
    let sequential: Vec<WindowReport> = windows.iter().map(default_report).collect();

    let parallel: Vec<WindowReport> = std::thread::scope(|scope| {
        let handles: Vec<_> = windows
            .iter()
            .map(|w| scope.spawn(move || default_report(w)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("analysis thread panicked"))
            .collect()
    });

    assert_eq!(parallel, sequential);
}
