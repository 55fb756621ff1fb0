//! Analytics module for chatpulse
//!
//! Every analyzer is a pure function over borrowed window data:
//! - [`comparison`]: first half vs second half of the period
//! - [`peak`]: busiest day and how far it stands out
//! - [`concentration`]: participation inequality across members
//! - [`anomaly`]: z-score outlier days
//! - [`growth`]: accelerating / steady / declining classification
//! - [`weekly`]: 7-day buckets
//! - [`patterns`]: hour-of-day, weekday and streaks
//!
//! [`report`] runs them all over one window, and [`metrics_registry`] names
//! the values they produce for use in insight formulas.
//!
//! Analyzers share no state, so windows for different groups can be processed
//! on as many threads as the caller likes.

pub mod anomaly;
pub mod comparison;
pub mod concentration;
pub mod growth;
pub mod metrics_registry;
pub mod patterns;
pub mod peak;
pub mod report;
pub mod weekly;

mod stats;

pub use anomaly::{detect_anomalies, Anomaly, AnomalyKind};
pub use comparison::{compare_periods, HalfSummary, PeriodChange, PeriodComparison};
pub use concentration::{
    analyze_concentration, ConcentrationBasis, ConcentrationLevel, ConcentrationResult,
    MemberShare,
};
pub use growth::{analyze_growth, Direction, GrowthTrend, GrowthTrendKind};
pub use metrics_registry::{list_metrics, MetricDescriptor, MetricValueType};
pub use patterns::{analyze_patterns, ActivityPatterns, StreakStats};
pub use peak::{detect_peak, PeakIntensity, PeakResult};
pub use report::{generate_report, FormulaFailure, WindowMetrics, WindowReport};
pub use weekly::{aggregate_weeks, PeakDay, WeeklySummary};

/// Tunables for the analyzers.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerOptions {
    /// `|z|` above which a day is anomalous
    pub anomaly_z_threshold: f64,
    /// Members listed in the concentration breakdown
    pub top_members: usize,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            anomaly_z_threshold: anomaly::DEFAULT_Z_THRESHOLD,
            top_members: concentration::DEFAULT_TOP_MEMBERS,
        }
    }
}
