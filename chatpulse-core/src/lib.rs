//! # chatpulse-core
//!
//! Core library for chatpulse - activity analytics for group chats.
//!
//! This library provides:
//! - Domain types for one analysis window (daily activity, member activity)
//! - Pure analyzers: period comparison, peaks, concentration, anomalies,
//!   growth, weekly buckets and activity patterns
//! - An insight registry plus user-defined insight formulas
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows one way:
//! - **Input:** a collaborator assembles an [`AnalysisWindow`], directly or
//!   from a JSON window document via [`input::load_window`]
//! - **Analyzers:** pure functions borrowing the window
//! - **Insights:** threshold rules and custom formulas over analyzer output
//!
//! ## Example
//!
//! ```rust,no_run
//! use chatpulse_core::{analytics, input, Config};
//!
//! let config = Config::load().expect("failed to load config");
//! let window = input::load_window("window.json".as_ref()).expect("failed to load window");
//!
//! let report = analytics::generate_report(
//!     &window,
//!     &config.analyzer_options(),
//!     &config.insight_options(),
//!     &config.insights.custom,
//! );
//! for insight in &report.active_insights {
//!     println!("{} ({})", insight.title, insight.trend.as_str());
//! }
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{generate_report, AnalyzerOptions, WindowReport};
pub use config::Config;
pub use error::{Error, FormulaError, Result};
pub use insights::{get_active_insights, ComputedInsight, CustomInsight, InsightOptions};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod dates;
pub mod error;
pub mod format;
pub mod input;
pub mod insights;
pub mod logging;
pub mod types;
