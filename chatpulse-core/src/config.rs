//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/chatpulse/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/chatpulse/` (~/.config/chatpulse/)
//! - State/Logs: `$XDG_STATE_HOME/chatpulse/` (~/.local/state/chatpulse/)

use crate::analytics::{AnalyzerOptions, ConcentrationBasis};
use crate::error::{Error, Result};
use crate::insights::{find_insight, CustomInsight, InsightOptions};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Analyzer tunables
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Insight selection and custom rules
    #[serde(default)]
    pub insights: InsightsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Analyzer configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// `|z|` above which a day is reported as an anomaly
    #[serde(default = "default_anomaly_z_threshold")]
    pub anomaly_z_threshold: f64,

    /// Members listed in the concentration breakdown
    #[serde(default = "default_top_members")]
    pub top_members: usize,

    /// Share read by the member concentration insight
    #[serde(default)]
    pub concentration_basis: ConcentrationBasis,

    /// Insight ids that are never evaluated
    #[serde(default)]
    pub disabled_insights: Vec<String>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            anomaly_z_threshold: default_anomaly_z_threshold(),
            top_members: default_top_members(),
            concentration_basis: ConcentrationBasis::default(),
            disabled_insights: vec![],
        }
    }
}

fn default_anomaly_z_threshold() -> f64 {
    2.5
}

fn default_top_members() -> usize {
    5
}

/// `[insights]` section
#[derive(Debug, Deserialize, Default, Clone)]
pub struct InsightsConfig {
    /// `[[insights.custom]]` entries
    #[serde(default)]
    pub custom: Vec<CustomInsight>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load and validate configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the analyzers cannot work with.
    ///
    /// Every custom formula is parsed here, so a typo surfaces at startup
    /// rather than on the first report.
    pub fn validate(&self) -> Result<()> {
        let z = self.analytics.anomaly_z_threshold;
        if z.is_nan() || z <= 0.0 {
            return Err(Error::Config(
                "analytics.anomaly_z_threshold must be positive".to_string(),
            ));
        }
        if self.analytics.top_members == 0 {
            return Err(Error::Config(
                "analytics.top_members must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for custom in &self.insights.custom {
            if custom.id.trim().is_empty() {
                return Err(Error::Config("custom insight id must not be empty".to_string()));
            }
            if find_insight(&custom.id).is_some() || !seen.insert(custom.id.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate insight id '{}'",
                    custom.id
                )));
            }
            custom.validate().map_err(|e| {
                Error::Config(format!("custom insight '{}': {}", custom.id, e))
            })?;
        }
        Ok(())
    }

    pub fn analyzer_options(&self) -> AnalyzerOptions {
        AnalyzerOptions {
            anomaly_z_threshold: self.analytics.anomaly_z_threshold,
            top_members: self.analytics.top_members,
        }
    }

    pub fn insight_options(&self) -> InsightOptions {
        InsightOptions {
            concentration_basis: self.analytics.concentration_basis,
            disabled: self.analytics.disabled_insights.clone(),
        }
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/chatpulse/config.toml` (~/.config/chatpulse/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("chatpulse").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/chatpulse/` (~/.local/state/chatpulse/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("chatpulse")
    }

    /// Returns the log file prefix
    ///
    /// `$XDG_STATE_HOME/chatpulse/chatpulse.log` (~/.local/state/chatpulse/chatpulse.log).
    /// The daily appender writes `chatpulse.log.YYYY-MM-DD` next to it.
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("chatpulse.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::Priority;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.analytics.anomaly_z_threshold, 2.5);
        assert_eq!(config.analytics.top_members, 5);
        assert_eq!(config.analytics.concentration_basis, ConcentrationBasis::TopThree);
        assert!(config.insights.custom.is_empty());
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[analytics]
anomaly_z_threshold = 3.0
concentration_basis = "top_fifth"
disabled_insights = ["growth_acceleration"]

[[insights.custom]]
id = "quiet_week"
title = "Quiet week"
expression = "active_days < day_count / 2"
priority = "high"

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.analytics.anomaly_z_threshold, 3.0);
        assert_eq!(config.analytics.top_members, 5);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.insights.custom.len(), 1);
        assert_eq!(config.insights.custom[0].priority, Priority::High);

        let options = config.insight_options();
        assert_eq!(options.concentration_basis, ConcentrationBasis::TopFifth);
        assert!(!options.is_enabled("growth_acceleration"));
        assert_eq!(config.analyzer_options().anomaly_z_threshold, 3.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.analytics.anomaly_z_threshold = 0.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.analytics.top_members = 0;
        assert!(config.validate().is_err());
    }

    fn with_custom(id: &str, expression: &str) -> Config {
        let mut config = Config::default();
        config.insights.custom.push(CustomInsight {
            id: id.to_string(),
            title: "t".to_string(),
            expression: expression.to_string(),
            priority: Priority::Low,
        });
        config
    }

    #[test]
    fn test_validate_custom_formulas() {
        assert!(with_custom("ok", "spike_count > 2").validate().is_ok());

        let err = with_custom("typo", "spikes > 2").validate().unwrap_err();
        assert!(err.to_string().contains("unresolved variables: spikes"));

        assert!(with_custom("bad", "spike_count >").validate().is_err());
        assert!(with_custom("activity_peak", "1 > 0").validate().is_err());
        assert!(with_custom(" ", "1 > 0").validate().is_err());

        let deep = format!("{}1{}", "(".repeat(5000), ")".repeat(5000));
        let err = with_custom("deep", &deep).validate().unwrap_err();
        assert!(err.to_string().contains("formula too long"), "{err}");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[analytics]\ntop_members = 3\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.analytics.top_members, 3);

        std::fs::write(&path, "[analytics]\ntop_members = \"many\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
        assert!(Config::load_from(&dir.path().join("missing.toml")).is_err());
    }
}
