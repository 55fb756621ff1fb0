//! User-authored insights from configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::formula::Formula;
use super::registry::{ComputedInsight, InsightCategory, Priority, Trend};
use crate::analytics::metrics_registry::is_known_metric;
use crate::error::FormulaError;

/// A `[[insights.custom]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomInsight {
    pub id: String,
    pub title: String,
    pub expression: String,
    #[serde(default)]
    pub priority: Priority,
}

impl CustomInsight {
    /// Parse the expression and check it only names registered metrics.
    pub fn validate(&self) -> Result<Formula, FormulaError> {
        let formula = Formula::parse(&self.expression)?;
        let unknown: Vec<String> = formula
            .variables()
            .into_iter()
            .filter(|name| !is_known_metric(name))
            .collect();
        if !unknown.is_empty() {
            return Err(FormulaError::UnresolvedVariables(unknown));
        }
        Ok(formula)
    }

    /// Evaluate against resolved window variables.
    pub fn evaluate(&self, vars: &BTreeMap<String, f64>) -> Result<ComputedInsight, FormulaError> {
        let formula = Formula::parse(&self.expression)?;
        let value = formula.evaluate(vars)?;
        let triggered = value.is_truthy();

        let variables = formula
            .variables()
            .into_iter()
            .filter_map(|name| vars.get(&name).map(|v| (name, *v)))
            .collect();

        Ok(ComputedInsight {
            id: self.id.clone(),
            title: self.title.clone(),
            category: InsightCategory::Custom,
            priority: self.priority,
            variables,
            value: value.as_f64(),
            threshold: None,
            operator: None,
            expression: Some(self.expression.clone()),
            triggered,
            trend: if triggered { Trend::Warning } else { Trend::Stable },
        })
    }
}
