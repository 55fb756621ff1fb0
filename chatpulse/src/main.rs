//! chatpulse - engagement analytics for one group-chat activity window
//!
//! Loads a window document (JSON), runs every analyzer and the insight
//! registry over it, and prints the report as text or JSON.

mod render;

use anyhow::{bail, Context, Result};
use chatpulse_core::analytics::metrics_registry::list_metrics;
use chatpulse_core::analytics::{generate_report, ConcentrationBasis};
use chatpulse_core::insights::{list_insights, Formula};
use chatpulse_core::{input, Config};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chatpulse")]
#[command(about = "Engagement analytics for a group-chat activity window")]
#[command(version)]
struct Args {
    /// Window document to analyze (JSON)
    #[arg(required_unless_present_any = ["list_insights", "list_variables"])]
    window: Option<PathBuf>,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Print only the insights that fired
    #[arg(long)]
    insights_only: bool,

    /// Share read by the concentration insight: top_three or top_fifth
    #[arg(long)]
    concentration_basis: Option<String>,

    /// Evaluate an ad-hoc formula against the window's variables
    #[arg(long, value_name = "EXPR")]
    formula: Option<String>,

    /// List built-in insights without analyzing anything
    #[arg(long)]
    list_insights: bool,

    /// List the variables formulas may reference
    #[arg(long)]
    list_variables: bool,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => bail!("unknown output format '{}' (expected text or json)", other),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let format = OutputFormat::parse(&args.format)?;

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        chatpulse_core::logging::init(&config.logging).context("failed to initialize logging")?;

    if args.list_insights {
        return print_listing(format, list_insights(), render::print_insight_list);
    }
    if args.list_variables {
        return print_listing(format, list_metrics().as_slice(), render::print_variable_list);
    }

    let Some(path) = args.window else {
        bail!("no window document given");
    };
    let window = input::load_window(&path)
        .with_context(|| format!("failed to load window from {}", path.display()))?;

    let mut insight_options = config.insight_options();
    if let Some(ref basis) = args.concentration_basis {
        insight_options.concentration_basis = basis
            .parse::<ConcentrationBasis>()
            .map_err(anyhow::Error::msg)?;
    }
    tracing::debug!(
        path = %path.display(),
        custom_insights = config.insights.custom.len(),
        "Analyzing window"
    );

    let report = generate_report(
        &window,
        &config.analyzer_options(),
        &insight_options,
        &config.insights.custom,
    );

    if let Some(ref expression) = args.formula {
        let formula = Formula::parse(expression)
            .with_context(|| format!("invalid formula '{}'", expression))?;
        let value = formula
            .evaluate(&report.variables(&window))
            .with_context(|| format!("failed to evaluate '{}'", expression))?;
        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "expression": expression,
                    "value": value.as_f64(),
                    "triggered": value.is_truthy(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => println!("{} = {}", expression, value),
        }
        return Ok(());
    }

    match (format, args.insights_only) {
        (OutputFormat::Json, true) => {
            println!("{}", serde_json::to_string_pretty(&report.active_insights)?)
        }
        (OutputFormat::Json, false) => println!("{}", serde_json::to_string_pretty(&report)?),
        (OutputFormat::Text, true) => render::print_insights(&report),
        (OutputFormat::Text, false) => render::print_report(&report),
    }

    Ok(())
}

fn print_listing<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    items: &T,
    text: fn(&T),
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputFormat::Text => text(items),
    }
    Ok(())
}
