//! Plain-text rendering of reports and listings.

use chatpulse_core::analytics::metrics_registry::MetricDescriptor;
use chatpulse_core::analytics::{ActivityPatterns, WindowReport};
use chatpulse_core::dates::format_day;
use chatpulse_core::format::{format_count, format_delta, format_percent};
use chatpulse_core::insights::{ComputedInsight, InsightDefinition};

pub fn print_report(report: &WindowReport) {
    println!("{} ({})", report.group_name, report.group_id);
    println!(
        "{} - {} days, {} messages, {} members",
        report.period.range().display(),
        report.period.day_count,
        format_count(report.total_messages),
        report.member_count
    );
    println!();

    let cmp = &report.comparison;
    println!("Period comparison");
    println!(
        "  First half:  {} messages, ~{} active/day",
        format_count(cmp.first_half.messages),
        cmp.first_half.members
    );
    println!(
        "  Second half: {} messages, ~{} active/day",
        format_count(cmp.second_half.messages),
        cmp.second_half.members
    );
    println!("  Change:      {}", format_delta(cmp.change.percent_change));
    println!();

    let peak = &report.peak;
    println!("Peak activity");
    match peak.date {
        Some(date) => {
            println!(
                "  {}: {} messages ({}x average, {})",
                format_day(date),
                format_count(peak.peak_messages),
                peak.ratio,
                peak.intensity.as_str()
            );
            if let Some(hour) = peak.peak_hour {
                println!("  Busiest hour: {}", ActivityPatterns::hour_display(hour));
            } else {
                println!("  Estimated duration: ~{}h", peak.estimated_duration_hours);
            }
        }
        None => println!("  No activity recorded"),
    }
    println!();

    let conc = &report.concentration;
    println!("Member concentration ({})", conc.level.as_str());
    println!(
        "  Top 3: {}   Top {}: {}   Diversity: {:.2}   Gini: {:.2}",
        format_percent(conc.top3_percentage as f64),
        conc.top_fifth_count,
        format_percent(conc.top_fifth_percentage as f64),
        conc.diversity_index,
        conc.gini_coefficient
    );
    for member in &conc.top_members {
        println!(
            "  {:<20} {:>8}  {}",
            member.name,
            format_count(member.message_count),
            format_percent(member.percentage)
        );
    }
    println!();

    let growth = &report.growth;
    println!("Growth");
    if growth.insufficient_data {
        println!("  Not enough data");
    } else {
        println!(
            "  {} ({:+.1}%), consistency {:.0}/100",
            growth.trend.as_str(),
            growth.change_percent,
            growth.consistency
        );
    }
    println!();

    if !report.anomalies.is_empty() {
        println!("Anomalies");
        for anomaly in &report.anomalies {
            println!(
                "  {} {:<5} {} messages (z = {:.2})",
                format_day(anomaly.date),
                anomaly.kind.as_str(),
                anomaly.value,
                anomaly.z_score
            );
        }
        println!();
    }

    println!("Weekly");
    for week in &report.weekly {
        println!(
            "  {:<28} {:>8}  {:>6.1}/day",
            week.week.display(),
            format_count(week.total_messages),
            week.avg_messages
        );
    }
    println!();

    let patterns = &report.patterns;
    println!("Patterns");
    if let Some(day) = patterns.busiest_weekday {
        println!("  Busiest weekday: {}", ActivityPatterns::weekday_name(day));
    }
    if let Some(hour) = patterns.peak_hour {
        println!("  Peak hour: {}", ActivityPatterns::hour_display(hour));
    }
    println!(
        "  Active {}/{} days ({}), longest streak {}, current {}",
        patterns.streaks.active_days,
        patterns.streaks.total_days,
        format_percent(patterns.streaks.activity_percentage()),
        patterns.streaks.longest_streak_days,
        patterns.streaks.current_streak_days
    );
    println!();

    print_insights(report);
}

pub fn print_insights(report: &WindowReport) {
    if report.active_insights.is_empty() {
        println!("No insights triggered.");
    } else {
        println!("Insights");
        for insight in &report.active_insights {
            print_insight(insight);
        }
    }

    for failure in &report.formula_errors {
        eprintln!("Custom insight {} skipped: {}", failure.id, failure.error);
    }
}

fn print_insight(insight: &ComputedInsight) {
    let rule = match (&insight.expression, insight.operator, insight.threshold) {
        (Some(expression), _, _) => expression.clone(),
        (None, Some(op), Some(threshold)) => {
            format!("{} {} {}", insight.value, op.symbol(), threshold)
        }
        _ => insight.value.to_string(),
    };
    println!(
        "  [{}] {} - {} ({})",
        insight.priority.as_str(),
        insight.title,
        insight.trend.as_str(),
        rule
    );
}

pub fn print_insight_list(definitions: &[InsightDefinition]) {
    println!("Available insights:");
    for def in definitions {
        println!(
            "  - {} [{}] {} {} {}",
            def.id,
            def.priority.as_str(),
            def.formula.variables.join(", "),
            def.formula.operator.symbol(),
            def.formula.threshold
        );
        println!("      {}", def.description);
    }
}

pub fn print_variable_list(metrics: &[MetricDescriptor]) {
    println!("Formula variables:");
    for metric in metrics {
        println!(
            "  {:<26} {:<8} {:<14} {}",
            metric.name,
            metric.value_type.as_str(),
            metric.analyzer,
            metric.summary
        );
    }
}
