//! Formatting helpers shared by report renderers.

/// Format a count compactly (e.g., "14.2K", "3.1M").
pub fn format_count(n: i64) -> String {
    let abs = n.unsigned_abs() as f64;
    let sign = if n < 0 { "-" } else { "" };
    if abs >= 1_000_000.0 {
        format!("{}{:.1}M", sign, abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{}{:.1}K", sign, abs / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Format a signed percent change (e.g., "+23%", "-30%", "0%").
pub fn format_delta(percent: i64) -> String {
    if percent > 0 {
        format!("+{}%", percent)
    } else {
        format!("{}%", percent)
    }
}

/// Format a percentage with one decimal, dropping a trailing ".0".
pub fn format_percent(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}%", rounded)
    } else {
        format!("{:.1}%", rounded)
    }
}
