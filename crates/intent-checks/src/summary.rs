//! Condensed markdown report for CI step summaries.

use serde_json::Value;

use crate::metric::round;
use crate::outcome::{CheckItem, MetricItem};

const UNAVAILABLE: &str = "n/a";

pub fn render(title: &str, checks: &[CheckItem], metrics: &[MetricItem]) -> String {
    let passed = checks.iter().filter(|c| c.ok).count();
    let failed = checks.len() - passed;

    let mut lines = vec![
        format!("## {title}"),
        String::new(),
        format!("**Checks:** {passed} passed, {failed} failed"),
    ];

    let failures: Vec<String> = checks
        .iter()
        .filter(|c| !c.ok)
        .map(|c| {
            let subject = match &c.gate {
                Some(name) => format!("gate `{name}`"),
                None => format!("`{}` `{}` {}", c.command, c.path, c.op),
            };
            format!("- {subject}: {}", c.reason.as_deref().unwrap_or("failed"))
        })
        .chain(metrics.iter().filter(|m| !m.ok).map(|m| {
            format!(
                "- metric `{}`: {}",
                m.label,
                m.reason.as_deref().unwrap_or("failed")
            )
        }))
        .collect();
    if !failures.is_empty() {
        lines.extend([String::new(), "### Failures".to_string(), String::new()]);
        lines.extend(failures);
    }

    if !metrics.is_empty() {
        lines.extend([
            String::new(),
            "| Metric | Value | Baseline | Delta |".to_string(),
            "| --- | --- | --- | --- |".to_string(),
        ]);
        lines.extend(metrics.iter().map(|metric| {
            format!(
                "| {} | {} | {} | {} |",
                cell(&metric.label),
                display(metric.value.as_ref(), metric.precision),
                display(metric.baseline.as_ref(), metric.precision),
                delta(metric.delta, metric.precision),
            )
        }));
    }

    lines.join("\n").trim_end().to_string()
}

fn display(value: Option<&Value>, precision: Option<u32>) -> String {
    match value {
        None | Some(Value::Null) => UNAVAILABLE.to_string(),
        Some(Value::Number(n)) => match (n.as_f64(), precision) {
            (Some(f), Some(places)) => format!("{:.*}", places as usize, round(f, Some(places))),
            _ => n.to_string(),
        },
        Some(Value::String(s)) => cell(s),
        Some(other) => cell(&other.to_string()),
    }
}

fn delta(delta: Option<f64>, precision: Option<u32>) -> String {
    let Some(d) = delta else {
        return UNAVAILABLE.to_string();
    };
    let d = round(d, precision);
    let text = match precision {
        Some(places) => format!("{:.*}", places as usize, d),
        None => d.to_string(),
    };
    if d > 0.0 { format!("+{text}") } else { text }
}

/// Keep table cells on one row.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
