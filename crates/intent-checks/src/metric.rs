//! Summary metric evaluation.

use intent_meta::{BaselinePolicy, BaselineSource, Code, MetricSpec};
use serde_json::Value;

use crate::command::CommandCache;
use crate::json_path;
use crate::outcome::MetricItem;

/// Inputs shared by every metric of one run.
#[derive(Debug, Clone, Copy)]
pub struct MetricContext<'a> {
    pub cache: &'a CommandCache,
    /// Parsed `[ci.summary].baseline_file`, or why it is unavailable
    pub baseline_file: Option<&'a Result<Value, String>>,
    pub on_missing_baseline: BaselinePolicy,
}

pub fn evaluate(metric: &MetricSpec, ctx: MetricContext<'_>) -> MetricItem {
    let mut item = MetricItem {
        label: metric.label.clone(),
        command: metric.command.clone(),
        path: metric.path.to_string(),
        baseline_path: metric.baseline.as_ref().map(|b| b.path().to_string()),
        value: None,
        baseline: None,
        delta: None,
        ok: true,
        reason: None,
        code: Code::CheckPass,
        precision: metric.precision,
    };

    let payload = match ctx.cache.payload(&metric.command) {
        Ok(payload) => payload,
        Err(reason) => return failed(item, Code::CommandFailed, reason),
    };
    let value = match json_path::resolve(payload, &metric.path) {
        Ok(value) => value,
        Err(reason) => return failed(item, Code::PathUnresolved, reason),
    };
    item.value = Some(value.clone());

    let Some(source) = &metric.baseline else {
        return item;
    };
    match resolve_baseline(source, payload, ctx) {
        Ok(baseline) => {
            item.delta = match (value.as_f64(), baseline.as_f64()) {
                (Some(v), Some(b)) => Some(v - b),
                _ => None,
            };
            item.baseline = Some(baseline.clone());
        }
        Err(reason) => {
            item.code = Code::BaselineUnavailable;
            item.reason = Some(format!("baseline unavailable: {reason}"));
            item.ok = ctx.on_missing_baseline == BaselinePolicy::Note;
        }
    }
    item
}

fn resolve_baseline<'a>(
    source: &BaselineSource,
    own_payload: &'a Value,
    ctx: MetricContext<'a>,
) -> Result<&'a Value, String> {
    match source {
        BaselineSource::SamePayload { path } => json_path::resolve(own_payload, path),
        BaselineSource::Command { command, path } => {
            json_path::resolve(ctx.cache.payload(command)?, path)
        }
        BaselineSource::File { path } => match ctx.baseline_file {
            Some(Ok(doc)) => json_path::resolve(doc, path),
            Some(Err(reason)) => Err(reason.clone()),
            None => Err("no baseline file configured".to_string()),
        },
    }
}

fn failed(mut item: MetricItem, code: Code, reason: String) -> MetricItem {
    item.ok = false;
    item.code = code;
    item.reason = Some(reason);
    item
}

/// Round for display; `None` leaves the value untouched.
pub fn round(value: f64, precision: Option<u32>) -> f64 {
    match precision {
        Some(places) => {
            let factor = 10f64.powi(places as i32);
            (value * factor).round() / factor
        }
        None => value,
    }
}
