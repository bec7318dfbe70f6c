//! Gate evaluation.

use intent_meta::{CheckGate, Code, GateKind};
use serde_json::{Map, Value, json};

use crate::assertion::json_eq;
use crate::command::CommandCache;
use crate::json_path::{self, type_name};
use crate::outcome::CheckItem;

/// Evaluate one gate against the memoized command results.
pub fn evaluate(gate: &CheckGate, cache: &CommandCache) -> CheckItem {
    let item = CheckItem {
        gate: Some(gate.name.clone()),
        command: gate.command.clone(),
        path: gate.path.to_string(),
        op: gate.kind.name().to_string(),
        expected: expected(&gate.kind),
        actual: None,
        ok: false,
        reason: None,
        code: Code::CheckPass,
    };

    let payload = match cache.payload(&gate.command) {
        Ok(payload) => payload,
        Err(reason) => return item.fail(Code::CommandFailed, reason),
    };
    let actual = match json_path::resolve(payload, &gate.path) {
        Ok(actual) => actual,
        Err(reason) => return item.fail(Code::PathUnresolved, reason),
    };
    let item = CheckItem {
        actual: Some(actual.clone()),
        ..item
    };

    match &gate.kind {
        GateKind::Threshold { max, min } => {
            let Some(value) = actual.as_f64() else {
                return item.fail(
                    Code::IncompatibleTypes,
                    format!(
                        "incompatible types: threshold gate '{}' needs a number, got {}",
                        gate.name,
                        type_name(actual)
                    ),
                );
            };
            if value > *max {
                return item.fail(
                    Code::GateFailed,
                    format!("gate '{}' failed: {value} is above max {max}", gate.name),
                );
            }
            if let Some(min) = min
                && value < *min
            {
                return item.fail(
                    Code::GateFailed,
                    format!("gate '{}' failed: {value} is below min {min}", gate.name),
                );
            }
            CheckItem { ok: true, ..item }
        }
        GateKind::Equals { value } => {
            if json_eq(actual, value) {
                CheckItem { ok: true, ..item }
            } else {
                item.fail(
                    Code::GateFailed,
                    format!("gate '{}' failed: expected {value}, got {actual}", gate.name),
                )
            }
        }
    }
}

fn expected(kind: &GateKind) -> Value {
    match kind {
        GateKind::Threshold { max, min } => {
            let mut bounds = Map::new();
            bounds.insert("max".to_string(), json!(max));
            if let Some(min) = min {
                bounds.insert("min".to_string(), json!(min));
            }
            Value::Object(bounds)
        }
        GateKind::Equals { value } => value.clone(),
    }
}
