//! Assertion evaluation.

use std::cmp::Ordering;

use intent_meta::{AssertOp, CheckAssertion, Code};
use serde_json::Value;

use crate::command::CommandCache;
use crate::json_path::{self, type_name};
use crate::outcome::CheckItem;

/// Evaluate one assertion against the memoized command results.
pub fn evaluate(assertion: &CheckAssertion, cache: &CommandCache) -> CheckItem {
    let mut item = CheckItem {
        gate: None,
        command: assertion.command.clone(),
        path: assertion.path.to_string(),
        op: assertion.op.to_string(),
        expected: assertion.expected.clone(),
        actual: None,
        ok: false,
        reason: None,
        code: Code::CheckPass,
    };

    let payload = match cache.payload(&assertion.command) {
        Ok(payload) => payload,
        Err(reason) => return item.fail(Code::CommandFailed, reason),
    };
    let actual = match json_path::resolve(payload, &assertion.path) {
        Ok(actual) => actual,
        Err(reason) => return item.fail(Code::PathUnresolved, reason),
    };
    item.actual = Some(actual.clone());

    match compare(assertion.op, actual, &assertion.expected) {
        Ok(true) => {
            item.ok = true;
            item
        }
        Ok(false) => {
            let detail = format!(
                "expected {} {} {}, got {}",
                assertion.path, assertion.op, assertion.expected, actual
            );
            let reason = match &assertion.message {
                Some(message) => format!("{message} ({detail})"),
                None => detail,
            };
            item.fail(Code::AssertionFailed, reason)
        }
        Err(reason) => item.fail(Code::IncompatibleTypes, reason),
    }
}

impl CheckItem {
    pub(crate) fn fail(mut self, code: Code, reason: String) -> Self {
        self.ok = false;
        self.code = code;
        self.reason = Some(reason);
        self
    }
}

/// Apply `op`; `Err` carries an incompatible-types reason.
pub fn compare(op: AssertOp, actual: &Value, expected: &Value) -> Result<bool, String> {
    match op {
        AssertOp::Eq => Ok(json_eq(actual, expected)),
        AssertOp::Ne => Ok(!json_eq(actual, expected)),
        AssertOp::In | AssertOp::NotIn => {
            let Value::Array(items) = expected else {
                return Err(format!(
                    "incompatible types: {op} needs an array, got {}",
                    type_name(expected)
                ));
            };
            let member = items.iter().any(|item| json_eq(actual, item));
            Ok(member == (op == AssertOp::In))
        }
        AssertOp::Gt | AssertOp::Gte | AssertOp::Lt | AssertOp::Lte => {
            let ordering = order(actual, expected).ok_or_else(|| {
                format!(
                    "incompatible types: cannot apply {op} to {} and {}",
                    type_name(actual),
                    type_name(expected)
                )
            })?;
            Ok(match op {
                AssertOp::Gt => ordering == Ordering::Greater,
                AssertOp::Gte => ordering != Ordering::Less,
                AssertOp::Lt => ordering == Ordering::Less,
                _ => ordering != Ordering::Greater,
            })
        }
    }
}

/// Structural equality where `1` and `1.0` are equal.
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

fn order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
