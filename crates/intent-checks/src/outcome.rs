//! Result items produced by the engine.

use intent_meta::Code;
use serde::Serialize;
use serde_json::Value;

/// One evaluated assertion or gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckItem {
    /// Gate name; absent for assertions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate: Option<String>,
    pub command: String,
    pub path: String,
    /// Assertion operator, or the gate kind
    pub op: String,
    pub expected: Value,
    pub actual: Option<Value>,
    pub ok: bool,
    pub reason: Option<String>,
    pub code: Code,
}

/// One evaluated summary metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricItem {
    pub label: String,
    pub command: String,
    pub path: String,
    pub baseline_path: Option<String>,
    pub value: Option<Value>,
    pub baseline: Option<Value>,
    pub delta: Option<f64>,
    pub ok: bool,
    pub reason: Option<String>,
    pub code: Code,
    /// Display precision, applied only when rendering the summary
    #[serde(skip)]
    pub precision: Option<u32>,
}
