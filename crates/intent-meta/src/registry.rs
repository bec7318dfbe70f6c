//! Immutable lookup tables handed to the loader.

use std::collections::BTreeMap;

use crate::schema::AssertOp;

/// Default policy values a pack expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackDefaults {
    pub strict: bool,
    pub workflow_lint_strict: bool,
}

/// Registry of known policy packs.
#[derive(Debug, Clone)]
pub struct PolicyPackRegistry {
    packs: BTreeMap<&'static str, PackDefaults>,
}

impl PolicyPackRegistry {
    pub fn with_builtins() -> Self {
        let packs = [
            (
                "default",
                PackDefaults {
                    strict: false,
                    workflow_lint_strict: false,
                },
            ),
            (
                "strict",
                PackDefaults {
                    strict: true,
                    workflow_lint_strict: true,
                },
            ),
            (
                "ci-gate",
                PackDefaults {
                    strict: true,
                    workflow_lint_strict: false,
                },
            ),
        ]
        .into_iter()
        .collect();
        Self { packs }
    }

    pub fn get(&self, name: &str) -> Option<PackDefaults> {
        self.packs.get(name).copied()
    }

    /// Values used when no pack is named.
    pub fn fallback(&self) -> PackDefaults {
        self.get("default").unwrap_or(PackDefaults {
            strict: false,
            workflow_lint_strict: false,
        })
    }

    pub fn list_known(&self) -> Vec<&'static str> {
        self.packs.keys().copied().collect()
    }
}

impl Default for PolicyPackRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Whitelist of assertion operators.
#[derive(Debug, Clone)]
pub struct OperatorTable {
    ops: BTreeMap<&'static str, AssertOp>,
}

impl OperatorTable {
    pub fn with_builtins() -> Self {
        let ops = [
            AssertOp::Eq,
            AssertOp::Ne,
            AssertOp::Gt,
            AssertOp::Gte,
            AssertOp::Lt,
            AssertOp::Lte,
            AssertOp::In,
            AssertOp::NotIn,
        ]
        .into_iter()
        .map(|op| (op.as_str(), op))
        .collect();
        Self { ops }
    }

    pub fn lookup(&self, name: &str) -> Option<AssertOp> {
        self.ops.get(name).copied()
    }

    pub fn list_known(&self) -> Vec<&'static str> {
        self.ops.keys().copied().collect()
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_registry_knows_builtins() {
        let registry = PolicyPackRegistry::with_builtins();
        assert_eq!(registry.list_known(), vec!["ci-gate", "default", "strict"]);
        assert!(registry.get("strict").unwrap().workflow_lint_strict);
        assert!(!registry.get("ci-gate").unwrap().workflow_lint_strict);
        assert!(registry.get("unknown").is_none());
        assert!(!registry.fallback().strict);
    }

    #[test]
    fn test_operator_table_whitelist() {
        let table = OperatorTable::with_builtins();
        assert_eq!(table.lookup("not_in"), Some(AssertOp::NotIn));
        assert_eq!(table.lookup("gte"), Some(AssertOp::Gte));
        assert_eq!(table.lookup("~="), None);
        assert_eq!(table.list_known().len(), 8);
    }
}
