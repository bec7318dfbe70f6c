//! Version tuples and constraint sets.
//!
//! Versions are dotted sequences of non-negative integers compared
//! position by position, with the shorter tuple padded with zeros, so
//! `3.12` and `3.12.0` are equal. Constraint sets are comma-separated
//! clauses that must all hold:
//!
//! ```
//! use intent_meta::version::{Satisfaction, VersionTuple, satisfies};
//!
//! let declared = VersionTuple::parse("3.12").unwrap();
//! assert_eq!(satisfies(&declared, ">=3.11,<3.13"), Satisfaction::Satisfied);
//! assert_eq!(satisfies(&declared, "<3.12"), Satisfaction::Violated);
//! assert_eq!(satisfies(&declared, "!=3.11"), Satisfaction::Unsupported);
//! ```

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Error, Result};

/// An ordered sequence of non-negative integers, e.g. `3.12.1`.
#[derive(Debug, Clone)]
pub struct VersionTuple {
    parts: Vec<u64>,
}

impl VersionTuple {
    /// Parse a dotted version string.
    ///
    /// Every dot-separated part must be a plain decimal literal; `""`,
    /// `"3."`, `"3.5l"` and `">=3.12"` are all rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let invalid = || Error::InvalidVersion {
            input: input.to_string(),
        };
        if trimmed.is_empty() {
            return Err(invalid());
        }
        let parts = trimmed
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                part.parse::<u64>().map_err(|_| invalid())
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    fn part(&self, idx: usize) -> u64 {
        self.parts.get(idx).copied().unwrap_or(0)
    }

    /// The `(major, minor)` pair, zero-filling a missing minor.
    pub fn major_minor(&self) -> (u64, u64) {
        (self.part(0), self.part(1))
    }

    /// The next minor release: `3.12.4` becomes `3.13`.
    pub fn next_minor(&self) -> Self {
        let (major, minor) = self.major_minor();
        Self {
            parts: vec![major, minor + 1],
        }
    }

    /// The `major.minor` prefix as its own tuple.
    pub fn truncate_minor(&self) -> Self {
        let (major, minor) = self.major_minor();
        Self {
            parts: vec![major, minor],
        }
    }

    /// Component-wise equality without zero padding.
    pub fn is_identical(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Ord for VersionTuple {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        (0..len)
            .map(|idx| self.part(idx).cmp(&other.part(idx)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for VersionTuple {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for VersionTuple {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionTuple {}

impl fmt::Display for VersionTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in &self.parts {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
            first = false;
        }
        Ok(())
    }
}

/// Comparison operators accepted in a constraint clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// `==`, or a bare literal
    Eq,
    /// `>=`
    Gte,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `~=` compatible release
    Compatible,
}

impl ConstraintOp {
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "" | "==" => Some(Self::Eq),
            ">=" => Some(Self::Gte),
            ">" => Some(Self::Gt),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Lte),
            "~=" => Some(Self::Compatible),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Gte => ">=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Compatible => "~=",
        }
    }
}

/// One `(operator, version)` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub op: ConstraintOp,
    pub version: VersionTuple,
    /// Written without an operator.
    pub bare: bool,
}

impl Constraint {
    pub fn matches(&self, candidate: &VersionTuple) -> bool {
        match self.op {
            ConstraintOp::Eq => candidate == &self.version,
            ConstraintOp::Gte => candidate >= &self.version,
            ConstraintOp::Gt => candidate > &self.version,
            ConstraintOp::Lt => candidate < &self.version,
            ConstraintOp::Lte => candidate <= &self.version,
            ConstraintOp::Compatible => {
                // ~=3.12 means >=3.12 and ==3.*; the last component floats.
                let fixed = self.version.parts().len() - 1;
                candidate >= &self.version
                    && (0..fixed).all(|idx| candidate.part(idx) == self.version.part(idx))
            }
        }
    }
}

/// A comma-separated, implicitly AND-ed set of clauses.
///
/// Parsing never fails; clauses with an operator outside the whitelist (or
/// an unparseable version) are kept as `unsupported` so callers can report
/// them.
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    raw: String,
    clauses: Vec<Constraint>,
    unsupported: Vec<String>,
}

impl ConstraintSet {
    pub fn parse(spec: &str) -> Self {
        let mut clauses = Vec::new();
        let mut unsupported = Vec::new();

        for clause in spec.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            match parse_clause(clause) {
                Some(constraint) => clauses.push(constraint),
                None => unsupported.push(clause.to_string()),
            }
        }
        if clauses.is_empty() && unsupported.is_empty() {
            unsupported.push(spec.trim().to_string());
        }

        Self {
            raw: spec.trim().to_string(),
            clauses,
            unsupported,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn clauses(&self) -> &[Constraint] {
        &self.clauses
    }

    pub fn unsupported(&self) -> &[String] {
        &self.unsupported
    }

    pub fn is_supported(&self) -> bool {
        self.unsupported.is_empty()
    }

    /// A single operator-less literal such as `3.12`.
    pub fn is_bare_literal(&self) -> bool {
        self.is_supported() && self.clauses.len() == 1 && self.clauses[0].bare
    }

    pub fn satisfied_by(&self, version: &VersionTuple) -> Satisfaction {
        if !self.is_supported() {
            return Satisfaction::Unsupported;
        }
        if self.clauses.iter().all(|c| c.matches(version)) {
            Satisfaction::Satisfied
        } else {
            Satisfaction::Violated
        }
    }

    /// The greatest bound among `>=` and `>` clauses.
    pub fn max_lower_bound(&self) -> Option<&VersionTuple> {
        self.clauses
            .iter()
            .filter(|c| matches!(c.op, ConstraintOp::Gte | ConstraintOp::Gt))
            .map(|c| &c.version)
            .max()
    }
}

impl fmt::Display for ConstraintSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_clause(clause: &str) -> Option<Constraint> {
    let split = clause
        .find(|c: char| !matches!(c, '=' | '<' | '>' | '!' | '~' | '^'))
        .unwrap_or(clause.len());
    let (symbol, rest) = clause.split_at(split);
    let op = ConstraintOp::from_symbol(symbol)?;
    let version = VersionTuple::parse(rest).ok()?;
    if op == ConstraintOp::Compatible && version.parts().len() < 2 {
        return None;
    }
    Some(Constraint {
        op,
        version,
        bare: symbol.is_empty(),
    })
}

/// Outcome of testing a version against a constraint set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Satisfaction {
    Satisfied,
    Violated,
    Unsupported,
}

/// Test `version` against the constraint set written in `spec`.
pub fn satisfies(version: &VersionTuple, spec: &str) -> Satisfaction {
    ConstraintSet::parse(spec).satisfied_by(version)
}

/// The greatest `>=`/`>` bound in `spec`, if any.
pub fn max_lower_bound(spec: &str) -> Option<VersionTuple> {
    ConstraintSet::parse(spec).max_lower_bound().cloned()
}

/// Relationship between a declared version and an external constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrossCheck {
    /// The external spec pins exactly the declared version, or admits it
    /// with a lower bound no looser than it.
    Match,
    /// The declared version is outside the external spec.
    Mismatch,
    /// The external spec admits the declared version but also versions
    /// below it.
    Broader { lower_bound: VersionTuple },
    /// The external spec uses syntax this model does not evaluate.
    Unsupported,
}

/// Compare a declared version against an external constraint.
pub fn cross_check(declared: &VersionTuple, spec: &str) -> CrossCheck {
    let set = ConstraintSet::parse(spec);
    if set.is_bare_literal() {
        return if set.clauses()[0].version.is_identical(declared) {
            CrossCheck::Match
        } else {
            CrossCheck::Mismatch
        };
    }
    match set.satisfied_by(declared) {
        Satisfaction::Unsupported => CrossCheck::Unsupported,
        Satisfaction::Violated => CrossCheck::Mismatch,
        Satisfaction::Satisfied => match set.max_lower_bound() {
            Some(lower) if lower < declared => CrossCheck::Broader {
                lower_bound: lower.clone(),
            },
            _ => CrossCheck::Match,
        },
    }
}

/// The recommended manifest range for a declared version: `>=D,<D.next-minor`.
pub fn recommended_range(declared: &VersionTuple) -> String {
    format!(">={},<{}", declared, declared.next_minor())
}
