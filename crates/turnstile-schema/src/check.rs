//! # Partition Checking
//!
//! Applies one resolved validator to one partition of request data and
//! normalizes the result. Absence means skip, not pass-by-accident, and a
//! failing partition reports every violation it contains so a caller can
//! fix a payload in one round trip.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::Resolved;

/// A single schema violation with structured context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// The violated constraint keyword (`required`, `type`, `format`, ...).
    pub keyword: String,
    /// JSON Pointer to the offending location in the partition data.
    /// Empty for violations at the partition root.
    pub path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "  (root) [{}]: {}", self.keyword, self.message)
        } else {
            write!(f, "  {} [{}]: {}", self.path, self.keyword, self.message)
        }
    }
}

/// Outcome of checking one partition.
#[derive(Debug, Clone)]
pub enum PartitionReport {
    /// No schema governs this partition; it was not checked.
    Skipped,
    /// The data satisfies the schema.
    Passed,
    /// The data violates the schema. Carries every violation found.
    Failed(Vec<Violation>),
}

impl PartitionReport {
    /// Whether this report lets the pipeline advance.
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Check `data` against a resolved validator.
///
/// [`Resolved::Absent`] yields [`PartitionReport::Skipped`]. Otherwise all
/// violations are collected in the validator's traversal order.
pub fn check(resolved: &Resolved, data: &Value) -> PartitionReport {
    let validator = match resolved {
        Resolved::Absent => return PartitionReport::Skipped,
        Resolved::Validator(validator) => validator,
    };

    let violations: Vec<Violation> = validator
        .iter_errors(data)
        .map(|e| {
            let schema_path = e.schema_path.to_string();
            Violation {
                keyword: keyword_of(&schema_path),
                path: e.instance_path.to_string(),
                message: e.to_string(),
            }
        })
        .collect();

    if violations.is_empty() {
        PartitionReport::Passed
    } else {
        PartitionReport::Failed(violations)
    }
}

/// Extract the constraint keyword from a schema path.
///
/// The keyword is the last segment that is not an array index, e.g.
/// `/properties/userId/type` yields `type` and `/allOf/0/required` yields
/// `required`.
fn keyword_of(schema_path: &str) -> String {
    schema_path
        .split('/')
        .rev()
        .find(|s| !s.is_empty() && !s.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or("schema")
        .to_string()
}
