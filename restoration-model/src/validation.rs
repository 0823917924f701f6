//! Validation evaluator.
//!
//! [`validate`] evaluates every invariant of a record snapshot and returns a
//! [`ValidationResult`]: a tree shaped like the record, where each field node
//! holds the checks that report against it. Evaluation never stops at the
//! first failure and has no side effects, so the same snapshot always yields
//! an identical tree.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::path::{FieldPath, PathSegment};
use crate::schema::{RecordSchema, Rule, Severity, ViolationKind};
use crate::types::CostRecord;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// A failed check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub path: FieldPath,
    pub rule: Rule,
    pub kind: ViolationKind,
    pub severity: Severity,
    pub reason: String,
    /// Offending value (current sum, difference, ...) when there is one
    pub actual: Option<f64>,
}

/// Outcome of one invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Check {
    Valid { rule: Rule },
    Invalid(Violation),
}

impl Check {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Self::Valid { .. } => None,
            Self::Invalid(violation) => Some(violation),
        }
    }
}

/// One node of the result tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ValidationNode {
    /// Field name or list index; `None` at the root
    pub segment: Option<PathSegment>,
    /// Checks reporting against this exact field
    pub checks: Vec<Check>,
    /// Nested fields, in record declaration order
    pub children: Vec<ValidationNode>,
}

impl ValidationNode {
    fn child_mut(&mut self, segment: &PathSegment) -> &mut ValidationNode {
        let position = self
            .children
            .iter()
            .position(|c| c.segment.as_ref() == Some(segment));
        let index = match position {
            Some(index) => index,
            None => {
                self.children.push(ValidationNode {
                    segment: Some(segment.clone()),
                    ..Default::default()
                });
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    fn insert(&mut self, path: &FieldPath, check: Check) {
        let mut node = self;
        for segment in path.segments() {
            node = node.child_mut(segment);
        }
        node.checks.push(check);
    }

    /// Whether this node and everything beneath it passed.
    pub fn is_valid(&self) -> bool {
        self.checks.iter().all(Check::is_valid) && self.children.iter().all(|c| c.is_valid())
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Violation>) {
        out.extend(self.checks.iter().filter_map(Check::violation));
        for child in &self.children {
            child.collect(out);
        }
    }
}

/// Result tree plus counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub root: ValidationNode,
    pub error_count: usize,
    pub warning_count: usize,
}

impl ValidationResult {
    /// No error-severity violations.
    pub fn is_valid(&self) -> bool {
        self.error_count == 0
    }

    /// All violations, in record declaration order.
    pub fn violations(&self) -> Vec<&Violation> {
        let mut out = Vec::new();
        self.root.collect(&mut out);
        out
    }

    pub fn errors(&self) -> Vec<&Violation> {
        self.filter_severity(Severity::Error)
    }

    pub fn warnings(&self) -> Vec<&Violation> {
        self.filter_severity(Severity::Warning)
    }

    fn filter_severity(&self, severity: Severity) -> Vec<&Violation> {
        self.violations()
            .into_iter()
            .filter(|v| v.severity == severity)
            .collect()
    }

    /// Node for an exact path.
    pub fn node(&self, path: &FieldPath) -> Option<&ValidationNode> {
        let mut node = &self.root;
        for segment in path.segments() {
            node = node
                .children
                .iter()
                .find(|c| c.segment.as_ref() == Some(segment))?;
        }
        Some(node)
    }

    /// Violations at `path` or beneath it.
    pub fn violations_under(&self, path: &FieldPath) -> Vec<&Violation> {
        let mut out = Vec::new();
        if let Some(node) = self.node(path) {
            node.collect(&mut out);
        }
        out
    }

    /// Whether any violation of `kind` is present.
    pub fn has_kind(&self, kind: ViolationKind) -> bool {
        self.violations().iter().any(|v| v.kind == kind)
    }
}

/// Validate a snapshot with the default configuration.
pub fn validate(record: &CostRecord) -> ValidationResult {
    validate_with(record, &EngineConfig::default())
}

/// Validate a snapshot.
pub fn validate_with(record: &CostRecord, config: &EngineConfig) -> ValidationResult {
    let schema = RecordSchema::from_config(config);
    let mut root = ValidationNode::default();
    let mut error_count = 0;
    let mut warning_count = 0;

    for invariant in schema.invariants(record) {
        let rule = invariant.rule();
        let check = match invariant.constraint.check(&config.tolerances) {
            None => Check::Valid { rule },
            Some((reason, actual)) => {
                let severity = severity_for(rule, config);
                match severity {
                    Severity::Error => error_count += 1,
                    Severity::Warning => warning_count += 1,
                }
                Check::Invalid(Violation {
                    path: invariant.path.clone(),
                    rule,
                    kind: rule.kind(),
                    severity,
                    reason,
                    actual,
                })
            }
        };
        root.insert(&invariant.path, check);
    }

    ValidationResult {
        root,
        error_count,
        warning_count,
    }
}

fn severity_for(rule: Rule, config: &EngineConfig) -> Severity {
    match rule {
        Rule::Reconciliation if !config.gate.reconciliation_blocks_persist => Severity::Warning,
        _ => Severity::Error,
    }
}
