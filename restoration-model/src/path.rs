//! Field paths into a [`CostRecord`](crate::types::CostRecord).
//!
//! Paths use the record's serialized field names so the browser form can map
//! a violation straight onto the input that caused it, e.g.
//! `methodCosts.direct_seeding.implementationDistribution.labor` or
//! `assistanceCosts[2].cost`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// One step of a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(untagged)]
pub enum PathSegment {
    /// Named field or map key
    Field(String),
    /// Position in a list
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// Path from the record root to a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(transparent)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The record root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dotted path such as `assistanceCosts[1].cost`.
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        for part in path.split('.').filter(|p| !p.is_empty()) {
            let (name, rest) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };
            if !name.is_empty() {
                segments.push(PathSegment::Field(name.to_string()));
            }
            for index in rest.split('[').filter(|s| !s.is_empty()) {
                let digits = index.trim_end_matches(']');
                match digits.parse::<usize>() {
                    Ok(i) => segments.push(PathSegment::Index(i)),
                    Err(_) => segments.push(PathSegment::Field(digits.to_string())),
                }
            }
        }
        Self(segments)
    }

    /// Child path for a named field.
    pub fn field(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Field(name.into()));
        Self(segments)
    }

    /// Child path for a list position.
    pub fn index(&self, i: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(i));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `self` equals `other` or lies beneath it.
    pub fn starts_with(&self, other: &FieldPath) -> bool {
        self.0.starts_with(&other.0)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i > 0 => write!(f, ".{}", name)?,
                other => write!(f, "{}", other)?,
            }
        }
        Ok(())
    }
}
