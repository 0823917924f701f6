//! Record schema and invariant set.
//!
//! Every sub-structure of a [`CostRecord`] knows which constraints apply to
//! it through the [`Constrained`] trait. Mounting a structure at a path
//! yields [`Invariant`]s bound to the snapshot's values, each reporting
//! against the field that caused it. [`RecordSchema`] composes the
//! sub-structures and adds the cross-field rules (scenario reconciliation,
//! assistance-entry correspondence, method presence).

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, ToleranceConfig};
use crate::derived::{approx_equal, computed_unfavorable_cost, reconciliation};
use crate::path::FieldPath;
use crate::types::*;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Domain of a numeric leaf field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum NumericDomain {
    /// `[0, 100]`
    Percentage,
    /// `[0, ∞)`, costs and rates
    NonNegative,
    /// Any finite value
    Signed,
}

impl NumericDomain {
    pub fn contains(&self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self {
            Self::Percentage => (0.0..=100.0).contains(&value),
            Self::NonNegative => value >= 0.0,
            Self::Signed => true,
        }
    }

    fn describe(&self, value: f64) -> String {
        if !value.is_finite() {
            return "must be a finite number".to_string();
        }
        match self {
            Self::Percentage => format!("must be between 0 and 100 (currently {})", value),
            Self::NonNegative => format!("must not be negative (currently {})", value),
            Self::Signed => "must be a finite number".to_string(),
        }
    }
}

/// Which rule a check comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Field must be filled in
    Required,
    /// Numeric value within its domain
    Domain,
    /// Time horizon within configured bounds
    HorizonRange,
    /// Selected assistance listed once
    UniqueSelection,
    /// Method variant baseline is present
    MethodPresent,
    /// Method baseline cost is strictly positive
    PositiveCost,
    /// Shares sum to 100
    ShareSum,
    /// Total equals implementation + maintenance
    ScenarioTotal,
    /// Cost entry belongs to a selected assistance
    EntrySelected,
    /// Selected assistance has a cost entry
    EntryPresent,
    /// Declared vs computed unfavorable cost
    Reconciliation,
}

impl Rule {
    /// Error category the rule reports under.
    pub fn kind(&self) -> ViolationKind {
        match self {
            Self::Required
            | Self::Domain
            | Self::HorizonRange
            | Self::UniqueSelection
            | Self::MethodPresent => ViolationKind::Schema,
            Self::PositiveCost | Self::ShareSum | Self::ScenarioTotal => ViolationKind::Invariant,
            Self::EntrySelected | Self::EntryPresent => ViolationKind::Correspondence,
            Self::Reconciliation => ViolationKind::Reconciliation,
        }
    }
}

/// Error taxonomy for violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Value outside its declared domain
    Schema,
    /// Cross-field arithmetic constraint broken beyond tolerance
    Invariant,
    /// Declared and computed unfavorable cost diverge
    Reconciliation,
    /// Assistance entries out of step with the selection
    Correspondence,
}

/// How a violation affects the persist gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Advisory only
    Warning,
    /// Blocks persist/export
    Error,
}

/// A constraint bound to the values of one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Required {
        present: bool,
    },
    InDomain {
        value: f64,
        domain: NumericDomain,
    },
    HorizonRange {
        years: u32,
        min: u32,
        max: u32,
    },
    Unique {
        name: AssistanceActivity,
        duplicate: bool,
    },
    MethodPresent {
        method: RestorationMethod,
        present: bool,
    },
    Positive {
        value: f64,
    },
    /// Shares (a triple or a labor pair) summing to 100
    SumsTo100 {
        sum: f64,
    },
    ScenarioTotal {
        costs: ScenarioCosts,
    },
    EntrySelected {
        name: AssistanceActivity,
        selected: bool,
    },
    EntryPresent {
        name: AssistanceActivity,
        present: bool,
    },
    Reconciliation {
        declared: f64,
        computed: f64,
    },
}

impl Constraint {
    pub fn rule(&self) -> Rule {
        match self {
            Self::Required { .. } => Rule::Required,
            Self::InDomain { .. } => Rule::Domain,
            Self::HorizonRange { .. } => Rule::HorizonRange,
            Self::Unique { .. } => Rule::UniqueSelection,
            Self::MethodPresent { .. } => Rule::MethodPresent,
            Self::Positive { .. } => Rule::PositiveCost,
            Self::SumsTo100 { .. } => Rule::ShareSum,
            Self::ScenarioTotal { .. } => Rule::ScenarioTotal,
            Self::EntrySelected { .. } => Rule::EntrySelected,
            Self::EntryPresent { .. } => Rule::EntryPresent,
            Self::Reconciliation { .. } => Rule::Reconciliation,
        }
    }

    /// Check the constraint. Returns the failure reason and the offending
    /// actual value, or `None` when it holds.
    pub fn check(&self, tolerances: &ToleranceConfig) -> Option<(String, Option<f64>)> {
        match *self {
            Self::Required { present } => {
                (!present).then(|| ("is required".to_string(), None))
            }
            Self::InDomain { value, domain } => {
                (!domain.contains(value)).then(|| (domain.describe(value), Some(value)))
            }
            Self::HorizonRange { years, min, max } => (!(min..=max).contains(&years)).then(|| {
                (
                    format!(
                        "must be between {} and {} years (currently {})",
                        min, max, years
                    ),
                    Some(years as f64),
                )
            }),
            Self::Unique { name, duplicate } => duplicate.then(|| {
                (
                    format!("'{}' is selected more than once", name.as_str()),
                    None,
                )
            }),
            Self::MethodPresent { method, present } => (!present).then(|| {
                (
                    format!("baseline costs for '{}' are missing", method.as_str()),
                    None,
                )
            }),
            Self::Positive { value } => (!(value > 0.0)).then(|| {
                (
                    format!("must be greater than 0 (currently {})", value),
                    Some(value),
                )
            }),
            Self::SumsTo100 { sum } => (!approx_equal(sum, 100.0, tolerances.share_sum)).then(|| {
                (
                    format!("shares must sum to 100% (currently {:.2}%)", sum),
                    Some(sum),
                )
            }),
            Self::ScenarioTotal { costs } => {
                let imbalance = costs.imbalance();
                (!approx_equal(imbalance, 0.0, tolerances.scenario_total)).then(|| {
                    (
                        format!(
                            "total cost must equal implementation + maintenance (difference {:.2})",
                            imbalance.abs()
                        ),
                        Some(imbalance),
                    )
                })
            }
            Self::EntrySelected { name, selected } => (!selected).then(|| {
                (
                    format!(
                        "cost entry '{}' has no matching selected assistance",
                        name.as_str()
                    ),
                    None,
                )
            }),
            Self::EntryPresent { name, present } => (!present).then(|| {
                (
                    format!("selected assistance '{}' has no cost entry", name.as_str()),
                    None,
                )
            }),
            Self::Reconciliation { declared, computed } => {
                let result = reconciliation(declared, computed, tolerances.reconciliation);
                if result.within_tolerance {
                    return None;
                }
                let reason = match result.relative_deviation {
                    Some(relative) => format!(
                        "declared unfavorable cost {:.2} differs from computed {:.2} by {:.2}% (tolerance {:.2}%)",
                        declared,
                        computed,
                        relative * 100.0,
                        tolerances.reconciliation * 100.0
                    ),
                    None => format!(
                        "declared unfavorable cost is 0 but computed cost is {:.2}",
                        computed
                    ),
                };
                Some((reason, Some(result.difference)))
            }
        }
    }
}

/// A constraint attached to the field it reports against.
#[derive(Debug, Clone, PartialEq)]
pub struct Invariant {
    pub path: FieldPath,
    pub constraint: Constraint,
}

impl Invariant {
    pub fn new(path: FieldPath, constraint: Constraint) -> Self {
        Self { path, constraint }
    }

    pub fn rule(&self) -> Rule {
        self.constraint.rule()
    }
}

/// A sub-structure that contributes invariants when mounted at a path.
pub trait Constrained {
    fn invariants(&self, at: &FieldPath, out: &mut Vec<Invariant>);
}

fn number(out: &mut Vec<Invariant>, path: FieldPath, value: f64, domain: NumericDomain) {
    out.push(Invariant::new(path, Constraint::InDomain { value, domain }));
}

impl Constrained for FactorShares {
    fn invariants(&self, at: &FieldPath, out: &mut Vec<Invariant>) {
        for (name, value) in self.dimensions() {
            number(out, at.field(name), value, NumericDomain::Percentage);
        }
        // Sum report attaches to the first field of the triple
        out.push(Invariant::new(
            at.field("labor"),
            Constraint::SumsTo100 { sum: self.sum() },
        ));
    }
}

impl Constrained for LaborSplit {
    fn invariants(&self, at: &FieldPath, out: &mut Vec<Invariant>) {
        number(out, at.field("hiredLabor"), self.hired_labor, NumericDomain::Percentage);
        number(out, at.field("familyLabor"), self.family_labor, NumericDomain::Percentage);
        out.push(Invariant::new(
            at.field("hiredLabor"),
            Constraint::SumsTo100 {
                sum: self.hired_labor + self.family_labor,
            },
        ));
    }
}

impl Constrained for ScenarioCosts {
    fn invariants(&self, at: &FieldPath, out: &mut Vec<Invariant>) {
        number(out, at.field("totalCost"), self.total_cost, NumericDomain::NonNegative);
        number(
            out,
            at.field("implementationCost"),
            self.implementation_cost,
            NumericDomain::NonNegative,
        );
        number(
            out,
            at.field("maintenanceCost"),
            self.maintenance_cost,
            NumericDomain::NonNegative,
        );
        out.push(Invariant::new(
            at.field("totalCost"),
            Constraint::ScenarioTotal { costs: *self },
        ));
    }
}

impl Constrained for MethodBaseline {
    fn invariants(&self, at: &FieldPath, out: &mut Vec<Invariant>) {
        for (name, value) in [
            ("implementationCost", self.implementation_cost),
            ("maintenanceCost", self.maintenance_cost),
        ] {
            number(out, at.field(name), value, NumericDomain::NonNegative);
            out.push(Invariant::new(at.field(name), Constraint::Positive { value }));
        }
        self.implementation_distribution
            .invariants(&at.field("implementationDistribution"), out);
        self.maintenance_distribution
            .invariants(&at.field("maintenanceDistribution"), out);
    }
}

impl Constrained for ContextConstraint {
    fn invariants(&self, at: &FieldPath, out: &mut Vec<Invariant>) {
        number(out, at.field("cost"), self.cost, NumericDomain::NonNegative);
        self.distribution.invariants(&at.field("distribution"), out);
    }
}

impl Constrained for ContextVariables {
    fn invariants(&self, at: &FieldPath, out: &mut Vec<Invariant>) {
        // Severity levels are closed enums; nothing left to check
        if let Self::Constraints(constraints) = self {
            for (dimension, entry) in constraints.entries() {
                entry.invariants(&at.field(dimension.field_name()), out);
            }
        }
    }
}

impl Constrained for AssistanceCostEntry {
    fn invariants(&self, at: &FieldPath, out: &mut Vec<Invariant>) {
        if let Some(cost) = self.cost {
            number(out, at.field("cost"), cost, NumericDomain::NonNegative);
        }
        self.factor_shares.invariants(&at.field("factorShares"), out);
    }
}

impl Constrained for LaborBreakdown {
    fn invariants(&self, at: &FieldPath, out: &mut Vec<Invariant>) {
        self.implementation.invariants(&at.field("implementation"), out);
        self.maintenance.invariants(&at.field("maintenance"), out);
        number(
            out,
            at.field("hiredLaborDailyRate"),
            self.hired_labor_daily_rate,
            NumericDomain::NonNegative,
        );
    }
}

/// The full invariant set of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub min_years: u32,
    pub max_years: u32,
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl RecordSchema {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            min_years: config.time_horizon.min_years,
            max_years: config.time_horizon.max_years,
        }
    }

    /// Bind every declared invariant to the values of `record`.
    ///
    /// Invariants come out in record declaration order.
    pub fn invariants(&self, record: &CostRecord) -> Vec<Invariant> {
        let root = FieldPath::root();
        let mut out = Vec::new();

        // Identification
        out.push(Invariant::new(
            root.field("ecosystem"),
            Constraint::Required {
                present: record.ecosystem.is_some(),
            },
        ));
        for (name, text) in [("country", &record.country), ("method", &record.method)] {
            out.push(Invariant::new(
                root.field(name),
                Constraint::Required {
                    present: !text.trim().is_empty(),
                },
            ));
        }
        out.push(Invariant::new(
            root.field("timeHorizonYears"),
            Constraint::HorizonRange {
                years: record.time_horizon_years,
                min: self.min_years,
                max: self.max_years,
            },
        ));

        // Method baselines
        let methods = root.field("methodCosts");
        for method in RestorationMethod::all() {
            let at = methods.field(method.as_str());
            match record.method_costs.get(&method) {
                Some(baseline) => baseline.invariants(&at, &mut out),
                None => out.push(Invariant::new(
                    at,
                    Constraint::MethodPresent {
                        method,
                        present: false,
                    },
                )),
            }
        }

        record.context.invariants(&root.field("context"), &mut out);

        // Selection must be a set
        let selected = root.field("selectedAssistances");
        for (i, name) in record.selected_assistances.iter().enumerate() {
            out.push(Invariant::new(
                selected.index(i),
                Constraint::Unique {
                    name: *name,
                    duplicate: record.selected_assistances[..i].contains(name),
                },
            ));
        }

        record.favorable.invariants(&root.field("favorable"), &mut out);
        record.unfavorable.invariants(&root.field("unfavorable"), &mut out);
        out.push(Invariant::new(
            root.field("unfavorable").field("totalCost"),
            Constraint::Reconciliation {
                declared: record.declared_unfavorable_cost(),
                computed: computed_unfavorable_cost(
                    record.favorable.total_cost,
                    &record.assistance_costs,
                    record.interaction_adjustment,
                ),
            },
        ));

        // Assistance entries, and their correspondence with the selection
        let entries = root.field("assistanceCosts");
        for (i, entry) in record.assistance_costs.iter().enumerate() {
            let at = entries.index(i);
            let first_for_name = !record.assistance_costs[..i]
                .iter()
                .any(|e| e.name == entry.name);
            out.push(Invariant::new(
                at.field("name"),
                Constraint::EntrySelected {
                    name: entry.name,
                    selected: first_for_name && record.selected_assistances.contains(&entry.name),
                },
            ));
            entry.invariants(&at, &mut out);
        }
        for (i, name) in record.selected_assistances.iter().enumerate() {
            out.push(Invariant::new(
                selected.index(i),
                Constraint::EntryPresent {
                    name: *name,
                    present: record.assistance_costs.iter().any(|e| e.name == *name),
                },
            ));
        }

        out.push(Invariant::new(
            root.field("interactionAdjustment"),
            Constraint::InDomain {
                value: record.interaction_adjustment,
                domain: NumericDomain::Signed,
            },
        ));
        record
            .favorable_factor_shares
            .invariants(&root.field("favorableFactorShares"), &mut out);

        if let Some(labor) = &record.labor_breakdown {
            labor.invariants(&root.field("laborBreakdown"), &mut out);
        }

        out
    }
}
