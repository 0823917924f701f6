//! Derived-field calculations.
//!
//! Everything here is a pure, total function of its inputs: empty lists and
//! all-zero records produce zeros, never a division by zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::types::{
    AssistanceCostEntry, CostPhase, CostRecord, FactorShares, MethodBaseline, RestorationMethod,
};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Default absolute tolerance for a set of shares summing to 100.
pub const SHARE_SUM_TOLERANCE: f64 = 0.01;

/// `|actual - expected| < tolerance`
pub fn approx_equal(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() < tolerance
}

/// Whether shares sum to 100 within `tolerance`.
pub fn shares_sum_to_100(shares: &FactorShares, tolerance: f64) -> bool {
    approx_equal(shares.sum(), 100.0, tolerance)
}

/// Sum of assistance entry costs; a missing cost counts as zero.
pub fn total_assistance_cost(entries: &[AssistanceCostEntry]) -> f64 {
    entries.iter().map(AssistanceCostEntry::cost_or_zero).sum()
}

/// Unfavorable cost implied by the additive model.
pub fn computed_unfavorable_cost(
    favorable_total: f64,
    entries: &[AssistanceCostEntry],
    interaction_adjustment: f64,
) -> f64 {
    favorable_total + total_assistance_cost(entries) + interaction_adjustment
}

/// Declared vs computed comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    /// `declared - computed`
    pub difference: f64,
    pub within_tolerance: bool,
    /// `|difference| / |declared|`, absent when declared is zero
    pub relative_deviation: Option<f64>,
}

/// Compare a declared total against the computed one.
///
/// A declared value of exactly zero only reconciles with a computed value of
/// exactly zero.
pub fn reconciliation(declared: f64, computed: f64, tolerance: f64) -> Reconciliation {
    let difference = declared - computed;
    if declared == 0.0 {
        return Reconciliation {
            difference,
            within_tolerance: computed == 0.0,
            relative_deviation: None,
        };
    }

    let relative = difference.abs() / declared.abs();
    Reconciliation {
        difference,
        within_tolerance: relative <= tolerance,
        relative_deviation: Some(relative),
    }
}

/// A cost and how it splits across factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostComponent {
    pub cost: f64,
    pub shares: FactorShares,
}

impl CostComponent {
    pub fn new(cost: f64, shares: FactorShares) -> Self {
        Self { cost, shares }
    }
}

/// Cost-weighted average of factor shares.
///
/// Returns the zero triple when the components carry no cost.
pub fn weighted_factor_shares(components: &[CostComponent]) -> FactorShares {
    let total: f64 = components.iter().map(|c| c.cost).sum();
    if total == 0.0 {
        return FactorShares::default();
    }

    let weighted = |dimension: fn(&FactorShares) -> f64| -> f64 {
        components
            .iter()
            .map(|c| c.cost * dimension(&c.shares))
            .sum::<f64>()
            / total
    };

    FactorShares {
        labor: weighted(|s| s.labor),
        materials: weighted(|s| s.materials),
        machinery: weighted(|s| s.machinery),
    }
}

/// Whether one method tab is complete: positive costs and both
/// distributions summing to 100.
pub fn method_tab_complete(baseline: &MethodBaseline, tolerance: f64) -> bool {
    baseline.implementation_cost > 0.0
        && baseline.maintenance_cost > 0.0
        && shares_sum_to_100(&baseline.implementation_distribution, tolerance)
        && shares_sum_to_100(&baseline.maintenance_distribution, tolerance)
}

/// Whether all four method tabs are complete.
pub fn method_tabs_complete(method_costs: &BTreeMap<RestorationMethod, MethodBaseline>) -> bool {
    method_tabs_complete_within(method_costs, SHARE_SUM_TOLERANCE)
}

/// [`method_tabs_complete`] with an explicit share tolerance.
pub fn method_tabs_complete_within(
    method_costs: &BTreeMap<RestorationMethod, MethodBaseline>,
    tolerance: f64,
) -> bool {
    RestorationMethod::all().iter().all(|method| {
        method_costs
            .get(method)
            .is_some_and(|baseline| method_tab_complete(baseline, tolerance))
    })
}

/// Assistance cost split by phase.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct PhaseTotals {
    pub implementation: f64,
    pub maintenance: f64,
    pub both: f64,
}

/// Sum assistance costs per phase.
pub fn assistance_cost_by_phase(entries: &[AssistanceCostEntry]) -> PhaseTotals {
    entries.iter().fold(PhaseTotals::default(), |mut totals, entry| {
        let cost = entry.cost_or_zero();
        match entry.phase {
            CostPhase::Implementation => totals.implementation += cost,
            CostPhase::Maintenance => totals.maintenance += cost,
            CostPhase::Both => totals.both += cost,
        }
        totals
    })
}

/// Everything the summary panels show, computed from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct DerivedSummary {
    pub total_assistance_cost: f64,
    pub assistance_by_phase: PhaseTotals,
    pub declared_unfavorable_cost: f64,
    pub computed_unfavorable_cost: f64,
    pub reconciliation: Reconciliation,
    /// Adjustment that would make declared and computed agree exactly
    pub suggested_interaction_adjustment: f64,
    /// Factor split of the unfavorable scenario, weighted over the favorable
    /// base and each assistance entry
    pub unfavorable_factor_shares: FactorShares,
    pub method_completeness: BTreeMap<RestorationMethod, bool>,
    pub method_tabs_complete: bool,
}

/// Compute all derived values for a record snapshot.
pub fn compute_derived(record: &CostRecord, config: &EngineConfig) -> DerivedSummary {
    let tolerances = &config.tolerances;
    let entries = &record.assistance_costs;

    let total_assistance = total_assistance_cost(entries);
    let computed = computed_unfavorable_cost(
        record.favorable.total_cost,
        entries,
        record.interaction_adjustment,
    );
    let declared = record.declared_unfavorable_cost();

    let mut components = Vec::with_capacity(entries.len() + 1);
    components.push(CostComponent::new(
        record.favorable.total_cost,
        record.favorable_factor_shares,
    ));
    components.extend(
        entries
            .iter()
            .map(|e| CostComponent::new(e.cost_or_zero(), e.factor_shares)),
    );

    let method_completeness = RestorationMethod::all()
        .into_iter()
        .map(|method| {
            let complete = record
                .method_costs
                .get(&method)
                .is_some_and(|b| method_tab_complete(b, tolerances.share_sum));
            (method, complete)
        })
        .collect();

    DerivedSummary {
        total_assistance_cost: total_assistance,
        assistance_by_phase: assistance_cost_by_phase(entries),
        declared_unfavorable_cost: declared,
        computed_unfavorable_cost: computed,
        reconciliation: reconciliation(declared, computed, tolerances.reconciliation),
        suggested_interaction_adjustment: declared
            - (record.favorable.total_cost + total_assistance),
        unfavorable_factor_shares: weighted_factor_shares(&components),
        method_completeness,
        method_tabs_complete: method_tabs_complete_within(
            &record.method_costs,
            tolerances.share_sum,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssistanceActivity;

    fn entry(name: AssistanceActivity, cost: Option<f64>) -> AssistanceCostEntry {
        AssistanceCostEntry {
            cost,
            ..AssistanceCostEntry::zeroed(name)
        }
    }

    fn complete_baseline() -> MethodBaseline {
        MethodBaseline {
            implementation_cost: 1200.0,
            implementation_distribution: FactorShares::new(50.0, 30.0, 20.0),
            maintenance_cost: 300.0,
            maintenance_distribution: FactorShares::new(70.0, 20.0, 10.0),
        }
    }

    #[test]
    fn test_total_assistance_cost_treats_missing_as_zero() {
        let entries = vec![
            entry(AssistanceActivity::Fencing, Some(800.0)),
            entry(AssistanceActivity::Firebreak, None),
            entry(AssistanceActivity::SoilRecovery, Some(300.0)),
        ];
        assert_eq!(total_assistance_cost(&entries), 1100.0);
        assert_eq!(total_assistance_cost(&[]), 0.0);
    }

    #[test]
    fn test_computed_unfavorable_cost() {
        let entries = vec![
            entry(AssistanceActivity::Fencing, Some(800.0)),
            entry(AssistanceActivity::Firebreak, Some(300.0)),
        ];
        assert_eq!(computed_unfavorable_cost(5000.0, &entries, -50.0), 6050.0);
    }

    #[test]
    fn test_reconciliation_within_tolerance() {
        let result = reconciliation(6000.0, 6050.0, 0.05);
        assert!(result.within_tolerance);
        assert_eq!(result.difference, -50.0);
        let relative = result.relative_deviation.unwrap();
        assert!((relative - 0.008_333).abs() < 1e-5);
    }

    #[test]
    fn test_reconciliation_outside_tolerance() {
        let result = reconciliation(6500.0, 6050.0, 0.05);
        assert!(!result.within_tolerance);
        assert_eq!(result.difference, 450.0);
    }

    #[test]
    fn test_reconciliation_zero_declared() {
        let zero = reconciliation(0.0, 0.0, 0.05);
        assert!(zero.within_tolerance);
        assert!(zero.relative_deviation.is_none());

        let nonzero = reconciliation(0.0, 5.0, 0.05);
        assert!(!nonzero.within_tolerance);
        assert_eq!(nonzero.difference, -5.0);
    }

    #[test]
    fn test_weighted_factor_shares() {
        let shares = weighted_factor_shares(&[
            CostComponent::new(300.0, FactorShares::new(100.0, 0.0, 0.0)),
            CostComponent::new(100.0, FactorShares::new(0.0, 100.0, 0.0)),
        ]);
        assert_eq!(shares, FactorShares::new(75.0, 25.0, 0.0));
    }

    #[test]
    fn test_weighted_factor_shares_zero_cost() {
        let shares = weighted_factor_shares(&[
            CostComponent::new(0.0, FactorShares::new(60.0, 30.0, 10.0)),
            CostComponent::new(0.0, FactorShares::new(10.0, 10.0, 80.0)),
        ]);
        assert_eq!(shares, FactorShares::default());
        assert_eq!(weighted_factor_shares(&[]), FactorShares::default());
    }

    #[test]
    fn test_method_tabs_complete() {
        let mut costs: BTreeMap<_, _> = RestorationMethod::all()
            .into_iter()
            .map(|m| (m, complete_baseline()))
            .collect();
        assert!(method_tabs_complete(&costs));

        costs
            .get_mut(&RestorationMethod::DirectSeeding)
            .unwrap()
            .maintenance_distribution = FactorShares::new(50.0, 30.0, 19.0);
        assert!(!method_tabs_complete(&costs));

        costs.insert(RestorationMethod::DirectSeeding, complete_baseline());
        costs
            .get_mut(&RestorationMethod::SeedlingPlanting)
            .unwrap()
            .implementation_cost = 0.0;
        assert!(!method_tabs_complete(&costs));

        costs.insert(RestorationMethod::SeedlingPlanting, complete_baseline());
        costs.remove(&RestorationMethod::NaturalRegeneration);
        assert!(!method_tabs_complete(&costs));
    }

    #[test]
    fn test_compute_derived_on_empty_record() {
        let summary = compute_derived(&CostRecord::default(), &EngineConfig::default());
        assert_eq!(summary.total_assistance_cost, 0.0);
        assert_eq!(summary.computed_unfavorable_cost, 0.0);
        assert!(summary.reconciliation.within_tolerance);
        assert_eq!(summary.unfavorable_factor_shares, FactorShares::default());
        assert!(!summary.method_tabs_complete);
        assert!(summary.method_completeness.values().all(|c| !c));
    }

    #[test]
    fn test_compute_derived_phase_split_and_suggestion() {
        let mut record = CostRecord::default();
        record.favorable.total_cost = 5000.0;
        record.unfavorable.total_cost = 6500.0;
        record.interaction_adjustment = -50.0;
        record.assistance_costs = vec![
            AssistanceCostEntry {
                phase: CostPhase::Maintenance,
                ..entry(AssistanceActivity::Fencing, Some(800.0))
            },
            AssistanceCostEntry {
                phase: CostPhase::Both,
                ..entry(AssistanceActivity::Firebreak, Some(300.0))
            },
        ];

        let summary = compute_derived(&record, &EngineConfig::default());
        assert_eq!(summary.computed_unfavorable_cost, 6050.0);
        assert!(!summary.reconciliation.within_tolerance);
        assert_eq!(summary.suggested_interaction_adjustment, 400.0);
        assert_eq!(summary.assistance_by_phase.maintenance, 800.0);
        assert_eq!(summary.assistance_by_phase.both, 300.0);
        assert_eq!(summary.assistance_by_phase.implementation, 0.0);
    }
}
