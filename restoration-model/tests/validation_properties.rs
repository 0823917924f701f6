//! Validation and derived-field property tests

mod common;

use common::{entry, shares, valid_record};
use restoration_model::derived::{
    computed_unfavorable_cost, method_tabs_complete, reconciliation, weighted_factor_shares,
    CostComponent,
};
use restoration_model::*;

fn share_sum_check<'a>(result: &'a ValidationResult, path: &str) -> &'a Check {
    result
        .node(&FieldPath::parse(path))
        .expect("node present")
        .checks
        .iter()
        .find(|check| match check {
            Check::Valid { rule } => *rule == Rule::ShareSum,
            Check::Invalid(v) => v.rule == Rule::ShareSum,
        })
        .expect("share sum check present")
}

#[test]
fn test_share_sum_holds_exactly_within_tolerance() {
    let triples = [
        (50.0, 30.0, 20.0),
        (100.0, 0.0, 0.0),
        (33.33, 33.33, 33.335),
        (50.0, 30.0, 19.995),
        (50.0, 30.0, 17.3),
        (0.0, 0.0, 0.0),
        (100.0, 100.0, 100.0),
        (40.0, 40.0, 20.02),
    ];

    for (labor, materials, machinery) in triples {
        let mut record = valid_record();
        let triple = FactorShares::new(labor, materials, machinery);
        record.favorable_factor_shares = triple;

        let result = validate(&record);
        let check = share_sum_check(&result, "favorableFactorShares.labor");
        let expected_ok = (triple.sum() - 100.0).abs() < 0.01;

        match check {
            Check::Valid { .. } => assert!(expected_ok, "{:?} should fail", triple),
            Check::Invalid(violation) => {
                assert!(!expected_ok, "{:?} should pass", triple);
                assert_eq!(violation.actual, Some(triple.sum()));
                assert_eq!(violation.kind, ViolationKind::Invariant);
            }
        }
    }
}

#[test]
fn test_share_sum_message_reports_current_sum() {
    let mut record = valid_record();
    record.favorable_factor_shares = FactorShares::new(50.0, 30.0, 17.3);

    let result = validate(&record);
    let Check::Invalid(violation) = share_sum_check(&result, "favorableFactorShares.labor") else {
        panic!("expected a share-sum violation");
    };
    assert_eq!(violation.reason, "shares must sum to 100% (currently 97.30%)");
}

#[test]
fn test_scenario_total_must_balance() {
    let mut record = valid_record();
    record.favorable = ScenarioCosts::new(1000.0, 400.0, 600.0);
    let balanced = validate(&record);
    assert!(balanced
        .violations()
        .iter()
        .all(|v| v.rule != Rule::ScenarioTotal));

    record.favorable = ScenarioCosts::new(1000.0, 400.0, 601.0);
    let unbalanced = validate(&record);
    assert!(!unbalanced.is_valid());

    let violation = unbalanced
        .errors()
        .into_iter()
        .find(|v| v.rule == Rule::ScenarioTotal)
        .expect("scenario total violation");
    assert_eq!(violation.path.to_string(), "favorable.totalCost");
    assert_eq!(violation.actual, Some(-1.0));
    assert!(violation.reason.contains("difference 1.00"));
}

#[test]
fn test_computed_unfavorable_cost() {
    let entries = [
        entry(AssistanceActivity::Fencing, 800.0),
        entry(AssistanceActivity::Firebreak, 300.0),
    ];
    assert_eq!(computed_unfavorable_cost(5000.0, &entries, -50.0), 6050.0);
}

#[test]
fn test_reconciliation_tolerance() {
    let close = reconciliation(6000.0, 6050.0, 0.05);
    assert!(close.within_tolerance);
    assert!((close.relative_deviation.unwrap() - 0.00833).abs() < 1e-4);

    let far = reconciliation(6500.0, 6050.0, 0.05);
    assert!(!far.within_tolerance);
    assert!((far.relative_deviation.unwrap() - 0.0692).abs() < 1e-3);
}

#[test]
fn test_reconciliation_with_zero_declared() {
    assert!(reconciliation(0.0, 0.0, 0.05).within_tolerance);

    let result = reconciliation(0.0, 5.0, 0.05);
    assert!(!result.within_tolerance);
    assert_eq!(result.relative_deviation, None);
    assert_eq!(result.difference, -5.0);
}

#[test]
fn test_zero_declared_record_warns() {
    let mut record = valid_record();
    record.unfavorable = ScenarioCosts::default();

    let result = validate(&record);
    assert!(result.is_valid());
    let warning = result.warnings()[0];
    assert_eq!(warning.rule, Rule::Reconciliation);
    assert!(warning.reason.starts_with("declared unfavorable cost is 0"));
}

#[test]
fn test_weighted_shares_with_zero_costs() {
    let components = [
        CostComponent::new(0.0, FactorShares::new(100.0, 0.0, 0.0)),
        CostComponent::new(0.0, FactorShares::new(0.0, 50.0, 50.0)),
    ];
    assert_eq!(weighted_factor_shares(&components), FactorShares::default());
}

#[test]
fn test_weighted_shares_follow_cost() {
    let components = [
        CostComponent::new(3000.0, FactorShares::new(100.0, 0.0, 0.0)),
        CostComponent::new(1000.0, FactorShares::new(0.0, 0.0, 100.0)),
    ];
    assert_eq!(
        weighted_factor_shares(&components),
        FactorShares::new(75.0, 0.0, 25.0)
    );
}

#[test]
fn test_method_tabs_complete() {
    let record = valid_record();
    assert!(method_tabs_complete(&record.method_costs));

    let mut missing = record.method_costs.clone();
    missing.remove(&RestorationMethod::AssistedNaturalRegeneration);
    assert!(!method_tabs_complete(&missing));

    let mut unpriced = record.method_costs.clone();
    unpriced
        .get_mut(&RestorationMethod::NaturalRegeneration)
        .unwrap()
        .maintenance_cost = 0.0;
    assert!(!method_tabs_complete(&unpriced));

    let mut skewed = record.method_costs.clone();
    skewed
        .get_mut(&RestorationMethod::SeedlingPlanting)
        .unwrap()
        .implementation_distribution = FactorShares::new(60.0, 30.0, 20.0);
    assert!(!method_tabs_complete(&skewed));
}

#[test]
fn test_missing_method_is_reported_at_its_tab() {
    let mut record = valid_record();
    record.method_costs.remove(&RestorationMethod::DirectSeeding);

    let result = validate(&record);
    let under = result.violations_under(&FieldPath::parse("methodCosts.direct_seeding"));
    assert_eq!(under.len(), 1);
    assert_eq!(under[0].rule, Rule::MethodPresent);
}

#[test]
fn test_time_horizon_bounds() {
    for (years, ok) in [(0, false), (1, true), (20, true), (100, true), (101, false)] {
        let mut record = valid_record();
        record.time_horizon_years = years;
        assert_eq!(validate(&record).is_valid(), ok, "horizon {}", years);
    }
}

#[test]
fn test_non_finite_values_are_rejected() {
    let mut record = valid_record();
    record.interaction_adjustment = f64::INFINITY;

    let result = validate(&record);
    let under = result.violations_under(&FieldPath::parse("interactionAdjustment"));
    assert_eq!(under[0].rule, Rule::Domain);
    assert_eq!(under[0].kind, ViolationKind::Schema);
}

#[test]
fn test_duplicate_selection_and_orphan_entry() {
    let mut record = valid_record();
    record.selected_assistances.push(AssistanceActivity::Fencing);
    record
        .assistance_costs
        .push(entry(AssistanceActivity::SoilRecovery, 0.0));

    let result = validate(&record);
    let rules: Vec<Rule> = result.errors().iter().map(|v| v.rule).collect();
    assert!(rules.contains(&Rule::UniqueSelection));
    assert!(rules.contains(&Rule::EntrySelected));
    assert!(result.has_kind(ViolationKind::Correspondence));
}

#[test]
fn test_severity_context_variant_is_accepted() {
    let mut record = valid_record();
    record.context = ContextVariables::Severity(SeverityContext::default());
    assert!(validate(&record).is_valid());
}

#[test]
fn test_labor_breakdown_pairs_sum_to_100() {
    let mut record = valid_record();
    record.labor_breakdown = Some(LaborBreakdown {
        implementation: LaborSplit {
            hired_labor: 70.0,
            family_labor: 30.0,
        },
        maintenance: LaborSplit {
            hired_labor: 70.0,
            family_labor: 20.0,
        },
        hired_labor_daily_rate: 25.0,
    });

    let result = validate(&record);
    let errors = result.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].path.to_string(),
        "laborBreakdown.maintenance.hiredLabor"
    );
    assert_eq!(errors[0].actual, Some(90.0));
}

#[test]
fn test_derived_summary_for_valid_record() {
    let summary = compute_derived(&valid_record(), &EngineConfig::default());
    assert_eq!(summary.total_assistance_cost, 1000.0);
    assert_eq!(summary.computed_unfavorable_cost, 6000.0);
    assert_eq!(summary.suggested_interaction_adjustment, 0.0);
    assert!(summary.reconciliation.within_tolerance);
    assert!(summary.method_tabs_complete);
    assert_eq!(summary.unfavorable_factor_shares, shares());
}
