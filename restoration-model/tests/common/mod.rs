//! Shared fixtures for integration tests

#![allow(dead_code)]

use restoration_model::*;

pub fn shares() -> FactorShares {
    FactorShares::new(50.0, 30.0, 20.0)
}

/// A record that passes every check and has complete method tabs.
pub fn valid_record() -> CostRecord {
    let mut record = CostRecord::default();
    record.ecosystem = Some(Ecosystem::TropicalMoistForest);
    record.country = "Brazil".to_string();
    record.method = "Seedling planting".to_string();
    for baseline in record.method_costs.values_mut() {
        *baseline = MethodBaseline {
            implementation_cost: 1000.0,
            implementation_distribution: shares(),
            maintenance_cost: 250.0,
            maintenance_distribution: shares(),
        };
    }
    if let ContextVariables::Constraints(ctx) = &mut record.context {
        for entry in [
            &mut ctx.fire_risk,
            &mut ctx.soil_degradation,
            &mut ctx.grazing_pressure,
            &mut ctx.invasive_pressure,
            &mut ctx.human_encroachment,
            &mut ctx.seed_availability,
        ] {
            entry.distribution = shares();
        }
    }
    record.favorable = ScenarioCosts::new(5000.0, 4000.0, 1000.0);
    record.favorable_factor_shares = shares();
    record.selected_assistances = vec![AssistanceActivity::Fencing];
    record.assistance_costs = vec![AssistanceCostEntry {
        cost: Some(1000.0),
        factor_shares: shares(),
        ..AssistanceCostEntry::zeroed(AssistanceActivity::Fencing)
    }];
    record.unfavorable = ScenarioCosts::new(6000.0, 4500.0, 1500.0);
    record
}

pub fn entry(name: AssistanceActivity, cost: f64) -> AssistanceCostEntry {
    AssistanceCostEntry {
        cost: Some(cost),
        factor_shares: shares(),
        ..AssistanceCostEntry::zeroed(name)
    }
}
