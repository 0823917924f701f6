//! Core types for the restoration cost record.
//!
//! A [`CostRecord`] describes one (ecosystem × restoration method) cost
//! profile: baseline costs for each of the four method variants, the
//! site context, the favorable and unfavorable scenario totals and the
//! assistance activities that separate the two scenarios.
//!
//! With the `typescript` feature enabled, these types can be exported to
//! TypeScript using ts-rs so the browser form shares one definition.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Default analysis horizon for a new record, in years.
pub const DEFAULT_TIME_HORIZON_YEARS: u32 = 20;

/// Ecosystem the restoration project targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Ecosystem {
    TropicalMoistForest,
    TropicalDryForest,
    Savanna,
    Grassland,
    Mangrove,
    Wetland,
    TemperateForest,
}

impl Ecosystem {
    /// Stable identifier, matches the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TropicalMoistForest => "tropical_moist_forest",
            Self::TropicalDryForest => "tropical_dry_forest",
            Self::Savanna => "savanna",
            Self::Grassland => "grassland",
            Self::Mangrove => "mangrove",
            Self::Wetland => "wetland",
            Self::TemperateForest => "temperate_forest",
        }
    }

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TropicalMoistForest => "Tropical Moist Forest",
            Self::TropicalDryForest => "Tropical Dry Forest",
            Self::Savanna => "Savanna",
            Self::Grassland => "Grassland",
            Self::Mangrove => "Mangrove",
            Self::Wetland => "Wetland",
            Self::TemperateForest => "Temperate Forest",
        }
    }
}

/// The four method variants every record carries baseline costs for.
///
/// Ordered from least to most intervention; this is also the tab order of
/// the baseline-cost section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum RestorationMethod {
    NaturalRegeneration,
    AssistedNaturalRegeneration,
    DirectSeeding,
    SeedlingPlanting,
}

impl RestorationMethod {
    /// All variants in tab order.
    pub fn all() -> [Self; 4] {
        [
            Self::NaturalRegeneration,
            Self::AssistedNaturalRegeneration,
            Self::DirectSeeding,
            Self::SeedlingPlanting,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NaturalRegeneration => "natural_regeneration",
            Self::AssistedNaturalRegeneration => "assisted_natural_regeneration",
            Self::DirectSeeding => "direct_seeding",
            Self::SeedlingPlanting => "seedling_planting",
        }
    }
}

/// Assistance activities required only in the unfavorable scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum AssistanceActivity {
    Fencing,
    Firebreak,
    SoilRecovery,
    InvasiveControl,
    CattleManagement,
    EnrichmentPlanting,
}

impl AssistanceActivity {
    /// The full catalog in display order.
    pub fn catalog() -> [Self; 6] {
        [
            Self::Fencing,
            Self::Firebreak,
            Self::SoilRecovery,
            Self::InvasiveControl,
            Self::CattleManagement,
            Self::EnrichmentPlanting,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fencing => "fencing",
            Self::Firebreak => "firebreak",
            Self::SoilRecovery => "soil_recovery",
            Self::InvasiveControl => "invasive_control",
            Self::CattleManagement => "cattle_management",
            Self::EnrichmentPlanting => "enrichment_planting",
        }
    }
}

/// Project phase a cost applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum CostPhase {
    Implementation,
    Maintenance,
    Both,
}

impl Default for CostPhase {
    fn default() -> Self {
        Self::Implementation
    }
}

/// Percentage split of a cost across labor, materials and machinery.
///
/// Must sum to 100 within the share-sum tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct FactorShares {
    pub labor: f64,
    pub materials: f64,
    pub machinery: f64,
}

impl FactorShares {
    pub fn new(labor: f64, materials: f64, machinery: f64) -> Self {
        Self {
            labor,
            materials,
            machinery,
        }
    }

    /// Sum of the three dimensions.
    pub fn sum(&self) -> f64 {
        self.labor + self.materials + self.machinery
    }

    /// Dimensions with their serialized field names, in declaration order.
    pub fn dimensions(&self) -> [(&'static str, f64); 3] {
        [
            ("labor", self.labor),
            ("materials", self.materials),
            ("machinery", self.machinery),
        ]
    }
}

/// Baseline costs of one restoration method variant.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct MethodBaseline {
    pub implementation_cost: f64,
    #[serde(default)]
    pub implementation_distribution: FactorShares,
    pub maintenance_cost: f64,
    #[serde(default)]
    pub maintenance_distribution: FactorShares,
}

/// Ordinal severity of a context dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
}

impl Default for SeverityLevel {
    fn default() -> Self {
        Self::Low
    }
}

/// Binary context dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Absent,
    Present,
}

impl Default for Presence {
    fn default() -> Self {
        Self::Absent
    }
}

/// Site context dimensions that drive the unfavorable scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum ContextDimension {
    FireRisk,
    SoilDegradation,
    GrazingPressure,
    InvasivePressure,
    HumanEncroachment,
    SeedAvailability,
}

impl ContextDimension {
    pub fn all() -> [Self; 6] {
        [
            Self::FireRisk,
            Self::SoilDegradation,
            Self::GrazingPressure,
            Self::InvasivePressure,
            Self::HumanEncroachment,
            Self::SeedAvailability,
        ]
    }

    /// Serialized field name inside the context section.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::FireRisk => "fireRisk",
            Self::SoilDegradation => "soilDegradation",
            Self::GrazingPressure => "grazingPressure",
            Self::InvasivePressure => "invasivePressure",
            Self::HumanEncroachment => "humanEncroachment",
            Self::SeedAvailability => "seedAvailability",
        }
    }
}

/// Categorical context: one severity per dimension.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SeverityContext {
    pub fire_risk: SeverityLevel,
    pub soil_degradation: SeverityLevel,
    pub grazing_pressure: Presence,
    pub invasive_pressure: SeverityLevel,
    pub human_encroachment: Presence,
    pub seed_availability: SeverityLevel,
}

/// Cost of one context constraint and how it is distributed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ContextConstraint {
    pub cost: f64,
    pub applies_to_implementation: bool,
    pub applies_to_maintenance: bool,
    #[serde(default)]
    pub distribution: FactorShares,
}

/// Full-cost context: one constraint entry per dimension.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ConstraintContext {
    pub fire_risk: ContextConstraint,
    pub soil_degradation: ContextConstraint,
    pub grazing_pressure: ContextConstraint,
    pub invasive_pressure: ContextConstraint,
    pub human_encroachment: ContextConstraint,
    pub seed_availability: ContextConstraint,
}

impl ConstraintContext {
    /// Get the entry for a dimension.
    pub fn get(&self, dimension: ContextDimension) -> &ContextConstraint {
        match dimension {
            ContextDimension::FireRisk => &self.fire_risk,
            ContextDimension::SoilDegradation => &self.soil_degradation,
            ContextDimension::GrazingPressure => &self.grazing_pressure,
            ContextDimension::InvasivePressure => &self.invasive_pressure,
            ContextDimension::HumanEncroachment => &self.human_encroachment,
            ContextDimension::SeedAvailability => &self.seed_availability,
        }
    }

    /// Entries in dimension order.
    pub fn entries(&self) -> impl Iterator<Item = (ContextDimension, &ContextConstraint)> {
        ContextDimension::all().into_iter().map(move |d| (d, self.get(d)))
    }
}

/// Context variables, in either of the two form variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ContextVariables {
    /// Categorical severity per dimension
    Severity(SeverityContext),
    /// Costed constraint entry per dimension
    Constraints(ConstraintContext),
}

impl Default for ContextVariables {
    fn default() -> Self {
        Self::Constraints(ConstraintContext::default())
    }
}

/// Declared totals of one scenario.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ScenarioCosts {
    pub total_cost: f64,
    pub implementation_cost: f64,
    pub maintenance_cost: f64,
}

impl ScenarioCosts {
    pub fn new(total_cost: f64, implementation_cost: f64, maintenance_cost: f64) -> Self {
        Self {
            total_cost,
            implementation_cost,
            maintenance_cost,
        }
    }

    /// `total - (implementation + maintenance)`
    pub fn imbalance(&self) -> f64 {
        self.total_cost - (self.implementation_cost + self.maintenance_cost)
    }
}

/// Cost of one selected assistance activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AssistanceCostEntry {
    /// Must match a selected assistance identifier
    pub name: AssistanceActivity,
    /// Missing cost counts as zero
    #[serde(default)]
    pub cost: Option<f64>,
    #[serde(default)]
    pub phase: CostPhase,
    #[serde(default)]
    pub factor_shares: FactorShares,
}

impl AssistanceCostEntry {
    /// Zero-initialized entry for a newly selected activity.
    pub fn zeroed(name: AssistanceActivity) -> Self {
        Self {
            name,
            cost: Some(0.0),
            phase: CostPhase::default(),
            factor_shares: FactorShares::default(),
        }
    }

    /// Cost with missing treated as zero.
    pub fn cost_or_zero(&self) -> f64 {
        self.cost.unwrap_or(0.0)
    }
}

/// Hired vs family labor split for one phase.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct LaborSplit {
    pub hired_labor: f64,
    pub family_labor: f64,
}

/// Optional labor breakdown section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct LaborBreakdown {
    pub implementation: LaborSplit,
    pub maintenance: LaborSplit,
    pub hired_labor_daily_rate: f64,
}

/// A full cost profile for one (ecosystem × method) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct CostRecord {
    /// Target ecosystem, unset on a fresh record
    pub ecosystem: Option<Ecosystem>,
    pub country: String,
    /// Method under study, free text
    pub method: String,
    pub time_horizon_years: u32,
    /// Baseline costs keyed by method variant
    pub method_costs: BTreeMap<RestorationMethod, MethodBaseline>,
    pub context: ContextVariables,
    pub selected_assistances: Vec<AssistanceActivity>,
    pub favorable: ScenarioCosts,
    pub unfavorable: ScenarioCosts,
    pub assistance_costs: Vec<AssistanceCostEntry>,
    pub interaction_adjustment: f64,
    pub favorable_factor_shares: FactorShares,
    #[serde(default)]
    pub labor_breakdown: Option<LaborBreakdown>,
}

impl Default for CostRecord {
    fn default() -> Self {
        Self {
            ecosystem: None,
            country: String::new(),
            method: String::new(),
            time_horizon_years: DEFAULT_TIME_HORIZON_YEARS,
            method_costs: RestorationMethod::all()
                .into_iter()
                .map(|m| (m, MethodBaseline::default()))
                .collect(),
            context: ContextVariables::default(),
            selected_assistances: Vec::new(),
            favorable: ScenarioCosts::default(),
            unfavorable: ScenarioCosts::default(),
            assistance_costs: Vec::new(),
            interaction_adjustment: 0.0,
            favorable_factor_shares: FactorShares::default(),
            labor_breakdown: None,
        }
    }
}

impl CostRecord {
    /// Create an empty record with the given horizon.
    pub fn with_time_horizon(years: u32) -> Self {
        Self {
            time_horizon_years: years,
            ..Default::default()
        }
    }

    /// Declared unfavorable total.
    pub fn declared_unfavorable_cost(&self) -> f64 {
        self.unfavorable.total_cost
    }
}
