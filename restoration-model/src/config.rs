//! Configuration for the cost-model engine.

use serde::{Deserialize, Serialize};

use crate::types::DEFAULT_TIME_HORIZON_YEARS;

/// Default storage key for saved records.
pub const DEFAULT_STORE_KEY: &str = "restoration-cost-records";

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tolerance bands for approximate equality checks
    pub tolerances: ToleranceConfig,
    /// Time horizon bounds
    pub time_horizon: TimeHorizonConfig,
    /// Persist/export gate settings
    pub gate: GateConfig,
    /// Record store settings
    pub store: StoreConfig,
}

impl EngineConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Builder: set the relative reconciliation tolerance.
    pub fn with_reconciliation_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerances.reconciliation = tolerance;
        self
    }
}

/// Tolerance configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceConfig {
    /// Absolute tolerance for factor shares summing to 100
    pub share_sum: f64,
    /// Absolute tolerance for total = implementation + maintenance
    pub scenario_total: f64,
    /// Relative tolerance between declared and computed unfavorable cost
    pub reconciliation: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            share_sum: 0.01,
            scenario_total: 0.01,
            reconciliation: 0.05,
        }
    }
}

/// Time horizon bounds, in years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeHorizonConfig {
    pub min_years: u32,
    pub max_years: u32,
    /// Horizon assigned to new records
    pub default_years: u32,
}

impl Default for TimeHorizonConfig {
    fn default() -> Self {
        Self {
            min_years: 1,
            max_years: 100,
            default_years: DEFAULT_TIME_HORIZON_YEARS,
        }
    }
}

/// Persist/export gate configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Treat reconciliation warnings as blocking
    pub reconciliation_blocks_persist: bool,
}

/// Record store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Key the saved-record list is stored under
    pub key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORE_KEY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.tolerances.share_sum, 0.01);
        assert_eq!(config.tolerances.reconciliation, 0.05);
        assert_eq!(config.time_horizon.default_years, 20);
        assert!(!config.gate.reconciliation_blocks_persist);
        assert_eq!(config.store.key, DEFAULT_STORE_KEY);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = EngineConfig::default().with_reconciliation_tolerance(0.1);
        let yaml = config.to_yaml().unwrap();
        let parsed = EngineConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "tolerances:\n  reconciliation: 0.02\ngate:\n  reconciliation_blocks_persist: true\n";
        let config = EngineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.tolerances.reconciliation, 0.02);
        assert_eq!(config.tolerances.share_sum, 0.01);
        assert!(config.gate.reconciliation_blocks_persist);
        assert_eq!(config.time_horizon.max_years, 100);
    }
}
