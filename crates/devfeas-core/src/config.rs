use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DevFeasError;
use crate::types::{Money, Rate};
use crate::DevFeasResult;

/// Share of the facility assumed drawn each month of the build phase.
pub const DEFAULT_BUILD_UTILIZATION: Rate = dec!(0.55);
/// Share of the facility drawn once construction has finished.
pub const DEFAULT_TAIL_UTILIZATION: Rate = dec!(1.0);
/// Seed for the facility fixed-point iteration, as a multiple of construction required.
pub const DEFAULT_FACILITY_SEED_MULTIPLIER: Decimal = dec!(1.15);
pub const DEFAULT_MAX_ITERATIONS: u32 = 30;
/// Convergence tolerance in currency units.
pub const DEFAULT_TOLERANCE: Money = dec!(1);

/// Assumptions driving the interest accrual, the facility solver and the
/// sensitivity sweep.
///
/// Every field has a default matching the calculator, so a partial JSON or
/// YAML document (or none at all) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Utilisation applied to the balance during the build phase
    pub build_utilization: Rate,
    /// Utilisation applied to the balance during the tail phase
    pub tail_utilization: Rate,
    /// Initial facility guess = construction required * multiplier
    pub facility_seed_multiplier: Decimal,
    /// Maximum number of fixed-point passes
    pub max_iterations: u32,
    /// Stop when successive facility estimates differ by less than this
    pub tolerance: Money,
    /// Revenue shocks applied by the sensitivity sweep (-0.10 = -10%)
    pub sensitivity_shocks: Vec<Rate>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            build_utilization: DEFAULT_BUILD_UTILIZATION,
            tail_utilization: DEFAULT_TAIL_UTILIZATION,
            facility_seed_multiplier: DEFAULT_FACILITY_SEED_MULTIPLIER,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            sensitivity_shocks: vec![dec!(-0.10), dec!(-0.05), dec!(0), dec!(0.05), dec!(0.10)],
        }
    }
}

impl EngineConfig {
    /// Reject configurations the solver cannot work with.
    pub fn validate(&self) -> DevFeasResult<()> {
        if self.max_iterations == 0 {
            return Err(DevFeasError::InvalidInput {
                field: "max_iterations".into(),
                reason: "At least one solver iteration is required".into(),
            });
        }
        if self.tolerance <= Decimal::ZERO {
            return Err(DevFeasError::InvalidInput {
                field: "tolerance".into(),
                reason: "Tolerance must be positive".into(),
            });
        }
        if self.build_utilization < Decimal::ZERO || self.tail_utilization < Decimal::ZERO {
            return Err(DevFeasError::InvalidInput {
                field: "utilization".into(),
                reason: "Utilisation cannot be negative".into(),
            });
        }
        if self.sensitivity_shocks.iter().any(|s| *s <= dec!(-1)) {
            return Err(DevFeasError::InvalidInput {
                field: "sensitivity_shocks".into(),
                reason: "A revenue shock of -100% or worse leaves nothing to sell".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_calculator() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.build_utilization, dec!(0.55));
        assert_eq!(cfg.tail_utilization, dec!(1));
        assert_eq!(cfg.facility_seed_multiplier, dec!(1.15));
        assert_eq!(cfg.max_iterations, 30);
        assert_eq!(cfg.tolerance, dec!(1));
        assert_eq!(cfg.sensitivity_shocks.len(), 5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{ "max_iterations": 5 }"#).unwrap();
        assert_eq!(cfg.max_iterations, 5);
        assert_eq!(cfg.build_utilization, DEFAULT_BUILD_UTILIZATION);
        assert_eq!(cfg.sensitivity_shocks, EngineConfig::default().sensitivity_shocks);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let cfg = EngineConfig {
            max_iterations: 0,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_non_positive_tolerance_rejected() {
        let cfg = EngineConfig {
            tolerance: Decimal::ZERO,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_total_revenue_wipeout_shock_rejected() {
        let cfg = EngineConfig {
            sensitivity_shocks: vec![dec!(-1)],
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
