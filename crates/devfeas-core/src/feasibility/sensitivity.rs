use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::feasibility::costs::{developer_margin, sales_marketing, CostBreakdown};
use crate::feasibility::engine::residual_land_value;
use crate::feasibility::input::FeasibilityInput;
use crate::types::{Money, Percent, Rate};

/// RLV at one revenue shock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRow {
    /// Price movement in percent (-10 = prices 10% lower)
    pub shock_pct: Percent,
    /// Gross sale revenue after the shock
    pub gdv_alt: Money,
    /// Residual land value after the shock
    pub rlv_alt: Money,
}

/// Sweep the default revenue shocks (-10%, -5%, base, +5%, +10%).
pub fn run_sensitivity(input: &FeasibilityInput, base_costs: &CostBreakdown) -> Vec<SensitivityRow> {
    run_sensitivity_with(input, base_costs, &EngineConfig::default().sensitivity_shocks)
}

/// RLV under each revenue shock in `shocks` (decimal, -0.10 = -10%).
///
/// Only the revenue-linked lines (sales & marketing, developer margin) are
/// recomputed. Professional fees, finance cost, funding fee and contingency
/// stay at their base values since they do not depend on sale prices. A zero
/// shock reproduces the base case.
pub fn run_sensitivity_with(
    input: &FeasibilityInput,
    base_costs: &CostBreakdown,
    shocks: &[Rate],
) -> Vec<SensitivityRow> {
    let gdv = input.gdv();

    shocks
        .iter()
        .map(|&shock| {
            let gdv_alt = gdv.saturating_mul(Decimal::ONE.saturating_add(shock));
            let shocked = CostBreakdown {
                sales_marketing: sales_marketing(input, gdv_alt),
                developer_margin: developer_margin(input, gdv_alt),
                ..base_costs.clone()
            };
            SensitivityRow {
                shock_pct: shock.saturating_mul(Decimal::ONE_HUNDRED),
                gdv_alt,
                rlv_alt: residual_land_value(
                    gdv_alt,
                    input.construction_cost,
                    &shocked,
                    input.other_costs,
                ),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feasibility::costs::compute_costs;
    use rust_decimal_macros::dec;

    fn sample_input() -> FeasibilityInput {
        FeasibilityInput {
            num_lots: 12,
            lots_expected_to_sell: 12,
            avg_sale_price: dec!(450000),
            construction_cost: dec!(2400000),
            professional_fees_pct: dec!(8),
            construction_amount_required: dec!(2000000),
            interest_rate_pct: dec!(8.5),
            construction_period_months: 12,
            facility_term_months: 18,
            sales_marketing_pct: dec!(2.5),
            contingency_pct: dec!(5),
            other_costs: dec!(85000),
            developer_margin_pct: dec!(18),
            ..FeasibilityInput::default()
        }
    }

    #[test]
    fn test_default_sweep_has_five_rows() {
        let input = sample_input();
        let costs = compute_costs(&input, dec!(2300000));
        let rows = run_sensitivity(&input, &costs);
        let shocks: Vec<Decimal> = rows.iter().map(|r| r.shock_pct).collect();
        assert_eq!(shocks, vec![dec!(-10), dec!(-5), dec!(0), dec!(5), dec!(10)]);
    }

    #[test]
    fn test_base_row_reproduces_base_case() {
        let input = sample_input();
        let costs = compute_costs(&input, dec!(2300000));
        let rows = run_sensitivity(&input, &costs);
        let base = &rows[2];
        assert_eq!(base.gdv_alt, input.gdv());
        assert_eq!(
            base.rlv_alt,
            residual_land_value(input.gdv(), input.construction_cost, &costs, input.other_costs)
        );
    }

    #[test]
    fn test_gdv_scales_with_shock() {
        let input = sample_input();
        let costs = compute_costs(&input, dec!(2300000));
        let rows = run_sensitivity(&input, &costs);
        // GDV = 12 * 450,000 = 5,400,000
        assert_eq!(rows[0].gdv_alt, dec!(4860000));
        assert_eq!(rows[4].gdv_alt, dec!(5940000));
    }

    #[test]
    fn test_rlv_moves_by_net_revenue_share() {
        // Each extra dollar of revenue keeps (1 - 2.5% - 18%) = 79.5 cents
        let input = sample_input();
        let costs = compute_costs(&input, dec!(2300000));
        let rows = run_sensitivity(&input, &costs);
        let step = rows[3].rlv_alt - rows[2].rlv_alt;
        // 5% of 5,400,000 = 270,000 * 0.795 = 214,650
        assert!((step - dec!(214650)).abs() < dec!(0.000001), "step {step}");
        for pair in rows.windows(2) {
            assert!(pair[1].rlv_alt > pair[0].rlv_alt);
        }
    }

    #[test]
    fn test_custom_shocks() {
        let input = sample_input();
        let costs = compute_costs(&input, dec!(2300000));
        let rows = run_sensitivity_with(&input, &costs, &[dec!(-0.2), dec!(0.2)]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].shock_pct, dec!(-20));
        assert_eq!(rows[1].gdv_alt, dec!(6480000));
    }
}
