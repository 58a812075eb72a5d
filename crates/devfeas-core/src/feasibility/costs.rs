use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::feasibility::input::FeasibilityInput;
use crate::feasibility::interest_reserve::accrue_interest_with;
use crate::types::{pct_to_rate, Money};

/// Cost lines derived from the inputs and the solved facility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub professional_fees: Money,
    /// Capitalised interest on the facility
    pub finance_costs: Money,
    /// Establishment fee on the facility
    pub funding_fee: Money,
    pub sales_marketing: Money,
    pub contingency: Money,
    pub developer_margin: Money,
}

impl CostBreakdown {
    /// Sum of all six lines.
    pub fn total(&self) -> Money {
        self.total_before_margin().saturating_add(self.developer_margin)
    }

    /// Sum of every line except the developer margin.
    pub fn total_before_margin(&self) -> Money {
        [
            self.finance_costs,
            self.funding_fee,
            self.sales_marketing,
            self.contingency,
        ]
        .into_iter()
        .fold(self.professional_fees, Decimal::saturating_add)
    }
}

/// Derive every cost line with the default accrual assumptions.
pub fn compute_costs(input: &FeasibilityInput, amount_financed: Money) -> CostBreakdown {
    compute_costs_with(input, amount_financed, &EngineConfig::default())
}

/// Derive every cost line for an already-solved facility size.
///
/// Finance cost is accrued again on construction funding plus the fee at the
/// converged facility, not taken from the solver's intermediate passes.
/// Percentages are applied as given, negative ones included. Lines beyond
/// the `Decimal` range are capped at its bounds.
pub fn compute_costs_with(
    input: &FeasibilityInput,
    amount_financed: Money,
    config: &EngineConfig,
) -> CostBreakdown {
    let gdv = input.gdv();

    let funding_fee = input.funding_fee_rate().saturating_mul(amount_financed);
    let net_principal = input.construction_amount_required.saturating_add(funding_fee);
    let finance_costs = accrue_interest_with(
        net_principal,
        input.interest_rate(),
        input.construction_period_months,
        input.finance_term_months(),
        config,
    );

    CostBreakdown {
        professional_fees: pct_to_rate(input.professional_fees_pct).saturating_mul(input.construction_cost),
        finance_costs,
        funding_fee,
        sales_marketing: sales_marketing(input, gdv),
        contingency: pct_to_rate(input.contingency_pct).saturating_mul(input.construction_cost),
        developer_margin: developer_margin(input, gdv),
    }
}

/// Sales & marketing cost at a given gross sale revenue.
pub fn sales_marketing(input: &FeasibilityInput, gross_sales: Money) -> Money {
    pct_to_rate(input.sales_marketing_pct).saturating_mul(gross_sales)
}

/// Developer margin at a given gross sale revenue.
pub fn developer_margin(input: &FeasibilityInput, gross_sales: Money) -> Money {
    pct_to_rate(input.developer_margin_pct).saturating_mul(gross_sales)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feasibility::interest_reserve::accrue_interest;
    use rust_decimal_macros::dec;

    fn sample_input() -> FeasibilityInput {
        FeasibilityInput {
            num_lots: 10,
            lots_expected_to_sell: 10,
            avg_sale_price: dec!(500000),
            construction_cost: dec!(2000000),
            professional_fees_pct: dec!(10),
            construction_amount_required: dec!(1500000),
            interest_rate_pct: dec!(9),
            construction_period_months: 12,
            facility_term_months: 15,
            sales_marketing_pct: dec!(3),
            contingency_pct: dec!(5),
            developer_margin_pct: dec!(20),
            ..FeasibilityInput::default()
        }
    }

    #[test]
    fn test_percentage_lines() {
        let costs = compute_costs(&sample_input(), dec!(1700000));
        // 10% of 2,000,000
        assert_eq!(costs.professional_fees, dec!(200000));
        // 5% of 2,000,000
        assert_eq!(costs.contingency, dec!(100000));
        // GDV = 10 * 500,000 = 5,000,000; 3% and 20%
        assert_eq!(costs.sales_marketing, dec!(150000));
        assert_eq!(costs.developer_margin, dec!(1000000));
        // 3% of 1,700,000
        assert_eq!(costs.funding_fee, dec!(51000));
    }

    #[test]
    fn test_finance_cost_accrues_on_construction_plus_fee() {
        let costs = compute_costs(&sample_input(), dec!(1700000));
        let net_principal = dec!(1500000) + dec!(0.03) * dec!(1700000);
        assert_eq!(net_principal, dec!(1551000));
        let expected = accrue_interest(net_principal, dec!(0.09), 12, 15);
        assert_eq!(costs.finance_costs, expected);
    }

    #[test]
    fn test_zero_term_means_no_tail() {
        let mut input = sample_input();
        input.facility_term_months = 0;
        let costs = compute_costs(&input, dec!(1700000));
        let net_principal = dec!(1500000) + dec!(0.03) * dec!(1700000);
        let expected = accrue_interest(net_principal, dec!(0.09), 12, 12);
        assert_eq!(costs.finance_costs, expected);
    }

    #[test]
    fn test_negative_percentages_propagate() {
        let mut input = sample_input();
        input.contingency_pct = dec!(-5);
        let costs = compute_costs(&input, Decimal::ZERO);
        assert_eq!(costs.contingency, dec!(-100000));
    }

    #[test]
    fn test_totals() {
        let costs = CostBreakdown {
            professional_fees: dec!(1),
            finance_costs: dec!(2),
            funding_fee: dec!(3),
            sales_marketing: dec!(4),
            contingency: dec!(5),
            developer_margin: dec!(6),
        };
        assert_eq!(costs.total_before_margin(), dec!(15));
        assert_eq!(costs.total(), dec!(21));
        assert_eq!(CostBreakdown::default().total(), Decimal::ZERO);
    }
}
