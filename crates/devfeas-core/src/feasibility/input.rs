use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::DevFeasError;
use crate::types::{pct_to_rate, Money, Percent, Rate};
use crate::DevFeasResult;

/// Establishment (funding) fee charged on the facility, in percent.
pub const DEFAULT_FUNDING_FEE_PCT: Percent = dec!(3);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Inputs for a single feasibility calculation.
///
/// Percentages are percentage points (`interest_rate_pct: 8` is 8% p.a.).
/// Missing fields deserialise as zero, except `funding_fee_pct` which
/// defaults to 3%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeasibilityInput {
    /// Project label, used only for report titles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    /// Current market value of the site (as-is)
    pub land_value: Money,
    /// Gross realisation value on completion (as-complete)
    pub on_completion_grv: Money,
    /// Number of lots in the development
    pub num_lots: u32,
    /// Lots expected to sell; values above `num_lots` are clamped
    pub lots_expected_to_sell: u32,
    /// Average sale price per lot
    pub avg_sale_price: Money,
    /// Total construction cost
    pub construction_cost: Money,
    /// Professional fees as a percentage of construction cost
    pub professional_fees_pct: Percent,
    /// Construction funding the facility has to provide
    pub construction_amount_required: Money,
    /// Annual facility interest rate
    pub interest_rate_pct: Percent,
    /// Build phase length in months
    pub construction_period_months: u32,
    /// Total facility term in months (build + tail); 0 means "same as build"
    pub facility_term_months: u32,
    /// Establishment fee on the facility
    pub funding_fee_pct: Percent,
    /// Sales & marketing as a percentage of GDV
    pub sales_marketing_pct: Percent,
    /// Contingency as a percentage of construction cost
    pub contingency_pct: Percent,
    /// Other absolute costs (rates, holding costs, legals)
    pub other_costs: Money,
    /// Target developer margin as a percentage of GDV
    pub developer_margin_pct: Percent,
}

impl Default for FeasibilityInput {
    fn default() -> Self {
        Self {
            project_name: None,
            land_value: Decimal::ZERO,
            on_completion_grv: Decimal::ZERO,
            num_lots: 0,
            lots_expected_to_sell: 0,
            avg_sale_price: Decimal::ZERO,
            construction_cost: Decimal::ZERO,
            professional_fees_pct: Decimal::ZERO,
            construction_amount_required: Decimal::ZERO,
            interest_rate_pct: Decimal::ZERO,
            construction_period_months: 0,
            facility_term_months: 0,
            funding_fee_pct: DEFAULT_FUNDING_FEE_PCT,
            sales_marketing_pct: Decimal::ZERO,
            contingency_pct: Decimal::ZERO,
            other_costs: Decimal::ZERO,
            developer_margin_pct: Decimal::ZERO,
        }
    }
}

impl FeasibilityInput {
    /// Lots sold after clamping to the lot count.
    pub fn lots_sold(&self) -> u32 {
        self.lots_expected_to_sell.min(self.num_lots)
    }

    /// Gross development value: lots sold * average sale price.
    pub fn gdv(&self) -> Money {
        Decimal::from(self.lots_sold()).saturating_mul(self.avg_sale_price)
    }

    pub fn interest_rate(&self) -> Rate {
        pct_to_rate(self.interest_rate_pct)
    }

    pub fn funding_fee_rate(&self) -> Rate {
        pct_to_rate(self.funding_fee_pct)
    }

    /// Facility term used for interest accrual. A zero term falls back to the
    /// build period, i.e. no tail phase.
    pub fn finance_term_months(&self) -> u32 {
        if self.facility_term_months == 0 {
            self.construction_period_months
        } else {
            self.facility_term_months
        }
    }

    /// True when the facility ends before construction does.
    pub fn term_shorter_than_build(&self) -> bool {
        self.facility_term_months > 0 && self.facility_term_months < self.construction_period_months
    }

    /// Parse an input document; absent fields take their defaults.
    pub fn from_json(json: &str) -> DevFeasResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Caller-side validation of a feasibility input.
///
/// The engine itself accepts any input and never fails; this is for
/// front ends that want to reject inconsistent data before evaluating.
pub fn validate_input(input: &FeasibilityInput) -> DevFeasResult<()> {
    if input.lots_expected_to_sell > input.num_lots {
        return Err(DevFeasError::InvalidInput {
            field: "lots_expected_to_sell".into(),
            reason: format!(
                "Lots expected to sell ({}) exceeds number of lots ({})",
                input.lots_expected_to_sell, input.num_lots
            ),
        });
    }

    if input.term_shorter_than_build() {
        return Err(DevFeasError::InvalidInput {
            field: "facility_term_months".into(),
            reason: format!(
                "Facility term ({} months) must cover the construction period ({} months)",
                input.facility_term_months, input.construction_period_months
            ),
        });
    }

    if input.funding_fee_pct >= Decimal::ONE_HUNDRED {
        return Err(DevFeasError::InvalidInput {
            field: "funding_fee_pct".into(),
            reason: "Funding fee must be below 100% of the facility".into(),
        });
    }

    let monetary = [
        ("land_value", input.land_value),
        ("on_completion_grv", input.on_completion_grv),
        ("avg_sale_price", input.avg_sale_price),
        ("construction_cost", input.construction_cost),
        ("construction_amount_required", input.construction_amount_required),
        ("other_costs", input.other_costs),
    ];
    for (field, value) in monetary {
        if value < Decimal::ZERO {
            return Err(DevFeasError::InvalidInput {
                field: field.into(),
                reason: "Amount cannot be negative".into(),
            });
        }
    }

    let percentages = [
        ("professional_fees_pct", input.professional_fees_pct),
        ("interest_rate_pct", input.interest_rate_pct),
        ("funding_fee_pct", input.funding_fee_pct),
        ("sales_marketing_pct", input.sales_marketing_pct),
        ("contingency_pct", input.contingency_pct),
        ("developer_margin_pct", input.developer_margin_pct),
    ];
    for (field, value) in percentages {
        if value < Decimal::ZERO {
            return Err(DevFeasError::InvalidInput {
                field: field.into(),
                reason: "Percentage cannot be negative".into(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> FeasibilityInput {
        FeasibilityInput {
            num_lots: 10,
            lots_expected_to_sell: 8,
            avg_sale_price: dec!(650000),
            construction_period_months: 12,
            facility_term_months: 18,
            ..FeasibilityInput::default()
        }
    }

    #[test]
    fn test_gdv_uses_lots_sold() {
        assert_eq!(sample_input().gdv(), dec!(5200000));
    }

    #[test]
    fn test_lots_sold_clamped_to_lot_count() {
        let mut input = sample_input();
        input.lots_expected_to_sell = 14;
        assert_eq!(input.lots_sold(), 10);
        assert_eq!(input.gdv(), dec!(6500000));
    }

    #[test]
    fn test_missing_fields_default_to_zero_with_standard_fee() {
        let input: FeasibilityInput = serde_json::from_str(r#"{ "num_lots": 4 }"#).unwrap();
        assert_eq!(input.num_lots, 4);
        assert_eq!(input.land_value, Decimal::ZERO);
        assert_eq!(input.funding_fee_pct, dec!(3));
        assert!(input.project_name.is_none());
    }

    #[test]
    fn test_zero_term_falls_back_to_build_period() {
        let mut input = sample_input();
        input.facility_term_months = 0;
        assert_eq!(input.finance_term_months(), 12);
        assert!(!input.term_shorter_than_build());
    }

    #[test]
    fn test_rates_from_percentages() {
        let mut input = sample_input();
        input.interest_rate_pct = dec!(8);
        assert_eq!(input.interest_rate(), dec!(0.08));
        assert_eq!(input.funding_fee_rate(), dec!(0.03));
    }

    #[test]
    fn test_validate_accepts_consistent_input() {
        assert!(validate_input(&sample_input()).is_ok());
    }

    #[test]
    fn test_validate_rejects_oversold_lots() {
        let mut input = sample_input();
        input.lots_expected_to_sell = 11;
        let err = validate_input(&input).unwrap_err();
        assert!(err.to_string().contains("lots_expected_to_sell"));
    }

    #[test]
    fn test_validate_rejects_short_facility_term() {
        let mut input = sample_input();
        input.facility_term_months = 9;
        assert!(validate_input(&input).is_err());
    }

    #[test]
    fn test_validate_rejects_full_funding_fee() {
        let mut input = sample_input();
        input.funding_fee_pct = dec!(100);
        assert!(validate_input(&input).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_amounts() {
        let mut input = sample_input();
        input.other_costs = dec!(-1);
        assert!(validate_input(&input).is_err());

        let mut input = sample_input();
        input.contingency_pct = dec!(-5);
        assert!(validate_input(&input).is_err());
    }

    #[test]
    fn test_from_json_defaults_and_errors() {
        let input = FeasibilityInput::from_json(r#"{"num_lots": 5, "avg_sale_price": "420000"}"#).unwrap();
        assert_eq!(input.num_lots, 5);
        assert_eq!(input.funding_fee_pct, dec!(3));
        assert_eq!(input.land_value, Decimal::ZERO);

        let err = FeasibilityInput::from_json("{not json").unwrap_err();
        assert!(matches!(err, DevFeasError::SerializationError(_)));
    }
}
