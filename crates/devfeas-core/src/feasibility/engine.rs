use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::config::EngineConfig;
use crate::feasibility::costs::{compute_costs_with, CostBreakdown};
use crate::feasibility::facility::{solve_facility_with, FacilityInput, FacilitySolution, FacilityStatus};
use crate::feasibility::input::FeasibilityInput;
use crate::feasibility::sensitivity::{run_sensitivity_with, SensitivityRow};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where the residual land value sits relative to the site's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RlvAssessment {
    /// RLV at or above the current land value
    Feasible,
    /// RLV below the current land value; the project may be unfeasible
    BelowLandValue,
    /// Negative RLV with no land value to compare; extra funds are needed
    CashShortfall,
    /// No land value supplied and a non-negative RLV
    Unassessed,
}

/// Cash position at completion once sales settle and the facility is repaid.
///
/// Professional fees and contingency are paid during construction and do not
/// appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementPosition {
    pub gross_sales: Money,
    pub selling_costs: Money,
    pub facility_repayment: Money,
    pub other_costs: Money,
    pub cash_result: Money,
}

/// Full feasibility result.
///
/// Ratios are `None` when their denominator is zero or negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeasibilityOutput {
    /// Gross development value (lots sold * average sale price)
    pub gdv: Money,
    /// Lots sold after clamping to the lot count
    pub lots_sold: u32,
    /// Solved facility size
    pub amount_financed: Money,
    /// Solver diagnostics for `amount_financed`
    pub facility: FacilitySolution,
    pub costs: CostBreakdown,
    /// Construction + every cost line except developer margin + other costs
    pub total_development_cost: Money,
    /// Residual land value
    pub rlv: Money,
    /// RLV per lot; zero when there are no lots
    pub rlv_per_lot: Money,
    pub rlv_assessment: RlvAssessment,
    /// Developer margin line
    pub developer_profit: Money,
    /// Margin on GDV before the developer's own margin is taken out
    pub profit_margin_pct: Option<Percent>,
    /// On-completion GRV less land value and construction cost
    pub project_lift: Money,
    /// On-completion GRV less total development cost
    pub net_value_created: Money,
    /// Project lift on land value, percent
    pub roe: Option<Percent>,
    /// Facility on on-completion GRV, percent
    pub ltv: Option<Percent>,
    /// Facility on land value plus construction cost, percent
    pub ltc: Option<Percent>,
    /// GDV cover of the facility, multiple
    pub dcr: Option<Decimal>,
    pub settlement: SettlementPosition,
    /// RLV under revenue shocks
    pub sensitivity: Vec<SensitivityRow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate a development with the default assumptions.
pub fn evaluate_feasibility(input: &FeasibilityInput) -> ComputationOutput<FeasibilityOutput> {
    evaluate_feasibility_with(input, &EngineConfig::default())
}

/// Evaluate a development: size the facility, derive every cost line, and
/// report the residual land value with lender ratios and a revenue
/// sensitivity sweep.
///
/// Never fails. Degenerate inputs resolve to zeros and `None` ratios, and
/// advisory conditions (oversold lots, short facility term, solver budget
/// exhausted, RLV below land value) are reported as warnings.
pub fn evaluate_feasibility_with(
    input: &FeasibilityInput,
    config: &EngineConfig,
) -> ComputationOutput<FeasibilityOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    check_input(input, &mut warnings);

    // --- Facility ---
    let facility = solve_facility_with(&FacilityInput::from(input), config);
    match facility.status {
        FacilityStatus::IterationLimit => warnings.push(format!(
            "Facility size did not converge after {} iterations (residual {}); using best estimate",
            facility.iterations,
            facility.residual.round_dp(2)
        )),
        FacilityStatus::Diverged => warnings.push(format!(
            "Facility size diverged after {} iterations: fee and capitalised interest outgrow the facility; using last finite estimate",
            facility.iterations
        )),
        FacilityStatus::FeeConsumesFacility => warnings.push(
            "Funding fee of 100% consumes the whole facility; no facility sized".into(),
        ),
        FacilityStatus::Converged | FacilityStatus::NotRequired => {}
    }
    let amount_financed = facility.facility_size;

    // --- Cost cascade ---
    let gdv = input.gdv();
    let costs = compute_costs_with(input, amount_financed, config);
    let total_development_cost = input
        .construction_cost
        .saturating_add(costs.total_before_margin())
        .saturating_add(input.other_costs);

    // --- Residual land value ---
    let rlv = residual_land_value(gdv, input.construction_cost, &costs, input.other_costs);
    let rlv_per_lot = if input.num_lots > 0 {
        rlv / Decimal::from(input.num_lots)
    } else {
        Decimal::ZERO
    };
    let rlv_assessment = assess_rlv(rlv, input.land_value);
    match rlv_assessment {
        RlvAssessment::BelowLandValue => warnings.push(format!(
            "RLV {} is below the current land value {}; project may be unfeasible",
            rlv.round_dp(0),
            input.land_value.round_dp(0)
        )),
        RlvAssessment::CashShortfall => warnings.push(format!(
            "RLV {} is negative; additional funds are needed",
            rlv.round_dp(0)
        )),
        RlvAssessment::Feasible | RlvAssessment::Unassessed => {}
    }

    // --- Profitability & lender ratios ---
    let land_and_construction = input.land_value.saturating_add(input.construction_cost);
    let profit_margin_pct = percent_of(gdv.saturating_sub(total_development_cost), gdv);
    let project_lift = input.on_completion_grv.saturating_sub(land_and_construction);
    let net_value_created = input.on_completion_grv.saturating_sub(total_development_cost);

    let roe = percent_of(project_lift, input.land_value);
    let ltv = percent_of(amount_financed, input.on_completion_grv);
    let ltc = percent_of(amount_financed, land_and_construction);
    let dcr = ratio(gdv, amount_financed);

    // --- Settlement ---
    let settlement = settlement_position(gdv, &costs, amount_financed, input.other_costs);
    if settlement.cash_result < Decimal::ZERO {
        warnings.push(format!(
            "Settlement leaves a cash shortfall of {}",
            (-settlement.cash_result).round_dp(0)
        ));
    }

    if [costs.finance_costs, total_development_cost, rlv, settlement.cash_result]
        .iter()
        .any(|v| is_capped(*v))
    {
        warnings.push(
            "Figures exceed the representable range and are capped; check rate, term and fee inputs"
                .into(),
        );
    }

    let sensitivity = run_sensitivity_with(input, &costs, &config.sensitivity_shocks);

    debug!(
        %gdv,
        %amount_financed,
        %rlv,
        iterations = facility.iterations,
        "feasibility evaluated"
    );

    let output = FeasibilityOutput {
        gdv,
        lots_sold: input.lots_sold(),
        amount_financed,
        facility,
        developer_profit: costs.developer_margin,
        costs,
        total_development_cost,
        rlv,
        rlv_per_lot,
        rlv_assessment,
        profit_margin_pct,
        project_lift,
        net_value_created,
        roe,
        ltv,
        ltc,
        dcr,
        settlement,
        sensitivity,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    with_metadata(
        "Residual Land Value (development feasibility)",
        input,
        warnings,
        elapsed,
        output,
    )
}

/// Residual land value: revenue less construction, every cost line, other
/// costs and the developer margin.
pub fn residual_land_value(
    gdv: Money,
    construction_cost: Money,
    costs: &CostBreakdown,
    other_costs: Money,
) -> Money {
    [
        construction_cost,
        costs.professional_fees,
        costs.finance_costs,
        costs.funding_fee,
        costs.sales_marketing,
        costs.contingency,
        other_costs,
        costs.developer_margin,
    ]
    .into_iter()
    .fold(gdv, Decimal::saturating_sub)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_input(input: &FeasibilityInput, warnings: &mut Vec<String>) {
    if input.lots_expected_to_sell > input.num_lots {
        warnings.push(format!(
            "Lots expected to sell ({}) exceeds number of lots ({}); clamped to {}",
            input.lots_expected_to_sell, input.num_lots, input.num_lots
        ));
    }
    if input.term_shorter_than_build() {
        warnings.push(format!(
            "Facility term ({} months) is shorter than the construction period ({} months); no tail interest accrued",
            input.facility_term_months, input.construction_period_months
        ));
    }
}

fn assess_rlv(rlv: Money, land_value: Money) -> RlvAssessment {
    if land_value > Decimal::ZERO {
        if rlv < land_value {
            RlvAssessment::BelowLandValue
        } else {
            RlvAssessment::Feasible
        }
    } else if rlv < Decimal::ZERO {
        RlvAssessment::CashShortfall
    } else {
        RlvAssessment::Unassessed
    }
}

fn settlement_position(
    gdv: Money,
    costs: &CostBreakdown,
    amount_financed: Money,
    other_costs: Money,
) -> SettlementPosition {
    SettlementPosition {
        gross_sales: gdv,
        selling_costs: costs.sales_marketing,
        facility_repayment: amount_financed,
        other_costs,
        cash_result: gdv
            .saturating_sub(costs.sales_marketing)
            .saturating_sub(amount_financed)
            .saturating_sub(other_costs),
    }
}

/// `numerator / denominator`, or `None` unless the denominator is positive.
/// Quotients beyond the `Decimal` range are capped.
fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator <= Decimal::ZERO {
        return None;
    }
    Some(numerator.checked_div(denominator).unwrap_or(
        if numerator.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        },
    ))
}

fn percent_of(numerator: Decimal, denominator: Decimal) -> Option<Percent> {
    ratio(numerator, denominator).map(|r| r.saturating_mul(Decimal::ONE_HUNDRED))
}

fn is_capped(value: Decimal) -> bool {
    value == Decimal::MAX || value == Decimal::MIN
}
