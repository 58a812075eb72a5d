use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::DevFeasError;
use crate::feasibility::input::{FeasibilityInput, DEFAULT_FUNDING_FEE_PCT};
use crate::feasibility::interest_reserve::{
    accrue_interest_with, checked_accrue_interest, interest_schedule, AccrualPeriod,
};
use crate::types::{pct_to_rate, with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::DevFeasResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Loan terms needed to size the construction facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityInput {
    /// Construction funding the facility has to provide
    pub construction_required: Money,
    /// Annual interest rate in percent
    pub interest_rate_pct: Percent,
    /// Build phase length in months
    pub build_months: u32,
    /// Total facility term in months
    pub term_months: u32,
    /// Establishment fee in percent of the facility
    #[serde(default = "default_funding_fee_pct")]
    pub funding_fee_pct: Percent,
}

fn default_funding_fee_pct() -> Percent {
    DEFAULT_FUNDING_FEE_PCT
}

impl From<&FeasibilityInput> for FacilityInput {
    fn from(input: &FeasibilityInput) -> Self {
        Self {
            construction_required: input.construction_amount_required,
            interest_rate_pct: input.interest_rate_pct,
            build_months: input.construction_period_months,
            term_months: input.facility_term_months,
            funding_fee_pct: input.funding_fee_pct,
        }
    }
}

/// How the solver finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacilityStatus {
    /// No construction funding, no interest rate or no build period
    NotRequired,
    /// Successive estimates agreed within tolerance
    Converged,
    /// Iteration budget exhausted; the last estimate is returned
    IterationLimit,
    /// Fee and capitalised interest outgrow the facility faster than it
    /// grows; the last estimate inside the `Decimal` range is returned
    Diverged,
    /// A 100% fee leaves nothing of the facility for construction
    FeeConsumesFacility,
}

/// Solved facility size together with solver diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilitySolution {
    /// Facility size (best estimate when the solver did not converge)
    pub facility_size: Money,
    /// Fixed-point passes performed
    pub iterations: u32,
    /// |estimate - next estimate| at the final pass
    pub residual: Money,
    pub status: FacilityStatus,
}

impl FacilitySolution {
    fn not_required(status: FacilityStatus) -> Self {
        Self {
            facility_size: Decimal::ZERO,
            iterations: 0,
            residual: Decimal::ZERO,
            status,
        }
    }

    pub fn converged(&self) -> bool {
        matches!(
            self.status,
            FacilityStatus::Converged | FacilityStatus::NotRequired
        )
    }

    /// The facility size, or an error when it is not a certified fixed point.
    pub fn require_converged(&self) -> DevFeasResult<Money> {
        match self.status {
            FacilityStatus::Converged | FacilityStatus::NotRequired => Ok(self.facility_size),
            FacilityStatus::IterationLimit | FacilityStatus::Diverged => Err(DevFeasError::ConvergenceFailure {
                function: "facility sizing".into(),
                iterations: self.iterations,
                last_delta: self.residual,
            }),
            FacilityStatus::FeeConsumesFacility => Err(DevFeasError::InvalidInput {
                field: "funding_fee_pct".into(),
                reason: "A 100% funding fee cannot be financed".into(),
            }),
        }
    }
}

/// Facility sizing with the cost of carrying it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityOutput {
    pub solution: FacilitySolution,
    /// Fee on the solved facility
    pub establishment_fee: Money,
    /// Capitalised interest on construction funding plus the fee
    pub finance_cost: Money,
    /// Monthly accrual behind `finance_cost`, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<AccrualPeriod>>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Size a facility and cost it, optionally with the monthly accrual schedule.
pub fn size_facility(
    input: &FacilityInput,
    config: &EngineConfig,
    include_schedule: bool,
) -> ComputationOutput<FacilityOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let solution = solve_facility_with(input, config);
    match solution.status {
        FacilityStatus::IterationLimit => warnings.push(format!(
            "Facility size did not converge after {} iterations (residual {})",
            solution.iterations,
            solution.residual.round_dp(2)
        )),
        FacilityStatus::Diverged => warnings.push(format!(
            "Facility size diverged after {} iterations: fee and capitalised interest outgrow the facility",
            solution.iterations
        )),
        FacilityStatus::FeeConsumesFacility => {
            warnings.push("Funding fee of 100% consumes the whole facility".into())
        }
        FacilityStatus::NotRequired => warnings.push(
            "No facility required: construction funding, interest rate or build period is zero"
                .into(),
        ),
        FacilityStatus::Converged => {}
    }
    if input.term_months < input.build_months {
        warnings.push(format!(
            "Facility term ({} months) is shorter than the build ({} months); no tail interest accrued",
            input.term_months, input.build_months
        ));
    }

    let annual_rate = pct_to_rate(input.interest_rate_pct);
    let establishment_fee = pct_to_rate(input.funding_fee_pct).saturating_mul(solution.facility_size);
    let net_principal = input.construction_required.saturating_add(establishment_fee);
    let finance_cost = accrue_interest_with(
        net_principal,
        annual_rate,
        input.build_months,
        input.term_months,
        config,
    );
    let schedule = include_schedule.then(|| {
        interest_schedule(
            net_principal,
            annual_rate,
            input.build_months,
            input.term_months,
            config,
        )
    });

    let output = FacilityOutput {
        solution,
        establishment_fee,
        finance_cost,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "Construction facility sizing (fixed-point on fee and capitalised interest)",
        input,
        warnings,
        elapsed,
        output,
    )
}

/// Size the facility with the default solver settings.
pub fn solve_facility(input: &FacilityInput) -> FacilitySolution {
    solve_facility_with(input, &EngineConfig::default())
}

/// Size a facility that funds construction, its own establishment fee and
/// its capitalised interest.
///
/// Fee and interest both scale with the facility, so the size is the fixed
/// point of `f = (C + interest(C + f * fee)) / (1 - fee)`, found by
/// iterating from `C * seed_multiplier`. When the iteration budget runs out
/// the last estimate is returned with [`FacilityStatus::IterationLimit`]; when
/// the next estimate leaves the `Decimal` range the last finite one is
/// returned with [`FacilityStatus::Diverged`].
pub fn solve_facility_with(input: &FacilityInput, config: &EngineConfig) -> FacilitySolution {
    let annual_rate = pct_to_rate(input.interest_rate_pct);
    let fee_rate = pct_to_rate(input.funding_fee_pct);

    if input.construction_required <= Decimal::ZERO
        || annual_rate <= Decimal::ZERO
        || input.build_months == 0
    {
        return FacilitySolution::not_required(FacilityStatus::NotRequired);
    }
    if fee_rate == Decimal::ONE {
        warn!(funding_fee_pct = %input.funding_fee_pct, "funding fee consumes the whole facility");
        return FacilitySolution::not_required(FacilityStatus::FeeConsumesFacility);
    }

    let Some(mut facility) = input
        .construction_required
        .checked_mul(config.facility_seed_multiplier)
    else {
        warn!(construction_required = %input.construction_required, "facility seed out of range");
        return FacilitySolution {
            facility_size: input.construction_required,
            iterations: 0,
            residual: Decimal::ZERO,
            status: FacilityStatus::Diverged,
        };
    };
    let mut residual = Decimal::ZERO;

    for pass in 1..=config.max_iterations {
        let step = next_estimate(facility, input, annual_rate, fee_rate, config).and_then(
            |candidate| {
                let delta = facility.checked_sub(candidate)?;
                Some((candidate, delta.abs()))
            },
        );
        let Some((candidate, delta)) = step else {
            warn!(pass, %facility, "facility solver diverged");
            return FacilitySolution {
                facility_size: facility,
                iterations: pass,
                residual,
                status: FacilityStatus::Diverged,
            };
        };
        residual = delta;
        debug!(pass, %facility, %candidate, %residual, "facility pass");

        if residual < config.tolerance {
            debug!(pass, %facility, "facility solver converged");
            return FacilitySolution {
                facility_size: facility,
                iterations: pass,
                residual,
                status: FacilityStatus::Converged,
            };
        }
        facility = candidate;
    }

    warn!(
        iterations = config.max_iterations,
        %residual,
        "facility solver exhausted its iteration budget"
    );
    FacilitySolution {
        facility_size: facility,
        iterations: config.max_iterations,
        residual,
        status: FacilityStatus::IterationLimit,
    }
}

/// One fixed-point pass: the facility implied by a current estimate.
///
/// A converged [`FacilitySolution`] satisfies
/// `|facility_candidate(f) - f| < tolerance`. `None` when the pass leaves the
/// `Decimal` range.
pub fn facility_candidate(
    facility: Money,
    input: &FacilityInput,
    config: &EngineConfig,
) -> Option<Money> {
    next_estimate(
        facility,
        input,
        pct_to_rate(input.interest_rate_pct),
        pct_to_rate(input.funding_fee_pct),
        config,
    )
}

fn next_estimate(
    facility: Money,
    input: &FacilityInput,
    annual_rate: Rate,
    fee_rate: Rate,
    config: &EngineConfig,
) -> Option<Money> {
    let establishment_fee = facility.checked_mul(fee_rate)?;
    let net_principal = input.construction_required.checked_add(establishment_fee)?;
    let interest_reserve = checked_accrue_interest(
        net_principal,
        annual_rate,
        input.build_months,
        input.term_months,
        config,
    )?;
    input
        .construction_required
        .checked_add(interest_reserve)?
        .checked_div(Decimal::ONE - fee_rate)
}
