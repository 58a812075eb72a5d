use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::types::{Money, Rate};

const MONTHS_PER_YEAR: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Drawdown phase of the facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccrualPhase {
    /// Construction under way, facility partially drawn
    Build,
    /// Construction complete, facility fully drawn until repayment
    Tail,
}

/// One month of the capitalised-interest schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualPeriod {
    /// 1-based month of the facility term
    pub month: u32,
    pub phase: AccrualPhase,
    pub opening_balance: Money,
    pub utilization: Rate,
    pub interest: Money,
    /// Opening balance plus capitalised interest
    pub closing_balance: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Total capitalised interest on `principal` over a build phase followed by
/// a fully-drawn tail, using the default utilisation assumptions.
///
/// `annual_rate` is a decimal rate (0.08 = 8%). The tail runs for
/// `total_term_months - build_months` months, or not at all when the term is
/// shorter than the build. Balances beyond the `Decimal` range are capped.
pub fn accrue_interest(
    principal: Money,
    annual_rate: Rate,
    build_months: u32,
    total_term_months: u32,
) -> Money {
    accrue_interest_with(
        principal,
        annual_rate,
        build_months,
        total_term_months,
        &EngineConfig::default(),
    )
}

/// [`accrue_interest`] with explicit utilisation assumptions.
pub fn accrue_interest_with(
    principal: Money,
    annual_rate: Rate,
    build_months: u32,
    total_term_months: u32,
    config: &EngineConfig,
) -> Money {
    let monthly_rate = annual_rate / MONTHS_PER_YEAR;
    let mut balance = principal;
    let mut total_interest = Decimal::ZERO;

    for (_, utilization) in phases(build_months, total_term_months, config) {
        let interest = balance
            .saturating_mul(utilization)
            .saturating_mul(monthly_rate);
        total_interest = total_interest.saturating_add(interest);
        balance = balance.saturating_add(interest);
    }

    total_interest
}

/// [`accrue_interest_with`], or `None` once the capitalised balance leaves
/// the representable range.
///
/// [`accrue_interest_with`] caps at `Decimal::MAX` / `Decimal::MIN` instead;
/// the facility solver uses this form to detect divergence.
pub fn checked_accrue_interest(
    principal: Money,
    annual_rate: Rate,
    build_months: u32,
    total_term_months: u32,
    config: &EngineConfig,
) -> Option<Money> {
    let monthly_rate = annual_rate / MONTHS_PER_YEAR;
    let mut balance = principal;
    let mut total_interest = Decimal::ZERO;

    for (_, utilization) in phases(build_months, total_term_months, config) {
        let interest = balance.checked_mul(utilization)?.checked_mul(monthly_rate)?;
        total_interest = total_interest.checked_add(interest)?;
        balance = balance.checked_add(interest)?;
    }

    Some(total_interest)
}

/// Month-by-month schedule behind [`accrue_interest_with`]. The interest
/// column sums to the same total.
pub fn interest_schedule(
    principal: Money,
    annual_rate: Rate,
    build_months: u32,
    total_term_months: u32,
    config: &EngineConfig,
) -> Vec<AccrualPeriod> {
    let monthly_rate = annual_rate / MONTHS_PER_YEAR;
    let mut balance = principal;

    phases(build_months, total_term_months, config)
        .enumerate()
        .map(|(idx, (phase, utilization))| {
            let opening_balance = balance;
            let interest = balance
                .saturating_mul(utilization)
                .saturating_mul(monthly_rate);
            balance = balance.saturating_add(interest);
            AccrualPeriod {
                month: idx as u32 + 1,
                phase,
                opening_balance,
                utilization,
                interest,
                closing_balance: balance,
            }
        })
        .collect()
}

/// Closed-form equivalent of the monthly model.
///
/// Utilisation is constant within a phase, so capitalisation compounds at
/// `1 + u * r / 12` per month and the total interest is
/// `P * ((1 + u_b * m)^b * (1 + u_t * m)^t - 1)`.
pub fn compound_interest(
    principal: Money,
    annual_rate: Rate,
    build_months: u32,
    total_term_months: u32,
    config: &EngineConfig,
) -> Money {
    let monthly_rate = annual_rate / MONTHS_PER_YEAR;
    let tail_months = total_term_months.saturating_sub(build_months);

    let build_base = Decimal::ONE.saturating_add(config.build_utilization.saturating_mul(monthly_rate));
    let tail_base = Decimal::ONE.saturating_add(config.tail_utilization.saturating_mul(monthly_rate));

    let growth = build_base
        .checked_powu(u64::from(build_months))
        .zip(tail_base.checked_powu(u64::from(tail_months)))
        .and_then(|(build, tail)| build.checked_mul(tail));

    match growth {
        Some(growth) => principal.saturating_mul(growth.saturating_sub(Decimal::ONE)),
        // Growth beyond range: the capped sign of the principal
        None => principal.saturating_mul(Decimal::MAX),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Phase and utilisation for every month of the term, build months first.
fn phases(
    build_months: u32,
    total_term_months: u32,
    config: &EngineConfig,
) -> impl Iterator<Item = (AccrualPhase, Rate)> {
    let tail_months = total_term_months.saturating_sub(build_months);
    let build = std::iter::repeat((AccrualPhase::Build, config.build_utilization))
        .take(build_months as usize);
    let tail = std::iter::repeat((AccrualPhase::Tail, config.tail_utilization))
        .take(tail_months as usize);
    build.chain(tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rate_accrues_nothing() {
        assert_eq!(accrue_interest(dec!(1000000), Decimal::ZERO, 12, 18), Decimal::ZERO);
    }

    #[test]
    fn test_zero_months_accrues_nothing() {
        assert_eq!(accrue_interest(dec!(1000000), dec!(0.08), 0, 0), Decimal::ZERO);
    }

    #[test]
    fn test_single_build_month() {
        // 1,200,000 * 0.55 * 0.12 / 12 = 6,600
        assert_eq!(accrue_interest(dec!(1200000), dec!(0.12), 1, 1), dec!(6600));
    }

    #[test]
    fn test_build_then_tail_capitalises() {
        // Month 1 (build): 1,200,000 * 0.55 * 0.01 = 6,600 -> balance 1,206,600
        // Month 2 (tail):  1,206,600 * 1.00 * 0.01 = 12,066
        assert_eq!(accrue_interest(dec!(1200000), dec!(0.12), 1, 2), dec!(18666));
    }

    #[test]
    fn test_term_shorter_than_build_has_no_tail() {
        let short = accrue_interest(dec!(1000000), dec!(0.08), 12, 6);
        let exact = accrue_interest(dec!(1000000), dec!(0.08), 12, 12);
        assert_eq!(short, exact);
    }

    #[test]
    fn test_interest_grows_with_principal() {
        let small = accrue_interest(dec!(500000), dec!(0.08), 12, 18);
        let large = accrue_interest(dec!(1000000), dec!(0.08), 12, 18);
        assert!(large > small);
    }

    #[test]
    fn test_schedule_sums_to_total() {
        let cfg = EngineConfig::default();
        let schedule = interest_schedule(dec!(1030000), dec!(0.08), 12, 18, &cfg);
        assert_eq!(schedule.len(), 18);
        assert_eq!(schedule[0].phase, AccrualPhase::Build);
        assert_eq!(schedule[11].phase, AccrualPhase::Build);
        assert_eq!(schedule[12].phase, AccrualPhase::Tail);
        assert_eq!(schedule[17].month, 18);

        let summed: Decimal = schedule.iter().map(|p| p.interest).sum();
        assert_eq!(summed, accrue_interest_with(dec!(1030000), dec!(0.08), 12, 18, &cfg));
    }

    #[test]
    fn test_schedule_balances_chain() {
        let cfg = EngineConfig::default();
        let schedule = interest_schedule(dec!(250000), dec!(0.09), 6, 9, &cfg);
        assert_eq!(schedule[0].opening_balance, dec!(250000));
        for pair in schedule.windows(2) {
            assert_eq!(pair[0].closing_balance, pair[1].opening_balance);
        }
    }

    #[test]
    fn test_closed_form_matches_monthly_model() {
        let cfg = EngineConfig::default();
        let monthly = accrue_interest_with(dec!(1030000), dec!(0.08), 12, 18, &cfg);
        let closed = compound_interest(dec!(1030000), dec!(0.08), 12, 18, &cfg);
        assert!(
            (monthly - closed).abs() < dec!(0.01),
            "monthly {monthly} vs closed form {closed}"
        );
    }

    #[test]
    fn test_runaway_accrual_is_capped_not_fatal() {
        // 1200% p.a. is 100% a month; 120 tail months double the balance 120 times
        let cfg = EngineConfig::default();
        let capped = accrue_interest_with(dec!(2500000), dec!(12), 12, 132, &cfg);
        assert_eq!(capped, Decimal::MAX);
        assert_eq!(checked_accrue_interest(dec!(2500000), dec!(12), 12, 132, &cfg), None);
        assert_eq!(compound_interest(dec!(2500000), dec!(12), 12, 132, &cfg), Decimal::MAX);

        let schedule = interest_schedule(dec!(2500000), dec!(12), 12, 132, &cfg);
        assert_eq!(schedule.len(), 132);
        assert_eq!(schedule[131].closing_balance, Decimal::MAX);
    }

    #[test]
    fn test_checked_accrual_matches_within_range() {
        let cfg = EngineConfig::default();
        assert_eq!(
            checked_accrue_interest(dec!(1030000), dec!(0.08), 12, 18, &cfg),
            Some(accrue_interest_with(dec!(1030000), dec!(0.08), 12, 18, &cfg))
        );
    }
}
