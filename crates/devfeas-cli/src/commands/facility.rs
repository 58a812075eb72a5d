use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use devfeas_core::feasibility::facility::{self, FacilityInput};
use devfeas_core::feasibility::input::DEFAULT_FUNDING_FEE_PCT;

use super::ConfigArgs;
use crate::input;

/// Arguments for construction facility sizing
#[derive(Args)]
pub struct FacilityArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Construction funding the facility has to provide
    #[arg(long)]
    pub construction_required: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 8.5 for 8.5%)
    #[arg(long)]
    pub interest_rate_pct: Option<Decimal>,

    /// Build phase length in months
    #[arg(long)]
    pub build_months: Option<u32>,

    /// Total facility term in months (defaults to the build period)
    #[arg(long)]
    pub term_months: Option<u32>,

    /// Establishment fee in percent of the facility
    #[arg(long)]
    pub funding_fee_pct: Option<Decimal>,

    /// Include the month-by-month interest accrual
    #[arg(long)]
    pub schedule: bool,

    /// Fail unless the facility size is a converged fixed point
    #[arg(long)]
    pub require_converged: bool,

    #[command(flatten)]
    pub engine: ConfigArgs,
}

pub fn run_facility(args: FacilityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let fac_input: FacilityInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let build_months = args
            .build_months
            .ok_or("--build-months is required (or provide --input)")?;
        FacilityInput {
            construction_required: args
                .construction_required
                .ok_or("--construction-required is required (or provide --input)")?,
            interest_rate_pct: args
                .interest_rate_pct
                .ok_or("--interest-rate-pct is required (or provide --input)")?,
            build_months,
            term_months: args.term_months.unwrap_or(build_months),
            funding_fee_pct: args.funding_fee_pct.unwrap_or(DEFAULT_FUNDING_FEE_PCT),
        }
    };
    let config = args.engine.load()?;

    let result = facility::size_facility(&fac_input, &config, args.schedule);
    if args.require_converged {
        result.result.solution.require_converged()?;
    }
    Ok(serde_json::to_value(result)?)
}
