use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::info;

use devfeas_core::feasibility::input::{validate_input, DEFAULT_FUNDING_FEE_PCT};
use devfeas_core::{evaluate_feasibility_with, FeasibilityInput};

use super::ConfigArgs;
use crate::input;

/// Arguments for a feasibility evaluation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct FeasibilityArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Project name shown on the report
    #[arg(long)]
    pub project_name: Option<String>,

    /// Current value of the site
    #[arg(long)]
    pub land_value: Option<Decimal>,

    /// Valuer's on-completion gross realisation value
    #[arg(long)]
    pub on_completion_grv: Option<Decimal>,

    /// Number of lots in the development
    #[arg(long)]
    pub num_lots: Option<u32>,

    /// Lots expected to sell
    #[arg(long)]
    pub lots_expected_to_sell: Option<u32>,

    /// Average sale price per lot
    #[arg(long)]
    pub avg_sale_price: Option<Decimal>,

    /// Total construction cost
    #[arg(long)]
    pub construction_cost: Option<Decimal>,

    /// Professional fees in percent of construction cost (e.g. 8 for 8%)
    #[arg(long)]
    pub professional_fees_pct: Option<Decimal>,

    /// Construction funding the facility has to provide
    #[arg(long)]
    pub construction_amount_required: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub interest_rate_pct: Option<Decimal>,

    /// Construction period in months
    #[arg(long)]
    pub construction_period_months: Option<u32>,

    /// Facility term in months (0 = construction period)
    #[arg(long)]
    pub facility_term_months: Option<u32>,

    /// Establishment fee in percent of the facility (default 3)
    #[arg(long)]
    pub funding_fee_pct: Option<Decimal>,

    /// Sales & marketing in percent of GDV
    #[arg(long)]
    pub sales_marketing_pct: Option<Decimal>,

    /// Contingency in percent of construction cost
    #[arg(long)]
    pub contingency_pct: Option<Decimal>,

    /// Other project costs
    #[arg(long)]
    pub other_costs: Option<Decimal>,

    /// Developer margin in percent of GDV
    #[arg(long)]
    pub developer_margin_pct: Option<Decimal>,

    /// Reject inconsistent inputs instead of evaluating them with warnings
    #[arg(long)]
    pub strict: bool,

    #[command(flatten)]
    pub engine: ConfigArgs,
}

impl FeasibilityArgs {
    /// Build the input from flags; anything not given is zero.
    fn to_input(&self) -> FeasibilityInput {
        FeasibilityInput {
            project_name: self.project_name.clone(),
            land_value: self.land_value.unwrap_or_default(),
            on_completion_grv: self.on_completion_grv.unwrap_or_default(),
            num_lots: self.num_lots.unwrap_or_default(),
            lots_expected_to_sell: self.lots_expected_to_sell.unwrap_or_default(),
            avg_sale_price: self.avg_sale_price.unwrap_or_default(),
            construction_cost: self.construction_cost.unwrap_or_default(),
            professional_fees_pct: self.professional_fees_pct.unwrap_or_default(),
            construction_amount_required: self.construction_amount_required.unwrap_or_default(),
            interest_rate_pct: self.interest_rate_pct.unwrap_or_default(),
            construction_period_months: self.construction_period_months.unwrap_or_default(),
            facility_term_months: self.facility_term_months.unwrap_or_default(),
            funding_fee_pct: self.funding_fee_pct.unwrap_or(DEFAULT_FUNDING_FEE_PCT),
            sales_marketing_pct: self.sales_marketing_pct.unwrap_or_default(),
            contingency_pct: self.contingency_pct.unwrap_or_default(),
            other_costs: self.other_costs.unwrap_or_default(),
            developer_margin_pct: self.developer_margin_pct.unwrap_or_default(),
        }
    }
}

pub fn run_feasibility(args: FeasibilityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let feas_input: FeasibilityInput = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        args.to_input()
    };
    let config = args.engine.load()?;

    if args.strict {
        validate_input(&feas_input)?;
    }

    let result = evaluate_feasibility_with(&feas_input, &config);
    info!(
        rlv = %result.result.rlv,
        warnings = result.warnings.len(),
        elapsed_us = result.metadata.computation_time_us,
        "feasibility complete"
    );
    Ok(serde_json::to_value(result)?)
}
