pub mod facility;
pub mod feasibility;

use clap::Args;
use rust_decimal::Decimal;

use devfeas_core::EngineConfig;

use crate::input;

/// Solver and accrual settings shared by every command
#[derive(Args)]
pub struct ConfigArgs {
    /// Path to a JSON or YAML engine config file
    #[arg(long)]
    pub config: Option<String>,

    /// Maximum fixed-point passes for facility sizing
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Convergence tolerance in currency units
    #[arg(long)]
    pub tolerance: Option<Decimal>,
}

impl ConfigArgs {
    /// Engine config from the file (or defaults) with flag overrides applied.
    pub fn load(&self) -> Result<EngineConfig, Box<dyn std::error::Error>> {
        let mut config: EngineConfig = match self.config {
            Some(ref path) => input::file::read_document(path)?,
            None => EngineConfig::default(),
        };
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations;
        }
        if let Some(tolerance) = self.tolerance {
            config.tolerance = tolerance;
        }
        config.validate()?;
        Ok(config)
    }
}
