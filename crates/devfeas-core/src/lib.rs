pub mod config;
pub mod error;
pub mod feasibility;
pub mod types;

pub use config::EngineConfig;
pub use error::DevFeasError;
pub use feasibility::engine::{evaluate_feasibility, evaluate_feasibility_with, FeasibilityOutput};
pub use feasibility::input::FeasibilityInput;
pub use types::*;

/// Standard result type for the fallible (strict) devfeas operations
pub type DevFeasResult<T> = Result<T, DevFeasError>;
