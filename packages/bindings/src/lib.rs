use napi::Result as NapiResult;
use napi_derive::napi;

use devfeas_core::feasibility::facility::{self, FacilityInput};
use devfeas_core::feasibility::input::validate_input;
use devfeas_core::{EngineConfig, FeasibilityInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Engine config from an optional JSON document; defaults when absent.
fn parse_config(config_json: Option<String>) -> NapiResult<EngineConfig> {
    let config = match config_json {
        Some(json) => serde_json::from_str::<EngineConfig>(&json).map_err(to_napi_error)?,
        None => EngineConfig::default(),
    };
    config.validate().map_err(to_napi_error)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Feasibility
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_feasibility(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input = FeasibilityInput::from_json(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let output = devfeas_core::evaluate_feasibility_with(&input, &config);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn validate_feasibility_input(input_json: String) -> NapiResult<String> {
    let input = FeasibilityInput::from_json(&input_json).map_err(to_napi_error)?;
    validate_input(&input).map_err(to_napi_error)?;
    serde_json::to_string(&serde_json::json!({ "valid": true })).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Facility
// ---------------------------------------------------------------------------

#[napi]
pub fn solve_facility(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: FacilityInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let output = facility::size_facility(&input, &config, true);
    serde_json::to_string(&output).map_err(to_napi_error)
}
