//! Property development feasibility.
//!
//! Data flows one way through the submodules:
//! [`input`] -> [`facility`] (sizes the construction loan) -> [`costs`]
//! (derives every cost line) -> [`engine`] (RLV and lender ratios) ->
//! [`sensitivity`] (RLV under revenue shocks). [`interest_reserve`] is the
//! capitalised-interest model shared by the solver and the cost cascade.

pub mod costs;
pub mod engine;
pub mod facility;
pub mod input;
pub mod interest_reserve;
pub mod sensitivity;
