//! Canonical fluid identifiers.
//!
//! A fluid type names a substance, and each model defines how that name is
//! interpreted: constants for [`PerfectGas`](super::model::PerfectGas), or
//! backend identifiers for [`CoolProp`](super::model) when the `coolprop`
//! feature is enabled.

mod carbon_dioxide;

pub use carbon_dioxide::CarbonDioxide;
