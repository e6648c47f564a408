#![cfg_attr(docsrs, feature(doc_cfg))]

//! # sCO2 Cycle
//!
//! Steady-state models of supercritical CO2 recompression Brayton cycles,
//! built on [Twine](https://github.com/isentropic-dev/twine).
//!
//! ## Crate layout
//!
//! - [`models`]: The cycle, its turbomachinery, and its heat exchangers.
//!   [`models::power::recompression::RecompressionCycle`] is the entry point.
//! - [`support`]: Property models, numeric solvers, and unit helpers used by
//!   the models.
//!
//! ## Utility code lifecycle
//!
//! Modules in [`support`] are part of the public API because they're useful,
//! but their APIs are not stable. Breaking changes may occur as needed.
//!
//! Utility code starts in a model's internal `core` module, moves to a
//! domain-level module once more than one model needs it, and lands in
//! [`support`] when it is useful across domains.
//!
//! ## Features
//!
//! - `coolprop`: real-gas CO2 properties through `CoolProp`. Without it,
//!   [`support::thermo::model::PerfectGas`] serves as the property model.

pub mod models;
pub mod support;
