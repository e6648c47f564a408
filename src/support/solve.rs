//! Numeric solvers used by the cycle models.
//!
//! - [`secant`]: bounded secant iteration with bisection fallback, for the
//!   nested equilibrium loops.
//! - [`simplex`]: bounded Nelder–Mead search for multi-variable design
//!   optimization.
//!
//! Bisection and golden section search on a [`twine_core::Model`] come from
//! `twine_solvers` and are used directly where a bracketed scalar search
//! suffices.

pub mod secant;
pub mod simplex;
