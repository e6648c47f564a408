//! Thermodynamic and fluid property modeling.
//!
//! Models expose what they can compute through capability traits
//! ([`capability`]). The cycle code does not talk to those traits directly;
//! it goes through [`PropertyOracle`], which any sufficiently capable model
//! implements automatically.

mod error;
mod oracle;
mod state;

pub mod capability;
pub mod fluid;
pub mod model;

pub use error::PropertyError;
pub use oracle::{Properties, PropertyOracle};
pub use state::State;
