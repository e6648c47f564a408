//! Capability traits a property model implements.
//!
//! [`PropertyOracle`](super::PropertyOracle) is implemented for any model with
//! the pressure, enthalpy, entropy, and sound speed capabilities and the four
//! [`StateFrom`] pairs.

mod base;
mod properties;
mod state_from;

pub use base::ThermoModel;
pub use properties::*;
pub use state_from::StateFrom;
