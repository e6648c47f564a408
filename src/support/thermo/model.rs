//! Thermodynamic property models for CO2.
//!
//! [`PerfectGas`] needs no native library and backs the tests. `CoolProp`
//! gives real-gas properties near the critical point.

pub mod perfect_gas;

#[cfg(feature = "coolprop")]
#[cfg_attr(docsrs, doc(cfg(feature = "coolprop")))]
pub mod coolprop;

pub use perfect_gas::PerfectGas;

#[cfg(feature = "coolprop")]
#[cfg_attr(docsrs, doc(cfg(feature = "coolprop")))]
pub use coolprop::CoolProp;
