//! Property capabilities, one trait per property.
//!
//! Each returns [`PropertyError`] when the model cannot evaluate the
//! property at the given state.

use uom::si::f64::{Pressure, Velocity};

use crate::support::thermo::{PropertyError, State};
use crate::support::units::{SpecificEnthalpy, SpecificEntropy};

use super::ThermoModel;

pub trait HasPressure: ThermoModel {
    /// # Errors
    ///
    /// Returns [`PropertyError`] if the pressure cannot be calculated.
    fn pressure(&self, state: &State<Self::Fluid>) -> Result<Pressure, PropertyError>;
}

pub trait HasEnthalpy: ThermoModel {
    /// # Errors
    ///
    /// Returns [`PropertyError`] if the enthalpy cannot be calculated.
    fn enthalpy(&self, state: &State<Self::Fluid>) -> Result<SpecificEnthalpy, PropertyError>;
}

pub trait HasEntropy: ThermoModel {
    /// # Errors
    ///
    /// Returns [`PropertyError`] if the entropy cannot be calculated.
    fn entropy(&self, state: &State<Self::Fluid>) -> Result<SpecificEntropy, PropertyError>;
}

/// Speed of sound, used for the turbine spouting velocity and the
/// compressor tip Mach number.
pub trait HasSoundSpeed: ThermoModel {
    /// # Errors
    ///
    /// Returns [`PropertyError`] if the speed of sound cannot be calculated.
    fn sound_speed(&self, state: &State<Self::Fluid>) -> Result<Velocity, PropertyError>;
}
