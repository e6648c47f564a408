//! CoolProp-backed fluid property model.
//!
//! Real-gas properties for supercritical CO2 through the `rfluids` bindings.
//! Property queries update a shared `AbstractState` from the state's density
//! and temperature, so a lookup is always consistent with the [`State`] it
//! came from. State construction flashes from the given input pair and keeps
//! the resulting temperature and density.

mod error;

use std::{marker::PhantomData, sync::Mutex};

use rfluids::{
    io::{FluidInputPair, FluidParam},
    native::AbstractState,
};
use uom::si::{
    available_energy::joule_per_kilogram,
    f64::{MassDensity, Pressure, ThermodynamicTemperature, Velocity},
    mass_density::kilogram_per_cubic_meter,
    pressure::pascal,
    specific_heat_capacity::joule_per_kilogram_kelvin,
    thermodynamic_temperature::kelvin,
    velocity::meter_per_second,
};

use crate::support::thermo::{
    PropertyError, State,
    capability::{HasEnthalpy, HasEntropy, HasPressure, HasSoundSpeed, StateFrom, ThermoModel},
};
use crate::support::units::{SpecificEnthalpy, SpecificEntropy};

pub use error::CoolPropError;

/// Backend and fluid identifiers for a `CoolProp` `AbstractState`.
#[cfg_attr(docsrs, doc(cfg(feature = "coolprop")))]
pub trait CoolPropFluid: Default + Send + Sync + 'static {
    const BACKEND: &'static str;
    const NAME: &'static str;
}

/// A fluid property model backed by `CoolProp`.
///
/// The `AbstractState` sits behind a mutex so each update and the outputs
/// read after it form one atomic lookup.
#[cfg_attr(docsrs, doc(cfg(feature = "coolprop")))]
pub struct CoolProp<F: CoolPropFluid> {
    state: Mutex<AbstractState>,
    _f: PhantomData<F>,
}

impl<F: CoolPropFluid> ThermoModel for CoolProp<F> {
    type Fluid = F;
}

impl<F: CoolPropFluid> CoolProp<F> {
    /// Creates the model for `F::NAME` on the `F::BACKEND` backend.
    ///
    /// # Errors
    ///
    /// Returns [`CoolPropError`] if CoolProp cannot create the state.
    pub fn new() -> Result<Self, CoolPropError> {
        let state = AbstractState::new(F::BACKEND, F::NAME)?;
        Ok(Self {
            state: Mutex::new(state),
            _f: PhantomData,
        })
    }

    /// Reads one output at the given state.
    fn output(&self, state: &State<F>, param: FluidParam) -> Result<f64, CoolPropError> {
        let mut abstract_state = self.state.lock()?;
        abstract_state.update(
            FluidInputPair::DMassT,
            state.density.get::<kilogram_per_cubic_meter>(),
            state.temperature.get::<kelvin>(),
        )?;
        Ok(abstract_state.keyed_output(param)?)
    }

    /// Flashes from an input pair and returns the resolved temperature and
    /// density.
    fn flash(
        &self,
        fluid: F,
        pair: FluidInputPair,
        first: f64,
        second: f64,
    ) -> Result<State<F>, CoolPropError> {
        let mut abstract_state = self.state.lock()?;
        abstract_state.update(pair, first, second)?;
        let temperature = abstract_state.keyed_output(FluidParam::T)?;
        let density = abstract_state.keyed_output(FluidParam::DMass)?;

        Ok(State::new(
            ThermodynamicTemperature::new::<kelvin>(temperature),
            MassDensity::new::<kilogram_per_cubic_meter>(density),
            fluid,
        ))
    }
}

impl<F: CoolPropFluid> HasPressure for CoolProp<F> {
    fn pressure(&self, state: &State<F>) -> Result<Pressure, PropertyError> {
        let p = self.output(state, FluidParam::P)?;
        Ok(Pressure::new::<pascal>(p))
    }
}

impl<F: CoolPropFluid> HasEnthalpy for CoolProp<F> {
    fn enthalpy(&self, state: &State<F>) -> Result<SpecificEnthalpy, PropertyError> {
        let h = self.output(state, FluidParam::HMass)?;
        Ok(SpecificEnthalpy::new::<joule_per_kilogram>(h))
    }
}

impl<F: CoolPropFluid> HasEntropy for CoolProp<F> {
    fn entropy(&self, state: &State<F>) -> Result<SpecificEntropy, PropertyError> {
        let s = self.output(state, FluidParam::SMass)?;
        Ok(SpecificEntropy::new::<joule_per_kilogram_kelvin>(s))
    }
}

impl<F: CoolPropFluid> HasSoundSpeed for CoolProp<F> {
    fn sound_speed(&self, state: &State<F>) -> Result<Velocity, PropertyError> {
        let a = self.output(state, FluidParam::SoundSpeed)?;
        Ok(Velocity::new::<meter_per_second>(a))
    }
}

impl<F: CoolPropFluid> StateFrom<(F, ThermodynamicTemperature, Pressure)> for CoolProp<F> {
    type Error = CoolPropError;

    fn state_from(
        &self,
        (fluid, temperature, pressure): (F, ThermodynamicTemperature, Pressure),
    ) -> Result<State<F>, Self::Error> {
        let state = self.flash(
            fluid,
            FluidInputPair::PT,
            pressure.get::<pascal>(),
            temperature.get::<kelvin>(),
        )?;
        // Keep the requested temperature exactly.
        Ok(State { temperature, ..state })
    }
}

impl<F: CoolPropFluid> StateFrom<(F, Pressure, SpecificEnthalpy)> for CoolProp<F> {
    type Error = CoolPropError;

    fn state_from(
        &self,
        (fluid, pressure, enthalpy): (F, Pressure, SpecificEnthalpy),
    ) -> Result<State<F>, Self::Error> {
        self.flash(
            fluid,
            FluidInputPair::HMassP,
            enthalpy.get::<joule_per_kilogram>(),
            pressure.get::<pascal>(),
        )
    }
}

impl<F: CoolPropFluid> StateFrom<(F, Pressure, SpecificEntropy)> for CoolProp<F> {
    type Error = CoolPropError;

    fn state_from(
        &self,
        (fluid, pressure, entropy): (F, Pressure, SpecificEntropy),
    ) -> Result<State<F>, Self::Error> {
        self.flash(
            fluid,
            FluidInputPair::PSMass,
            pressure.get::<pascal>(),
            entropy.get::<joule_per_kilogram_kelvin>(),
        )
    }
}

impl<F: CoolPropFluid> StateFrom<(F, SpecificEnthalpy, SpecificEntropy)> for CoolProp<F> {
    type Error = CoolPropError;

    fn state_from(
        &self,
        (fluid, enthalpy, entropy): (F, SpecificEnthalpy, SpecificEntropy),
    ) -> Result<State<F>, Self::Error> {
        self.flash(
            fluid,
            FluidInputPair::HMassSMass,
            enthalpy.get::<joule_per_kilogram>(),
            entropy.get::<joule_per_kilogram_kelvin>(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        available_energy::kilojoule_per_kilogram,
        pressure::{kilopascal, megapascal},
        thermodynamic_temperature::degree_celsius,
    };

    use crate::support::thermo::{PropertyOracle, fluid::CarbonDioxide};

    fn co2() -> CoolProp<CarbonDioxide> {
        CoolProp::new().expect("CoolProp loads carbon dioxide")
    }

    fn dense_state() -> State<CarbonDioxide> {
        State::new(
            ThermodynamicTemperature::new::<degree_celsius>(42.0),
            MassDensity::new::<kilogram_per_cubic_meter>(670.0),
            CarbonDioxide,
        )
    }

    #[test]
    fn dense_state_matches_reference_values() {
        let model = co2();
        let state = dense_state();

        let p = model.pressure(&state).unwrap();
        let h = model.enthalpy(&state).unwrap();
        assert_relative_eq!(p.get::<megapascal>(), 11.3362, epsilon = 1e-4);
        assert_relative_eq!(h.get::<kilojoule_per_kilogram>(), 307.8761, epsilon = 1e-4);
        assert!(model.sound_speed(&state).unwrap().get::<meter_per_second>() > 250.0);
    }

    #[test]
    fn compressor_inlet_lookups_agree() -> Result<(), PropertyError> {
        let model = co2();
        let base = model.from_tp(
            ThermodynamicTemperature::new::<degree_celsius>(32.0),
            Pressure::new::<kilopascal>(7650.0),
        )?;

        let ph = model.from_ph(base.pressure, base.enthalpy)?;
        let ps = model.from_ps(base.pressure, base.entropy)?;

        for other in [ph, ps] {
            assert_relative_eq!(
                other.temperature.get::<kelvin>(),
                base.temperature.get::<kelvin>(),
                max_relative = 1e-8
            );
            assert_relative_eq!(
                other.density.get::<kilogram_per_cubic_meter>(),
                base.density.get::<kilogram_per_cubic_meter>(),
                max_relative = 1e-6
            );
        }

        Ok(())
    }

    #[test]
    fn turbine_inlet_enthalpy_entropy_lookup_recovers_pressure() -> Result<(), PropertyError> {
        let model = co2();
        let base = model.from_tp(
            ThermodynamicTemperature::new::<degree_celsius>(550.0),
            Pressure::new::<kilopascal>(20_000.0),
        )?;

        let hs = model.from_hs(base.enthalpy, base.entropy)?;
        assert_relative_eq!(hs.pressure.get::<kilopascal>(), 20_000.0, max_relative = 1e-6);

        Ok(())
    }
}
