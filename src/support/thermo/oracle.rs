//! Two-property state lookups.
//!
//! Cycle calculations move between states by fixing two independent
//! properties: temperature and pressure at a boundary, pressure and entropy
//! for an isentropic step, pressure and enthalpy after an energy balance, and
//! enthalpy and entropy when a machine map fixes the head instead of the
//! discharge pressure.
//!
//! [`PropertyOracle`] exposes exactly those four entry points and returns a
//! fully populated [`Properties`] record. Any model with the right
//! capabilities gets an implementation for free.

use uom::si::f64::{MassDensity, Pressure, ThermodynamicTemperature, Velocity};

use crate::support::units::{SpecificEnthalpy, SpecificEntropy};

use super::{
    PropertyError,
    capability::{HasEnthalpy, HasEntropy, HasPressure, HasSoundSpeed, StateFrom, ThermoModel},
};

/// A resolved thermodynamic state with every property a cycle node needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Properties {
    pub temperature: ThermodynamicTemperature,
    pub pressure: Pressure,
    pub enthalpy: SpecificEnthalpy,
    pub entropy: SpecificEntropy,
    pub density: MassDensity,
    pub sound_speed: Velocity,
}

/// Property lookups keyed by pairs of independent properties.
///
/// Implementations must be deterministic; they may be called from several
/// independent solver instances at once.
pub trait PropertyOracle {
    /// Resolves a state from temperature and pressure.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] if the state lies outside the model's domain
    /// or the underlying calculation fails.
    fn from_tp(
        &self,
        temperature: ThermodynamicTemperature,
        pressure: Pressure,
    ) -> Result<Properties, PropertyError>;

    /// Resolves a state from pressure and entropy.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] on lookup failure.
    fn from_ps(
        &self,
        pressure: Pressure,
        entropy: SpecificEntropy,
    ) -> Result<Properties, PropertyError>;

    /// Resolves a state from pressure and enthalpy.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] on lookup failure.
    fn from_ph(
        &self,
        pressure: Pressure,
        enthalpy: SpecificEnthalpy,
    ) -> Result<Properties, PropertyError>;

    /// Resolves a state from enthalpy and entropy.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] on lookup failure.
    fn from_hs(
        &self,
        enthalpy: SpecificEnthalpy,
        entropy: SpecificEntropy,
    ) -> Result<Properties, PropertyError>;
}

type TpInput<F> = (F, ThermodynamicTemperature, Pressure);
type PsInput<F> = (F, Pressure, SpecificEntropy);
type PhInput<F> = (F, Pressure, SpecificEnthalpy);
type HsInput<F> = (F, SpecificEnthalpy, SpecificEntropy);

impl<M> PropertyOracle for M
where
    M: HasPressure
        + HasEnthalpy
        + HasEntropy
        + HasSoundSpeed
        + StateFrom<TpInput<<M as ThermoModel>::Fluid>>
        + StateFrom<PsInput<<M as ThermoModel>::Fluid>>
        + StateFrom<PhInput<<M as ThermoModel>::Fluid>>
        + StateFrom<HsInput<<M as ThermoModel>::Fluid>>,
    <M as ThermoModel>::Fluid: Default,
    <M as StateFrom<TpInput<<M as ThermoModel>::Fluid>>>::Error: Into<PropertyError>,
    <M as StateFrom<PsInput<<M as ThermoModel>::Fluid>>>::Error: Into<PropertyError>,
    <M as StateFrom<PhInput<<M as ThermoModel>::Fluid>>>::Error: Into<PropertyError>,
    <M as StateFrom<HsInput<<M as ThermoModel>::Fluid>>>::Error: Into<PropertyError>,
{
    fn from_tp(
        &self,
        temperature: ThermodynamicTemperature,
        pressure: Pressure,
    ) -> Result<Properties, PropertyError> {
        let state = <M as StateFrom<TpInput<M::Fluid>>>::state_from(
            self,
            (M::Fluid::default(), temperature, pressure),
        )
        .map_err(Into::into)?;

        check_finite(
            Properties {
                temperature,
                pressure,
                enthalpy: self.enthalpy(&state)?,
                entropy: self.entropy(&state)?,
                density: state.density,
                sound_speed: self.sound_speed(&state)?,
            },
            "TP",
        )
    }

    fn from_ps(
        &self,
        pressure: Pressure,
        entropy: SpecificEntropy,
    ) -> Result<Properties, PropertyError> {
        let state = <M as StateFrom<PsInput<M::Fluid>>>::state_from(
            self,
            (M::Fluid::default(), pressure, entropy),
        )
        .map_err(Into::into)?;

        check_finite(
            Properties {
                temperature: state.temperature,
                pressure,
                enthalpy: self.enthalpy(&state)?,
                entropy,
                density: state.density,
                sound_speed: self.sound_speed(&state)?,
            },
            "PS",
        )
    }

    fn from_ph(
        &self,
        pressure: Pressure,
        enthalpy: SpecificEnthalpy,
    ) -> Result<Properties, PropertyError> {
        let state = <M as StateFrom<PhInput<M::Fluid>>>::state_from(
            self,
            (M::Fluid::default(), pressure, enthalpy),
        )
        .map_err(Into::into)?;

        check_finite(
            Properties {
                temperature: state.temperature,
                pressure,
                enthalpy,
                entropy: self.entropy(&state)?,
                density: state.density,
                sound_speed: self.sound_speed(&state)?,
            },
            "PH",
        )
    }

    fn from_hs(
        &self,
        enthalpy: SpecificEnthalpy,
        entropy: SpecificEntropy,
    ) -> Result<Properties, PropertyError> {
        let state = <M as StateFrom<HsInput<M::Fluid>>>::state_from(
            self,
            (M::Fluid::default(), enthalpy, entropy),
        )
        .map_err(Into::into)?;

        check_finite(
            Properties {
                temperature: state.temperature,
                pressure: self.pressure(&state)?,
                enthalpy,
                entropy,
                density: state.density,
                sound_speed: self.sound_speed(&state)?,
            },
            "HS",
        )
    }
}

/// Rejects non-finite results so a failed lookup never leaks NaN downstream.
fn check_finite(
    properties: Properties,
    context: &str,
) -> Result<Properties, PropertyError> {
    let values = [
        properties.temperature.value,
        properties.pressure.value,
        properties.enthalpy.value,
        properties.entropy.value,
        properties.density.value,
        properties.sound_speed.value,
    ];
    if values.iter().all(|value| value.is_finite()) {
        Ok(properties)
    } else {
        Err(PropertyError::Calculation {
            context: format!("non-finite property in {context} lookup"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        pressure::megapascal,
        thermodynamic_temperature::{degree_celsius, kelvin},
        velocity::meter_per_second,
    };

    use crate::support::thermo::{fluid::CarbonDioxide, model::PerfectGas};

    fn oracle() -> PerfectGas<CarbonDioxide> {
        PerfectGas::new().expect("carbon dioxide parameters are valid")
    }

    #[test]
    fn every_lookup_lands_on_the_same_state() -> Result<(), PropertyError> {
        let oracle = oracle();
        let base = oracle.from_tp(
            ThermodynamicTemperature::new::<degree_celsius>(550.0),
            Pressure::new::<megapascal>(20.0),
        )?;

        let ps = oracle.from_ps(base.pressure, base.entropy)?;
        let ph = oracle.from_ph(base.pressure, base.enthalpy)?;
        let hs = oracle.from_hs(base.enthalpy, base.entropy)?;

        for other in [ps, ph, hs] {
            assert_relative_eq!(
                other.temperature.get::<kelvin>(),
                base.temperature.get::<kelvin>(),
                max_relative = 1e-10
            );
            assert_relative_eq!(
                other.pressure.get::<megapascal>(),
                base.pressure.get::<megapascal>(),
                max_relative = 1e-10
            );
            assert_relative_eq!(other.density.value, base.density.value, max_relative = 1e-10);
        }

        Ok(())
    }

    #[test]
    fn sound_speed_is_populated() -> Result<(), PropertyError> {
        let props = oracle().from_tp(
            ThermodynamicTemperature::new::<kelvin>(300.0),
            Pressure::new::<megapascal>(1.0),
        )?;
        assert!(props.sound_speed.get::<meter_per_second>() > 200.0);
        Ok(())
    }

    #[test]
    fn non_finite_values_are_rejected() -> Result<(), PropertyError> {
        let mut props = oracle().from_tp(
            ThermodynamicTemperature::new::<kelvin>(300.0),
            Pressure::new::<megapascal>(1.0),
        )?;
        props.density.value = f64::NAN;
        assert!(matches!(
            check_finite(props, "test"),
            Err(PropertyError::Calculation { .. })
        ));
        Ok(())
    }
}
