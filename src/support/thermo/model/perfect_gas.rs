//! Calorically perfect gas model.
//!
//! `PerfectGas` pairs the ideal gas equation of state `p = ρ·R·T` with a
//! constant `cp`. For carbon dioxide this is far from the real-gas behavior
//! near the critical point, but every lookup has a closed form, which makes
//! it a good oracle for exercising cycle logic without a native property
//! library. Use [`super::CoolProp`] (when enabled) for real-gas CO2.
//!
//! Enthalpy and entropy are measured from a reference state at 0 °C and
//! 1 atm unless the fluid supplies another.

use std::{convert::Infallible, marker::PhantomData};

use thiserror::Error;
use uom::{
    ConstZero,
    si::{
        f64::{MassDensity, Pressure, SpecificHeatCapacity, ThermodynamicTemperature, Velocity},
        pressure::{atmosphere, pascal},
        ratio::ratio,
        specific_heat_capacity::joule_per_kilogram_kelvin,
        thermodynamic_temperature::{degree_celsius, kelvin},
        velocity::meter_per_second,
    },
};

use crate::support::{
    thermo::{
        PropertyError, State,
        capability::{HasEnthalpy, HasEntropy, HasPressure, HasSoundSpeed, StateFrom, ThermoModel},
    },
    units::{SpecificEnthalpy, SpecificEntropy, SpecificGasConstant, TemperatureDifference},
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PerfectGasParametersError {
    #[error("gas constant must be positive, got {r:?}")]
    GasConstant { r: SpecificGasConstant },
    #[error("reference temperature must be positive, got {t_ref:?}")]
    ReferenceTemperature { t_ref: ThermodynamicTemperature },
    #[error("reference pressure must be positive, got {p_ref:?}")]
    ReferencePressure { p_ref: Pressure },
    #[error("cv = cp - R must be positive; cp={cp:?}, R={r:?}")]
    NonPhysicalCv {
        r: SpecificGasConstant,
        cp: SpecificHeatCapacity,
    },
}

/// State at which enthalpy and entropy take their reference values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfectGasReference {
    pub temperature: ThermodynamicTemperature,
    pub pressure: Pressure,
    pub enthalpy: SpecificEnthalpy,
    pub entropy: SpecificEntropy,
}

impl Default for PerfectGasReference {
    /// 0 °C and 1 atm with zero enthalpy and entropy.
    fn default() -> Self {
        Self {
            temperature: ThermodynamicTemperature::new::<degree_celsius>(0.0),
            pressure: Pressure::new::<atmosphere>(1.0),
            enthalpy: SpecificEnthalpy::ZERO,
            entropy: SpecificEntropy::ZERO,
        }
    }
}

/// Constants a fluid supplies through [`PerfectGasFluid`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfectGasParameters {
    pub gas_constant: SpecificGasConstant,
    pub cp: SpecificHeatCapacity,
    pub reference: PerfectGasReference,
}

impl PerfectGasParameters {
    #[must_use]
    pub fn new(gas_constant: SpecificGasConstant, cp: SpecificHeatCapacity) -> Self {
        Self {
            gas_constant,
            cp,
            reference: PerfectGasReference::default(),
        }
    }
}

/// Fluid constants required by the [`PerfectGas`] model.
pub trait PerfectGasFluid {
    fn parameters() -> PerfectGasParameters;
}

/// Perfect gas model with constant `cp` and `cv`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfectGas<Fluid> {
    r: SpecificGasConstant,
    cp: SpecificHeatCapacity,
    gamma: f64,
    reference: PerfectGasReference,
    _marker: PhantomData<Fluid>,
}

impl<Fluid> ThermoModel for PerfectGas<Fluid> {
    type Fluid = Fluid;
}

impl<Fluid: PerfectGasFluid> PerfectGas<Fluid> {
    /// Creates the model from the constants `Fluid` supplies.
    ///
    /// # Errors
    ///
    /// Returns [`PerfectGasParametersError`] if `R`, the reference state, or
    /// `cv = cp − R` is not positive.
    pub fn new() -> Result<Self, PerfectGasParametersError> {
        let PerfectGasParameters {
            gas_constant: r,
            cp,
            reference,
        } = Fluid::parameters();

        if !is_positive(r.get::<joule_per_kilogram_kelvin>()) {
            return Err(PerfectGasParametersError::GasConstant { r });
        }
        if !is_positive(reference.temperature.get::<kelvin>()) {
            return Err(PerfectGasParametersError::ReferenceTemperature {
                t_ref: reference.temperature,
            });
        }
        if !is_positive(reference.pressure.get::<pascal>()) {
            return Err(PerfectGasParametersError::ReferencePressure {
                p_ref: reference.pressure,
            });
        }
        let cv = cp - r;
        if !is_positive(cv.get::<joule_per_kilogram_kelvin>()) {
            return Err(PerfectGasParametersError::NonPhysicalCv { r, cp });
        }

        Ok(Self {
            r,
            cp,
            gamma: (cp / cv).get::<ratio>(),
            reference,
            _marker: PhantomData,
        })
    }
}

impl<Fluid> PerfectGas<Fluid> {
    fn state(&self, fluid: Fluid, t: ThermodynamicTemperature, p: Pressure) -> State<Fluid> {
        let density: MassDensity = p / (self.r * t);
        State::new(t, density, fluid)
    }

    /// `T = T₀ + (h − h₀)/cp`
    fn temperature_at(&self, h: SpecificEnthalpy) -> ThermodynamicTemperature {
        self.reference.temperature + (h - self.reference.enthalpy) / self.cp
    }
}

impl<Fluid> HasPressure for PerfectGas<Fluid> {
    fn pressure(&self, state: &State<Fluid>) -> Result<Pressure, PropertyError> {
        Ok(state.density * self.r * state.temperature)
    }
}

impl<Fluid> HasEnthalpy for PerfectGas<Fluid> {
    /// `h = h₀ + cp·(T − T₀)`
    fn enthalpy(&self, state: &State<Fluid>) -> Result<SpecificEnthalpy, PropertyError> {
        let reference = &self.reference;
        Ok(reference.enthalpy + self.cp * state.temperature.minus(reference.temperature))
    }
}

impl<Fluid> HasEntropy for PerfectGas<Fluid> {
    /// `s = s₀ + cp·ln(T/T₀) − R·ln(p/p₀)`
    fn entropy(&self, state: &State<Fluid>) -> Result<SpecificEntropy, PropertyError> {
        let reference = &self.reference;
        let p = self.pressure(state)?;
        Ok(reference.entropy + self.cp * (state.temperature / reference.temperature).ln()
            - self.r * (p / reference.pressure).ln())
    }
}

impl<Fluid> HasSoundSpeed for PerfectGas<Fluid> {
    /// `a = √(γ·R·T)`
    fn sound_speed(&self, state: &State<Fluid>) -> Result<Velocity, PropertyError> {
        let r_t = self.r.get::<joule_per_kilogram_kelvin>() * state.temperature.get::<kelvin>();
        if r_t <= 0.0 {
            return Err(PropertyError::OutOfDomain {
                context: format!("sound speed requires T > 0, got {:?}", state.temperature),
            });
        }
        Ok(Velocity::new::<meter_per_second>((self.gamma * r_t).sqrt()))
    }
}

impl<Fluid> StateFrom<(Fluid, ThermodynamicTemperature, Pressure)> for PerfectGas<Fluid> {
    type Error = Infallible;

    fn state_from(
        &self,
        (fluid, t, p): (Fluid, ThermodynamicTemperature, Pressure),
    ) -> Result<State<Fluid>, Self::Error> {
        Ok(self.state(fluid, t, p))
    }
}

impl<Fluid> StateFrom<(Fluid, Pressure, SpecificEnthalpy)> for PerfectGas<Fluid> {
    type Error = Infallible;

    fn state_from(
        &self,
        (fluid, p, h): (Fluid, Pressure, SpecificEnthalpy),
    ) -> Result<State<Fluid>, Self::Error> {
        Ok(self.state(fluid, self.temperature_at(h), p))
    }
}

impl<Fluid> StateFrom<(Fluid, Pressure, SpecificEntropy)> for PerfectGas<Fluid> {
    type Error = Infallible;

    /// `T = T₀·exp((s − s₀ + R·ln(p/p₀))/cp)`
    fn state_from(
        &self,
        (fluid, p, s): (Fluid, Pressure, SpecificEntropy),
    ) -> Result<State<Fluid>, Self::Error> {
        let reference = &self.reference;
        let exponent = (s - reference.entropy + self.r * (p / reference.pressure).ln()) / self.cp;
        let t = reference.temperature * exponent.get::<ratio>().exp();
        Ok(self.state(fluid, t, p))
    }
}

impl<Fluid> StateFrom<(Fluid, SpecificEnthalpy, SpecificEntropy)> for PerfectGas<Fluid> {
    type Error = Infallible;

    /// `p = p₀·exp((cp·ln(T/T₀) + s₀ − s)/R)`
    fn state_from(
        &self,
        (fluid, h, s): (Fluid, SpecificEnthalpy, SpecificEntropy),
    ) -> Result<State<Fluid>, Self::Error> {
        let reference = &self.reference;
        let t = self.temperature_at(h);
        let exponent =
            (self.cp * (t / reference.temperature).ln() + reference.entropy - s) / self.r;
        let p = reference.pressure * exponent.get::<ratio>().exp();
        Ok(self.state(fluid, t, p))
    }
}

/// False for zero, negative, and NaN values.
fn is_positive(value: f64) -> bool {
    value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::pressure::{kilopascal, megapascal};

    use crate::support::thermo::fluid::CarbonDioxide;

    #[derive(Debug, Clone, Copy, Default)]
    struct ColdCv;

    impl PerfectGasFluid for ColdCv {
        fn parameters() -> PerfectGasParameters {
            PerfectGasParameters::new(
                SpecificGasConstant::new::<joule_per_kilogram_kelvin>(500.0),
                SpecificHeatCapacity::new::<joule_per_kilogram_kelvin>(400.0),
            )
        }
    }

    fn co2() -> PerfectGas<CarbonDioxide> {
        PerfectGas::new().expect("carbon dioxide parameters are physically valid")
    }

    fn at(t_celsius: f64, p_mpa: f64) -> State<CarbonDioxide> {
        co2()
            .state_from((
                ThermodynamicTemperature::new::<degree_celsius>(t_celsius),
                Pressure::new::<megapascal>(p_mpa),
            ))
            .unwrap()
    }

    #[test]
    fn reference_state_has_zero_enthalpy() -> Result<(), PropertyError> {
        let thermo = co2();
        let state = thermo
            .state_from((
                ThermodynamicTemperature::new::<degree_celsius>(0.0),
                Pressure::new::<atmosphere>(1.0),
            ))
            .unwrap();

        assert_relative_eq!(thermo.pressure(&state)?.get::<atmosphere>(), 1.0);
        assert_eq!(thermo.enthalpy(&state)?, SpecificEnthalpy::ZERO);
        Ok(())
    }

    #[test]
    fn rejects_cp_below_gas_constant() {
        let error = PerfectGas::<ColdCv>::new().unwrap_err();
        assert!(matches!(error, PerfectGasParametersError::NonPhysicalCv { .. }));
    }

    #[test]
    fn isentropic_compression_heats_the_gas() -> Result<(), PropertyError> {
        let thermo = co2();
        let inlet = at(32.0, 7.65);
        let s = thermo.entropy(&inlet)?;

        let outlet: State<CarbonDioxide> = thermo
            .state_from((Pressure::new::<megapascal>(20.0), s))
            .unwrap();

        // T2/T1 = (P2/P1)^(R/cp)
        let expected = inlet.temperature.get::<kelvin>() * (20.0_f64 / 7.65).powf(188.92 / 844.0);
        assert_relative_eq!(outlet.temperature.get::<kelvin>(), expected, max_relative = 1e-12);

        Ok(())
    }

    #[test]
    fn precooler_outlet_recovers_from_pressure_and_enthalpy() -> Result<(), PropertyError> {
        let thermo = co2();
        let state = at(32.0, 7.7);

        let h = thermo.enthalpy(&state)?;
        let back: State<CarbonDioxide> = thermo
            .state_from((Pressure::new::<kilopascal>(7700.0), h))
            .unwrap();

        assert_relative_eq!(
            back.temperature.get::<kelvin>(),
            state.temperature.get::<kelvin>(),
            max_relative = 1e-12
        );
        Ok(())
    }

    #[test]
    fn turbine_inlet_recovers_from_enthalpy_and_entropy() -> Result<(), PropertyError> {
        let thermo = co2();
        let state = at(550.0, 20.0);

        let h = thermo.enthalpy(&state)?;
        let s = thermo.entropy(&state)?;
        let back: State<CarbonDioxide> = thermo.state_from((h, s)).unwrap();

        assert_relative_eq!(
            back.temperature.get::<kelvin>(),
            state.temperature.get::<kelvin>(),
            max_relative = 1e-10
        );
        assert_relative_eq!(
            thermo.pressure(&back)?.get::<megapascal>(),
            20.0,
            max_relative = 1e-10
        );
        Ok(())
    }

    #[test]
    fn sound_speed_follows_gamma_r_t() -> Result<(), PropertyError> {
        let state = at(400.0 - 273.15, 1.0);

        let gamma = 844.0 / (844.0 - 188.92);
        let expected = (gamma * 188.92 * 400.0_f64).sqrt();
        assert_relative_eq!(
            co2().sound_speed(&state)?.get::<meter_per_second>(),
            expected,
            max_relative = 1e-9
        );
        Ok(())
    }
}
