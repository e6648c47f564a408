use uom::si::{
    f64::{Pressure, SpecificHeatCapacity, ThermodynamicTemperature},
    pressure::kilopascal,
    specific_heat_capacity::joule_per_kilogram_kelvin,
    thermodynamic_temperature::kelvin,
};

use crate::support::thermo::model::perfect_gas::{PerfectGasFluid, PerfectGasParameters};
use crate::support::units::SpecificGasConstant;

/// Canonical identifier for carbon dioxide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CarbonDioxide;

impl CarbonDioxide {
    /// Critical temperature, 304.1282 K.
    #[must_use]
    pub fn critical_temperature() -> ThermodynamicTemperature {
        ThermodynamicTemperature::new::<kelvin>(304.1282)
    }

    /// Critical pressure, 7377.3 kPa.
    #[must_use]
    pub fn critical_pressure() -> Pressure {
        Pressure::new::<kilopascal>(7377.3)
    }

    /// Supercritical pseudo-critical pressure at a given temperature.
    ///
    /// Quadratic fit of the pressure at which `cp` peaks along an isotherm,
    /// `P_pc = (0.191448·T + 45.6661)·T − 24213.3` kPa with `T` in kelvin.
    /// Only meaningful above the critical temperature.
    #[must_use]
    pub fn pseudo_critical_pressure(temperature: ThermodynamicTemperature) -> Pressure {
        let t = temperature.get::<kelvin>();
        Pressure::new::<kilopascal>((0.191_448 * t + 45.6661) * t - 24_213.3)
    }
}

impl PerfectGasFluid for CarbonDioxide {
    fn parameters() -> PerfectGasParameters {
        PerfectGasParameters::new(
            SpecificGasConstant::new::<joule_per_kilogram_kelvin>(188.92),
            SpecificHeatCapacity::new::<joule_per_kilogram_kelvin>(844.0),
        )
    }
}

#[cfg(feature = "coolprop")]
impl crate::support::thermo::model::coolprop::CoolPropFluid for CarbonDioxide {
    const BACKEND: &'static str = "HEOS";
    const NAME: &'static str = "CarbonDioxide";
}
