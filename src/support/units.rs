//! Extensions to [`uom`].
//!
//! [`uom`] has no named quantities for specific enthalpy, entropy, or gas
//! constant, and subtracting two absolute temperatures does not give a
//! [`TemperatureInterval`]. This module fills both gaps:
//!
//! ```
//! use uom::si::{
//!     f64::ThermodynamicTemperature, temperature_interval::kelvin as delta_kelvin,
//!     thermodynamic_temperature::degree_celsius,
//! };
//! use sco2_cycle::support::units::TemperatureDifference;
//!
//! let turbine_outlet = ThermodynamicTemperature::new::<degree_celsius>(420.0);
//! let cold_outlet = ThermodynamicTemperature::new::<degree_celsius>(405.0);
//! assert!((turbine_outlet.minus(cold_outlet).get::<delta_kelvin>() - 15.0).abs() < 1e-9);
//! ```

use uom::{
    si::{
        ISQ, Quantity, SI,
        f64::{TemperatureInterval, ThermodynamicTemperature},
        temperature_interval::kelvin as delta_kelvin,
        thermodynamic_temperature::kelvin,
    },
    typenum::{N1, N2, P2, Z0},
};

/// Specific enthalpy, J/kg in SI.
pub type SpecificEnthalpy = Quantity<ISQ<P2, Z0, N2, Z0, Z0, Z0, Z0>, SI<f64>, f64>;

/// Specific entropy, J/kg·K in SI.
pub type SpecificEntropy = Quantity<ISQ<P2, Z0, N2, Z0, N1, Z0, Z0>, SI<f64>, f64>;

/// Specific gas constant, J/kg·K in SI.
pub type SpecificGasConstant = SpecificEntropy;

/// Difference of two absolute temperatures.
///
/// See [uom#380](https://github.com/iliekturtles/uom/issues/380) for why
/// `ThermodynamicTemperature - ThermodynamicTemperature` is not provided.
pub trait TemperatureDifference {
    /// Returns `self - other` as an interval.
    fn minus(self, other: Self) -> TemperatureInterval;
}

impl TemperatureDifference for ThermodynamicTemperature {
    fn minus(self, other: Self) -> TemperatureInterval {
        TemperatureInterval::new::<delta_kelvin>(self.get::<kelvin>() - other.get::<kelvin>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        available_energy::joule_per_kilogram, thermodynamic_temperature::degree_celsius,
    };

    #[test]
    fn approach_is_signed() {
        let hot = ThermodynamicTemperature::new::<degree_celsius>(550.0);
        let cold = ThermodynamicTemperature::new::<kelvin>(800.0);

        assert_relative_eq!(hot.minus(cold).get::<delta_kelvin>(), 23.15, epsilon = 1e-9);
        assert_relative_eq!(cold.minus(hot).get::<delta_kelvin>(), -23.15, epsilon = 1e-9);
    }

    #[test]
    fn enthalpy_alias_reads_in_joules_per_kilogram() {
        let h = SpecificEnthalpy::new::<joule_per_kilogram>(5.0e5);
        assert_relative_eq!(h.get::<joule_per_kilogram>(), 5.0e5);
    }
}
