use uom::si::{
    available_energy::joule_per_kilogram,
    f64::{Pressure, ThermodynamicTemperature},
};

use crate::support::{
    thermo::{Properties, PropertyError, PropertyOracle},
    units::SpecificEnthalpy,
};

use super::Machine;

/// Inlet and outlet states of a machine with a known isentropic efficiency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutletState {
    pub inlet: Properties,
    pub outlet: Properties,

    /// Specific work `h_in − h_out`: positive for a turbine, negative for a
    /// compressor.
    pub specific_work: SpecificEnthalpy,
}

/// Computes the outlet state of a compressor or turbine.
///
/// The inlet is fixed by temperature and pressure. The isentropic outlet
/// enthalpy at `outlet_pressure` is corrected by `efficiency` in the direction
/// appropriate for `machine`.
///
/// # Errors
///
/// Returns [`PropertyError`] if the inlet, isentropic, or actual outlet state
/// cannot be resolved.
pub fn outlet_state(
    oracle: &impl PropertyOracle,
    machine: Machine,
    efficiency: f64,
    inlet_temperature: ThermodynamicTemperature,
    inlet_pressure: Pressure,
    outlet_pressure: Pressure,
) -> Result<OutletState, PropertyError> {
    let inlet = oracle.from_tp(inlet_temperature, inlet_pressure)?;
    let h_in = inlet.enthalpy.get::<joule_per_kilogram>();
    let h_s = oracle
        .from_ps(outlet_pressure, inlet.entropy)?
        .enthalpy
        .get::<joule_per_kilogram>();

    let w = machine.actual_work(h_in - h_s, efficiency);
    let outlet = oracle.from_ph(
        outlet_pressure,
        SpecificEnthalpy::new::<joule_per_kilogram>(h_in - w),
    )?;

    Ok(OutletState {
        inlet,
        outlet,
        specific_work: SpecificEnthalpy::new::<joule_per_kilogram>(w),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{pressure::megapascal, thermodynamic_temperature::kelvin};

    use crate::support::thermo::{fluid::CarbonDioxide, model::PerfectGas};

    const CP: f64 = 844.0;

    fn oracle() -> PerfectGas<CarbonDioxide> {
        PerfectGas::new().expect("carbon dioxide parameters are valid")
    }

    #[test]
    fn compressor_absorbs_work() -> Result<(), PropertyError> {
        let oracle = oracle();
        let ideal = outlet_state(
            &oracle,
            Machine::Compressor,
            1.0,
            ThermodynamicTemperature::new::<kelvin>(305.0),
            Pressure::new::<megapascal>(7.7),
            Pressure::new::<megapascal>(20.0),
        )?;
        let real = outlet_state(
            &oracle,
            Machine::Compressor,
            0.85,
            ThermodynamicTemperature::new::<kelvin>(305.0),
            Pressure::new::<megapascal>(7.7),
            Pressure::new::<megapascal>(20.0),
        )?;

        let w_s = ideal.specific_work.get::<joule_per_kilogram>();
        let w = real.specific_work.get::<joule_per_kilogram>();
        assert!(w_s < 0.0);
        assert_relative_eq!(w, w_s / 0.85, max_relative = 1e-12);
        assert_relative_eq!(
            real.outlet.temperature.get::<kelvin>() - 305.0,
            -w / CP,
            max_relative = 1e-9
        );
        assert_relative_eq!(ideal.outlet.entropy.value, ideal.inlet.entropy.value, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn turbine_produces_work() -> Result<(), PropertyError> {
        let oracle = oracle();
        let ideal = outlet_state(
            &oracle,
            Machine::Turbine,
            1.0,
            ThermodynamicTemperature::new::<kelvin>(823.0),
            Pressure::new::<megapascal>(20.0),
            Pressure::new::<megapascal>(7.8),
        )?;
        let real = outlet_state(
            &oracle,
            Machine::Turbine,
            0.93,
            ThermodynamicTemperature::new::<kelvin>(823.0),
            Pressure::new::<megapascal>(20.0),
            Pressure::new::<megapascal>(7.8),
        )?;

        let w_s = ideal.specific_work.get::<joule_per_kilogram>();
        let w = real.specific_work.get::<joule_per_kilogram>();
        assert!(w_s > 0.0);
        assert_relative_eq!(w, 0.93 * w_s, max_relative = 1e-12);
        assert!(real.outlet.temperature > ideal.outlet.temperature);
        Ok(())
    }
}
