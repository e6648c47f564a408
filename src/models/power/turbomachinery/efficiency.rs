use uom::si::{
    available_energy::joule_per_kilogram,
    f64::{Pressure, ThermodynamicTemperature},
    pressure::pascal,
};

use crate::support::{
    thermo::{PropertyError, PropertyOracle},
    units::SpecificEnthalpy,
};

/// Number of equal pressure steps used to integrate a polytropic path.
const POLYTROPIC_STAGES: usize = 200;

/// Direction of energy transfer through a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Machine {
    /// Work goes into the fluid; actual work exceeds isentropic work.
    Compressor,

    /// Work comes out of the fluid; actual work falls short of isentropic work.
    Turbine,
}

impl Machine {
    /// Actual specific enthalpy change from an isentropic one.
    pub(super) fn actual_work(self, isentropic_work: f64, efficiency: f64) -> f64 {
        match self {
            Self::Compressor => isentropic_work / efficiency,
            Self::Turbine => isentropic_work * efficiency,
        }
    }
}

/// How a machine efficiency is specified.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Efficiency {
    Isentropic(f64),
    Polytropic(f64),
}

impl Efficiency {
    /// Returns the isentropic efficiency across the given pressure change.
    ///
    /// An isentropic efficiency is returned as is. A polytropic efficiency is
    /// converted with [`isentropic_from_polytropic`].
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] if a state along the polytropic path cannot
    /// be resolved.
    pub fn isentropic(
        self,
        oracle: &impl PropertyOracle,
        machine: Machine,
        inlet_temperature: ThermodynamicTemperature,
        inlet_pressure: Pressure,
        outlet_pressure: Pressure,
    ) -> Result<f64, PropertyError> {
        match self {
            Self::Isentropic(eta) => Ok(eta),
            Self::Polytropic(eta) => isentropic_from_polytropic(
                oracle,
                machine,
                eta,
                inlet_temperature,
                inlet_pressure,
                outlet_pressure,
            ),
        }
    }
}

/// Converts a polytropic efficiency into the equivalent isentropic one.
///
/// The pressure change is split into many small stages, each with the
/// polytropic efficiency, and the overall actual enthalpy change is compared
/// with the single isentropic step across the whole pressure change.
///
/// # Errors
///
/// Returns [`PropertyError`] if any stage state cannot be resolved.
pub fn isentropic_from_polytropic(
    oracle: &impl PropertyOracle,
    machine: Machine,
    polytropic: f64,
    inlet_temperature: ThermodynamicTemperature,
    inlet_pressure: Pressure,
    outlet_pressure: Pressure,
) -> Result<f64, PropertyError> {
    let inlet = oracle.from_tp(inlet_temperature, inlet_pressure)?;
    let h_in = inlet.enthalpy.get::<joule_per_kilogram>();
    let p_in = inlet_pressure.get::<pascal>();
    let p_out = outlet_pressure.get::<pascal>();

    let h_s_out = oracle
        .from_ps(outlet_pressure, inlet.entropy)?
        .enthalpy
        .get::<joule_per_kilogram>();

    let stage_dp = (p_out - p_in) / POLYTROPIC_STAGES as f64;
    let (mut h, mut s) = (h_in, inlet.entropy);
    for stage in 1..=POLYTROPIC_STAGES {
        let p = Pressure::new::<pascal>(p_in + stage as f64 * stage_dp);
        let h_s = oracle.from_ps(p, s)?.enthalpy.get::<joule_per_kilogram>();
        h -= machine.actual_work(h - h_s, polytropic);
        s = oracle
            .from_ph(p, SpecificEnthalpy::new::<joule_per_kilogram>(h))?
            .entropy;
    }

    let actual = h - h_in;
    let ideal = h_s_out - h_in;
    if actual == 0.0 || ideal == 0.0 {
        return Ok(polytropic);
    }

    Ok(match machine {
        Machine::Compressor => ideal / actual,
        Machine::Turbine => actual / ideal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{pressure::megapascal, thermodynamic_temperature::kelvin};

    use crate::support::thermo::{fluid::CarbonDioxide, model::PerfectGas};

    fn oracle() -> PerfectGas<CarbonDioxide> {
        PerfectGas::new().expect("carbon dioxide parameters are valid")
    }

    /// Closed-form perfect gas conversion, `k = R/cp`.
    fn perfect_gas_compressor(eta_p: f64, pressure_ratio: f64) -> f64 {
        let k = 188.92 / 844.0;
        (pressure_ratio.powf(k) - 1.0) / (pressure_ratio.powf(k / eta_p) - 1.0)
    }

    #[test]
    fn isentropic_input_passes_through() -> Result<(), PropertyError> {
        let eta = Efficiency::Isentropic(0.89).isentropic(
            &oracle(),
            Machine::Compressor,
            ThermodynamicTemperature::new::<kelvin>(305.0),
            Pressure::new::<megapascal>(7.7),
            Pressure::new::<megapascal>(20.0),
        )?;
        assert_eq!(eta, 0.89);
        Ok(())
    }

    #[test]
    fn compressor_conversion_matches_perfect_gas() -> Result<(), PropertyError> {
        let eta = isentropic_from_polytropic(
            &oracle(),
            Machine::Compressor,
            0.9,
            ThermodynamicTemperature::new::<kelvin>(305.0),
            Pressure::new::<megapascal>(7.7),
            Pressure::new::<megapascal>(20.0),
        )?;

        assert_relative_eq!(
            eta,
            perfect_gas_compressor(0.9, 20.0 / 7.7),
            max_relative = 1e-3
        );
        assert!(eta < 0.9);
        Ok(())
    }

    #[test]
    fn turbine_isentropic_exceeds_polytropic() -> Result<(), PropertyError> {
        let eta = isentropic_from_polytropic(
            &oracle(),
            Machine::Turbine,
            0.9,
            ThermodynamicTemperature::new::<kelvin>(823.0),
            Pressure::new::<megapascal>(20.0),
            Pressure::new::<megapascal>(7.8),
        )?;

        assert!(eta > 0.9 && eta < 1.0);
        Ok(())
    }
}
