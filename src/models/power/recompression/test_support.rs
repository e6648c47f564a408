//! Shared fixtures for cycle tests.

use uom::si::{
    f64::{Power, Pressure, ThermalConductance, ThermodynamicTemperature},
    power::megawatt,
    pressure::kilopascal,
    thermal_conductance::kilowatt_per_kelvin,
    thermodynamic_temperature::kelvin,
};

use crate::{
    models::{power::turbomachinery::Efficiency, thermal::hx::StreamPair},
    support::thermo::{fluid::CarbonDioxide, model::PerfectGas},
};

use super::{DesignParameters, PressureDrop, Topology, TurbineSpeed};

pub(crate) fn oracle() -> PerfectGas<CarbonDioxide> {
    PerfectGas::new().expect("carbon dioxide parameters are valid")
}

pub(crate) fn kpa(value: f64) -> Pressure {
    Pressure::new::<kilopascal>(value)
}

/// A 10 MW simple recuperated cycle with no pressure drops.
pub(crate) fn design_parameters() -> DesignParameters {
    let no_drop = PressureDrop::Absolute(kpa(0.0));
    DesignParameters {
        w_dot_net: Power::new::<megawatt>(10.0),
        t_mc_in: ThermodynamicTemperature::new::<kelvin>(305.0),
        t_t_in: ThermodynamicTemperature::new::<kelvin>(823.0),
        p_mc_in: kpa(7700.0),
        p_mc_out: kpa(20_000.0),
        dp_lt: StreamPair::new(no_drop, no_drop),
        dp_ht: StreamPair::new(no_drop, no_drop),
        dp_pc: no_drop,
        dp_phx: no_drop,
        ua_lt: ThermalConductance::new::<kilowatt_per_kelvin>(300.0),
        ua_ht: ThermalConductance::new::<kilowatt_per_kelvin>(300.0),
        recomp_frac: 0.0,
        eta_mc: Efficiency::Isentropic(0.89),
        eta_rc: Efficiency::Isentropic(0.89),
        eta_t: Efficiency::Isentropic(0.9),
        n_sub_hxrs: 10,
        n_t: TurbineSpeed::LinkedToCompressor,
        tol: 1e-6,
        topology: Topology::Standard,
    }
}

/// A hotter recompression cycle with small pressure drops.
pub(crate) fn recompression_parameters() -> DesignParameters {
    DesignParameters {
        t_t_in: ThermodynamicTemperature::new::<kelvin>(1100.0),
        p_mc_out: kpa(12_000.0),
        dp_lt: StreamPair::new(
            PressureDrop::Absolute(kpa(60.0)),
            PressureDrop::Absolute(kpa(30.0)),
        ),
        dp_ht: StreamPair::new(
            PressureDrop::Absolute(kpa(60.0)),
            PressureDrop::Absolute(kpa(30.0)),
        ),
        dp_pc: PressureDrop::Absolute(kpa(20.0)),
        dp_phx: PressureDrop::Absolute(kpa(40.0)),
        ua_lt: ThermalConductance::new::<kilowatt_per_kelvin>(250.0),
        ua_ht: ThermalConductance::new::<kilowatt_per_kelvin>(400.0),
        recomp_frac: 0.25,
        ..design_parameters()
    }
}
