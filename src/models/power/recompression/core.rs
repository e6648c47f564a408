//! Cycle balance shared by the design and off-design solves.
//!
//! Both solves fix the compressor and turbine inlets, resolve the pressure at
//! every node, and then iterate the two recuperator temperatures until the
//! conductance each recuperator needs matches the conductance it has. They
//! differ in where the mass flows come from: the design solve derives them
//! from the net power target, the off-design solve from the turbine nozzle.

mod design;
mod finalize;
mod heat_shield;
mod off_design;
mod pressures;
mod recuperators;
mod topology;

pub(super) use design::{DesignPoint, design_point};
pub(super) use finalize::finalize;
pub(super) use off_design::off_design;

use uom::si::{
    available_energy::joule_per_kilogram,
    f64::{MassRate, Power, ThermodynamicTemperature},
    mass_rate::kilogram_per_second,
    power::watt,
    thermodynamic_temperature::kelvin,
};

use crate::support::{thermo::Properties, units::SpecificEnthalpy};

/// Recuperators with less conductance than this (W/K) are absent.
const NO_RECUPERATOR: f64 = 1e-12;

/// Recompression fractions below this send no flow to the recompressor.
const NO_RECOMPRESSION: f64 = 1e-12;

fn enthalpy(state: &Properties) -> f64 {
    state.enthalpy.get::<joule_per_kilogram>()
}

fn temperature(state: &Properties) -> f64 {
    state.temperature.get::<kelvin>()
}

fn kelvins(t: f64) -> ThermodynamicTemperature {
    ThermodynamicTemperature::new::<kelvin>(t)
}

fn mass_rate(m_dot: f64) -> MassRate {
    MassRate::new::<kilogram_per_second>(m_dot)
}

fn watts(q_dot: f64) -> Power {
    Power::new::<watt>(q_dot)
}

fn specific_enthalpy(h: f64) -> SpecificEnthalpy {
    SpecificEnthalpy::new::<joule_per_kilogram>(h)
}
