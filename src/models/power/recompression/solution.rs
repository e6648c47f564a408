use uom::si::f64::{
    MassRate, Power, Ratio, TemperatureInterval, ThermalConductance,
};

use crate::models::{
    power::turbomachinery::{
        CompressorDesign, CompressorOperation, RecompressorDesign, RecompressorOperation,
        TurbineDesign, TurbineOperation,
    },
    thermal::hx::HeatExchangerDesign,
};

use super::{CycleStates, DesignParameters, OffDesignParameters};

/// Design records of the four heat exchangers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exchangers {
    /// Low-temperature recuperator: main compressor flow against turbine flow.
    pub lt: HeatExchangerDesign,

    /// High-temperature recuperator: turbine flow on both sides.
    pub ht: HeatExchangerDesign,

    /// Primary heat exchanger, cold side only.
    pub phx: HeatExchangerDesign,

    /// Precooler, hot side only.
    pub pc: HeatExchangerDesign,
}

/// Mass flow through each branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassFlows {
    pub main_compressor: MassRate,
    pub recompressor: MassRate,
    pub turbine: MassRate,
}

/// A solved and sized design point.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignSolution {
    pub parameters: DesignParameters,
    pub states: CycleStates,
    pub w_dot_net: Power,

    /// Heat added in the primary heat exchanger, plus any heat shield bypass.
    pub q_dot_in: Power,

    /// Thermal efficiency, including any topology penalty.
    pub eta_thermal: Ratio,

    pub m_dot: MassFlows,

    /// Fraction of turbine flow that bypasses the HT recuperator cold side.
    ///
    /// Zero unless the topology routes flow around it.
    pub ht_bypass_fraction: f64,

    pub exchangers: Exchangers,
    pub compressor: CompressorDesign,

    /// Sized only when the design recompresses a meaningful fraction.
    pub recompressor: Option<RecompressorDesign>,

    pub turbine: TurbineDesign,
}

/// Recuperator behavior at an off-design point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecuperatorPerformance {
    /// Conductance available at the operating flows.
    pub ua: ThermalConductance,
    pub q_dot: Power,
    pub min_delta_t: TemperatureInterval,
}

/// A solved off-design operating point.
#[derive(Debug, Clone, PartialEq)]
pub struct OffDesignSolution {
    pub parameters: OffDesignParameters,
    pub states: CycleStates,
    pub w_dot_net: Power,
    pub q_dot_in: Power,
    pub eta_thermal: Ratio,
    pub m_dot: MassFlows,
    pub compressor: CompressorOperation,
    pub recompressor: Option<RecompressorOperation>,
    pub turbine: TurbineOperation,
    pub lt: RecuperatorPerformance,
    pub ht: RecuperatorPerformance,
}
