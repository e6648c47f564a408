use uom::si::{
    f64::{
        AngularVelocity, MassRate, Power, Pressure, SpecificHeatCapacity, TemperatureInterval,
        ThermalConductance, ThermodynamicTemperature,
    },
    pressure::pascal,
    temperature_interval::kelvin as delta_kelvin,
};

use crate::models::{power::turbomachinery::Efficiency, thermal::hx::StreamPair};

/// Pressure loss through one side of a heat exchanger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressureDrop {
    Absolute(Pressure),

    /// Fraction of the inlet pressure.
    Relative(f64),
}

impl PressureDrop {
    /// Outlet pressure for a known inlet pressure.
    #[must_use]
    pub fn outlet(self, inlet: Pressure) -> Pressure {
        match self {
            Self::Absolute(dp) => inlet - dp,
            Self::Relative(fraction) => inlet * (1.0 - fraction.abs()),
        }
    }

    /// Inlet pressure needed to reach a known outlet pressure.
    #[must_use]
    pub fn inlet(self, outlet: Pressure) -> Pressure {
        match self {
            Self::Absolute(dp) => outlet + dp,
            Self::Relative(fraction) => outlet / (1.0 - fraction.abs()),
        }
    }
}

impl Default for PressureDrop {
    fn default() -> Self {
        Self::Absolute(Pressure::new::<pascal>(0.0))
    }
}

/// Turbine shaft speed at the design point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TurbineSpeed {
    /// Same shaft as the main compressor.
    #[default]
    LinkedToCompressor,
    Fixed(AngularVelocity),
}

/// How the design point treats the recompressed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Topology {
    /// Recompressed flow mixes back in ahead of the HT recuperator.
    #[default]
    Standard,

    /// Recompressed flow bypasses the turbine as a heat shield stream.
    ///
    /// Efficiency is penalized when the heat shield temperature rise leaves
    /// 150–250 K or its share of heat input moves away from 10/65.
    Bypass,

    /// Standard balance, penalized when the recompressor outlet exceeds 150 °C.
    Bypass150C,

    /// Part of the turbine flow bypasses the HT recuperator cold side.
    ///
    /// The bypass fraction is solved so the bypass stream takes 10/65 of the
    /// total heat input.
    HtrBypassHeatShield,
}

/// Iteration limits for the recuperator and mass flow loops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleTolerances {
    /// Maximum iterations of each recuperator temperature loop.
    pub max_iters: usize,

    /// Maximum iterations of the off-design turbine mass flow loop.
    pub mass_flow_max_iters: usize,

    /// A recuperator approach below this counts as fully pinched.
    pub temperature_tol: TemperatureInterval,
}

impl Default for CycleTolerances {
    fn default() -> Self {
        Self {
            max_iters: 500,
            mass_flow_max_iters: 100,
            temperature_tol: TemperatureInterval::new::<delta_kelvin>(1e-6),
        }
    }
}

/// Inputs for a single design-point solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesignParameters {
    /// Target net power.
    pub w_dot_net: Power,

    pub t_mc_in: ThermodynamicTemperature,
    pub t_t_in: ThermodynamicTemperature,
    pub p_mc_in: Pressure,
    pub p_mc_out: Pressure,

    pub dp_lt: StreamPair<PressureDrop>,
    pub dp_ht: StreamPair<PressureDrop>,

    /// Precooler pressure drop (hot side).
    pub dp_pc: PressureDrop,

    /// Primary heat exchanger pressure drop (cold side).
    pub dp_phx: PressureDrop,

    pub ua_lt: ThermalConductance,
    pub ua_ht: ThermalConductance,

    /// Fraction of turbine flow routed through the recompressor.
    pub recomp_frac: f64,

    pub eta_mc: Efficiency,
    pub eta_rc: Efficiency,
    pub eta_t: Efficiency,

    /// Sub-segments used in each recuperator UA calculation.
    pub n_sub_hxrs: usize,

    pub n_t: TurbineSpeed,

    /// Relative convergence tolerance of the recuperator loops.
    pub tol: f64,

    pub topology: Topology,
}

/// Inputs for an off-design solve of a sized cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffDesignParameters {
    pub t_mc_in: ThermodynamicTemperature,
    pub t_t_in: ThermodynamicTemperature,
    pub p_mc_in: Pressure,
    pub recomp_frac: f64,
    pub n_mc: AngularVelocity,
    pub n_t: AngularVelocity,
    pub n_sub_hxrs: usize,
    pub tol: f64,
}

/// Inputs for a design optimization.
///
/// Each free variable has an initial guess and a flag that holds it fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimalDesignParameters {
    pub w_dot_net: Power,
    pub t_mc_in: ThermodynamicTemperature,
    pub t_t_in: ThermodynamicTemperature,
    pub dp_lt: StreamPair<PressureDrop>,
    pub dp_ht: StreamPair<PressureDrop>,
    pub dp_pc: PressureDrop,
    pub dp_phx: PressureDrop,

    /// Recuperator conductance shared between LT and HT.
    pub ua_total: ThermalConductance,

    pub eta_mc: Efficiency,
    pub eta_rc: Efficiency,
    pub eta_t: Efficiency,
    pub n_sub_hxrs: usize,

    /// Upper limit on any cycle pressure.
    pub p_high_limit: Pressure,

    pub n_t: TurbineSpeed,
    pub tol: f64,

    /// Relative tolerance of the optimizer.
    pub opt_tol: f64,

    pub p_mc_out_guess: Pressure,
    pub fixed_p_mc_out: bool,

    /// Compressor pressure ratio guess.
    pub pr_mc_guess: f64,
    pub fixed_pr_mc: bool,

    pub recomp_frac_guess: f64,
    pub fixed_recomp_frac: bool,

    /// Fraction of `ua_total` given to the LT recuperator.
    pub lt_frac_guess: f64,
    pub fixed_lt_frac: bool,

    pub topology: Topology,
}

/// Inputs for the automatic design optimization.
///
/// Compressor outlet pressure, pressure ratio, recompression fraction, and
/// UA split are all chosen by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoOptimalParameters {
    pub w_dot_net: Power,
    pub t_mc_in: ThermodynamicTemperature,
    pub t_t_in: ThermodynamicTemperature,
    pub dp_lt: StreamPair<PressureDrop>,
    pub dp_ht: StreamPair<PressureDrop>,
    pub dp_pc: PressureDrop,
    pub dp_phx: PressureDrop,
    pub ua_total: ThermalConductance,
    pub eta_mc: Efficiency,
    pub eta_rc: Efficiency,
    pub eta_t: Efficiency,
    pub n_sub_hxrs: usize,
    pub p_high_limit: Pressure,
    pub n_t: TurbineSpeed,
    pub tol: f64,
    pub opt_tol: f64,
    pub topology: Topology,
}

impl AutoOptimalParameters {
    /// Optimization inputs with the given pressure guesses and fixes.
    pub(crate) fn optimal(
        &self,
        p_mc_out: Pressure,
        pr_mc: f64,
        recomp_frac: f64,
        lt_frac: f64,
        fixed_recomp_frac: bool,
    ) -> OptimalDesignParameters {
        OptimalDesignParameters {
            w_dot_net: self.w_dot_net,
            t_mc_in: self.t_mc_in,
            t_t_in: self.t_t_in,
            dp_lt: self.dp_lt,
            dp_ht: self.dp_ht,
            dp_pc: self.dp_pc,
            dp_phx: self.dp_phx,
            ua_total: self.ua_total,
            eta_mc: self.eta_mc,
            eta_rc: self.eta_rc,
            eta_t: self.eta_t,
            n_sub_hxrs: self.n_sub_hxrs,
            p_high_limit: self.p_high_limit,
            n_t: self.n_t,
            tol: self.tol,
            opt_tol: self.opt_tol,
            p_mc_out_guess: p_mc_out,
            fixed_p_mc_out: true,
            pr_mc_guess: pr_mc,
            fixed_pr_mc: false,
            recomp_frac_guess: recomp_frac,
            fixed_recomp_frac,
            lt_frac_guess: lt_frac,
            fixed_lt_frac: fixed_recomp_frac,
            topology: self.topology,
        }
    }
}

/// Inputs for finding the recuperator size that reaches a target efficiency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetEfficiencyParameters {
    pub w_dot_net: Power,

    /// Thermal efficiency the optimized design must reach.
    pub eta_thermal: f64,

    pub t_mc_in: ThermodynamicTemperature,
    pub t_t_in: ThermodynamicTemperature,
    pub dp_lt: StreamPair<PressureDrop>,
    pub dp_ht: StreamPair<PressureDrop>,
    pub dp_pc: PressureDrop,
    pub dp_phx: PressureDrop,
    pub eta_mc: Efficiency,
    pub eta_rc: Efficiency,
    pub eta_t: Efficiency,
    pub n_sub_hxrs: usize,
    pub p_high_limit: Pressure,
    pub n_t: TurbineSpeed,
    pub tol: f64,
    pub opt_tol: f64,
    pub topology: Topology,
}

/// Bounds used to validate target-efficiency inputs and to bracket the
/// recuperator conductance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetEfficiencyLimits {
    /// Smallest total UA per unit net power, W/K per W.
    pub ua_min_ratio: f64,

    /// Largest total UA per unit net power, W/K per W.
    pub ua_max_ratio: f64,

    /// Turbine inlet temperatures at or above this are rejected.
    pub t_upper_limit: ThermodynamicTemperature,

    /// High-pressure limits at or above this are clamped below it.
    pub p_upper_limit: Pressure,

    /// Maximum number of conductance updates.
    pub max_iters: usize,
}

impl Default for TargetEfficiencyLimits {
    fn default() -> Self {
        use uom::si::{pressure::megapascal, thermodynamic_temperature::kelvin};

        Self {
            ua_min_ratio: 1e-5,
            ua_max_ratio: 2.0,
            t_upper_limit: ThermodynamicTemperature::new::<kelvin>(2000.0),
            p_upper_limit: Pressure::new::<megapascal>(800.0),
            max_iters: 50,
        }
    }
}

/// Which off-design quantity a target applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffDesignTarget {
    NetPower,
    HeatInput,
}

/// Inputs for finding the compressor inlet pressure that hits a target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetOffDesignParameters {
    pub t_mc_in: ThermodynamicTemperature,
    pub t_t_in: ThermodynamicTemperature,
    pub recomp_frac: f64,
    pub n_mc: AngularVelocity,
    pub n_t: AngularVelocity,
    pub n_sub_hxrs: usize,
    pub tol: f64,

    /// Target net power or heat input.
    pub target: Power,
    pub target_kind: OffDesignTarget,

    /// Bounds of the compressor inlet pressure scan.
    pub lowest_pressure: Pressure,
    pub highest_pressure: Pressure,

    /// Scan with 50 intervals instead of 20.
    pub fine_scan: bool,

    /// The scan stops once the compressor outlet exceeds 1.2 times this.
    pub p_high_limit: Pressure,
}

/// Quantity maximized by the off-design optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffDesignObjective {
    NetPower,
    Efficiency,
}

/// Inputs for optimizing an off-design operating point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimalOffDesignParameters {
    pub t_mc_in: ThermodynamicTemperature,
    pub t_t_in: ThermodynamicTemperature,
    pub n_sub_hxrs: usize,
    pub tol: f64,
    pub opt_tol: f64,
    pub objective: OffDesignObjective,

    /// Compressor outlet pressures above this are penalized.
    pub p_high_limit: Pressure,

    pub p_mc_in_guess: Pressure,
    pub fixed_p_mc_in: bool,
    pub recomp_frac_guess: f64,
    pub fixed_recomp_frac: bool,
    pub n_mc_guess: AngularVelocity,
    pub fixed_n_mc: bool,

    /// Turbine speed; `None` keeps it on the compressor shaft.
    pub n_t_guess: Option<AngularVelocity>,
    pub fixed_n_t: bool,
}

/// Inputs for the most efficient operating point that meets a target.
///
/// The compressor inlet pressure follows from the target at each trial; the
/// recompression fraction and shaft speeds are searched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimalTargetOffDesignParameters {
    pub t_mc_in: ThermodynamicTemperature,
    pub t_t_in: ThermodynamicTemperature,
    pub n_sub_hxrs: usize,
    pub tol: f64,
    pub opt_tol: f64,

    /// Target net power or heat input.
    pub target: Power,
    pub target_kind: OffDesignTarget,

    /// Bounds of the compressor inlet pressure scan.
    pub lowest_pressure: Pressure,
    pub highest_pressure: Pressure,
    pub fine_scan: bool,

    /// Compressor outlet pressures above this are penalized.
    pub p_high_limit: Pressure,

    pub recomp_frac_guess: f64,
    pub fixed_recomp_frac: bool,
    pub n_mc_guess: AngularVelocity,
    pub fixed_n_mc: bool,

    /// Turbine speed; `None` keeps it on the compressor shaft.
    pub n_t_guess: Option<AngularVelocity>,
    pub fixed_n_t: bool,
}

impl OptimalTargetOffDesignParameters {
    /// Single-point inputs at the given speeds and recompression fraction.
    pub(crate) fn at(
        &self,
        recomp_frac: f64,
        n_mc: AngularVelocity,
        n_t: AngularVelocity,
    ) -> TargetOffDesignParameters {
        TargetOffDesignParameters {
            t_mc_in: self.t_mc_in,
            t_t_in: self.t_t_in,
            recomp_frac,
            n_mc,
            n_t,
            n_sub_hxrs: self.n_sub_hxrs,
            tol: self.tol,
            target: self.target,
            target_kind: self.target_kind,
            lowest_pressure: self.lowest_pressure,
            highest_pressure: self.highest_pressure,
            fine_scan: self.fine_scan,
            p_high_limit: self.p_high_limit,
        }
    }
}

/// A heat transfer fluid loop feeding the primary heat exchanger.
///
/// The turbine inlet temperature is not given; it follows from a counterflow
/// exchange with the fluid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatSourceParameters {
    pub t_mc_in: ThermodynamicTemperature,

    /// Heat transfer fluid temperature entering the exchanger.
    pub t_htf_hot: ThermodynamicTemperature,

    /// Heat transfer fluid return temperature to reach.
    pub t_htf_cold: ThermodynamicTemperature,

    pub m_dot_htf: MassRate,
    pub m_dot_htf_design: MassRate,
    pub cp_htf: SpecificHeatCapacity,

    /// Exchanger conductance at the design flows.
    pub ua_phx_design: ThermalConductance,

    pub n_sub_hxrs: usize,
    pub tol: f64,
    pub opt_tol: f64,

    /// Compressor outlet pressures above this are penalized.
    pub p_high_limit: Pressure,
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::pressure::kilopascal;

    #[test]
    fn relative_drop_is_consistent_both_ways() {
        let drop = PressureDrop::Relative(0.02);
        let inlet = Pressure::new::<kilopascal>(20_000.0);

        let outlet = drop.outlet(inlet);
        assert_relative_eq!(outlet.get::<kilopascal>(), 19_600.0);
        assert_relative_eq!(drop.inlet(outlet).get::<kilopascal>(), 20_000.0);
    }

    #[test]
    fn absolute_drop_subtracts() {
        let drop = PressureDrop::Absolute(Pressure::new::<kilopascal>(150.0));
        let outlet = drop.outlet(Pressure::new::<kilopascal>(8000.0));

        assert_relative_eq!(outlet.get::<kilopascal>(), 7850.0);
        assert_relative_eq!(drop.inlet(outlet).get::<kilopascal>(), 8000.0);
    }
}
