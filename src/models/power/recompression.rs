//! Supercritical CO2 recompression Brayton cycle.
//!
//! The cycle has ten state points. The main compressor feeds the cold side
//! of the low-temperature (LT) recuperator, a recompressor takes part of the
//! LT hot outlet flow around the precooler, the two streams mix ahead of the
//! high-temperature (HT) recuperator, and the primary heat exchanger brings
//! the flow to the turbine inlet. [`Node`] names each point.
//!
//! [`RecompressionCycle`] is the entry point. It binds a [`PropertyOracle`]
//! and exposes each operation:
//!
//! - [`RecompressionCycle::design`]: balance and size the cycle for given
//!   pressures, conductances, and recompression fraction.
//! - [`RecompressionCycle::off_design`]: run a sized cycle at other inlet
//!   conditions and shaft speeds.
//! - [`RecompressionCycle::optimal_design`] and
//!   [`RecompressionCycle::auto_optimal_design`]: search the design variables
//!   for the highest efficiency.
//! - [`RecompressionCycle::design_for_target_efficiency`]: find the total
//!   recuperator conductance that reaches an efficiency.
//! - [`RecompressionCycle::target_off_design`] and
//!   [`RecompressionCycle::optimal_off_design`]: search the operating
//!   variables of a sized cycle.
//! - [`RecompressionCycle::max_off_design_output`] and
//!   [`RecompressionCycle::optimal_target_off_design`]: the largest net
//!   power a sized cycle reaches, and the most efficient way to meet a
//!   target below it.
//! - [`RecompressionCycle::heat_source_off_design`]: operate on a heat
//!   transfer fluid loop instead of a fixed turbine inlet temperature.
//!
//! The cycle is also a [`Model`] from [`DesignParameters`] to
//! [`DesignSolution`].

mod core;
mod error;
mod heat_source;
mod optimize;
mod parameters;
mod solution;
mod states;
mod target;

#[cfg(test)]
mod test_support;

use twine_core::Model;

use crate::support::thermo::PropertyOracle;

pub use error::{CycleError, ErrorCode, Loop};
pub use heat_source::HeatSourceOperation;
pub use parameters::{
    AutoOptimalParameters, CycleTolerances, DesignParameters, HeatSourceParameters,
    OffDesignObjective, OffDesignParameters, OffDesignTarget, OptimalDesignParameters,
    OptimalOffDesignParameters, OptimalTargetOffDesignParameters, PressureDrop,
    TargetEfficiencyLimits, TargetEfficiencyParameters, TargetOffDesignParameters, Topology,
    TurbineSpeed,
};
pub use solution::{
    DesignSolution, Exchangers, MassFlows, OffDesignSolution, RecuperatorPerformance,
};
pub use states::{CycleStates, Node};
pub use target::TargetEfficiencyDesign;

/// A recompression cycle bound to a property oracle.
#[derive(Debug, Clone)]
pub struct RecompressionCycle<O> {
    oracle: O,
    tolerances: CycleTolerances,
    limits: TargetEfficiencyLimits,
}

impl<O: PropertyOracle> RecompressionCycle<O> {
    /// Creates a cycle with default tolerances and limits.
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            tolerances: CycleTolerances::default(),
            limits: TargetEfficiencyLimits::default(),
        }
    }

    /// Replaces the recuperator loop tolerances.
    #[must_use]
    pub fn with_tolerances(self, tolerances: CycleTolerances) -> Self {
        Self { tolerances, ..self }
    }

    /// Replaces the bounds used by the target-efficiency search.
    #[must_use]
    pub fn with_limits(self, limits: TargetEfficiencyLimits) -> Self {
        Self { limits, ..self }
    }

    /// The property oracle the cycle evaluates states with.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Balances the cycle at a design point and sizes its components.
    ///
    /// # Errors
    ///
    /// Returns a [`CycleError`] if a state cannot be resolved, a recuperator
    /// loop does not converge, the cycle produces no net power, or a machine
    /// cannot be sized.
    pub fn design(&self, params: &DesignParameters) -> Result<DesignSolution, CycleError> {
        let point = core::design_point(&self.oracle, params, &self.tolerances)?;
        core::finalize(&self.oracle, point)
    }

    /// Runs a sized cycle at the given inlet conditions and shaft speeds.
    ///
    /// # Errors
    ///
    /// Returns a [`CycleError`] if the inputs are invalid for the design or
    /// no consistent mass flow is found.
    pub fn off_design(
        &self,
        design: &DesignSolution,
        params: &OffDesignParameters,
    ) -> Result<OffDesignSolution, CycleError> {
        core::off_design(&self.oracle, design, params, &self.tolerances)
    }

    /// Designs the cycle at the most efficient free design variables.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::NoFeasibleDesign`] if no trial solves.
    pub fn optimal_design(
        &self,
        params: &OptimalDesignParameters,
    ) -> Result<DesignSolution, CycleError> {
        optimize::optimal_design(&self.oracle, params, &self.tolerances)
    }

    /// Searches the compressor outlet pressure as well, with recompression
    /// and as a simple recuperated cycle, and keeps the better.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::NoFeasibleDesign`] if nothing solves.
    pub fn auto_optimal_design(
        &self,
        params: &AutoOptimalParameters,
    ) -> Result<DesignSolution, CycleError> {
        optimize::auto_optimal_design(&self.oracle, params, &self.tolerances)
    }

    /// Finds the total recuperator conductance whose optimal design reaches
    /// the target efficiency.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::InvalidInput`] for rejected inputs or a target
    /// the conductance limits cannot reach.
    pub fn design_for_target_efficiency(
        &self,
        params: &TargetEfficiencyParameters,
    ) -> Result<TargetEfficiencyDesign, CycleError> {
        target::design_for_target_efficiency(&self.oracle, params, &self.limits, &self.tolerances)
    }

    /// Finds the compressor inlet pressure that meets a power or heat target.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::TargetNotBracketed`] or a
    /// [`Loop::TargetPressure`] convergence failure.
    pub fn target_off_design(
        &self,
        design: &DesignSolution,
        params: &TargetOffDesignParameters,
    ) -> Result<OffDesignSolution, CycleError> {
        target::target_off_design(&self.oracle, design, params, &self.tolerances)
    }

    /// Maximizes net power or efficiency over the free operating variables.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::NoFeasibleOperation`] if no trial scores above
    /// zero.
    pub fn optimal_off_design(
        &self,
        design: &DesignSolution,
        params: &OptimalOffDesignParameters,
    ) -> Result<OffDesignSolution, CycleError> {
        optimize::optimal_off_design(&self.oracle, design, params, &self.tolerances)
    }

    /// Finds the highest net power the sized cycle reaches at the given inlet
    /// temperatures, searching up from the lowest scan pressure.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::NoFeasibleOperation`] if no start solves.
    pub fn max_off_design_output(
        &self,
        design: &DesignSolution,
        params: &OptimalTargetOffDesignParameters,
    ) -> Result<OffDesignSolution, CycleError> {
        optimize::max_off_design_output(&self.oracle, design, params, &self.tolerances)
    }

    /// Finds the most efficient operating point that meets a power or heat
    /// target.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::TargetUnreachable`] if a net power target exceeds
    /// the maximum output and [`CycleError::NoFeasibleTarget`] if no trial
    /// meets the target.
    pub fn optimal_target_off_design(
        &self,
        design: &DesignSolution,
        params: &OptimalTargetOffDesignParameters,
    ) -> Result<OffDesignSolution, CycleError> {
        optimize::optimal_target_off_design(&self.oracle, design, params, &self.tolerances)
    }

    /// Finds the most efficient operating point a heat transfer fluid loop
    /// sustains, with the turbine inlet temperature set by the exchanger.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::InvalidInput`] for a fluid too cold to heat the
    /// cycle and [`CycleError::NoFeasibleOperation`] if no trial meets the
    /// return temperature and pressure limit.
    pub fn heat_source_off_design(
        &self,
        design: &DesignSolution,
        params: &HeatSourceParameters,
    ) -> Result<HeatSourceOperation, CycleError> {
        heat_source::heat_source_off_design(&self.oracle, design, params, &self.tolerances)
    }
}

impl<O: PropertyOracle> Model for RecompressionCycle<O> {
    type Input = DesignParameters;
    type Output = DesignSolution;
    type Error = CycleError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        self.design(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        f64::{
            MassRate, Power, SpecificHeatCapacity, ThermalConductance, ThermodynamicTemperature,
        },
        mass_rate::kilogram_per_second,
        power::{megawatt, watt},
        ratio::ratio,
        specific_heat_capacity::kilojoule_per_kilogram_kelvin,
        thermal_conductance::kilowatt_per_kelvin,
        thermodynamic_temperature::kelvin,
    };

    use super::test_support::{design_parameters, kpa, oracle, recompression_parameters};

    #[test]
    fn model_call_matches_design() {
        let cycle = RecompressionCycle::new(oracle());
        let params = recompression_parameters();

        let direct = cycle.design(&params).expect("design solves");
        let called = cycle.call(&params).expect("model solves");
        assert_eq!(direct, called);
    }

    #[test]
    fn fixed_optimization_reproduces_the_design() {
        let cycle = RecompressionCycle::new(oracle());
        let base = recompression_parameters();
        let ua_total = base.ua_lt + base.ua_ht;
        let params = OptimalDesignParameters {
            w_dot_net: base.w_dot_net,
            t_mc_in: base.t_mc_in,
            t_t_in: base.t_t_in,
            dp_lt: base.dp_lt,
            dp_ht: base.dp_ht,
            dp_pc: base.dp_pc,
            dp_phx: base.dp_phx,
            ua_total,
            eta_mc: base.eta_mc,
            eta_rc: base.eta_rc,
            eta_t: base.eta_t,
            n_sub_hxrs: base.n_sub_hxrs,
            p_high_limit: kpa(25_000.0),
            n_t: base.n_t,
            tol: base.tol,
            opt_tol: 1e-3,
            p_mc_out_guess: base.p_mc_out,
            fixed_p_mc_out: true,
            pr_mc_guess: (base.p_mc_out / base.p_mc_in).get::<ratio>(),
            fixed_pr_mc: true,
            recomp_frac_guess: base.recomp_frac,
            fixed_recomp_frac: true,
            lt_frac_guess: (base.ua_lt / ua_total).get::<ratio>(),
            fixed_lt_frac: true,
            topology: base.topology,
        };

        let designed = cycle.design(&base).expect("design solves");
        let optimal = cycle.optimal_design(&params).expect("fixed design solves");
        assert_relative_eq!(
            optimal.eta_thermal.get::<ratio>(),
            designed.eta_thermal.get::<ratio>(),
            max_relative = 1e-6
        );
    }

    #[test]
    fn error_codes_report_failures() {
        let cycle = RecompressionCycle::new(oracle());
        let design = cycle.design(&design_parameters());
        assert_eq!(design.error_code(), 0);

        let design = design.expect("design solves");
        let params = OffDesignParameters {
            t_mc_in: design.parameters.t_mc_in,
            t_t_in: design.parameters.t_t_in,
            p_mc_in: design.parameters.p_mc_in,
            recomp_frac: 0.2,
            n_mc: design.compressor.design_speed,
            n_t: design.turbine.design_speed,
            n_sub_hxrs: design.parameters.n_sub_hxrs,
            tol: 1e-6,
        };
        assert_eq!(cycle.off_design(&design, &params).error_code(), -1);
    }

    #[test]
    fn net_power_is_met_at_design() {
        let cycle = RecompressionCycle::new(oracle());
        let params = DesignParameters {
            ua_lt: ThermalConductance::new::<kilowatt_per_kelvin>(500.0),
            ..recompression_parameters()
        };
        let solution = cycle.design(&params).expect("design solves");

        assert_relative_eq!(
            solution.w_dot_net.get::<watt>(),
            params.w_dot_net.get::<watt>(),
            max_relative = 1e-9
        );
        assert!(solution.eta_thermal.get::<ratio>() > 0.0);
    }

    fn target_parameters(
        design: &DesignSolution,
        megawatts: f64,
    ) -> OptimalTargetOffDesignParameters {
        OptimalTargetOffDesignParameters {
            t_mc_in: design.parameters.t_mc_in,
            t_t_in: design.parameters.t_t_in,
            n_sub_hxrs: design.parameters.n_sub_hxrs,
            tol: 1e-3,
            opt_tol: 1e-3,
            target: Power::new::<megawatt>(megawatts),
            target_kind: OffDesignTarget::NetPower,
            lowest_pressure: kpa(6_000.0),
            highest_pressure: kpa(12_000.0),
            fine_scan: false,
            p_high_limit: kpa(25_000.0),
            recomp_frac_guess: 0.0,
            fixed_recomp_frac: true,
            n_mc_guess: design.compressor.design_speed,
            fixed_n_mc: true,
            n_t_guess: None,
            fixed_n_t: true,
        }
    }

    #[test]
    fn maximum_output_exceeds_the_design_point() {
        let cycle = RecompressionCycle::new(oracle());
        let design = cycle.design(&design_parameters()).expect("design solves");

        let maximum = cycle
            .max_off_design_output(&design, &target_parameters(&design, 9.0))
            .expect("maximum output found");

        // Net power grows with inlet pressure up to the outlet pressure limit.
        assert!(maximum.w_dot_net > design.w_dot_net);
        assert!(maximum.parameters.p_mc_in > design.parameters.p_mc_in);
        assert_relative_eq!(
            maximum.parameters.n_mc.value,
            design.compressor.design_speed.value,
            max_relative = 1e-12
        );
    }

    #[test]
    fn optimal_target_meets_the_power() {
        let cycle = RecompressionCycle::new(oracle());
        let design = cycle.design(&design_parameters()).expect("design solves");
        let params = OptimalTargetOffDesignParameters {
            fixed_n_mc: false,
            ..target_parameters(&design, 9.0)
        };

        let solution = cycle
            .optimal_target_off_design(&design, &params)
            .expect("target is reachable");

        assert_relative_eq!(
            solution.w_dot_net.get::<megawatt>(),
            9.0,
            max_relative = params.tol
        );
        assert!(solution.eta_thermal.get::<ratio>() > 0.0);
    }

    #[test]
    fn targets_above_the_maximum_output_are_rejected() {
        let cycle = RecompressionCycle::new(oracle());
        let design = cycle.design(&design_parameters()).expect("design solves");

        let result = cycle.optimal_target_off_design(&design, &target_parameters(&design, 100.0));
        assert_eq!(result.error_code(), 123);
        assert!(matches!(
            result,
            Err(CycleError::TargetUnreachable { maximum, .. }) if maximum < 100e6
        ));
    }

    #[test]
    fn heat_source_colder_than_the_compressor_inlet_is_rejected() {
        let cycle = RecompressionCycle::new(oracle());
        let design = cycle.design(&design_parameters()).expect("design solves");
        let m_dot_htf = MassRate::new::<kilogram_per_second>(50.0);
        let params = HeatSourceParameters {
            t_mc_in: design.parameters.t_mc_in,
            t_htf_hot: ThermodynamicTemperature::new::<kelvin>(300.0),
            t_htf_cold: ThermodynamicTemperature::new::<kelvin>(290.0),
            m_dot_htf,
            m_dot_htf_design: m_dot_htf,
            cp_htf: SpecificHeatCapacity::new::<kilojoule_per_kilogram_kelvin>(1.5),
            ua_phx_design: ThermalConductance::new::<kilowatt_per_kelvin>(500.0),
            n_sub_hxrs: 10,
            tol: 1e-3,
            opt_tol: 1e-3,
            p_high_limit: kpa(25_000.0),
        };

        let result = cycle.heat_source_off_design(&design, &params);
        assert_eq!(result.error_code(), -1);
    }

    #[cfg(feature = "coolprop")]
    #[test]
    fn unrecuperated_simple_cycle_with_real_properties() {
        use uom::{
            ConstZero,
            si::{f64::ThermodynamicTemperature, thermodynamic_temperature::degree_celsius},
        };

        use crate::support::thermo::{fluid::CarbonDioxide, model::CoolProp};

        let oracle = CoolProp::<CarbonDioxide>::new().expect("CoolProp loads carbon dioxide");
        let cycle = RecompressionCycle::new(oracle);
        let params = DesignParameters {
            t_mc_in: ThermodynamicTemperature::new::<degree_celsius>(32.0),
            t_t_in: ThermodynamicTemperature::new::<degree_celsius>(550.0),
            p_mc_in: kpa(7650.0),
            ua_lt: ThermalConductance::ZERO,
            ua_ht: ThermalConductance::ZERO,
            ..design_parameters()
        };
        let solution = cycle.design(&params).expect("design solves");

        let eta = solution.eta_thermal.get::<ratio>();
        assert!((0.2..0.3).contains(&eta), "efficiency {eta}");
    }
}
