//! Design and off-design optimizers.
//!
//! Each objective maps the optimizer's free variables to a full parameter
//! set, solves the cycle, and scores it. Infeasible or failed trials score
//! zero. The best solved point is kept as a side effect of scoring, so the
//! result is the best point seen rather than the optimizer's final vertex.

use std::convert::Infallible;

use tracing::{debug, info};
use twine_core::{Model, OptimizationProblem};
use twine_solvers::optimization::golden_section;
use uom::si::{
    angular_velocity::revolution_per_minute,
    f64::{AngularVelocity, Pressure},
    power::watt,
    pressure::kilopascal,
    ratio::ratio,
};

use crate::support::{
    solve::simplex::{self, Variable},
    thermo::{PropertyOracle, fluid::CarbonDioxide},
};

use super::{
    AutoOptimalParameters, CycleError, CycleTolerances, DesignParameters, DesignSolution, Node,
    OffDesignObjective, OffDesignParameters, OffDesignSolution, OffDesignTarget,
    OptimalDesignParameters, OptimalOffDesignParameters, OptimalTargetOffDesignParameters,
    TargetOffDesignParameters,
    core::{self, DesignPoint},
    target,
};

/// Compressor pressures at or below this are infeasible, kPa.
const MIN_PRESSURE: f64 = 100.0;

/// Pressure ratios above this are infeasible.
const MAX_PRESSURE_RATIO: f64 = 50.0;

/// Score lost per unit of relative excess over the high-pressure limit.
const HIGH_PRESSURE_PENALTY: f64 = 5.0;

/// The maximum output search starts its compressor speed this much above
/// the guess.
const MAX_OUTPUT_SPEED_FACTOR: f64 = 1.25;

/// Growth of the starting compressor inlet pressure after a failed start.
const START_PRESSURE_GROWTH: f64 = 1.1;

/// The four design variables the optimizer may free.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DesignVariables {
    /// Main compressor outlet pressure, kPa.
    p_mc_out: f64,
    pr_mc: f64,
    recomp_frac: f64,
    lt_frac: f64,
}

impl DesignVariables {
    fn guess(params: &OptimalDesignParameters) -> Self {
        Self {
            p_mc_out: params.p_mc_out_guess.get::<kilopascal>(),
            pr_mc: params.pr_mc_guess,
            recomp_frac: params.recomp_frac_guess,
            lt_frac: params.lt_frac_guess,
        }
    }

    /// Overwrites the free variables, in order, from `x`.
    fn with_free(mut self, params: &OptimalDesignParameters, x: &[f64]) -> Self {
        let mut x = x.iter().copied();
        let mut next = |fixed: bool, value: &mut f64| {
            if fixed {
                return;
            }
            if let Some(free) = x.next() {
                *value = free;
            }
        };
        next(params.fixed_p_mc_out, &mut self.p_mc_out);
        next(params.fixed_pr_mc, &mut self.pr_mc);
        next(params.fixed_recomp_frac, &mut self.recomp_frac);
        next(params.fixed_lt_frac, &mut self.lt_frac);
        self
    }

    fn p_mc_in(&self) -> f64 {
        self.p_mc_out / self.pr_mc
    }

    fn is_feasible(&self, p_high_limit: f64) -> bool {
        let p_mc_in = self.p_mc_in();
        self.p_mc_out <= p_high_limit
            && self.pr_mc <= MAX_PRESSURE_RATIO
            && p_mc_in < self.p_mc_out
            && p_mc_in > MIN_PRESSURE
            && (0.0..1.0).contains(&self.recomp_frac)
            && (0.0..=1.0).contains(&self.lt_frac)
    }

    fn parameters(&self, params: &OptimalDesignParameters) -> DesignParameters {
        DesignParameters {
            w_dot_net: params.w_dot_net,
            t_mc_in: params.t_mc_in,
            t_t_in: params.t_t_in,
            p_mc_in: Pressure::new::<kilopascal>(self.p_mc_in()),
            p_mc_out: Pressure::new::<kilopascal>(self.p_mc_out),
            dp_lt: params.dp_lt,
            dp_ht: params.dp_ht,
            dp_pc: params.dp_pc,
            dp_phx: params.dp_phx,
            ua_lt: params.ua_total * self.lt_frac,
            ua_ht: params.ua_total * (1.0 - self.lt_frac),
            recomp_frac: self.recomp_frac,
            eta_mc: params.eta_mc,
            eta_rc: params.eta_rc,
            eta_t: params.eta_t,
            n_sub_hxrs: params.n_sub_hxrs,
            n_t: params.n_t,
            tol: params.tol,
            topology: params.topology,
        }
    }
}

/// Search bounds and initial steps of the free design variables.
fn design_variables(params: &OptimalDesignParameters) -> Vec<Variable> {
    let guess = DesignVariables::guess(params);
    let limit = params.p_high_limit.get::<kilopascal>();

    [
        (params.fixed_p_mc_out, guess.p_mc_out, MIN_PRESSURE, limit, 500.0),
        (params.fixed_pr_mc, guess.pr_mc, 1e-4, limit / MIN_PRESSURE, 0.2),
        (params.fixed_recomp_frac, guess.recomp_frac, 0.0, 1.0, 0.05),
        (params.fixed_lt_frac, guess.lt_frac, 0.0, 1.0, 0.05),
    ]
    .into_iter()
    .filter(|(fixed, ..)| !fixed)
    .map(|(_, initial, lower, upper, step)| Variable {
        initial,
        lower,
        upper,
        step,
    })
    .collect()
}

/// Keeps `candidate` if it beats the best point so far.
fn keep_better(best: &mut Option<DesignPoint>, candidate: DesignPoint) {
    let eta = candidate.eta_thermal();
    if eta > 0.0 && best.as_ref().is_none_or(|best| eta > best.eta_thermal()) {
        *best = Some(candidate);
    }
}

/// Best balanced design point over the free variables.
pub(super) fn optimal_point(
    oracle: &impl PropertyOracle,
    params: &OptimalDesignParameters,
    tolerances: &CycleTolerances,
) -> Result<DesignPoint, CycleError> {
    let guess = DesignVariables::guess(params);
    let variables = design_variables(params);
    if variables.is_empty() {
        return core::design_point(oracle, &guess.parameters(params), tolerances);
    }

    let limit = params.p_high_limit.get::<kilopascal>();
    let mut best = None;
    let config = simplex::Config {
        x_rel_tol: params.opt_tol,
        ..simplex::Config::default()
    };

    let solution = simplex::maximize(&variables, &config, |x| {
        let trial = guess.with_free(params, x);
        if !trial.is_feasible(limit) {
            return 0.0;
        }
        match core::design_point(oracle, &trial.parameters(params), tolerances) {
            Ok(point) => {
                let eta = point.eta_thermal();
                keep_better(&mut best, point);
                eta
            }
            Err(error) => {
                debug!(?trial, code = error.code(), "design trial failed");
                0.0
            }
        }
    })?;

    debug!(
        evals = solution.evals,
        eta = solution.objective,
        status = ?solution.status,
        "design optimizer finished"
    );
    best.ok_or(CycleError::NoFeasibleDesign)
}

/// Optimizes the free design variables and sizes the best design.
///
/// # Errors
///
/// Returns [`CycleError::NoFeasibleDesign`] if no trial solves, or the
/// design error when every variable is fixed.
pub(super) fn optimal_design(
    oracle: &impl PropertyOracle,
    params: &OptimalDesignParameters,
    tolerances: &CycleTolerances,
) -> Result<DesignSolution, CycleError> {
    let point = optimal_point(oracle, params, tolerances)?;
    info!(eta = point.eta_thermal(), "optimal design found");
    core::finalize(oracle, point)
}

/// Pressure ratio guess that puts the compressor inlet near the
/// pseudo-critical line.
fn pressure_ratio_guess(params: &AutoOptimalParameters, p_high: Pressure) -> f64 {
    let p_pc = CarbonDioxide::pseudo_critical_pressure(params.t_mc_in);
    if p_high > p_pc {
        (p_high / p_pc).get::<ratio>()
    } else {
        1.1
    }
}

/// Bound on the high-pressure search iterations.
const PRESSURE_SEARCH_ITERS: usize = 50;

/// Optimizes a recompression and a simple cycle at one high pressure.
///
/// Returns the more efficient of the two, `None` if neither solves.
fn both_configurations(
    oracle: &impl PropertyOracle,
    params: &AutoOptimalParameters,
    tolerances: &CycleTolerances,
    p_high: Pressure,
    pr_mc: f64,
) -> Option<DesignPoint> {
    let recompression = params.optimal(p_high, pr_mc, 0.3, 0.5, false);
    let simple = params.optimal(p_high, pr_mc, 0.0, 0.5, true);

    let mut best = None;
    for candidate in [recompression, simple] {
        match optimal_point(oracle, &candidate, tolerances) {
            Ok(point) => keep_better(&mut best, point),
            Err(error) => debug!(
                p_high = p_high.get::<kilopascal>(),
                recompression = !candidate.fixed_recomp_frac,
                code = error.code(),
                "configuration failed"
            ),
        }
    }
    best
}

/// Best configuration at a compressor outlet pressure in kPa.
struct HighPressureModel<'a, O> {
    oracle: &'a O,
    params: &'a AutoOptimalParameters,
    tolerances: &'a CycleTolerances,
}

impl<O: PropertyOracle> Model for HighPressureModel<'_, O> {
    type Input = f64;
    type Output = Option<DesignPoint>;
    type Error = Infallible;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        let p_high = Pressure::new::<kilopascal>(*input);
        let pr_mc = pressure_ratio_guess(self.params, p_high);
        Ok(both_configurations(
            self.oracle,
            self.params,
            self.tolerances,
            p_high,
            pr_mc,
        ))
    }
}

/// Thermal efficiency of the best configuration, zero if none solves.
struct HighPressureProblem;

impl OptimizationProblem<1> for HighPressureProblem {
    type Input = f64;
    type Output = Option<DesignPoint>;
    type Error = Infallible;

    fn input(&self, x: &[f64; 1]) -> Result<Self::Input, Self::Error> {
        Ok(x[0])
    }

    fn objective(
        &self,
        _input: &Self::Input,
        output: &Self::Output,
    ) -> Result<f64, Self::Error> {
        Ok(output.as_ref().map_or(0.0, DesignPoint::eta_thermal))
    }
}

/// Searches the high pressure, then compares recompression against a simple
/// cycle at the high-pressure limit, and sizes the best design seen.
///
/// # Errors
///
/// Returns [`CycleError::NoFeasibleDesign`] if nothing solves.
pub(super) fn auto_optimal_design(
    oracle: &impl PropertyOracle,
    params: &AutoOptimalParameters,
    tolerances: &CycleTolerances,
) -> Result<DesignSolution, CycleError> {
    let limit = params.p_high_limit.get::<kilopascal>();
    let model = HighPressureModel {
        oracle,
        params,
        tolerances,
    };
    let config = golden_section::Config::new(PRESSURE_SEARCH_ITERS, 1.0, 0.0)?;

    let search = golden_section::maximize(
        &model,
        &HighPressureProblem,
        [0.2 * limit, limit],
        &config,
        |event: &golden_section::Event<'_, _, _>| {
            // A pressure where neither configuration solves is never better.
            if let golden_section::Event::Evaluated { output: None, .. } = event {
                return Some(golden_section::Action::AssumeWorse);
            }
            None
        },
    )
    .map_err(|error| {
        debug!(%error, "high pressure search failed");
        CycleError::NoFeasibleDesign
    })?;
    debug!(
        p_high = search.x,
        eta = search.objective,
        iters = search.iters,
        status = ?search.status,
        "high pressure search finished"
    );

    let mut best = search.snapshot.output;
    let pr_mc = best
        .as_ref()
        .map(|point: &DesignPoint| {
            let states = point.states();
            (states[Node::McOutlet].pressure / states[Node::McInlet].pressure).get::<ratio>()
        })
        .ok_or(CycleError::NoFeasibleDesign)?;
    if let Some(at_limit) =
        both_configurations(oracle, params, tolerances, params.p_high_limit, pr_mc)
    {
        keep_better(&mut best, at_limit);
    }

    let point = best.ok_or(CycleError::NoFeasibleDesign)?;
    info!(
        eta = point.eta_thermal(),
        recomp_frac = point.params().recomp_frac,
        "auto-optimized design found"
    );
    core::finalize(oracle, point)
}

/// The off-design variables the optimizer may free.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OperatingVariables {
    /// Compressor inlet pressure, kPa.
    p_mc_in: f64,
    recomp_frac: f64,

    /// Shaft speeds, rpm. A turbine speed of `None` follows the compressor.
    n_mc: f64,
    n_t: Option<f64>,
}

impl OperatingVariables {
    fn guess(params: &OptimalOffDesignParameters) -> Self {
        Self {
            p_mc_in: params.p_mc_in_guess.get::<kilopascal>(),
            recomp_frac: params.recomp_frac_guess,
            n_mc: params.n_mc_guess.get::<revolution_per_minute>(),
            n_t: params.n_t_guess.map(|n| n.get::<revolution_per_minute>()),
        }
    }

    fn with_free(mut self, params: &OptimalOffDesignParameters, x: &[f64]) -> Self {
        let mut x = x.iter().copied();
        let mut next = |fixed: bool, value: &mut f64| {
            if fixed {
                return;
            }
            if let Some(free) = x.next() {
                *value = free;
            }
        };
        next(params.fixed_p_mc_in, &mut self.p_mc_in);
        next(params.fixed_recomp_frac, &mut self.recomp_frac);
        next(params.fixed_n_mc, &mut self.n_mc);
        if let Some(n_t) = self.n_t.as_mut() {
            next(params.fixed_n_t, n_t);
        }
        self
    }

    fn parameters(&self, params: &OptimalOffDesignParameters) -> OffDesignParameters {
        let rpm = AngularVelocity::new::<revolution_per_minute>;
        OffDesignParameters {
            t_mc_in: params.t_mc_in,
            t_t_in: params.t_t_in,
            p_mc_in: Pressure::new::<kilopascal>(self.p_mc_in),
            recomp_frac: self.recomp_frac,
            n_mc: rpm(self.n_mc),
            n_t: rpm(self.n_t.unwrap_or(self.n_mc)),
            n_sub_hxrs: params.n_sub_hxrs,
            tol: params.tol,
        }
    }
}

fn operating_variables(params: &OptimalOffDesignParameters) -> Vec<Variable> {
    let guess = OperatingVariables::guess(params);
    let limit = params.p_high_limit.get::<kilopascal>();

    let mut variables = Vec::with_capacity(4);
    if !params.fixed_p_mc_in {
        variables.push(Variable {
            initial: guess.p_mc_in,
            lower: MIN_PRESSURE,
            upper: limit,
            step: 50.0,
        });
    }
    if !params.fixed_recomp_frac {
        variables.push(Variable {
            initial: guess.recomp_frac,
            lower: 0.0,
            upper: 1.0,
            step: 0.05,
        });
    }
    if !params.fixed_n_mc {
        variables.push(Variable {
            initial: guess.n_mc,
            lower: 1.0,
            upper: f64::INFINITY,
            step: 0.25 * guess.n_mc,
        });
    }
    if let (Some(n_t), false) = (guess.n_t, params.fixed_n_t) {
        variables.push(Variable {
            initial: n_t,
            lower: 1.0,
            upper: f64::INFINITY,
            step: 100.0,
        });
    }
    variables
}

/// Objective value of an operating point, penalized above the pressure limit.
fn operating_score(
    solution: &OffDesignSolution,
    objective: OffDesignObjective,
    p_high_limit: Pressure,
) -> f64 {
    let value = match objective {
        OffDesignObjective::NetPower => solution.w_dot_net.get::<watt>(),
        OffDesignObjective::Efficiency => solution.eta_thermal.get::<ratio>(),
    };
    let excess = ((solution.states[Node::McOutlet].pressure - p_high_limit) / p_high_limit)
        .get::<ratio>()
        .max(0.0);
    value * (1.0 - HIGH_PRESSURE_PENALTY * excess)
}

/// Keeps `solution` if it scores above zero and above the best so far.
fn keep_higher(
    best: &mut Option<(f64, OffDesignSolution)>,
    score: f64,
    solution: OffDesignSolution,
) {
    if score > 0.0 && best.as_ref().is_none_or(|(best, _)| score > *best) {
        *best = Some((score, solution));
    }
}

/// Finds the operating point of a sized cycle that maximizes the objective.
///
/// # Errors
///
/// Returns [`CycleError::NoFeasibleOperation`] if no trial scores above zero,
/// or the off-design error when every variable is fixed.
pub(super) fn optimal_off_design(
    oracle: &impl PropertyOracle,
    design: &DesignSolution,
    params: &OptimalOffDesignParameters,
    tolerances: &CycleTolerances,
) -> Result<OffDesignSolution, CycleError> {
    let guess = OperatingVariables::guess(params);
    let variables = operating_variables(params);
    if variables.is_empty() {
        return core::off_design(oracle, design, &guess.parameters(params), tolerances);
    }

    let mut best: Option<(f64, OffDesignSolution)> = None;
    let config = simplex::Config {
        x_rel_tol: params.opt_tol,
        ..simplex::Config::default()
    };

    let solution = simplex::maximize(&variables, &config, |x| {
        let trial = guess.with_free(params, x);
        match core::off_design(oracle, design, &trial.parameters(params), tolerances) {
            Ok(solution) => {
                let score = operating_score(&solution, params.objective, params.p_high_limit);
                keep_higher(&mut best, score, solution);
                score
            }
            Err(error) => {
                debug!(?trial, code = error.code(), "off-design trial failed");
                0.0
            }
        }
    })?;

    debug!(
        evals = solution.evals,
        score = solution.objective,
        status = ?solution.status,
        "off-design optimizer finished"
    );
    let (score, solution) = best.ok_or(CycleError::NoFeasibleOperation)?;
    info!(score, objective = ?params.objective, "optimal operating point found");
    Ok(solution)
}

/// Highest net power the sized cycle reaches at the given inlet temperatures.
///
/// Each start optimizes net power with a free compressor inlet pressure,
/// beginning at the lowest scan pressure. A failed start moves up by 10 %.
/// The first success is searched once more from its own optimum.
///
/// # Errors
///
/// Returns [`CycleError::NoFeasibleOperation`] if no start below the highest
/// scan pressure solves.
pub(super) fn max_off_design_output(
    oracle: &impl PropertyOracle,
    design: &DesignSolution,
    params: &OptimalTargetOffDesignParameters,
    tolerances: &CycleTolerances,
) -> Result<OffDesignSolution, CycleError> {
    let mut search = OptimalOffDesignParameters {
        t_mc_in: params.t_mc_in,
        t_t_in: params.t_t_in,
        n_sub_hxrs: params.n_sub_hxrs,
        tol: params.tol,
        opt_tol: params.opt_tol,
        objective: OffDesignObjective::NetPower,
        p_high_limit: params.p_high_limit,
        p_mc_in_guess: params.lowest_pressure,
        fixed_p_mc_in: false,
        recomp_frac_guess: params.recomp_frac_guess,
        fixed_recomp_frac: params.fixed_recomp_frac,
        n_mc_guess: if params.fixed_n_mc {
            params.n_mc_guess
        } else {
            params.n_mc_guess * MAX_OUTPUT_SPEED_FACTOR
        },
        fixed_n_mc: params.fixed_n_mc,
        n_t_guess: params.n_t_guess,
        fixed_n_t: params.fixed_n_t,
    };

    let mut best: Option<OffDesignSolution> = None;
    let mut successes = 0;
    while search.p_mc_in_guess <= params.highest_pressure && successes < 2 {
        match optimal_off_design(oracle, design, &search, tolerances) {
            Ok(solution) => {
                let operating = solution.parameters;
                search.p_mc_in_guess = operating.p_mc_in;
                search.recomp_frac_guess = operating.recomp_frac;
                search.n_mc_guess = operating.n_mc;
                search.n_t_guess = search.n_t_guess.map(|_| operating.n_t);
                successes += 1;
                if best.as_ref().is_none_or(|best| solution.w_dot_net > best.w_dot_net) {
                    best = Some(solution);
                }
            }
            Err(error) => {
                debug!(
                    p_mc_in = search.p_mc_in_guess.get::<kilopascal>(),
                    code = error.code(),
                    "maximum output start failed"
                );
                search.p_mc_in_guess = search.p_mc_in_guess * START_PRESSURE_GROWTH;
            }
        }
    }

    let solution = best.ok_or(CycleError::NoFeasibleOperation)?;
    info!(
        w_dot_net = solution.w_dot_net.get::<watt>(),
        p_mc_in = solution.parameters.p_mc_in.get::<kilopascal>(),
        "maximum output found"
    );
    Ok(solution)
}

/// The variables searched while meeting a target.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TargetVariables {
    recomp_frac: f64,

    /// Shaft speeds, rpm. A turbine speed of `None` follows the compressor.
    n_mc: f64,
    n_t: Option<f64>,
}

impl TargetVariables {
    fn guess(params: &OptimalTargetOffDesignParameters) -> Self {
        Self {
            recomp_frac: params.recomp_frac_guess,
            n_mc: params.n_mc_guess.get::<revolution_per_minute>(),
            n_t: params.n_t_guess.map(|n| n.get::<revolution_per_minute>()),
        }
    }

    fn with_free(mut self, params: &OptimalTargetOffDesignParameters, x: &[f64]) -> Self {
        let mut x = x.iter().copied();
        let mut next = |fixed: bool, value: &mut f64| {
            if fixed {
                return;
            }
            if let Some(free) = x.next() {
                *value = free;
            }
        };
        next(params.fixed_recomp_frac, &mut self.recomp_frac);
        next(params.fixed_n_mc, &mut self.n_mc);
        if let Some(n_t) = self.n_t.as_mut() {
            next(params.fixed_n_t, n_t);
        }
        self
    }

    fn parameters(&self, params: &OptimalTargetOffDesignParameters) -> TargetOffDesignParameters {
        let rpm = AngularVelocity::new::<revolution_per_minute>;
        params.at(
            self.recomp_frac,
            rpm(self.n_mc),
            rpm(self.n_t.unwrap_or(self.n_mc)),
        )
    }
}

fn target_variables(params: &OptimalTargetOffDesignParameters) -> Vec<Variable> {
    let guess = TargetVariables::guess(params);

    let mut variables = Vec::with_capacity(3);
    if !params.fixed_recomp_frac {
        variables.push(Variable {
            initial: guess.recomp_frac,
            lower: 0.0,
            upper: 1.0,
            step: 0.01,
        });
    }
    if !params.fixed_n_mc {
        variables.push(Variable {
            initial: guess.n_mc,
            lower: 1.0,
            upper: f64::INFINITY,
            step: 0.25 * guess.n_mc,
        });
    }
    if let (Some(n_t), false) = (guess.n_t, params.fixed_n_t) {
        variables.push(Variable {
            initial: n_t,
            lower: 1.0,
            upper: f64::INFINITY,
            step: 100.0,
        });
    }
    variables
}

/// Finds the most efficient operating point that meets a power or heat
/// target.
///
/// A net power target is first checked against [`max_off_design_output`].
/// Every trial then solves the target for its compressor inlet pressure and
/// scores its efficiency; trials that miss the target score zero.
///
/// # Errors
///
/// Returns [`CycleError::TargetUnreachable`] if the net power target exceeds
/// the maximum output, [`CycleError::NoFeasibleTarget`] if no trial meets the
/// target, or the target error when every variable is fixed.
pub(super) fn optimal_target_off_design(
    oracle: &impl PropertyOracle,
    design: &DesignSolution,
    params: &OptimalTargetOffDesignParameters,
    tolerances: &CycleTolerances,
) -> Result<OffDesignSolution, CycleError> {
    if params.target_kind == OffDesignTarget::NetPower {
        let maximum = max_off_design_output(oracle, design, params, tolerances)?;
        let target = params.target.get::<watt>();
        let maximum = maximum.w_dot_net.get::<watt>();
        if maximum < target {
            return Err(CycleError::TargetUnreachable { target, maximum });
        }
    }

    let guess = TargetVariables::guess(params);
    let variables = target_variables(params);
    if variables.is_empty() {
        return target::target_off_design(oracle, design, &guess.parameters(params), tolerances);
    }

    let mut best: Option<(f64, OffDesignSolution)> = None;
    let config = simplex::Config {
        x_rel_tol: params.opt_tol,
        ..simplex::Config::default()
    };

    let solution = simplex::maximize(&variables, &config, |x| {
        let trial = guess.with_free(params, x);
        match target::target_off_design(oracle, design, &trial.parameters(params), tolerances) {
            Ok(solution) => {
                let score = operating_score(
                    &solution,
                    OffDesignObjective::Efficiency,
                    params.p_high_limit,
                );
                keep_higher(&mut best, score, solution);
                score
            }
            Err(error) => {
                debug!(?trial, code = error.code(), "target trial failed");
                0.0
            }
        }
    })?;

    debug!(
        evals = solution.evals,
        eta = solution.objective,
        status = ?solution.status,
        "target optimizer finished"
    );
    let (eta, solution) = best.ok_or(CycleError::NoFeasibleTarget)?;
    info!(eta, "optimal target operating point found");
    Ok(solution)
}
