//! Off-design operation driven by a heat transfer fluid loop.
//!
//! The turbine inlet temperature is not an input here. At every trial the
//! primary heat exchanger is treated as a counterflow exchanger between the
//! cycle and the heat transfer fluid, its conductance scaled from design by
//! the average flow ratio to the 0.8 power. The turbine inlet temperature is
//! iterated until the heat that exchanger passes reproduces it.

use tracing::{debug, info, trace};
use uom::si::{
    angular_velocity::revolution_per_minute,
    available_energy::joule_per_kilogram,
    f64::{AngularVelocity, Power, Pressure, ThermodynamicTemperature},
    mass_rate::kilogram_per_second,
    power::watt,
    pressure::kilopascal,
    ratio::ratio,
    specific_heat_capacity::joule_per_kilogram_kelvin,
    thermal_conductance::watt_per_kelvin,
    thermodynamic_temperature::kelvin,
};

use crate::support::{
    solve::{
        secant::{self, Seed, Step},
        simplex::{self, Variable},
    },
    thermo::PropertyOracle,
    units::SpecificEnthalpy,
};

use super::{
    CycleError, CycleTolerances, DesignSolution, HeatSourceParameters, Node,
    OffDesignParameters, OffDesignSolution, TurbineSpeed, core,
};

/// Compressor inlet pressure search bounds, kPa.
const INLET_PRESSURE: [f64; 2] = [1000.0, 17_000.0];

const INLET_PRESSURE_STEP: f64 = 4000.0;

/// Turbine inlet temperatures searched, as approaches to the fluid inlet, K.
const APPROACH: [f64; 2] = [50.0, 0.01];

/// The turbine inlet search accepts its last trial once the bracket is this
/// narrow, K.
const APPROACH_TOL: f64 = 0.1;

const TURBINE_INLET_MAX_ITERS: usize = 50;

/// Exponent of the flow ratio in the conductance scaling.
const CONDUCTANCE_EXPONENT: f64 = 0.8;

/// A sized cycle running on a heat transfer fluid loop.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatSourceOperation {
    pub solution: OffDesignSolution,

    /// Heat passed from the fluid to the cycle.
    pub q_dot_phx: Power,

    /// Heat transfer fluid return temperature at this point.
    pub t_htf_cold: ThermodynamicTemperature,
}

/// One trial's exchange, before scoring.
struct Exchange {
    operation: HeatSourceOperation,

    /// Relative mismatch between the trial and computed turbine inlet.
    t_t_in_error: f64,
}

/// Compressor speed search window, as fractions of the design speed.
#[derive(Debug, Clone, Copy)]
struct SpeedWindow {
    initial: f64,
    lower: f64,
    upper: f64,
}

/// The first search starts at design speed; the retry starts fast.
const SPEED_WINDOWS: [SpeedWindow; 2] = [
    SpeedWindow {
        initial: 1.0,
        lower: 0.1,
        upper: 1.5,
    },
    SpeedWindow {
        initial: 1.5,
        lower: 0.5,
        upper: 1.75,
    },
];

/// Counterflow effectiveness for a capacity ratio and number of transfer
/// units.
fn counterflow_effectiveness(c_r: f64, ntu: f64) -> f64 {
    if c_r < 1.0 {
        let e = (-ntu * (1.0 - c_r)).exp();
        (1.0 - e) / (1.0 - c_r * e)
    } else {
        ntu / (1.0 + ntu)
    }
}

/// Runs the cycle at one turbine inlet temperature and passes the heat the
/// exchanger would deliver.
fn exchange(
    oracle: &impl PropertyOracle,
    design: &DesignSolution,
    params: &HeatSourceParameters,
    solution: OffDesignSolution,
) -> Result<Exchange, CycleError> {
    let m_t = solution.m_dot.turbine.get::<kilogram_per_second>();
    let m_htf = params.m_dot_htf.get::<kilogram_per_second>();
    let flow_ratio = 0.5
        * (m_htf / params.m_dot_htf_design.get::<kilogram_per_second>()
            + m_t / design.m_dot.turbine.get::<kilogram_per_second>());
    let ua_design = params.ua_phx_design.get::<watt_per_kelvin>();
    let ua = ua_design * flow_ratio.powf(CONDUCTANCE_EXPONENT);

    let (inlet, outlet) = (
        &solution.states[Node::HtColdOutlet],
        &solution.states[Node::TurbineInlet],
    );
    let h5 = inlet.enthalpy.get::<joule_per_kilogram>();
    let h6 = outlet.enthalpy.get::<joule_per_kilogram>();
    let t5 = inlet.temperature.get::<kelvin>();
    let t6 = outlet.temperature.get::<kelvin>();

    let c_co2 = m_t * (h6 - h5) / (t6 - t5);
    let c_htf = params.cp_htf.get::<joule_per_kilogram_kelvin>() * m_htf;
    let (c_min, c_max) = (c_co2.min(c_htf), c_co2.max(c_htf));
    let effectiveness = counterflow_effectiveness(c_min / c_max, ua / c_min);

    let t_htf_hot = params.t_htf_hot.get::<kelvin>();
    let q_dot = effectiveness * c_min * (t_htf_hot - t5);
    let heated = oracle.from_ph(
        outlet.pressure,
        SpecificEnthalpy::new::<joule_per_kilogram>(h5 + q_dot / m_t),
    )?;
    let t_t_in_error = (heated.temperature.get::<kelvin>() - t6) / t6;
    trace!(t6, t_calc = heated.temperature.get::<kelvin>(), q_dot, "exchanger trial");

    Ok(Exchange {
        operation: HeatSourceOperation {
            solution,
            q_dot_phx: Power::new::<watt>(q_dot),
            t_htf_cold: ThermodynamicTemperature::new::<kelvin>(t_htf_hot - q_dot / c_htf),
        },
        t_t_in_error,
    })
}

/// Finds the turbine inlet temperature the exchanger sustains at one
/// compressor inlet pressure, recompression fraction, and speed.
///
/// Returns `None` if no trial runs.
fn balance_turbine_inlet(
    oracle: &impl PropertyOracle,
    design: &DesignSolution,
    params: &HeatSourceParameters,
    operating: OffDesignParameters,
    tolerances: &CycleTolerances,
) -> Option<Exchange> {
    let t_htf_hot = params.t_htf_hot.get::<kelvin>();
    let bracket = [t_htf_hot - APPROACH[0], t_htf_hot - APPROACH[1]];
    let config = secant::Config {
        max_iters: TURBINE_INLET_MAX_ITERS,
        x_abs_tol: APPROACH_TOL,
        ..secant::Config::default()
    };

    let result = secant::solve(
        bracket,
        Seed::at(design.parameters.t_t_in.get::<kelvin>()),
        &config,
        |t_t_in| -> Result<Step<Exchange>, CycleError> {
            let trial = OffDesignParameters {
                t_t_in: ThermodynamicTemperature::new::<kelvin>(t_t_in),
                ..operating
            };
            let solution = match core::off_design(oracle, design, &trial, tolerances) {
                Ok(solution) => solution,
                Err(error) => {
                    trace!(t_t_in, code = error.code(), "turbine inlet trial failed");
                    return Ok(Step::Raise);
                }
            };
            let exchange = exchange(oracle, design, params, solution)?;
            let error = exchange.t_t_in_error;
            if error.abs() <= params.tol {
                Ok(Step::Converged(exchange))
            } else {
                // A hotter trial than the exchanger sustains is too high.
                Ok(Step::Residual(-error, exchange))
            }
        },
    );

    match result {
        Ok(solution) => Some(solution.value),
        Err(error) => {
            debug!(%error, "turbine inlet search failed");
            None
        }
    }
}

/// Score of a balanced trial and whether it meets every constraint.
///
/// Efficiency is discounted by the return temperature miss, the turbine inlet
/// mismatch, and the compressor outlet pressure above the limit in kPa.
fn score(exchange: &Exchange, params: &HeatSourceParameters) -> (f64, bool) {
    let operation = &exchange.operation;
    let t_cold = operation.t_htf_cold.get::<kelvin>();
    let t_cold_miss = ((params.t_htf_cold.get::<kelvin>() - t_cold).abs() / t_cold
        - params.tol)
        .max(0.0);
    let t_t_in_miss = (exchange.t_t_in_error.abs() - params.tol).max(0.0);
    let p_excess = (operation.solution.states[Node::McOutlet].pressure - params.p_high_limit)
        .get::<kilopascal>()
        .max(0.0);

    let eta = operation.solution.eta_thermal.get::<ratio>();
    let score = eta * (-t_cold_miss).exp() * (-t_t_in_miss).exp() * (-p_excess).exp();
    let met = t_cold_miss == 0.0 && t_t_in_miss == 0.0 && p_excess == 0.0;
    (score, met)
}

/// The searched variables: inlet pressure, recompression fraction if the
/// design recompresses, and compressor speed.
fn variables(design: &DesignSolution, window: SpeedWindow) -> Vec<Variable> {
    let n_design = design.compressor.design_speed.get::<revolution_per_minute>();

    let mut variables = Vec::with_capacity(3);
    variables.push(Variable {
        initial: INLET_PRESSURE[0],
        lower: INLET_PRESSURE[0],
        upper: INLET_PRESSURE[1],
        step: INLET_PRESSURE_STEP,
    });
    if design.recompressor.is_some() {
        variables.push(Variable {
            initial: design.parameters.recomp_frac,
            lower: 0.0,
            upper: 1.0,
            step: 0.02,
        });
    }
    variables.push(Variable {
        initial: window.initial * n_design,
        lower: window.lower * n_design,
        upper: window.upper * n_design,
        step: 0.1 * n_design,
    });
    variables
}

fn operating_parameters(
    design: &DesignSolution,
    params: &HeatSourceParameters,
    x: &[f64],
) -> OffDesignParameters {
    let (p_mc_in, recomp_frac, n_mc) = match *x {
        [p, f, n] => (p, f, n),
        [p, n] => (p, 0.0, n),
        _ => (INLET_PRESSURE[0], 0.0, 0.0),
    };
    let n_mc = AngularVelocity::new::<revolution_per_minute>(n_mc);
    OffDesignParameters {
        t_mc_in: params.t_mc_in,
        t_t_in: design.parameters.t_t_in,
        p_mc_in: Pressure::new::<kilopascal>(p_mc_in),
        recomp_frac,
        n_mc,
        n_t: match design.parameters.n_t {
            TurbineSpeed::LinkedToCompressor => n_mc,
            TurbineSpeed::Fixed(_) => design.turbine.design_speed,
        },
        n_sub_hxrs: params.n_sub_hxrs,
        tol: params.tol,
    }
}

/// Finds the most efficient operating point a heat transfer fluid loop can
/// sustain.
///
/// The compressor inlet pressure, recompression fraction, and compressor
/// speed are searched. If no trial meets the return temperature, turbine
/// inlet balance, and pressure limit, the search is repeated from a faster
/// compressor.
///
/// # Errors
///
/// Returns [`CycleError::InvalidInput`] if the fluid is no hotter than the
/// compressor inlet or its return target, and
/// [`CycleError::NoFeasibleOperation`] if no trial meets every constraint.
pub(super) fn heat_source_off_design(
    oracle: &impl PropertyOracle,
    design: &DesignSolution,
    params: &HeatSourceParameters,
    tolerances: &CycleTolerances,
) -> Result<HeatSourceOperation, CycleError> {
    if params.t_htf_hot <= params.t_mc_in || params.t_htf_hot <= params.t_htf_cold {
        return Err(CycleError::InvalidInput(format!(
            "heat transfer fluid at {:.2} K cannot heat the cycle",
            params.t_htf_hot.get::<kelvin>()
        )));
    }

    let config = simplex::Config {
        x_rel_tol: params.opt_tol,
        ..simplex::Config::default()
    };

    for window in SPEED_WINDOWS {
        let mut best: Option<(f64, HeatSourceOperation)> = None;
        let solution = simplex::maximize(&variables(design, window), &config, |x| {
            let operating = operating_parameters(design, params, x);
            let Some(exchange) =
                balance_turbine_inlet(oracle, design, params, operating, tolerances)
            else {
                return 0.0;
            };
            let (score, met) = score(&exchange, params);
            if met && score > 0.0 && best.as_ref().is_none_or(|(best, _)| score > *best) {
                best = Some((score, exchange.operation));
            }
            score
        })?;
        debug!(
            evals = solution.evals,
            score = solution.objective,
            status = ?solution.status,
            "heat source search finished"
        );

        if let Some((eta, operation)) = best {
            info!(
                eta,
                t_t_in = operation.solution.parameters.t_t_in.get::<kelvin>(),
                "heat source operating point found"
            );
            return Ok(operation);
        }
    }

    Err(CycleError::NoFeasibleOperation)
}
