//! Drivers that search for a design or operating point hitting a target.

use tracing::{debug, info, warn};
use uom::si::{
    f64::{Pressure, ThermalConductance, ThermodynamicTemperature},
    power::watt,
    pressure::{kilopascal, megapascal, pascal},
    ratio::ratio,
    thermal_conductance::watt_per_kelvin,
    thermodynamic_temperature::{degree_celsius, kelvin},
};

use crate::{
    models::power::turbomachinery::Efficiency,
    support::{
        solve::secant::{self, FirstStep, Seed, Step},
        thermo::{PropertyOracle, fluid::CarbonDioxide},
    },
};

use super::{
    AutoOptimalParameters, CycleError, CycleTolerances, DesignSolution, Loop, Node,
    OffDesignParameters, OffDesignSolution, OffDesignTarget, TargetEfficiencyLimits,
    TargetEfficiencyParameters, TargetOffDesignParameters, core, optimize,
};

/// Highest compressor inlet temperature before clamping, °C.
const T_MC_IN_MAX_C: f64 = 70.0;

/// Lowest turbine inlet temperature before clamping, °C.
const T_T_IN_MIN_C: f64 = 300.0;

/// Machine efficiencies are clamped to this range.
const EFFICIENCY_RANGE: [f64; 2] = [0.1, 1.0];

/// High-pressure limits at or below this are rejected, MPa.
const P_HIGH_LIMIT_MIN_MPA: f64 = 10.0;

/// Conductance updates that may only halve or grow the guess before jumping
/// to the ratio limit.
const EXPANSION_STEPS: usize = 5;

/// The scan never goes above this compressor inlet pressure, MPa.
const SCAN_PRESSURE_MAX_MPA: f64 = 12.0;

/// The scan stops once the compressor outlet exceeds this multiple of the
/// high-pressure limit.
const SCAN_OUTLET_MARGIN: f64 = 1.2;

const TARGET_MAX_ITERS: usize = 100;

/// Refinement stops once the pressure bracket is narrower than this, Pa.
const TARGET_PRESSURE_TOL: f64 = 100.0;

/// An optimized design that reaches a target thermal efficiency.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetEfficiencyDesign {
    pub design: DesignSolution,

    /// Inputs that were clamped before the search, one message each.
    pub warnings: Vec<String>,

    /// Total recuperator conductance of the design.
    pub ua_total: ThermalConductance,

    /// Number of auto-optimized designs solved.
    pub iterations: usize,
}

/// Checks target-efficiency inputs, clamping what can be clamped.
///
/// Returns the inputs to use and a warning for every clamp.
fn validate(
    params: &TargetEfficiencyParameters,
    limits: &TargetEfficiencyLimits,
) -> Result<(TargetEfficiencyParameters, Vec<String>), CycleError> {
    let mut params = *params;
    let mut warnings = Vec::new();
    let mut clamped = |message: String| {
        warn!("{message}");
        warnings.push(message);
    };
    let celsius = |t: ThermodynamicTemperature| t.get::<degree_celsius>();

    let t_crit = CarbonDioxide::critical_temperature();
    if params.t_mc_in <= t_crit {
        return Err(CycleError::InvalidInput(format!(
            "compressor inlet temperature {:.2} °C must be above the critical {:.2} °C",
            celsius(params.t_mc_in),
            celsius(t_crit),
        )));
    }

    let t_mc_in_max = ThermodynamicTemperature::new::<degree_celsius>(T_MC_IN_MAX_C);
    if params.t_mc_in > t_mc_in_max {
        clamped(format!(
            "compressor inlet temperature {:.2} °C was reset to {T_MC_IN_MAX_C} °C",
            celsius(params.t_mc_in),
        ));
        params.t_mc_in = t_mc_in_max;
    }

    let t_t_in_min = ThermodynamicTemperature::new::<degree_celsius>(T_T_IN_MIN_C);
    if params.t_t_in < t_t_in_min {
        clamped(format!(
            "turbine inlet temperature {:.2} °C was reset to {T_T_IN_MIN_C} °C",
            celsius(params.t_t_in),
        ));
        params.t_t_in = t_t_in_min;
    }

    if params.t_t_in <= params.t_mc_in {
        return Err(CycleError::InvalidInput(format!(
            "turbine inlet temperature {:.2} °C is not above the compressor inlet {:.2} °C",
            celsius(params.t_t_in),
            celsius(params.t_mc_in),
        )));
    }
    if params.t_t_in >= limits.t_upper_limit {
        return Err(CycleError::InvalidInput(format!(
            "turbine inlet temperature {:.2} °C is at or above the property limit {:.2} °C",
            celsius(params.t_t_in),
            celsius(limits.t_upper_limit),
        )));
    }

    for (name, eta) in [
        ("main compressor", &mut params.eta_mc),
        ("recompressor", &mut params.eta_rc),
        ("turbine", &mut params.eta_t),
    ] {
        if let Some(message) = clamp_efficiency(name, eta) {
            clamped(message);
        }
    }

    if params.p_high_limit >= limits.p_upper_limit {
        clamped(format!(
            "high-pressure limit {:.1} MPa was reset to the property limit {:.1} MPa",
            params.p_high_limit.get::<megapascal>(),
            limits.p_upper_limit.get::<megapascal>(),
        ));
        params.p_high_limit = limits.p_upper_limit;
    }
    if params.p_high_limit <= Pressure::new::<megapascal>(P_HIGH_LIMIT_MIN_MPA) {
        return Err(CycleError::InvalidInput(format!(
            "high-pressure limit {:.1} MPa must be above {P_HIGH_LIMIT_MIN_MPA} MPa",
            params.p_high_limit.get::<megapascal>(),
        )));
    }

    if params.eta_thermal <= 0.0 {
        return Err(CycleError::InvalidInput(format!(
            "target thermal efficiency {} must be positive",
            params.eta_thermal
        )));
    }
    let eta_carnot = 1.0 - params.t_mc_in.get::<kelvin>() / params.t_t_in.get::<kelvin>();
    if params.eta_thermal >= eta_carnot {
        return Err(CycleError::InvalidInput(format!(
            "target thermal efficiency {} must be below the Carnot efficiency {eta_carnot:.4}",
            params.eta_thermal
        )));
    }

    Ok((params, warnings))
}

/// Clamps an efficiency of either kind into [`EFFICIENCY_RANGE`].
fn clamp_efficiency(name: &str, efficiency: &mut Efficiency) -> Option<String> {
    let (Efficiency::Isentropic(eta) | Efficiency::Polytropic(eta)) = efficiency;
    let [low, high] = EFFICIENCY_RANGE;
    let clamped = eta.clamp(low, high);
    if clamped == *eta {
        return None;
    }

    let message = format!("{name} efficiency {eta} was reset to {clamped}");
    *eta = clamped;
    Some(message)
}

fn auto_parameters(
    params: &TargetEfficiencyParameters,
    ua_total: ThermalConductance,
) -> AutoOptimalParameters {
    AutoOptimalParameters {
        w_dot_net: params.w_dot_net,
        t_mc_in: params.t_mc_in,
        t_t_in: params.t_t_in,
        dp_lt: params.dp_lt,
        dp_ht: params.dp_ht,
        dp_pc: params.dp_pc,
        dp_phx: params.dp_phx,
        ua_total,
        eta_mc: params.eta_mc,
        eta_rc: params.eta_rc,
        eta_t: params.eta_t,
        n_sub_hxrs: params.n_sub_hxrs,
        p_high_limit: params.p_high_limit,
        n_t: params.n_t,
        tol: params.tol,
        opt_tol: params.opt_tol,
        topology: params.topology,
    }
}

/// Finds the total recuperator conductance whose auto-optimized design
/// reaches the target efficiency.
///
/// The conductance is bracketed by halving or growing the guess, then
/// refined by false position.
///
/// # Errors
///
/// Every failure is reported as [`CycleError::InvalidInput`]: rejected
/// inputs, a design that cannot be optimized, a target outside what the
/// conductance limits allow, or no convergence within the iteration limit.
pub(super) fn design_for_target_efficiency(
    oracle: &impl PropertyOracle,
    params: &TargetEfficiencyParameters,
    limits: &TargetEfficiencyLimits,
    tolerances: &CycleTolerances,
) -> Result<TargetEfficiencyDesign, CycleError> {
    let (params, warnings) = validate(params, limits)?;
    let w_dot_net = params.w_dot_net.get::<watt>();
    let target = params.eta_thermal;

    let solve = |ua: f64| {
        let auto = auto_parameters(&params, ThermalConductance::new::<watt_per_kelvin>(ua));
        optimize::auto_optimal_design(oracle, &auto, tolerances).map_err(|error| {
            CycleError::InvalidInput(format!(
                "cannot optimize the cycle with total conductance {ua} W/K: {error}"
            ))
        })
    };

    let mut ua = 0.1 * w_dot_net;
    let mut design = solve(ua)?;
    let mut iterations = 1;
    let mut lower: Option<(f64, f64)> = None;
    let mut upper: Option<(f64, f64)> = None;

    loop {
        let eta = design.eta_thermal.get::<ratio>();
        let diff = eta - target;
        debug!(ua, eta, diff, iterations, "target efficiency trial");
        if diff.abs() <= params.tol {
            break;
        }
        if iterations >= limits.max_iters {
            return Err(CycleError::InvalidInput(format!(
                "target efficiency {target} not reached after {iterations} designs (last {eta})"
            )));
        }
        iterations += 1;

        if diff > 0.0 {
            if ua / w_dot_net <= limits.ua_min_ratio {
                return Err(CycleError::InvalidInput(format!(
                    "target efficiency {target} is too small; the lowest reachable is about {eta}"
                )));
            }
            lower = Some((ua, diff));
            ua = match upper {
                Some(upper) => false_position((ua, diff), upper),
                None if iterations > EXPANSION_STEPS => limits.ua_min_ratio * w_dot_net,
                None => 0.5 * ua,
            };
        } else {
            if ua / w_dot_net >= limits.ua_max_ratio {
                return Err(CycleError::InvalidInput(format!(
                    "target efficiency {target} is too large; the highest reachable is about {eta}"
                )));
            }
            upper = Some((ua, diff));
            ua = match lower {
                Some(lower) => false_position(lower, (ua, diff)),
                None if iterations > EXPANSION_STEPS => limits.ua_max_ratio * w_dot_net,
                None => 2.5 * ua,
            };
        }

        design = solve(ua)?;
    }

    info!(
        ua_total = ua,
        eta = target,
        iterations,
        "design reaches target efficiency"
    );
    Ok(TargetEfficiencyDesign {
        design,
        warnings,
        ua_total: ThermalConductance::new::<watt_per_kelvin>(ua),
        iterations,
    })
}

/// Root of the line through two `(ua, diff)` points.
fn false_position((x_lower, y_lower): (f64, f64), (x_upper, y_upper): (f64, f64)) -> f64 {
    -y_upper * (x_lower - x_upper) / (y_lower - y_upper) + x_upper
}

/// Bounds on the compressor inlet pressure found by the scan, Pa.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScanBracket {
    /// Pressure with the smallest non-negative residual.
    above: (f64, f64),

    /// Pressure with the largest negative residual.
    below: (f64, f64),
}

fn target_value(solution: &OffDesignSolution, kind: OffDesignTarget) -> f64 {
    match kind {
        OffDesignTarget::NetPower => solution.w_dot_net.get::<watt>(),
        OffDesignTarget::HeatInput => solution.q_dot_in.get::<watt>(),
    }
}

fn operating_parameters(params: &TargetOffDesignParameters, p_mc_in: f64) -> OffDesignParameters {
    OffDesignParameters {
        t_mc_in: params.t_mc_in,
        t_t_in: params.t_t_in,
        p_mc_in: Pressure::new::<pascal>(p_mc_in),
        recomp_frac: params.recomp_frac,
        n_mc: params.n_mc,
        n_t: params.n_t,
        n_sub_hxrs: params.n_sub_hxrs,
        tol: params.tol,
    }
}

/// Scans compressor inlet pressures for a pair that brackets the target.
fn scan(
    oracle: &impl PropertyOracle,
    design: &DesignSolution,
    params: &TargetOffDesignParameters,
    tolerances: &CycleTolerances,
) -> Result<ScanBracket, CycleError> {
    let intervals: u32 = if params.fine_scan { 50 } else { 20 };
    let p_low = params.lowest_pressure.get::<pascal>();
    let p_high = params
        .highest_pressure
        .min(Pressure::new::<megapascal>(SCAN_PRESSURE_MAX_MPA))
        .get::<pascal>();
    let target = params.target.get::<watt>();
    let outlet_limit = params.p_high_limit * SCAN_OUTLET_MARGIN;

    let mut above: Option<(f64, f64)> = None;
    let mut below: Option<(f64, f64)> = None;

    for i in 0..=intervals {
        let p = p_low + f64::from(i) * (p_high - p_low) / f64::from(intervals);
        let operating = operating_parameters(params, p);
        let solution = match core::off_design(oracle, design, &operating, tolerances) {
            Ok(solution) => solution,
            Err(error) => {
                debug!(p_mc_in = p, code = error.code(), "scan point failed");
                continue;
            }
        };
        if solution.states[Node::McOutlet].pressure > outlet_limit {
            break;
        }

        let residual = target_value(&solution, params.target_kind) - target;
        if residual >= 0.0 {
            if above.is_none_or(|(_, best)| residual < best) {
                above = Some((p, residual));
            }
        } else if below.is_none_or(|(_, best)| residual > best) {
            below = Some((p, residual));
        }

        if let (Some(above), Some(below)) = (above, below) {
            return Ok(ScanBracket { above, below });
        }
    }

    Err(CycleError::TargetNotBracketed { target })
}

/// Finds the compressor inlet pressure at which the sized cycle delivers a
/// target net power or heat input.
///
/// # Errors
///
/// Returns [`CycleError::TargetNotBracketed`] if the scan finds no bracket
/// and [`CycleError::NotConverged`] for [`Loop::TargetPressure`] if the
/// refinement fails.
pub(super) fn target_off_design(
    oracle: &impl PropertyOracle,
    design: &DesignSolution,
    params: &TargetOffDesignParameters,
    tolerances: &CycleTolerances,
) -> Result<OffDesignSolution, CycleError> {
    let bracket = scan(oracle, design, params, tolerances)?;
    let target = params.target.get::<watt>();
    let (p_above, p_below) = (bracket.above.0, bracket.below.0);

    // Residuals must grow with pressure.
    let sign = if p_above > p_below { 1.0 } else { -1.0 };

    let config = secant::Config {
        max_iters: TARGET_MAX_ITERS,
        x_abs_tol: TARGET_PRESSURE_TOL,
        first_step: FirstStep::Bisect,
        ..secant::Config::default()
    };
    let solution = secant::solve(
        [p_above.min(p_below), p_above.max(p_below)],
        Seed::at(0.5 * (p_above + p_below)),
        &config,
        |p| -> Result<Step<OffDesignSolution>, CycleError> {
            let operating = operating_parameters(params, p);
            let solution = match core::off_design(oracle, design, &operating, tolerances) {
                Ok(solution) => solution,
                Err(error) => {
                    debug!(p_mc_in = p, code = error.code(), "refinement point failed");
                    return Ok(Step::Lower);
                }
            };

            let residual = target_value(&solution, params.target_kind) - target;
            if residual.abs() / target <= params.tol {
                Ok(Step::Converged(solution))
            } else {
                Ok(Step::Residual(sign * residual, solution))
            }
        },
    )
    .map_err(|error| {
        error.or_else(|| CycleError::not_converged(Loop::TargetPressure, TARGET_MAX_ITERS))
    })?;

    info!(
        p_mc_in = Pressure::new::<pascal>(solution.x).get::<kilopascal>(),
        iters = solution.iters,
        "target operating point found"
    );
    Ok(solution.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{f64::Power, power::megawatt};

    use crate::models::power::recompression::test_support::{
        design_parameters, kpa, oracle, recompression_parameters,
    };

    fn target_parameters() -> TargetEfficiencyParameters {
        let base = recompression_parameters();
        TargetEfficiencyParameters {
            w_dot_net: base.w_dot_net,
            eta_thermal: 0.3,
            t_mc_in: base.t_mc_in,
            t_t_in: base.t_t_in,
            dp_lt: base.dp_lt,
            dp_ht: base.dp_ht,
            dp_pc: base.dp_pc,
            dp_phx: base.dp_phx,
            eta_mc: base.eta_mc,
            eta_rc: base.eta_rc,
            eta_t: base.eta_t,
            n_sub_hxrs: base.n_sub_hxrs,
            p_high_limit: kpa(25_000.0),
            n_t: base.n_t,
            tol: 1e-3,
            opt_tol: 1e-3,
            topology: base.topology,
        }
    }

    #[test]
    fn valid_inputs_pass_without_warnings() {
        let (params, warnings) =
            validate(&target_parameters(), &TargetEfficiencyLimits::default()).expect("valid");

        assert!(warnings.is_empty());
        assert_eq!(params, target_parameters());
    }

    #[test]
    fn clamps_are_reported() {
        let params = TargetEfficiencyParameters {
            t_mc_in: ThermodynamicTemperature::new::<degree_celsius>(80.0),
            t_t_in: ThermodynamicTemperature::new::<degree_celsius>(250.0),
            eta_mc: Efficiency::Isentropic(1.2),
            eta_t: Efficiency::Polytropic(0.05),
            eta_thermal: 0.1,
            ..target_parameters()
        };
        let (params, warnings) =
            validate(&params, &TargetEfficiencyLimits::default()).expect("clamped inputs");

        assert_eq!(warnings.len(), 4);
        assert_relative_eq!(params.t_mc_in.get::<degree_celsius>(), 70.0, epsilon = 1e-9);
        assert_relative_eq!(params.t_t_in.get::<degree_celsius>(), 300.0, epsilon = 1e-9);
        assert_eq!(params.eta_mc, Efficiency::Isentropic(1.0));
        assert_eq!(params.eta_t, Efficiency::Polytropic(0.1));
    }

    #[test]
    fn pressure_limit_is_clamped_to_the_property_limit() {
        let limits = TargetEfficiencyLimits {
            p_upper_limit: kpa(30_000.0),
            ..TargetEfficiencyLimits::default()
        };
        let params = TargetEfficiencyParameters {
            p_high_limit: kpa(40_000.0),
            ..target_parameters()
        };
        let (params, warnings) = validate(&params, &limits).expect("clamped inputs");

        assert_eq!(warnings.len(), 1);
        assert_eq!(params.p_high_limit, kpa(30_000.0));
    }

    #[test]
    fn rejections_have_code_minus_one() {
        let limits = TargetEfficiencyLimits::default();
        let rejected = [
            TargetEfficiencyParameters {
                t_mc_in: ThermodynamicTemperature::new::<kelvin>(300.0),
                ..target_parameters()
            },
            TargetEfficiencyParameters {
                p_high_limit: kpa(9_000.0),
                ..target_parameters()
            },
            TargetEfficiencyParameters {
                eta_thermal: 0.0,
                ..target_parameters()
            },
            TargetEfficiencyParameters {
                eta_thermal: 0.75,
                ..target_parameters()
            },
        ];

        for params in rejected {
            let error = validate(&params, &limits).expect_err("rejected input");
            assert_eq!(error.code(), -1);
        }
    }

    #[test]
    fn false_position_interpolates_linearly() {
        assert_relative_eq!(false_position((1.0, 0.2), (3.0, -0.2)), 2.0);
        assert_relative_eq!(false_position((10.0, 0.1), (20.0, -0.3)), 12.5);
    }

    #[test]
    fn net_power_target_is_met() {
        let oracle = oracle();
        let tolerances = CycleTolerances::default();
        let point = core::design_point(&oracle, &design_parameters(), &tolerances)
            .expect("feasible design");
        let design = core::finalize(&oracle, point).expect("components size");

        let params = TargetOffDesignParameters {
            t_mc_in: design.parameters.t_mc_in,
            t_t_in: design.parameters.t_t_in,
            recomp_frac: 0.0,
            n_mc: design.compressor.design_speed,
            n_t: design.turbine.design_speed,
            n_sub_hxrs: 10,
            tol: 1e-3,
            target: Power::new::<megawatt>(9.0),
            target_kind: OffDesignTarget::NetPower,
            lowest_pressure: kpa(6_000.0),
            highest_pressure: kpa(8_400.0),
            fine_scan: false,
            p_high_limit: kpa(25_000.0),
        };

        let solution =
            target_off_design(&oracle, &design, &params, &tolerances).expect("target is met");
        assert_relative_eq!(
            solution.w_dot_net.get::<megawatt>(),
            9.0,
            max_relative = params.tol
        );

        // Less power than design means a lower compressor inlet pressure.
        let p_mc_in = solution.parameters.p_mc_in;
        assert!(p_mc_in > params.lowest_pressure && p_mc_in < design.parameters.p_mc_in);
    }
}
