//! Off-design operation of a sized cycle.
//!
//! The compressor and turbine speeds are given. The turbine mass flow is
//! iterated until the flow the compressor delivers at that speed is the flow
//! the turbine nozzle passes at the resulting pressures. The recuperators
//! then balance with conductances scaled to the operating flows.

use tracing::{debug, trace};
use uom::si::{
    angular_velocity::radian_per_second,
    f64::{Ratio, TemperatureInterval, ThermalConductance},
    length::meter,
    mass_density::kilogram_per_cubic_meter,
    mass_rate::kilogram_per_second,
    ratio::ratio,
    temperature_interval::kelvin as delta_kelvin,
    thermal_conductance::watt_per_kelvin,
};

use crate::{
    models::{
        power::turbomachinery::{
            CompressorError, CompressorOperation, FLOW_COEFFICIENT_DESIGN, FLOW_COEFFICIENT_MAX,
            TurbineOperation,
        },
        thermal::hx::StreamPair,
    },
    support::{
        solve::secant::{self, FirstStep, Seed, Step},
        thermo::PropertyOracle,
    },
};

use super::{
    super::{
        CycleError, CycleStates, CycleTolerances, DesignSolution, Loop, Node,
        OffDesignParameters, OffDesignSolution, RecuperatorPerformance,
    },
    NO_RECOMPRESSION, enthalpy, kelvins, mass_rate,
    pressures::Pressures,
    recuperators::{Branch, Exchange, Flows, Recuperators},
    watts,
};

/// Operating point of the machines once the mass flow is consistent.
struct Machines {
    flows: Flows,
    pressures: Pressures,
    compressor: CompressorOperation,
    turbine: TurbineOperation,
}

/// Runs a sized cycle at the given inlet conditions and shaft speeds.
///
/// # Errors
///
/// Returns [`CycleError::InvalidInput`] for a recompression fraction outside
/// `[0, 1)` or one the design has no recompressor for,
/// [`CycleError::NotConverged`] for [`Loop::MassFlow`] if no turbine flow
/// matches the compressor, and any fatal machine or recuperator error.
pub(in crate::models::power::recompression) fn off_design(
    oracle: &impl PropertyOracle,
    design: &DesignSolution,
    params: &OffDesignParameters,
    tolerances: &CycleTolerances,
) -> Result<OffDesignSolution, CycleError> {
    let f = params.recomp_frac;
    if !(0.0..1.0).contains(&f) {
        return Err(CycleError::InvalidInput(format!(
            "recompression fraction {f} is outside [0, 1)"
        )));
    }
    let recompresses = f >= NO_RECOMPRESSION;
    let recompressor = match (&design.recompressor, recompresses) {
        (Some(recompressor), true) => Some(recompressor),
        (None, true) => {
            return Err(CycleError::InvalidInput(format!(
                "recompression fraction {f} needs a design with a recompressor"
            )));
        }
        (_, false) => None,
    };

    let machines = match_mass_flow(oracle, design, params, tolerances)?;
    let Machines {
        flows,
        pressures: p,
        compressor,
        turbine,
    } = machines;

    let ua_lt = design
        .exchangers
        .lt
        .conductance(StreamPair::new(flows.mc(), flows.t()));
    let ua_ht = design
        .exchangers
        .ht
        .conductance(StreamPair::new(flows.t(), flows.t()));

    let recuperators = Recuperators {
        oracle,
        pressures: &p,
        ua_lt: ua_lt.get::<watt_per_kelvin>(),
        ua_ht: ua_ht.get::<watt_per_kelvin>(),
        n_sub_hxrs: params.n_sub_hxrs,
        tol: params.tol,
        tolerances,
        recomp_frac: f,
        ht_cold_fraction: 1.0,
    };

    let balance = recuperators.solve(&compressor.outlet, &turbine.outlet, |t9| {
        let t9 = kelvins(t9);
        let state9 = oracle.from_tp(t9, p[Node::LtHotOutlet])?;
        let (state10, operation) = match recompressor {
            Some(recompressor) => {
                let operation = recompressor.off_design(
                    oracle,
                    t9,
                    p[Node::LtHotOutlet],
                    mass_rate(flows.rc),
                    p[Node::RcOutlet],
                )?;
                (operation.outlet, Some(operation))
            }
            None => (state9, None),
        };

        Ok(Branch {
            state9,
            state10,
            flows,
            extra: operation,
        })
    })?;

    let states = CycleStates::new([
        oracle.from_tp(params.t_mc_in, p[Node::McInlet])?,
        compressor.outlet,
        balance.state3,
        balance.state4,
        balance.state5,
        oracle.from_tp(params.t_t_in, p[Node::TurbineInlet])?,
        turbine.outlet,
        balance.state8,
        balance.state9,
        balance.state10,
    ]);

    let h = |node: Node| enthalpy(&states[node]);
    let w_mc = h(Node::McInlet) - h(Node::McOutlet);
    let w_rc = h(Node::LtHotOutlet) - h(Node::RcOutlet);
    let w_t = h(Node::TurbineInlet) - h(Node::TurbineOutlet);
    let w_dot_net = flows.mc * w_mc + flows.rc * w_rc + flows.t * w_t;
    let q_dot_in = flows.t * (h(Node::TurbineInlet) - h(Node::HtColdOutlet));

    debug!(
        m_dot_t = flows.t,
        w_dot_net,
        eta = w_dot_net / q_dot_in,
        "off-design point balanced"
    );

    Ok(OffDesignSolution {
        parameters: *params,
        states,
        w_dot_net: watts(w_dot_net),
        q_dot_in: watts(q_dot_in),
        eta_thermal: Ratio::new::<ratio>(w_dot_net / q_dot_in),
        m_dot: flows.into(),
        compressor,
        recompressor: balance.extra,
        turbine,
        lt: performance(ua_lt, &balance.lt),
        ht: performance(ua_ht, &balance.ht),
    })
}

/// Finds the turbine flow the compressor and turbine agree on.
fn match_mass_flow(
    oracle: &impl PropertyOracle,
    design: &DesignSolution,
    params: &OffDesignParameters,
    tolerances: &CycleTolerances,
) -> Result<Machines, CycleError> {
    let f = params.recomp_frac;
    let inlet = oracle.from_tp(params.t_mc_in, params.p_mc_in)?;

    let diameter = design.compressor.rotor_diameter.get::<meter>();
    let u_tip = 0.5 * diameter * params.n_mc.get::<radian_per_second>();
    let partial = inlet.density.get::<kilogram_per_cubic_meter>() * diameter * diameter * u_tip;
    let guess = FLOW_COEFFICIENT_DESIGN * partial / (1.0 - f);
    let upper = 1.2 * FLOW_COEFFICIENT_MAX * partial / (1.0 - f);

    let config = secant::Config {
        max_iters: tolerances.mass_flow_max_iters,
        first_step: FirstStep::Bisect,
        ..secant::Config::default()
    };

    let solution = secant::solve(
        [0.0, upper],
        Seed::at(guess),
        &config,
        |m_t| -> Result<Step<Machines>, CycleError> {
            if m_t <= 0.0 {
                return Ok(Step::Raise);
            }
            let flows = Flows::split(m_t, f);
            let compressor = match design.compressor.off_design(
                oracle,
                params.t_mc_in,
                params.p_mc_in,
                flows.mc(),
                params.n_mc,
            ) {
                Ok(compressor) => compressor,
                Err(CompressorError::NoHead { .. } | CompressorError::Inlet(_)) => {
                    return Ok(Step::Lower);
                }
                Err(CompressorError::Outlet(_)) => return Ok(Step::Raise),
                Err(error) => return Err(error.into()),
            };

            let pressures = Pressures::off_design(
                params.p_mc_in,
                compressor.outlet.pressure,
                &design.exchangers,
                &flows,
            );
            let turbine = design.turbine.off_design(
                oracle,
                params.t_t_in,
                pressures[Node::TurbineInlet],
                pressures[Node::TurbineOutlet],
                params.n_t,
            )?;

            let m_allowed = turbine.m_dot.get::<kilogram_per_second>();
            let residual = m_t - m_allowed;
            trace!(m_t, m_allowed, "turbine flow trial");

            let machines = Machines {
                flows,
                pressures,
                compressor,
                turbine,
            };
            if (residual / m_t).abs() < params.tol {
                Ok(Step::Converged(machines))
            } else {
                Ok(Step::Residual(residual, machines))
            }
        },
    )
    .map_err(|error| {
        error.or_else(|| {
            CycleError::not_converged(Loop::MassFlow, tolerances.mass_flow_max_iters)
        })
    })?;

    Ok(solution.value)
}

fn performance(ua: ThermalConductance, exchange: &Exchange) -> RecuperatorPerformance {
    RecuperatorPerformance {
        ua,
        q_dot: watts(exchange.q_dot),
        min_delta_t: TemperatureInterval::new::<delta_kelvin>(exchange.min_delta_t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::power::watt;

    use crate::models::power::recompression::{
        DesignParameters,
        core::{design_point, finalize},
        test_support::{design_parameters, oracle, recompression_parameters},
    };

    fn sized(params: &DesignParameters) -> DesignSolution {
        let oracle = oracle();
        let point =
            design_point(&oracle, params, &CycleTolerances::default()).expect("feasible design");
        finalize(&oracle, point).expect("components size")
    }

    fn at_design(design: &DesignSolution) -> OffDesignParameters {
        let params = &design.parameters;
        OffDesignParameters {
            t_mc_in: params.t_mc_in,
            t_t_in: params.t_t_in,
            p_mc_in: params.p_mc_in,
            recomp_frac: params.recomp_frac,
            n_mc: design.compressor.design_speed,
            n_t: design.turbine.design_speed,
            n_sub_hxrs: params.n_sub_hxrs,
            tol: 1e-6,
        }
    }

    #[test]
    fn design_conditions_reproduce_the_design_point() {
        let design = sized(&recompression_parameters());
        let params = at_design(&design);
        let solution = off_design(&oracle(), &design, &params, &CycleTolerances::default())
            .expect("design conditions run");

        assert_relative_eq!(
            solution.m_dot.turbine.get::<kilogram_per_second>(),
            design.m_dot.turbine.get::<kilogram_per_second>(),
            max_relative = 1e-3
        );
        assert_relative_eq!(
            solution.w_dot_net.get::<watt>(),
            design.w_dot_net.get::<watt>(),
            max_relative = 1e-3
        );
        assert_relative_eq!(
            solution.eta_thermal.get::<ratio>(),
            design.eta_thermal.get::<ratio>(),
            max_relative = 1e-3
        );
        assert!(solution.recompressor.is_some());
    }

    #[test]
    fn recompression_needs_a_recompressor() {
        let design = sized(&design_parameters());
        let params = OffDesignParameters {
            recomp_frac: 0.2,
            ..at_design(&design)
        };

        let error = off_design(&oracle(), &design, &params, &CycleTolerances::default())
            .expect_err("no recompressor to run");
        assert_eq!(error.code(), -1);
    }

    #[test]
    fn slower_compressor_moves_less_flow() {
        let design = sized(&design_parameters());
        let params = OffDesignParameters {
            n_mc: design.compressor.design_speed * 0.95,
            ..at_design(&design)
        };

        let solution = off_design(&oracle(), &design, &params, &CycleTolerances::default())
            .expect("slower speed runs");

        assert!(solution.m_dot.turbine < design.m_dot.turbine);
        assert!(solution.states[Node::McOutlet].pressure < design.states[Node::McOutlet].pressure);
        assert!(solution.w_dot_net.get::<watt>() > 0.0);
    }

    #[test]
    fn mass_flow_cap_is_reported() {
        let design = sized(&design_parameters());
        let params = OffDesignParameters {
            n_mc: design.compressor.design_speed * 0.95,
            ..at_design(&design)
        };
        let tolerances = CycleTolerances {
            mass_flow_max_iters: 1,
            ..CycleTolerances::default()
        };

        let error = off_design(&oracle(), &design, &params, &tolerances)
            .expect_err("one trial cannot match the flows");
        assert_eq!(error.code(), 42);
        assert!(matches!(
            error,
            CycleError::NotConverged {
                which: Loop::MassFlow,
                iters: 1
            }
        ));
    }
}
