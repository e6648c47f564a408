use tracing::debug;
use uom::si::{
    available_energy::joule_per_kilogram, f64::ThermodynamicTemperature, power::watt,
    thermal_conductance::watt_per_kelvin,
};

use crate::{
    models::power::turbomachinery::{Machine, OutletState, outlet_state},
    support::thermo::PropertyOracle,
};

use super::{
    super::{CycleError, CycleStates, CycleTolerances, DesignParameters, Node, Topology},
    NO_RECOMPRESSION, enthalpy, heat_shield, kelvins,
    pressures::Pressures,
    recuperators::{Branch, Exchange, Flows, Recuperators},
    topology::SpecificWork,
};

/// A balanced design point before its components are sized.
#[derive(Debug, Clone, PartialEq)]
pub(in crate::models::power::recompression) struct DesignPoint {
    pub(super) params: DesignParameters,
    pub(super) states: CycleStates,
    pub(super) flows: Flows,
    pub(super) work: SpecificWork,
    pub(super) w_dot_net: f64,
    pub(super) q_dot_phx: f64,
    pub(super) q_dot_in: f64,
    pub(super) q_dot_shield: f64,
    pub(super) eta_thermal: f64,
    pub(super) ht_bypass_fraction: f64,
    pub(super) lt: Exchange,
    pub(super) ht: Exchange,
}

impl DesignPoint {
    pub(in crate::models::power::recompression) fn params(&self) -> &DesignParameters {
        &self.params
    }

    pub(in crate::models::power::recompression) fn eta_thermal(&self) -> f64 {
        self.eta_thermal
    }

    pub(in crate::models::power::recompression) fn states(&self) -> &CycleStates {
        &self.states
    }
}

/// Solves the design point for the configured topology.
///
/// # Errors
///
/// Returns the first fatal [`CycleError`] of the balance.
pub(in crate::models::power::recompression) fn design_point(
    oracle: &impl PropertyOracle,
    params: &DesignParameters,
    tolerances: &CycleTolerances,
) -> Result<DesignPoint, CycleError> {
    match params.topology {
        Topology::HtrBypassHeatShield => heat_shield::solve(oracle, params, tolerances),
        Topology::Standard | Topology::Bypass | Topology::Bypass150C => {
            balance(oracle, params, tolerances, 0.0)
        }
    }
}

/// Balances the cycle with a fixed fraction of turbine flow bypassing the HT
/// recuperator cold side.
pub(super) fn balance(
    oracle: &impl PropertyOracle,
    params: &DesignParameters,
    tolerances: &CycleTolerances,
    ht_bypass_fraction: f64,
) -> Result<DesignPoint, CycleError> {
    let p = Pressures::design(params);

    let eta_mc = params.eta_mc.isentropic(
        oracle,
        Machine::Compressor,
        params.t_mc_in,
        p[Node::McInlet],
        p[Node::McOutlet],
    )?;
    let mc = outlet_state(
        oracle,
        Machine::Compressor,
        eta_mc,
        params.t_mc_in,
        p[Node::McInlet],
        p[Node::McOutlet],
    )?;

    let eta_t = params.eta_t.isentropic(
        oracle,
        Machine::Turbine,
        params.t_t_in,
        p[Node::TurbineInlet],
        p[Node::TurbineOutlet],
    )?;
    let turbine = outlet_state(
        oracle,
        Machine::Turbine,
        eta_t,
        params.t_t_in,
        p[Node::TurbineInlet],
        p[Node::TurbineOutlet],
    )?;

    let recompressor = |t9: ThermodynamicTemperature| -> Result<OutletState, CycleError> {
        let inlet = (p[Node::LtHotOutlet], p[Node::RcOutlet]);
        let eta = params
            .eta_rc
            .isentropic(oracle, Machine::Compressor, t9, inlet.0, inlet.1)?;
        Ok(outlet_state(oracle, Machine::Compressor, eta, t9, inlet.0, inlet.1)?)
    };

    let f = params.recomp_frac;
    let recompresses = f >= NO_RECOMPRESSION;
    let w_mc = mc.specific_work.get::<joule_per_kilogram>();
    let w_t = turbine.specific_work.get::<joule_per_kilogram>();

    // The recompressor absorbs the least work with its inlet at the compressor
    // outlet temperature.
    let w_rc = if recompresses {
        recompressor(mc.outlet.temperature)?
            .specific_work
            .get::<joule_per_kilogram>()
    } else {
        0.0
    };
    if w_mc + w_rc + w_t <= 0.0 {
        return Err(CycleError::NoNetPower {
            specific_work: w_mc + w_rc + w_t,
        });
    }

    let w_dot_target = params.w_dot_net.get::<watt>();
    let recuperators = Recuperators {
        oracle,
        pressures: &p,
        ua_lt: params.ua_lt.get::<watt_per_kelvin>(),
        ua_ht: params.ua_ht.get::<watt_per_kelvin>(),
        n_sub_hxrs: params.n_sub_hxrs,
        tol: params.tol,
        tolerances,
        recomp_frac: f,
        ht_cold_fraction: 1.0 - ht_bypass_fraction,
    };

    let balance = recuperators.solve(&mc.outlet, &turbine.outlet, |t9| {
        let t9 = kelvins(t9);
        let (state9, state10, w_rc) = if recompresses {
            let rc = recompressor(t9)?;
            (rc.inlet, rc.outlet, rc.specific_work.get::<joule_per_kilogram>())
        } else {
            let state9 = oracle.from_tp(t9, p[Node::LtHotOutlet])?;
            (state9, state9, 0.0)
        };

        let work = SpecificWork {
            mc: w_mc,
            rc: w_rc,
            t: w_t,
        };
        let m_t = params.topology.turbine_flow(w_dot_target, &work, f);
        if m_t < 0.0 {
            return Err(CycleError::NegativeTurbineFlow { m_dot: m_t });
        }

        Ok(Branch {
            state9,
            state10,
            flows: Flows::split(m_t, f),
            extra: work,
        })
    })?;

    let states = CycleStates::new([
        mc.inlet,
        mc.outlet,
        balance.state3,
        balance.state4,
        balance.state5,
        turbine.inlet,
        turbine.outlet,
        balance.state8,
        balance.state9,
        balance.state10,
    ]);
    let flows = balance.flows;
    let q_dot_phx =
        flows.t * (enthalpy(&states[Node::TurbineInlet]) - enthalpy(&states[Node::HtColdOutlet]));
    let performance = params.topology.performance(
        &balance.extra,
        &flows,
        &states,
        q_dot_phx,
        params.tol,
        ht_bypass_fraction,
    );

    debug!(
        m_dot_t = flows.t,
        w_dot_net = performance.w_dot_net,
        eta = performance.eta_thermal,
        "design point balanced"
    );

    Ok(DesignPoint {
        params: *params,
        states,
        flows,
        work: balance.extra,
        w_dot_net: performance.w_dot_net,
        q_dot_phx,
        q_dot_in: performance.q_dot_in,
        q_dot_shield: performance.q_dot_shield,
        eta_thermal: performance.eta_thermal,
        ht_bypass_fraction,
        lt: balance.lt,
        ht: balance.ht,
    })
}
