use tracing::debug;
use uom::{
    ConstZero,
    si::{
        f64::{MassRate, Pressure, Ratio, TemperatureInterval, ThermalConductance},
        length::meter,
        ratio::ratio,
        temperature_interval::kelvin as delta_kelvin,
        thermal_conductance::watt_per_kelvin,
    },
};

use crate::{
    models::{
        power::turbomachinery::{CompressorDesign, RecompressorDesign, TurbineDesign},
        thermal::hx::{HeatExchangerDesign, StreamPair},
    },
    support::thermo::{Properties, PropertyOracle},
};

use super::{
    super::{CycleError, DesignSolution, Exchangers, Node, TurbineSpeed},
    design::DesignPoint,
    enthalpy, mass_rate,
    recuperators::Exchange,
    temperature, watts,
};

/// The recompressor is sized only above this recompression fraction.
const SIZED_RECOMPRESSION: f64 = 0.01;

/// Sizes the turbomachinery and records the exchanger design points.
///
/// # Errors
///
/// Returns the sizing error of whichever machine fails first.
pub(in crate::models::power::recompression) fn finalize(
    oracle: &impl PropertyOracle,
    point: DesignPoint,
) -> Result<DesignSolution, CycleError> {
    let params = point.params;
    let states = &point.states;
    let flows = point.flows;

    let compressor = CompressorDesign::size(
        oracle,
        &states[Node::McInlet],
        &states[Node::McOutlet],
        flows.mc(),
    )?;

    let recompressor = if params.recomp_frac > SIZED_RECOMPRESSION {
        Some(RecompressorDesign::size(
            oracle,
            &states[Node::LtHotOutlet],
            &states[Node::RcOutlet],
            mass_rate(flows.rc),
        )?)
    } else {
        None
    };

    let speed = match params.n_t {
        TurbineSpeed::Fixed(speed) => speed,
        TurbineSpeed::LinkedToCompressor => compressor.design_speed,
    };
    let turbine = TurbineDesign::size(
        oracle,
        &states[Node::TurbineInlet],
        &states[Node::TurbineOutlet],
        flows.t(),
        speed,
    )?;

    debug!(
        d_mc = compressor.rotor_diameter.get::<meter>(),
        d_t = turbine.rotor_diameter.get::<meter>(),
        recompressor = recompressor.is_some(),
        "components sized"
    );

    Ok(DesignSolution {
        parameters: params,
        states: point.states,
        w_dot_net: watts(point.w_dot_net),
        q_dot_in: watts(point.q_dot_in),
        eta_thermal: Ratio::new::<ratio>(point.eta_thermal),
        m_dot: flows.into(),
        ht_bypass_fraction: point.ht_bypass_fraction,
        exchangers: exchangers(&point),
        compressor,
        recompressor,
        turbine,
    })
}

fn exchangers(point: &DesignPoint) -> Exchangers {
    let s = &point.states;
    let p = |node: Node| s[node].pressure;
    let flows = point.flows;
    let m_ht_cold = (1.0 - point.ht_bypass_fraction) * flows.t;

    let lt = recuperator(
        &point.lt,
        StreamPair::new(flows.mc, flows.t),
        StreamPair::new(
            p(Node::McOutlet) - p(Node::LtColdOutlet),
            p(Node::HtHotOutlet) - p(Node::LtHotOutlet),
        ),
        (&s[Node::McOutlet], &s[Node::LtColdOutlet]),
        (&s[Node::HtHotOutlet], &s[Node::LtHotOutlet]),
    );
    let ht = recuperator(
        &point.ht,
        StreamPair::new(m_ht_cold, flows.t),
        StreamPair::new(
            p(Node::Mixed) - p(Node::HtColdOutlet),
            p(Node::TurbineOutlet) - p(Node::HtHotOutlet),
        ),
        (&s[Node::Mixed], &s[Node::HtColdOutlet]),
        (&s[Node::TurbineOutlet], &s[Node::HtHotOutlet]),
    );

    let phx = HeatExchangerDesign::size(
        StreamPair::new(flows.t(), MassRate::ZERO),
        StreamPair::new(p(Node::HtColdOutlet) - p(Node::TurbineInlet), Pressure::ZERO),
        ThermalConductance::ZERO,
        watts(point.q_dot_phx),
    );
    let pc = HeatExchangerDesign::size(
        StreamPair::new(MassRate::ZERO, flows.mc()),
        StreamPair::new(Pressure::ZERO, p(Node::LtHotOutlet) - p(Node::McInlet)),
        ThermalConductance::ZERO,
        watts(flows.mc * (enthalpy(&s[Node::LtHotOutlet]) - enthalpy(&s[Node::McInlet]))),
    );

    Exchangers { lt, ht, phx, pc }
}

/// Design record of a recuperator from each stream's (inlet, outlet) states.
///
/// Effectiveness is the duty over the most the smaller capacitance stream
/// could carry between the two inlet temperatures.
fn recuperator(
    exchange: &Exchange,
    m_dot: StreamPair<f64>,
    dp: StreamPair<Pressure>,
    (cold_in, cold_out): (&Properties, &Properties),
    (hot_in, hot_out): (&Properties, &Properties),
) -> HeatExchangerDesign {
    let effectiveness = if exchange.q_dot > 0.0 {
        let capacitance = |m: f64, inlet: &Properties, outlet: &Properties| {
            m * (enthalpy(outlet) - enthalpy(inlet)) / (temperature(outlet) - temperature(inlet))
        };
        let c_min = capacitance(m_dot.cold, cold_in, cold_out)
            .min(capacitance(m_dot.hot, hot_in, hot_out));
        exchange.q_dot / (c_min * (temperature(hot_in) - temperature(cold_in)))
    } else {
        0.0
    };

    HeatExchangerDesign::size(
        m_dot.map(mass_rate),
        dp,
        ThermalConductance::new::<watt_per_kelvin>(exchange.ua),
        watts(exchange.q_dot),
    )
    .with_performance(
        Ratio::new::<ratio>(effectiveness),
        TemperatureInterval::new::<delta_kelvin>(exchange.min_delta_t),
    )
}
