use uom::{
    ConstZero,
    si::{
        f64::{MassRate, Power, Pressure, Ratio, TemperatureInterval, ThermalConductance},
        ratio::ratio,
    },
};

use super::StreamPair;

/// Pressure drops scale with the mass-flow ratio to this power.
const PRESSURE_DROP_EXPONENT: f64 = 1.75;

/// Conductance scales with the mean mass-flow ratio to this power.
const CONDUCTANCE_EXPONENT: f64 = 0.8;

/// Design-point reference for a two-stream heat exchanger.
///
/// Off-design pressure drops and conductance are scaled from these values
/// using the actual stream mass flows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatExchangerDesign {
    /// Design pressure drop of each stream.
    pub dp: StreamPair<Pressure>,

    /// Design mass flow of each stream.
    pub m_dot: StreamPair<MassRate>,

    /// Design conductance.
    pub ua: ThermalConductance,

    /// Design heat duty.
    pub q_dot: Power,

    /// Design effectiveness, `Q / (C_min·(T_hot,in − T_cold,in))`.
    pub effectiveness: Ratio,

    /// Smallest hot-to-cold temperature difference at the design point.
    pub min_delta_t: TemperatureInterval,
}

impl HeatExchangerDesign {
    /// Records the design point of an exchanger.
    ///
    /// Effectiveness and minimum temperature difference start at zero; set
    /// them with [`Self::with_performance`] when they are known.
    #[must_use]
    pub fn size(
        m_dot: StreamPair<MassRate>,
        dp: StreamPair<Pressure>,
        ua: ThermalConductance,
        q_dot: Power,
    ) -> Self {
        Self {
            dp,
            m_dot,
            ua,
            q_dot,
            effectiveness: Ratio::ZERO,
            min_delta_t: TemperatureInterval::ZERO,
        }
    }

    #[must_use]
    pub fn with_performance(self, effectiveness: Ratio, min_delta_t: TemperatureInterval) -> Self {
        Self {
            effectiveness,
            min_delta_t,
            ..self
        }
    }

    /// Pressure drop of each stream at the given flows.
    ///
    /// Each drop scales as `(m / m_design)^1.75`. A stream with no design
    /// flow has no pressure drop.
    #[must_use]
    pub fn pressure_drops(&self, m_dot: StreamPair<MassRate>) -> StreamPair<Pressure> {
        let scale = |dp: Pressure, m: MassRate, m_design: MassRate| {
            if m_design <= MassRate::ZERO {
                return Pressure::ZERO;
            }
            dp * (m / m_design).get::<ratio>().powf(PRESSURE_DROP_EXPONENT)
        };

        StreamPair {
            cold: scale(self.dp.cold, m_dot.cold, self.m_dot.cold),
            hot: scale(self.dp.hot, m_dot.hot, self.m_dot.hot),
        }
    }

    /// Conductance at the given flows.
    ///
    /// Scales the design conductance by the mean flow ratio of the two
    /// streams to the 0.8 power. A stream with no design flow counts as
    /// running at its design flow.
    #[must_use]
    pub fn conductance(&self, m_dot: StreamPair<MassRate>) -> ThermalConductance {
        let flow_ratio = |m: MassRate, m_design: MassRate| {
            if m_design <= MassRate::ZERO {
                1.0
            } else {
                (m / m_design).get::<ratio>()
            }
        };

        let mean = 0.5
            * (flow_ratio(m_dot.cold, self.m_dot.cold) + flow_ratio(m_dot.hot, self.m_dot.hot));
        self.ua * mean.max(0.0).powf(CONDUCTANCE_EXPONENT)
    }
}
