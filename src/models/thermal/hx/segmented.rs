//! Achieved conductance from a sub-segmented energy balance.
//!
//! The exchanger is split into `N` segments of equal duty. Pressure and
//! enthalpy vary linearly between the stream terminals, temperatures come from
//! the property oracle at each node, and each segment contributes
//! `NTU·C_min` from the counter-flow effectiveness-NTU relation. Summing the
//! segments captures the strong variation of `cp` in supercritical CO2 that a
//! single lumped NTU would miss.

use uom::{
    ConstZero,
    si::{
        available_energy::joule_per_kilogram,
        f64::{
            MassRate, Power, Pressure, TemperatureInterval, ThermalConductance,
            ThermodynamicTemperature,
        },
        mass_rate::kilogram_per_second,
        power::watt,
        pressure::pascal,
        temperature_interval::kelvin as delta_kelvin,
        thermal_conductance::watt_per_kelvin,
        thermodynamic_temperature::kelvin,
    },
};

use crate::support::{
    thermo::PropertyOracle,
    units::{SpecificEnthalpy, TemperatureDifference},
};

use super::{HxError, StreamPair};

/// Duties at or below this many watts are treated as no heat transfer.
const NEGLIGIBLE_DUTY: f64 = 1e-14;

/// Segments whose capacitance rates differ by less than this fraction are
/// treated as balanced.
const BALANCED_STREAMS: f64 = 1e-8;

/// Terminal conditions of a counter-flow exchanger with a known duty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Duty {
    pub q_dot: Power,
    pub m_dot: StreamPair<MassRate>,
    pub inlet_temperature: StreamPair<ThermodynamicTemperature>,
    pub inlet_pressure: StreamPair<Pressure>,
    pub outlet_pressure: StreamPair<Pressure>,
}

/// Conductance needed to transfer a duty, and the tightest approach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AchievedUa {
    pub ua: ThermalConductance,

    /// Smallest hot-minus-cold temperature difference over all nodes.
    pub min_delta_t: TemperatureInterval,
}

/// Computes the conductance an exchanger needs to transfer `duty`.
///
/// # Errors
///
/// Rejects a negative duty, a hot inlet colder than the cold inlet, and
/// pressures that rise through either stream. Returns
/// [`HxError::SecondLaw`] if any node has the cold stream at or above the hot
/// stream temperature, and property failures tagged by where they happened.
pub fn achieved_ua(
    oracle: &impl PropertyOracle,
    n_segments: usize,
    duty: &Duty,
) -> Result<AchievedUa, HxError> {
    let q = duty.q_dot.get::<watt>();
    if q < 0.0 {
        return Err(HxError::NegativeDuty { q_dot: duty.q_dot });
    }

    let t_in = duty.inlet_temperature;
    if t_in.hot < t_in.cold {
        return Err(HxError::InletTemperatures {
            cold: t_in.cold,
            hot: t_in.hot,
        });
    }

    let (p_in, p_out) = (duty.inlet_pressure, duty.outlet_pressure);
    if p_in.hot < p_out.hot {
        return Err(HxError::HotPressureRise {
            inlet: p_in.hot,
            outlet: p_out.hot,
        });
    }
    if p_in.cold < p_out.cold {
        return Err(HxError::ColdPressureRise {
            inlet: p_in.cold,
            outlet: p_out.cold,
        });
    }

    if q <= NEGLIGIBLE_DUTY {
        return Ok(AchievedUa {
            ua: ThermalConductance::ZERO,
            min_delta_t: t_in.hot.minus(t_in.cold),
        });
    }

    let cold_in = oracle
        .from_tp(t_in.cold, p_in.cold)
        .map_err(HxError::ColdInlet)?;
    let hot_in = oracle
        .from_tp(t_in.hot, p_in.hot)
        .map_err(HxError::HotInlet)?;

    let m_c = duty.m_dot.cold.get::<kilogram_per_second>();
    let m_h = duty.m_dot.hot.get::<kilogram_per_second>();
    let h_c_in = cold_in.enthalpy.get::<joule_per_kilogram>();
    let h_h_in = hot_in.enthalpy.get::<joule_per_kilogram>();
    let h_c_out = h_c_in + q / m_c;
    let h_h_out = h_h_in - q / m_h;

    let n = n_segments.max(1);
    let fraction = |i: usize| i as f64 / n as f64;

    // Node 0 is the hot inlet / cold outlet end; node n is the cold inlet end.
    let mut nodes = Vec::with_capacity(n + 1);
    for i in 0..=n {
        let f = fraction(i);
        let h_c = h_c_out + f * (h_c_in - h_c_out);
        let h_h = h_h_in + f * (h_h_out - h_h_in);

        let t_h = if i == 0 {
            t_in.hot.get::<kelvin>()
        } else {
            let p_h = p_in.hot.get::<pascal>() - f * (p_in.hot - p_out.hot).get::<pascal>();
            oracle
                .from_ph(
                    Pressure::new::<pascal>(p_h),
                    SpecificEnthalpy::new::<joule_per_kilogram>(h_h),
                )
                .map_err(|source| HxError::HotNode { node: i, source })?
                .temperature
                .get::<kelvin>()
        };

        let t_c = if i == n {
            t_in.cold.get::<kelvin>()
        } else {
            let p_c = p_out.cold.get::<pascal>() + f * (p_in.cold - p_out.cold).get::<pascal>();
            oracle
                .from_ph(
                    Pressure::new::<pascal>(p_c),
                    SpecificEnthalpy::new::<joule_per_kilogram>(h_c),
                )
                .map_err(|source| HxError::ColdNode { node: i, source })?
                .temperature
                .get::<kelvin>()
        };

        nodes.push(Node { h_c, h_h, t_c, t_h });
    }

    let mut min_delta_t = f64::INFINITY;
    for (i, node) in nodes.iter().enumerate() {
        let delta_t = node.t_h - node.t_c;
        min_delta_t = min_delta_t.min(delta_t);
        if delta_t <= 0.0 {
            return Err(HxError::SecondLaw {
                node: i,
                min_delta_t: TemperatureInterval::new::<delta_kelvin>(delta_t),
            });
        }
    }

    let q_segment = q / n as f64;
    let mut ua = 0.0;
    for (segment, pair) in nodes.windows(2).enumerate() {
        let (hot_end, cold_end) = (&pair[0], &pair[1]);

        let c_h = m_h * (hot_end.h_h - cold_end.h_h) / (hot_end.t_h - cold_end.t_h);
        let c_c = m_c * (hot_end.h_c - cold_end.h_c) / (hot_end.t_c - cold_end.t_c);
        let c_min = c_c.min(c_h);
        let c_max = c_c.max(c_h);

        // The log form of counter-flow NTU loses all precision as C_r -> 1.
        let c_max = if c_max - c_min <= BALANCED_STREAMS * c_max {
            c_min
        } else {
            c_max
        };

        let effectiveness = q_segment / (c_min * (hot_end.t_h - cold_end.t_c));
        let ntu = counter_flow_ntu(effectiveness, c_min, c_max)
            .ok_or(HxError::Conductance { segment })?;
        ua += ntu * c_min;
    }

    if ua.is_nan() {
        return Err(HxError::Conductance { segment: n });
    }

    Ok(AchievedUa {
        ua: ThermalConductance::new::<watt_per_kelvin>(ua),
        min_delta_t: TemperatureInterval::new::<delta_kelvin>(min_delta_t),
    })
}

/// Counter-flow NTU for a segment, or `None` if the capacitance rates are
/// not positive or the effectiveness falls outside `[0, 1]`.
fn counter_flow_ntu(effectiveness: f64, c_min: f64, c_max: f64) -> Option<f64> {
    if !(c_min > 0.0 && c_max >= c_min) || !(0.0..=1.0).contains(&effectiveness) {
        return None;
    }
    let c_r = c_min / c_max;
    if c_r < 1.0 {
        Some(((1.0 - effectiveness * c_r) / (1.0 - effectiveness)).ln() / (1.0 - c_r))
    } else {
        Some(effectiveness / (1.0 - effectiveness))
    }
}

struct Node {
    h_c: f64,
    h_h: f64,
    t_c: f64,
    t_h: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{power::kilowatt, pressure::megapascal};

    use crate::support::thermo::{fluid::CarbonDioxide, model::PerfectGas};

    const CP: f64 = 844.0;

    fn oracle() -> PerfectGas<CarbonDioxide> {
        PerfectGas::new().expect("carbon dioxide parameters are valid")
    }

    fn balanced(q_dot_w: f64) -> Duty {
        Duty {
            q_dot: Power::new::<watt>(q_dot_w),
            m_dot: StreamPair::new(
                MassRate::new::<kilogram_per_second>(10.0),
                MassRate::new::<kilogram_per_second>(10.0),
            ),
            inlet_temperature: StreamPair::new(
                ThermodynamicTemperature::new::<kelvin>(400.0),
                ThermodynamicTemperature::new::<kelvin>(600.0),
            ),
            inlet_pressure: StreamPair::new(
                Pressure::new::<megapascal>(20.0),
                Pressure::new::<megapascal>(8.0),
            ),
            outlet_pressure: StreamPair::new(
                Pressure::new::<megapascal>(20.0),
                Pressure::new::<megapascal>(8.0),
            ),
        }
    }

    #[test]
    fn zero_duty_needs_no_conductance() {
        let result = achieved_ua(&oracle(), 10, &balanced(0.0)).expect("zero duty is valid");

        assert_eq!(result.ua, ThermalConductance::ZERO);
        assert_relative_eq!(result.min_delta_t.get::<delta_kelvin>(), 200.0);
    }

    #[test]
    fn balanced_constant_cp_matches_closed_form() {
        // Equal capacitance rates keep ΔT uniform at 50 K, so UA = Q / ΔT.
        let q = 10.0 * CP * 150.0;
        let result = achieved_ua(&oracle(), 10, &balanced(q)).expect("feasible duty");

        assert_relative_eq!(
            result.ua.get::<watt_per_kelvin>(),
            q / 50.0,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            result.min_delta_t.get::<delta_kelvin>(),
            50.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn more_duty_needs_more_conductance() {
        let oracle = oracle();
        let small = achieved_ua(&oracle, 10, &balanced(10.0 * CP * 100.0)).unwrap();
        let large = achieved_ua(&oracle, 10, &balanced(10.0 * CP * 180.0)).unwrap();

        assert!(large.ua > small.ua);
        assert!(large.min_delta_t < small.min_delta_t);
    }

    #[test]
    fn excessive_duty_is_a_second_law_violation() {
        let error = achieved_ua(&oracle(), 10, &balanced(10.0 * CP * 250.0)).unwrap_err();

        assert!(error.is_second_law());
        assert_eq!(error.code(), 11);
    }

    #[test]
    fn rejects_invalid_terminal_conditions() {
        let oracle = oracle();

        let mut duty = balanced(0.0);
        duty.q_dot = Power::new::<kilowatt>(-1.0);
        assert_eq!(achieved_ua(&oracle, 10, &duty).unwrap_err().code(), 4);

        let mut duty = balanced(1000.0);
        duty.inlet_temperature.hot = ThermodynamicTemperature::new::<kelvin>(350.0);
        assert_eq!(achieved_ua(&oracle, 10, &duty).unwrap_err().code(), 5);

        let mut duty = balanced(1000.0);
        duty.outlet_pressure.hot = Pressure::new::<megapascal>(9.0);
        assert_eq!(achieved_ua(&oracle, 10, &duty).unwrap_err().code(), 6);

        let mut duty = balanced(1000.0);
        duty.outlet_pressure.cold = Pressure::new::<megapascal>(21.0);
        assert_eq!(achieved_ua(&oracle, 10, &duty).unwrap_err().code(), 7);
    }

    #[test]
    fn counter_flow_ntu_limits() {
        assert_relative_eq!(counter_flow_ntu(0.5, 1.0, 1.0).unwrap(), 1.0);
        assert_relative_eq!(
            counter_flow_ntu(0.5, 1.0, f64::INFINITY).unwrap(),
            2.0_f64.ln(),
            max_relative = 1e-12
        );
        assert!(counter_flow_ntu(1.2, 1.0, 2.0).is_none());
        assert!(counter_flow_ntu(0.5, 0.0, 2.0).is_none());
    }
}
