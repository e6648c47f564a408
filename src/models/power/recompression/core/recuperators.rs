//! The two nested recuperator temperature loops.
//!
//! The outer loop iterates the HT recuperator hot outlet temperature (state
//! 8), the inner loop the LT recuperator hot outlet temperature (state 9).
//! At each inner trial the caller supplies the recompressor branch: states 9
//! and 10 and the mass flows that go with them. The loops are the same for
//! the design and off-design solves; only that branch differs.
//!
//! Each loop drives `UA_target − UA_needed` to zero. The residual grows with
//! the trial temperature, because a warmer hot outlet means less duty. A
//! trial that violates the second law moves the bracket up.

use uom::si::{
    f64::MassRate, temperature_interval::kelvin as delta_kelvin,
    thermal_conductance::watt_per_kelvin,
};

use crate::{
    models::thermal::hx::{AchievedUa, Duty, StreamPair, achieved_ua},
    support::{
        solve::secant::{self, Seed, Step},
        thermo::{Properties, PropertyOracle},
    },
};

use super::{
    super::{CycleError, CycleTolerances, Loop, MassFlows, Node},
    NO_RECOMPRESSION, NO_RECUPERATOR, enthalpy, kelvins, mass_rate,
    pressures::Pressures,
    specific_enthalpy, temperature, watts,
};

/// Branch mass flows, kg/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Flows {
    pub(super) mc: f64,
    pub(super) rc: f64,
    pub(super) t: f64,
}

impl Flows {
    /// Splits the turbine flow by recompression fraction.
    pub(super) fn split(m_t: f64, recomp_frac: f64) -> Self {
        let rc = m_t * recomp_frac;
        Self {
            mc: m_t - rc,
            rc,
            t: m_t,
        }
    }

    pub(super) fn mc(&self) -> MassRate {
        mass_rate(self.mc)
    }

    pub(super) fn t(&self) -> MassRate {
        mass_rate(self.t)
    }
}

impl From<Flows> for MassFlows {
    fn from(flows: Flows) -> Self {
        Self {
            main_compressor: mass_rate(flows.mc),
            recompressor: mass_rate(flows.rc),
            turbine: mass_rate(flows.t),
        }
    }
}

/// The recompressor side of the cycle at one trial state 9.
pub(super) struct Branch<T> {
    pub(super) state9: Properties,
    pub(super) state10: Properties,
    pub(super) flows: Flows,

    /// Whatever the caller needs back from the converged trial.
    pub(super) extra: T,
}

/// Duty and conductance of one recuperator, in W and W/K.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Exchange {
    pub(super) q_dot: f64,
    pub(super) ua: f64,
    pub(super) min_delta_t: f64,
}

impl Exchange {
    fn new(q_dot: f64, achieved: &AchievedUa) -> Self {
        Self {
            q_dot,
            ua: achieved.ua.get::<watt_per_kelvin>(),
            min_delta_t: achieved.min_delta_t.get::<delta_kelvin>(),
        }
    }
}

/// States and flows once both recuperators balance.
pub(super) struct Balance<T> {
    pub(super) state3: Properties,
    pub(super) state4: Properties,
    pub(super) state5: Properties,
    pub(super) state8: Properties,
    pub(super) state9: Properties,
    pub(super) state10: Properties,
    pub(super) flows: Flows,
    pub(super) extra: T,
    pub(super) lt: Exchange,
    pub(super) ht: Exchange,
}

struct LowSide<T> {
    branch: Branch<T>,
    lt: Exchange,
}

/// Fixed inputs of the recuperator loops.
pub(super) struct Recuperators<'a, O> {
    pub(super) oracle: &'a O,
    pub(super) pressures: &'a Pressures,

    /// Available conductances, W/K.
    pub(super) ua_lt: f64,
    pub(super) ua_ht: f64,

    pub(super) n_sub_hxrs: usize,
    pub(super) tol: f64,
    pub(super) tolerances: &'a CycleTolerances,
    pub(super) recomp_frac: f64,

    /// Fraction of the turbine flow through the HT recuperator cold side.
    pub(super) ht_cold_fraction: f64,
}

impl<O: PropertyOracle> Recuperators<'_, O> {
    /// Balances both recuperators between the compressor and turbine outlets.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError::NotConverged`] for either loop, and any
    /// non-recoverable error from the property oracle, the exchangers, or
    /// `branch`.
    pub(super) fn solve<T>(
        &self,
        state2: &Properties,
        state7: &Properties,
        mut branch: impl FnMut(f64) -> Result<Branch<T>, CycleError>,
    ) -> Result<Balance<T>, CycleError> {
        let (t2, t7) = (temperature(state2), temperature(state7));
        let has_ht = self.ua_ht >= NO_RECUPERATOR;
        let bracket = if has_ht { [t2, t7] } else { [t7, t7] };
        let p = self.pressures;

        let solution = secant::solve(
            bracket,
            Seed::at(0.5 * (t2 + t7)).with_prior(t7, self.ua_ht),
            &self.config(),
            |t8| -> Result<Step<Balance<T>>, CycleError> {
                let state8 = self.oracle.from_tp(kelvins(t8), p[Node::HtHotOutlet])?;
                let LowSide { branch: low, lt } =
                    self.solve_low(state2, &state8, &mut branch)?;
                let flows = low.flows;

                let h3 = enthalpy(state2) + lt.q_dot / flows.mc;
                let state3 = self
                    .oracle
                    .from_ph(p[Node::LtColdOutlet], specific_enthalpy(h3))?;
                let state4 = if self.recomp_frac >= NO_RECOMPRESSION {
                    let f = self.recomp_frac;
                    let h4 = (1.0 - f) * h3 + f * enthalpy(&low.state10);
                    self.oracle.from_ph(p[Node::Mixed], specific_enthalpy(h4))?
                } else {
                    state3
                };

                if temperature(&state4) >= t8 {
                    return Ok(Step::Raise);
                }

                let q_ht = if has_ht {
                    flows.t * (enthalpy(state7) - enthalpy(&state8))
                } else {
                    0.0
                };
                let m_ht_cold = self.ht_cold_fraction * flows.t;
                let duty = Duty {
                    q_dot: watts(q_ht),
                    m_dot: StreamPair::new(mass_rate(m_ht_cold), flows.t()),
                    inlet_temperature: StreamPair::new(state4.temperature, state7.temperature),
                    inlet_pressure: StreamPair::new(p[Node::Mixed], p[Node::TurbineOutlet]),
                    outlet_pressure: StreamPair::new(
                        p[Node::HtColdOutlet],
                        p[Node::HtHotOutlet],
                    ),
                };
                let achieved = match achieved_ua(self.oracle, self.n_sub_hxrs, &duty) {
                    Ok(achieved) => achieved,
                    Err(error) if error.is_second_law() => return Ok(Step::Raise),
                    Err(error) => return Err(error.into()),
                };
                let ht = Exchange::new(q_ht, &achieved);

                let h5 = enthalpy(&state4) + q_ht / m_ht_cold;
                let state5 = self
                    .oracle
                    .from_ph(p[Node::HtColdOutlet], specific_enthalpy(h5))?;

                Ok(self.judge(
                    self.ua_ht,
                    &ht,
                    Balance {
                        state3,
                        state4,
                        state5,
                        state8,
                        state9: low.state9,
                        state10: low.state10,
                        flows,
                        extra: low.extra,
                        lt,
                        ht,
                    },
                ))
            },
        )
        .map_err(|error| {
            error.or_else(|| {
                CycleError::not_converged(Loop::HighTemperature, self.tolerances.max_iters)
            })
        })?;

        Ok(solution.value)
    }

    /// Balances the LT recuperator for a fixed state 8.
    fn solve_low<T, F>(
        &self,
        state2: &Properties,
        state8: &Properties,
        branch: &mut F,
    ) -> Result<LowSide<T>, CycleError>
    where
        F: FnMut(f64) -> Result<Branch<T>, CycleError>,
    {
        let (t2, t8) = (temperature(state2), temperature(state8));
        let has_lt = self.ua_lt >= NO_RECUPERATOR;
        let bracket = if has_lt { [t2, t8] } else { [t8, t8] };
        let p = self.pressures;

        let solution = secant::solve(
            bracket,
            Seed::at(0.5 * (t2 + t8)).with_prior(t8, self.ua_lt),
            &self.config(),
            |t9| -> Result<Step<LowSide<T>>, CycleError> {
                let trial = branch(t9)?;
                let flows = trial.flows;

                let q_lt = if has_lt {
                    flows.t * (enthalpy(state8) - enthalpy(&trial.state9))
                } else {
                    0.0
                };
                let duty = Duty {
                    q_dot: watts(q_lt),
                    m_dot: StreamPair::new(flows.mc(), flows.t()),
                    inlet_temperature: StreamPair::new(state2.temperature, state8.temperature),
                    inlet_pressure: StreamPair::new(p[Node::McOutlet], p[Node::HtHotOutlet]),
                    outlet_pressure: StreamPair::new(
                        p[Node::LtColdOutlet],
                        p[Node::LtHotOutlet],
                    ),
                };
                let achieved = match achieved_ua(self.oracle, self.n_sub_hxrs, &duty) {
                    Ok(achieved) => achieved,
                    Err(error) if error.is_second_law() => return Ok(Step::Raise),
                    Err(error) => return Err(error.into()),
                };
                let lt = Exchange::new(q_lt, &achieved);

                Ok(self.judge(self.ua_lt, &lt, LowSide { branch: trial, lt }))
            },
        )
        .map_err(|error| {
            error.or_else(|| {
                CycleError::not_converged(Loop::LowTemperature, self.tolerances.max_iters)
            })
        })?;

        Ok(solution.value)
    }

    /// Accepts a trial whose needed conductance is close enough to the target.
    ///
    /// Needing more than the target must be within `tol`. Needing less is also
    /// accepted once the recuperator is pinched.
    fn judge<P>(&self, target: f64, exchange: &Exchange, payload: P) -> Step<P> {
        let residual = target - exchange.ua;
        if residual.abs() < NO_RECUPERATOR {
            return Step::Converged(payload);
        }

        let relative = residual.abs() / target;
        let pinched =
            exchange.min_delta_t < self.tolerances.temperature_tol.get::<delta_kelvin>();
        if relative < self.tol || (residual > 0.0 && pinched) {
            return Step::Converged(payload);
        }

        Step::Residual(residual, payload)
    }

    fn config(&self) -> secant::Config {
        secant::Config {
            max_iters: self.tolerances.max_iters,
            ..secant::Config::default()
        }
    }
}
