//! Mass and energy bookkeeping that differs between cycle topologies.

use uom::si::thermodynamic_temperature::degree_celsius;

use super::{
    super::{CycleStates, Node, Topology},
    enthalpy,
    recuperators::Flows,
    temperature,
};

/// Share of total heat input the heat shield stream should carry.
pub(super) const HEAT_SHIELD_FRACTION: f64 = 10.0 / 65.0;

/// Heat shield temperature rise band, K.
const SHIELD_DELTA_T: [f64; 2] = [150.0, 250.0];

/// Recompressor outlet temperature above which a bypass stream is penalized.
const BYPASS_OUTLET_LIMIT_C: f64 = 150.0;

/// Specific work of each machine, J/kg; negative for the compressors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct SpecificWork {
    pub(super) mc: f64,
    pub(super) rc: f64,
    pub(super) t: f64,
}

/// Cycle totals in W, with the efficiency after any penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Performance {
    pub(super) w_dot_net: f64,
    pub(super) q_dot_in: f64,
    pub(super) eta_thermal: f64,

    /// Heat picked up by a bypass or heat shield stream, W.
    pub(super) q_dot_shield: f64,
}

impl Topology {
    /// Turbine flow that delivers `w_dot_net` with the given specific work.
    pub(super) fn turbine_flow(self, w_dot_net: f64, work: &SpecificWork, recomp_frac: f64) -> f64 {
        match self {
            Self::Bypass => w_dot_net / (work.mc + work.t),
            Self::Standard | Self::Bypass150C | Self::HtrBypassHeatShield => {
                w_dot_net
                    / (work.mc * (1.0 - recomp_frac) + work.rc * recomp_frac + work.t)
            }
        }
    }

    /// Net power, heat input, and efficiency of a balanced cycle.
    pub(super) fn performance(
        self,
        work: &SpecificWork,
        flows: &Flows,
        states: &CycleStates,
        q_dot_phx: f64,
        tol: f64,
        ht_bypass_fraction: f64,
    ) -> Performance {
        let machines = work.mc * flows.mc + work.rc * flows.rc + work.t * flows.t;
        let h = |node: Node| enthalpy(&states[node]);

        match self {
            Self::Standard => Performance {
                w_dot_net: machines,
                q_dot_in: q_dot_phx,
                eta_thermal: machines / q_dot_phx,
                q_dot_shield: 0.0,
            },
            Self::Bypass => {
                let w_dot_net = (work.mc + work.t) * flows.t;
                let q_dot_shield = flows.rc * (h(Node::RcOutlet) - h(Node::McOutlet));
                let q_dot_in = q_dot_phx + q_dot_shield;
                let delta_t = temperature(&states[Node::RcOutlet])
                    - temperature(&states[Node::McOutlet]);

                Performance {
                    w_dot_net,
                    q_dot_in,
                    eta_thermal: w_dot_net / q_dot_in
                        * shield_penalty(delta_t, q_dot_shield / q_dot_in, tol),
                    q_dot_shield,
                }
            }
            Self::Bypass150C => {
                let t10 = states[Node::RcOutlet].temperature.get::<degree_celsius>();
                Performance {
                    w_dot_net: machines,
                    q_dot_in: q_dot_phx,
                    eta_thermal: machines / q_dot_phx * hot_outlet_penalty(t10),
                    q_dot_shield: 0.0,
                }
            }
            Self::HtrBypassHeatShield => {
                let q_dot_shield =
                    ht_bypass_fraction * flows.t * (h(Node::HtColdOutlet) - h(Node::Mixed));
                let q_dot_in = q_dot_phx + q_dot_shield;
                Performance {
                    w_dot_net: machines,
                    q_dot_in,
                    eta_thermal: machines / q_dot_in,
                    q_dot_shield,
                }
            }
        }
    }
}

/// Efficiency multiplier for a heat shield outside its temperature band or
/// away from its heat share.
fn shield_penalty(delta_t: f64, q_fraction: f64, tol: f64) -> f64 {
    let [low, high] = SHIELD_DELTA_T;
    let outside = (low - delta_t).max(0.0).max((delta_t - high).max(0.0));
    let off_share = ((q_fraction - HEAT_SHIELD_FRACTION).abs() - tol).max(0.0);
    (-outside).exp() * (-100.0 * off_share).exp()
}

fn hot_outlet_penalty(t10_celsius: f64) -> f64 {
    (-(t10_celsius - BYPASS_OUTLET_LIMIT_C).max(0.0)).exp()
}
