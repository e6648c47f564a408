use std::ops::Index;

use uom::{
    ConstZero,
    si::{
        f64::{MassRate, Pressure},
        thermal_conductance::watt_per_kelvin,
    },
};

use crate::models::thermal::hx::StreamPair;

use super::{
    super::{DesignParameters, Exchangers, Node},
    NO_RECUPERATOR,
    recuperators::Flows,
};

/// Pressure at every cycle node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Pressures([Pressure; 10]);

impl Pressures {
    /// Pressures set by the design compressor pressures and fixed drops.
    ///
    /// The high side is walked forward from the compressor outlet and the low
    /// side backward from the compressor inlet. An absent recuperator has no
    /// pressure drop.
    pub(super) fn design(params: &DesignParameters) -> Self {
        let has_lt = params.ua_lt.get::<watt_per_kelvin>() >= NO_RECUPERATOR;
        let has_ht = params.ua_ht.get::<watt_per_kelvin>() >= NO_RECUPERATOR;

        let p1 = params.p_mc_in;
        let p2 = params.p_mc_out;
        let p3 = if has_lt { params.dp_lt.cold.outlet(p2) } else { p2 };
        let p4 = p3;
        let p5 = if has_ht { params.dp_ht.cold.outlet(p4) } else { p4 };
        let p6 = params.dp_phx.outlet(p5);

        let p9 = params.dp_pc.inlet(p1);
        let p8 = if has_lt { params.dp_lt.hot.inlet(p9) } else { p9 };
        let p7 = if has_ht { params.dp_ht.hot.inlet(p8) } else { p8 };

        Self([p1, p2, p3, p4, p5, p6, p7, p8, p9, p3])
    }

    /// Pressures with drops scaled from the design records to the given flows.
    pub(super) fn off_design(
        p1: Pressure,
        p2: Pressure,
        exchangers: &Exchangers,
        flows: &Flows,
    ) -> Self {
        let (mc, t) = (flows.mc(), flows.t());
        let lt = exchangers.lt.pressure_drops(StreamPair::new(mc, t));
        let ht = exchangers.ht.pressure_drops(StreamPair::new(t, t));
        let phx = exchangers.phx.pressure_drops(StreamPair::new(t, MassRate::ZERO));
        let pc = exchangers.pc.pressure_drops(StreamPair::new(MassRate::ZERO, mc));

        let p3 = p2 - lt.cold;
        let p4 = p3;
        let p5 = p4 - ht.cold;
        let p6 = p5 - phx.cold;

        let p9 = p1 + pc.hot;
        let p8 = p9 + lt.hot;
        let p7 = p8 + ht.hot;

        Self([p1, p2, p3, p4, p5, p6, p7, p8, p9, p3])
    }
}

impl Index<Node> for Pressures {
    type Output = Pressure;

    fn index(&self, node: Node) -> &Pressure {
        &self.0[node as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{f64::ThermalConductance, pressure::kilopascal};

    use crate::models::power::recompression::{
        PressureDrop,
        test_support::{design_parameters, kpa},
    };

    fn params() -> DesignParameters {
        DesignParameters {
            p_mc_out: kpa(25_000.0),
            dp_lt: StreamPair::new(
                PressureDrop::Absolute(kpa(100.0)),
                PressureDrop::Relative(0.02),
            ),
            dp_ht: StreamPair::new(
                PressureDrop::Absolute(kpa(50.0)),
                PressureDrop::Absolute(kpa(40.0)),
            ),
            dp_pc: PressureDrop::Absolute(kpa(30.0)),
            dp_phx: PressureDrop::Absolute(kpa(60.0)),
            ..design_parameters()
        }
    }

    #[test]
    fn design_walks_both_sides_from_the_compressor() {
        let p = Pressures::design(&params());

        assert_relative_eq!(p[Node::LtColdOutlet].get::<kilopascal>(), 24_900.0);
        assert_relative_eq!(p[Node::Mixed].get::<kilopascal>(), 24_900.0);
        assert_relative_eq!(p[Node::RcOutlet].get::<kilopascal>(), 24_900.0);
        assert_relative_eq!(p[Node::HtColdOutlet].get::<kilopascal>(), 24_850.0);
        assert_relative_eq!(p[Node::TurbineInlet].get::<kilopascal>(), 24_790.0);

        assert_relative_eq!(p[Node::LtHotOutlet].get::<kilopascal>(), 7730.0);
        assert_relative_eq!(
            p[Node::HtHotOutlet].get::<kilopascal>(),
            7730.0 / 0.98,
            max_relative = 1e-12
        );
        assert_relative_eq!(
            p[Node::TurbineOutlet].get::<kilopascal>(),
            7730.0 / 0.98 + 40.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn absent_recuperators_have_no_pressure_drop() {
        let params = DesignParameters {
            ua_lt: ThermalConductance::ZERO,
            ua_ht: ThermalConductance::ZERO,
            ..params()
        };
        let p = Pressures::design(&params);

        assert_eq!(p[Node::LtColdOutlet], p[Node::McOutlet]);
        assert_eq!(p[Node::HtColdOutlet], p[Node::Mixed]);
        assert_eq!(p[Node::HtHotOutlet], p[Node::LtHotOutlet]);
        assert_eq!(p[Node::TurbineOutlet], p[Node::HtHotOutlet]);
    }
}
