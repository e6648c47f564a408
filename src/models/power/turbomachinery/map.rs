//! Dimensionless performance map of the Sandia radial compressor.
//!
//! The map is a pair of quartic fits in the modified flow coefficient
//! `φ* = φ·(N/N_d)^0.2`: one for the modified head coefficient `ψ*` and one
//! for the modified efficiency `η*`. Speed corrections recover the actual
//! head coefficient and an efficiency normalized to one at the design point.

/// Flow coefficient at the peak of the efficiency curve.
pub const FLOW_COEFFICIENT_DESIGN: f64 = 0.02971;

/// Approximate surge limit.
pub const FLOW_COEFFICIENT_MIN: f64 = 0.02;

/// Approximate zero-head flow coefficient.
pub const FLOW_COEFFICIENT_MAX: f64 = 0.05;

/// Scales `η*` so the normalized efficiency is one at the design point.
const EFFICIENCY_NORMALIZATION: f64 = 1.47528;

/// Head coefficient and normalized efficiency at one operating point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct MapPoint {
    pub head_coefficient: f64,
    pub efficiency_ratio: f64,
}

/// Evaluates the map at flow coefficient `phi` and speed ratio `N/N_d`.
pub(super) fn operating_point(phi: f64, speed_ratio: f64) -> MapPoint {
    let phi_star = phi * speed_ratio.powf(0.2);
    let shape = 20.0 * phi_star;

    MapPoint {
        head_coefficient: modified_head(phi_star) * speed_ratio.powf(shape.powi(3)),
        efficiency_ratio: modified_efficiency(phi_star)
            * EFFICIENCY_NORMALIZATION
            * speed_ratio.powf(shape.powi(5)),
    }
}

/// Head coefficient at the design flow coefficient and speed.
pub(super) fn design_head_coefficient() -> f64 {
    modified_head(FLOW_COEFFICIENT_DESIGN)
}

fn modified_head(phi_star: f64) -> f64 {
    ((((-498_626.0 * phi_star) + 53_224.0) * phi_star - 2505.0) * phi_star + 54.6) * phi_star
        + 0.04049
}

fn modified_efficiency(phi_star: f64) -> f64 {
    ((((-1.638e6 * phi_star) + 182_725.0) * phi_star - 8089.0) * phi_star + 168.6) * phi_star
        - 0.7069
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn design_point_is_normalized() {
        let point = operating_point(FLOW_COEFFICIENT_DESIGN, 1.0);

        assert_relative_eq!(point.efficiency_ratio, 1.0, epsilon = 1e-3);
        assert_relative_eq!(point.head_coefficient, design_head_coefficient());
    }

    #[test]
    fn head_falls_with_flow() {
        let low = operating_point(FLOW_COEFFICIENT_MIN, 1.0);
        let high = operating_point(FLOW_COEFFICIENT_MAX, 1.0);

        assert!(low.head_coefficient > high.head_coefficient);
        assert!(high.head_coefficient > 0.0);
        assert!(operating_point(0.06, 1.0).head_coefficient < 0.0);
    }

    #[test]
    fn efficiency_peaks_near_design_flow() {
        let design = operating_point(FLOW_COEFFICIENT_DESIGN, 1.0).efficiency_ratio;

        assert!(operating_point(0.022, 1.0).efficiency_ratio < design);
        assert!(operating_point(0.045, 1.0).efficiency_ratio < design);
    }

    #[test]
    fn speed_correction_vanishes_at_design_speed() {
        let phi = 0.035;
        let point = operating_point(phi, 1.0);

        assert_relative_eq!(point.head_coefficient, modified_head(phi));
        assert_relative_eq!(
            point.efficiency_ratio,
            modified_efficiency(phi) * EFFICIENCY_NORMALIZATION
        );
    }
}
