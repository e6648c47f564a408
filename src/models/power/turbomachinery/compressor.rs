use thiserror::Error;
use tracing::trace;
use uom::si::{
    angular_velocity::radian_per_second,
    available_energy::joule_per_kilogram,
    f64::{AngularVelocity, Length, MassRate, Pressure, Ratio, ThermodynamicTemperature},
    length::meter,
    mass_density::kilogram_per_cubic_meter,
    mass_rate::kilogram_per_second,
    ratio::ratio,
    velocity::meter_per_second,
};

use crate::support::{
    thermo::{Properties, PropertyError, PropertyOracle},
    units::SpecificEnthalpy,
};

use super::map::{self, FLOW_COEFFICIENT_DESIGN, FLOW_COEFFICIENT_MIN};

/// A single-stage radial compressor sized at its design point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorDesign {
    pub rotor_diameter: Length,
    pub design_speed: AngularVelocity,

    /// Rotor tip speed over the outlet speed of sound.
    pub tip_speed_ratio: Ratio,

    /// Isentropic efficiency at the design point.
    pub design_efficiency: Ratio,
}

/// A compressor running away from its design point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorOperation {
    pub outlet: Properties,
    pub flow_coefficient: Ratio,
    pub efficiency: Ratio,
    pub tip_speed_ratio: Ratio,

    /// The flow coefficient fell below the surge limit and was clamped to it.
    pub surge: bool,
}

/// Errors from sizing or running a compressor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompressorError {
    /// The flow is too high for the shaft speed and the map gives no head.
    #[error("flow coefficient {flow_coefficient} gives no head (psi = {head_coefficient})")]
    NoHead {
        flow_coefficient: f64,
        head_coefficient: f64,
    },

    /// The flow is too low for the shaft speed and the discharge state does
    /// not exist.
    #[error("outlet state cannot be resolved")]
    Outlet(#[source] PropertyError),

    /// The inlet state does not exist; reported like excess flow.
    #[error("inlet state cannot be resolved")]
    Inlet(#[source] PropertyError),

    #[error(transparent)]
    Property(#[from] PropertyError),
}

impl CompressorError {
    /// Integer code for this failure.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::NoHead { .. } | Self::Inlet(_) => 1,
            Self::Outlet(_) => 2,
            Self::Property(_) => 3,
        }
    }
}

impl CompressorDesign {
    /// Sizes the compressor for its design inlet and outlet states.
    ///
    /// The rotor runs at the map's design flow coefficient, which fixes tip
    /// speed from the isentropic head and diameter from the volumetric flow.
    ///
    /// # Errors
    ///
    /// Returns [`CompressorError::Property`] if the isentropic outlet state
    /// cannot be resolved.
    pub fn size(
        oracle: &impl PropertyOracle,
        inlet: &Properties,
        outlet: &Properties,
        m_dot: MassRate,
    ) -> Result<Self, CompressorError> {
        let h_in = inlet.enthalpy.get::<joule_per_kilogram>();
        let h_out = outlet.enthalpy.get::<joule_per_kilogram>();
        let h_s_out = oracle
            .from_ps(outlet.pressure, inlet.entropy)?
            .enthalpy
            .get::<joule_per_kilogram>();

        let w_s = h_s_out - h_in;
        let u_tip = (w_s / map::design_head_coefficient()).sqrt();
        let diameter = (m_dot.get::<kilogram_per_second>()
            / (FLOW_COEFFICIENT_DESIGN
                * inlet.density.get::<kilogram_per_cubic_meter>()
                * u_tip))
            .sqrt();
        let speed = 2.0 * u_tip / diameter;

        Ok(Self {
            rotor_diameter: Length::new::<meter>(diameter),
            design_speed: AngularVelocity::new::<radian_per_second>(speed),
            tip_speed_ratio: Ratio::new::<ratio>(
                u_tip / outlet.sound_speed.get::<meter_per_second>(),
            ),
            design_efficiency: Ratio::new::<ratio>(w_s / (h_out - h_in)),
        })
    }

    /// Runs the compressor at a given inlet, flow, and shaft speed.
    ///
    /// The discharge pressure follows from the map head. A flow coefficient
    /// below the surge limit is clamped and flagged.
    ///
    /// # Errors
    ///
    /// Returns [`CompressorError::NoHead`] if the flow is too high for the
    /// speed, [`CompressorError::Outlet`] if the discharge state cannot be
    /// resolved, and [`CompressorError::Inlet`] for an unresolvable inlet.
    pub fn off_design(
        &self,
        oracle: &impl PropertyOracle,
        inlet_temperature: ThermodynamicTemperature,
        inlet_pressure: Pressure,
        m_dot: MassRate,
        speed: AngularVelocity,
    ) -> Result<CompressorOperation, CompressorError> {
        let inlet = oracle
            .from_tp(inlet_temperature, inlet_pressure)
            .map_err(CompressorError::Inlet)?;
        let h_in = inlet.enthalpy.get::<joule_per_kilogram>();

        let diameter = self.rotor_diameter.get::<meter>();
        let omega = speed.get::<radian_per_second>();
        let u_tip = 0.5 * diameter * omega;
        let mut phi = m_dot.get::<kilogram_per_second>()
            / (inlet.density.get::<kilogram_per_cubic_meter>() * u_tip * diameter * diameter);

        let surge = phi < FLOW_COEFFICIENT_MIN;
        if surge {
            phi = FLOW_COEFFICIENT_MIN;
        }

        let point = map::operating_point(phi, omega / self.design_speed.get::<radian_per_second>());
        let eta = (point.efficiency_ratio * self.design_efficiency.get::<ratio>()).max(0.0);
        if point.head_coefficient <= 0.0 {
            return Err(CompressorError::NoHead {
                flow_coefficient: phi,
                head_coefficient: point.head_coefficient,
            });
        }

        let dh_s = point.head_coefficient * u_tip * u_tip;
        let dh = dh_s / eta;
        trace!(phi, eta, dh_s, surge, "compressor map point");

        let p_out = oracle
            .from_hs(
                SpecificEnthalpy::new::<joule_per_kilogram>(h_in + dh_s),
                inlet.entropy,
            )
            .map_err(CompressorError::Outlet)?
            .pressure;
        let outlet = oracle
            .from_ph(p_out, SpecificEnthalpy::new::<joule_per_kilogram>(h_in + dh))
            .map_err(CompressorError::Outlet)?;

        Ok(CompressorOperation {
            outlet,
            flow_coefficient: Ratio::new::<ratio>(phi),
            efficiency: Ratio::new::<ratio>(eta),
            tip_speed_ratio: Ratio::new::<ratio>(
                u_tip / outlet.sound_speed.get::<meter_per_second>(),
            ),
            surge,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{
        angular_velocity::revolution_per_minute, pressure::megapascal,
        thermodynamic_temperature::kelvin,
    };

    use crate::models::power::turbomachinery::{Machine, outlet_state};
    use crate::support::thermo::{fluid::CarbonDioxide, model::PerfectGas};

    fn oracle() -> PerfectGas<CarbonDioxide> {
        PerfectGas::new().expect("carbon dioxide parameters are valid")
    }

    fn inlet_temperature() -> ThermodynamicTemperature {
        ThermodynamicTemperature::new::<kelvin>(305.0)
    }

    fn inlet_pressure() -> Pressure {
        Pressure::new::<megapascal>(7.7)
    }

    fn m_dot() -> MassRate {
        MassRate::new::<kilogram_per_second>(60.0)
    }

    fn sized(oracle: &PerfectGas<CarbonDioxide>) -> (CompressorDesign, Properties) {
        let states = outlet_state(
            oracle,
            Machine::Compressor,
            0.89,
            inlet_temperature(),
            inlet_pressure(),
            Pressure::new::<megapascal>(20.0),
        )
        .expect("valid compression");
        let design = CompressorDesign::size(oracle, &states.inlet, &states.outlet, m_dot())
            .expect("compressor sizes");
        (design, states.outlet)
    }

    #[test]
    fn sizing_recovers_design_efficiency() {
        let (design, _) = sized(&oracle());

        assert_relative_eq!(design.design_efficiency.get::<ratio>(), 0.89, max_relative = 1e-9);
        assert!(design.rotor_diameter.get::<meter>() > 0.0);
        assert!(design.design_speed.get::<revolution_per_minute>() > 0.0);
        assert!(design.tip_speed_ratio.get::<ratio>() > 0.0);
    }

    #[test]
    fn design_point_reproduces_design_outlet() {
        let oracle = oracle();
        let (design, outlet) = sized(&oracle);

        let op = design
            .off_design(
                &oracle,
                inlet_temperature(),
                inlet_pressure(),
                m_dot(),
                design.design_speed,
            )
            .expect("design point runs");

        assert!(!op.surge);
        assert_relative_eq!(
            op.flow_coefficient.get::<ratio>(),
            FLOW_COEFFICIENT_DESIGN,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            op.outlet.pressure.get::<megapascal>(),
            outlet.pressure.get::<megapascal>(),
            max_relative = 1e-9
        );
        // The normalized map efficiency is one at design to within 1e-6.
        assert_relative_eq!(
            op.outlet.temperature.get::<kelvin>(),
            outlet.temperature.get::<kelvin>(),
            max_relative = 1e-5
        );
    }

    #[test]
    fn low_flow_is_clamped_to_surge() {
        let oracle = oracle();
        let (design, _) = sized(&oracle);

        let op = design
            .off_design(
                &oracle,
                inlet_temperature(),
                inlet_pressure(),
                m_dot() * 0.5,
                design.design_speed,
            )
            .expect("surge is reported, not an error");

        assert!(op.surge);
        assert_relative_eq!(op.flow_coefficient.get::<ratio>(), FLOW_COEFFICIENT_MIN);
    }

    #[test]
    fn excessive_flow_has_no_head() {
        let oracle = oracle();
        let (design, _) = sized(&oracle);

        let error = design
            .off_design(
                &oracle,
                inlet_temperature(),
                inlet_pressure(),
                m_dot() * 2.5,
                design.design_speed,
            )
            .unwrap_err();

        assert!(matches!(error, CompressorError::NoHead { .. }));
        assert_eq!(error.code(), 1);
    }

    #[test]
    fn unresolvable_inlet_reads_as_excess_flow() {
        let oracle = oracle();
        let (design, _) = sized(&oracle);

        let error = design
            .off_design(
                &oracle,
                inlet_temperature(),
                Pressure::new::<megapascal>(0.0),
                m_dot(),
                design.design_speed,
            )
            .unwrap_err();

        assert!(matches!(error, CompressorError::Inlet(_)));
        assert_eq!(error.code(), 1);
    }

    #[test]
    fn faster_shaft_raises_discharge_pressure() {
        let oracle = oracle();
        let (design, _) = sized(&oracle);
        let run = |speed: AngularVelocity| {
            design
                .off_design(&oracle, inlet_temperature(), inlet_pressure(), m_dot(), speed)
                .expect("near-design operation")
                .outlet
                .pressure
        };

        assert!(run(design.design_speed * 1.05) > run(design.design_speed));
    }
}
