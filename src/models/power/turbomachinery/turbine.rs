use thiserror::Error;
use uom::si::{
    angular_velocity::radian_per_second,
    area::square_meter,
    available_energy::joule_per_kilogram,
    f64::{
        AngularVelocity, Area, Length, MassRate, Pressure, Ratio, ThermodynamicTemperature,
    },
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

/// Tip speed over spouting velocity at the design point.
const VELOCITY_RATIO_DESIGN: f64 = 0.7476;

/// A radial inflow turbine sized at its design point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurbineDesign {
    pub rotor_diameter: Length,

    /// Effective nozzle area, which limits the mass flow at off-design.
    pub nozzle_area: Area,
    pub design_speed: AngularVelocity,

    /// Rotor tip speed over the inlet speed of sound.
    pub tip_speed_ratio: Ratio,
    pub design_efficiency: Ratio,
}

/// A turbine running away from its design point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurbineOperation {
    pub outlet: Properties,

    /// Mass flow the nozzle passes at this inlet state and pressure ratio.
    pub m_dot: MassRate,

    /// Tip speed over spouting velocity.
    pub velocity_ratio: Ratio,
    pub efficiency: Ratio,
    pub tip_speed_ratio: Ratio,
}

/// Errors from sizing or running a turbine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TurbineError {
    #[error("turbine needs a positive shaft speed, got {speed:?}")]
    NoShaftSpeed { speed: AngularVelocity },

    #[error(transparent)]
    Property(#[from] PropertyError),
}

impl TurbineError {
    /// Integer code for this failure.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::NoShaftSpeed { .. } => 7,
            Self::Property(_) => 3,
        }
    }
}

impl TurbineDesign {
    /// Sizes the turbine for its design states, flow, and shaft speed.
    ///
    /// # Errors
    ///
    /// Returns [`TurbineError::NoShaftSpeed`] unless `speed` is positive and
    /// finite, and [`TurbineError::Property`] if the isentropic outlet state
    /// cannot be resolved.
    pub fn size(
        oracle: &impl PropertyOracle,
        inlet: &Properties,
        outlet: &Properties,
        m_dot: MassRate,
        speed: AngularVelocity,
    ) -> Result<Self, TurbineError> {
        let omega = speed.get::<radian_per_second>();
        if !(omega.is_finite() && omega > 0.0) {
            return Err(TurbineError::NoShaftSpeed { speed });
        }

        let h_in = inlet.enthalpy.get::<joule_per_kilogram>();
        let h_out = outlet.enthalpy.get::<joule_per_kilogram>();
        let w_s = h_in
            - oracle
                .from_ps(outlet.pressure, inlet.entropy)?
                .enthalpy
                .get::<joule_per_kilogram>();

        let spouting = (2.0 * w_s).sqrt();
        let u_tip = VELOCITY_RATIO_DESIGN * spouting;

        Ok(Self {
            rotor_diameter: Length::new::<meter>(2.0 * u_tip / omega),
            nozzle_area: Area::new::<square_meter>(
                m_dot.get::<kilogram_per_second>()
                    / (spouting * inlet.density.get::<kilogram_per_cubic_meter>()),
            ),
            design_speed: speed,
            tip_speed_ratio: Ratio::new::<ratio>(
                u_tip / inlet.sound_speed.get::<meter_per_second>(),
            ),
            design_efficiency: Ratio::new::<ratio>((h_in - h_out) / w_s),
        })
    }

    /// Runs the turbine between the given pressures at a shaft speed.
    ///
    /// Efficiency follows a quartic in the velocity ratio, normalized to the
    /// design efficiency. The returned mass flow is what the nozzle passes;
    /// the caller decides how to reconcile it with the cycle flow.
    ///
    /// # Errors
    ///
    /// Returns [`TurbineError::Property`] if a state cannot be resolved.
    pub fn off_design(
        &self,
        oracle: &impl PropertyOracle,
        inlet_temperature: ThermodynamicTemperature,
        inlet_pressure: Pressure,
        outlet_pressure: Pressure,
        speed: AngularVelocity,
    ) -> Result<TurbineOperation, TurbineError> {
        let inlet = oracle.from_tp(inlet_temperature, inlet_pressure)?;
        let h_in = inlet.enthalpy.get::<joule_per_kilogram>();
        let w_s = h_in
            - oracle
                .from_ps(outlet_pressure, inlet.entropy)?
                .enthalpy
                .get::<joule_per_kilogram>();

        let spouting = (2.0 * w_s).sqrt();
        let u_tip = 0.5 * self.rotor_diameter.get::<meter>() * speed.get::<radian_per_second>();
        let nu = u_tip / spouting;

        let eta = efficiency_ratio(nu) * self.design_efficiency.get::<ratio>();
        let outlet = oracle.from_ph(
            outlet_pressure,
            SpecificEnthalpy::new::<joule_per_kilogram>(h_in - eta * w_s),
        )?;

        Ok(TurbineOperation {
            outlet,
            m_dot: MassRate::new::<kilogram_per_second>(
                spouting
                    * self.nozzle_area.get::<square_meter>()
                    * inlet.density.get::<kilogram_per_cubic_meter>(),
            ),
            velocity_ratio: Ratio::new::<ratio>(nu),
            efficiency: Ratio::new::<ratio>(eta),
            tip_speed_ratio: Ratio::new::<ratio>(
                u_tip / inlet.sound_speed.get::<meter_per_second>(),
            ),
        })
    }
}

/// Efficiency relative to design as a function of velocity ratio.
fn efficiency_ratio(nu: f64) -> f64 {
    ((((1.0626 * nu - 3.0874) * nu + 1.3668) * nu + 1.3567) * nu + 0.179_921_180).clamp(0.0, 1.0)
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

    fn sized(oracle: &PerfectGas<CarbonDioxide>) -> (TurbineDesign, Properties) {
        let states = outlet_state(
            oracle,
            Machine::Turbine,
            0.93,
            ThermodynamicTemperature::new::<kelvin>(823.0),
            Pressure::new::<megapascal>(19.6),
            Pressure::new::<megapascal>(7.9),
        )
        .expect("valid expansion");
        let design = TurbineDesign::size(
            oracle,
            &states.inlet,
            &states.outlet,
            MassRate::new::<kilogram_per_second>(100.0),
            AngularVelocity::new::<revolution_per_minute>(30_000.0),
        )
        .expect("turbine sizes");
        (design, states.outlet)
    }

    #[test]
    fn design_velocity_ratio_is_near_peak() {
        assert_relative_eq!(efficiency_ratio(VELOCITY_RATIO_DESIGN), 1.0, epsilon = 1e-3);
        assert!(efficiency_ratio(0.5) < efficiency_ratio(VELOCITY_RATIO_DESIGN));
        assert_eq!(efficiency_ratio(0.0), 0.179_921_180);
    }

    #[test]
    fn design_point_reproduces_flow_and_outlet() {
        let oracle = oracle();
        let (design, outlet) = sized(&oracle);

        assert_relative_eq!(design.design_efficiency.get::<ratio>(), 0.93, max_relative = 1e-9);

        let op = design
            .off_design(
                &oracle,
                ThermodynamicTemperature::new::<kelvin>(823.0),
                Pressure::new::<megapascal>(19.6),
                Pressure::new::<megapascal>(7.9),
                design.design_speed,
            )
            .expect("design point runs");

        assert_relative_eq!(op.m_dot.get::<kilogram_per_second>(), 100.0, max_relative = 1e-9);
        assert_relative_eq!(
            op.velocity_ratio.get::<ratio>(),
            VELOCITY_RATIO_DESIGN,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            op.outlet.temperature.get::<kelvin>(),
            outlet.temperature.get::<kelvin>(),
            max_relative = 1e-4
        );
    }

    #[test]
    fn lower_inlet_pressure_passes_less_flow() {
        let oracle = oracle();
        let (design, _) = sized(&oracle);

        let op = design
            .off_design(
                &oracle,
                ThermodynamicTemperature::new::<kelvin>(823.0),
                Pressure::new::<megapascal>(16.0),
                Pressure::new::<megapascal>(7.9),
                design.design_speed,
            )
            .expect("part load runs");

        assert!(op.m_dot.get::<kilogram_per_second>() < 100.0);
    }

    #[test]
    fn zero_speed_is_rejected() {
        let oracle = oracle();
        let states = outlet_state(
            &oracle,
            Machine::Turbine,
            0.93,
            ThermodynamicTemperature::new::<kelvin>(823.0),
            Pressure::new::<megapascal>(19.6),
            Pressure::new::<megapascal>(7.9),
        )
        .expect("valid expansion");

        let error = TurbineDesign::size(
            &oracle,
            &states.inlet,
            &states.outlet,
            MassRate::new::<kilogram_per_second>(100.0),
            AngularVelocity::new::<revolution_per_minute>(0.0),
        )
        .unwrap_err();

        assert_eq!(error.code(), 7);
    }
}
