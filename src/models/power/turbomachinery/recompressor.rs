use thiserror::Error;
use tracing::{debug, trace};
use uom::si::{
    angular_velocity::radian_per_second,
    available_energy::joule_per_kilogram,
    f64::{AngularVelocity, Length, MassRate, Pressure, Ratio, ThermodynamicTemperature},
    length::meter,
    mass_density::kilogram_per_cubic_meter,
    mass_rate::kilogram_per_second,
    pressure::pascal,
    ratio::ratio,
    velocity::meter_per_second,
};

use crate::support::{
    solve::secant::{self, FirstStep, Seed, Step},
    thermo::{Properties, PropertyError, PropertyOracle},
    units::SpecificEnthalpy,
};

use super::map::{self, FLOW_COEFFICIENT_DESIGN, FLOW_COEFFICIENT_MAX, FLOW_COEFFICIENT_MIN};

/// Sizing and off-design iterations converge to this tolerance.
const TOLERANCE: f64 = 1e-8;

/// Off-design discharge pressure tolerance, relative to the target.
const PRESSURE_REL_TOL: f64 = 1e-9;

const MAX_ITERS: usize = 100;

/// A two-stage radial recompressor sized at its design point.
///
/// Both stages share a shaft and run at the design flow coefficient with the
/// same isentropic stage efficiency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecompressorDesign {
    pub first_stage_diameter: Length,
    pub second_stage_diameter: Length,
    pub design_speed: AngularVelocity,

    /// Isentropic efficiency of each stage.
    pub stage_efficiency: Ratio,

    /// Overall isentropic efficiency at the design point.
    pub design_efficiency: Ratio,

    /// Largest stage tip speed over its discharge speed of sound.
    pub tip_speed_ratio: Ratio,
}

/// A recompressor running away from its design point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecompressorOperation {
    pub outlet: Properties,

    /// Shaft speed needed to reach the requested discharge pressure.
    pub speed: AngularVelocity,

    /// Flow coefficient of the first and second stage.
    pub flow_coefficients: [Ratio; 2],

    /// Overall isentropic efficiency.
    pub efficiency: Ratio,
    pub tip_speed_ratio: Ratio,

    /// Either stage runs below the surge flow coefficient.
    pub surge: bool,
}

/// Errors from sizing or running a recompressor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecompressorError {
    #[error("recompressor iteration did not converge")]
    NotConverged,

    #[error(transparent)]
    Property(#[from] PropertyError),
}

impl RecompressorError {
    /// Integer code for this failure.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::NotConverged => 1,
            Self::Property(_) => 3,
        }
    }
}

/// Geometry found for one interstage pressure during sizing.
#[derive(Debug, Clone, Copy)]
struct Stages {
    d1: f64,
    d2: f64,
    omega: f64,
    eta_required: f64,
    tip_speed_ratio: f64,
}

/// One converged off-design shaft condition.
#[derive(Debug, Clone, Copy)]
struct Running {
    omega: f64,
    phi: [f64; 2],
    p_out: f64,
    h_out: f64,
    tip_speeds: [f64; 2],
    sound_speed_int: f64,
}

impl RecompressorDesign {
    /// Sizes both stages for the design inlet and outlet states.
    ///
    /// For a trial stage efficiency, the interstage pressure is found where
    /// the second stage also runs at the design flow coefficient on the
    /// common shaft. The stage efficiency is then relaxed toward the one the
    /// second stage needs to reach the design outlet enthalpy, until the two
    /// agree.
    ///
    /// # Errors
    ///
    /// Returns [`RecompressorError::NotConverged`] if either iteration fails
    /// and [`RecompressorError::Property`] for an unresolvable state.
    pub fn size(
        oracle: &impl PropertyOracle,
        inlet: &Properties,
        outlet: &Properties,
        m_dot: MassRate,
    ) -> Result<Self, RecompressorError> {
        let h_in = inlet.enthalpy.get::<joule_per_kilogram>();
        let h_out = outlet.enthalpy.get::<joule_per_kilogram>();
        let h_s_out = oracle
            .from_ps(outlet.pressure, inlet.entropy)?
            .enthalpy
            .get::<joule_per_kilogram>();
        let design_efficiency = (h_s_out - h_in) / (h_out - h_in);

        let mut eta_stage = design_efficiency;
        for outer in 1..=MAX_ITERS {
            let stages = size_at_stage_efficiency(oracle, inlet, outlet, m_dot, eta_stage)?;
            trace!(outer, eta_stage, eta_required = stages.eta_required, "recompressor stages");

            if (eta_stage - stages.eta_required).abs() <= TOLERANCE {
                debug!(
                    d1 = stages.d1,
                    d2 = stages.d2,
                    omega = stages.omega,
                    eta_stage,
                    "recompressor sized"
                );
                return Ok(Self {
                    first_stage_diameter: Length::new::<meter>(stages.d1),
                    second_stage_diameter: Length::new::<meter>(stages.d2),
                    design_speed: AngularVelocity::new::<radian_per_second>(stages.omega),
                    stage_efficiency: Ratio::new::<ratio>(eta_stage),
                    design_efficiency: Ratio::new::<ratio>(design_efficiency),
                    tip_speed_ratio: Ratio::new::<ratio>(stages.tip_speed_ratio),
                });
            }
            eta_stage = 0.5 * (eta_stage + stages.eta_required);
        }

        Err(RecompressorError::NotConverged)
    }

    /// Finds the shaft speed that delivers `outlet_pressure` at the given
    /// inlet and flow.
    ///
    /// Iterates on the first-stage flow coefficient: it fixes tip speed and
    /// shaft speed, the map gives the first-stage discharge, and the second
    /// stage then runs at the same shaft speed.
    ///
    /// # Errors
    ///
    /// Returns [`RecompressorError::NotConverged`] if no speed reaches the
    /// outlet pressure and [`RecompressorError::Property`] for an
    /// unresolvable state.
    pub fn off_design(
        &self,
        oracle: &impl PropertyOracle,
        inlet_temperature: ThermodynamicTemperature,
        inlet_pressure: Pressure,
        m_dot: MassRate,
        outlet_pressure: Pressure,
    ) -> Result<RecompressorOperation, RecompressorError> {
        let inlet = oracle.from_tp(inlet_temperature, inlet_pressure)?;
        let p_target = outlet_pressure.get::<pascal>();

        let config = secant::Config {
            max_iters: MAX_ITERS,
            first_step: FirstStep::Perturb(1e-4),
            ..secant::Config::default()
        };
        let solution = secant::solve(
            [0.1 * FLOW_COEFFICIENT_MIN, 2.0 * FLOW_COEFFICIENT_MAX],
            Seed::at(FLOW_COEFFICIENT_DESIGN),
            &config,
            |phi_1| -> Result<Step<Running>, RecompressorError> {
                let Some(running) = self.run(oracle, &inlet, m_dot, phi_1)? else {
                    return Ok(if phi_1 > FLOW_COEFFICIENT_DESIGN {
                        Step::Lower
                    } else {
                        Step::Raise
                    });
                };
                let residual = p_target - running.p_out;
                if residual.abs() / p_target <= PRESSURE_REL_TOL {
                    Ok(Step::Converged(running))
                } else {
                    Ok(Step::Residual(residual, running))
                }
            },
        )
        .map_err(|error| error.or_else(|| RecompressorError::NotConverged))?;

        let running = solution.value;
        let p_out = Pressure::new::<pascal>(running.p_out);
        let outlet = oracle.from_ph(
            p_out,
            SpecificEnthalpy::new::<joule_per_kilogram>(running.h_out),
        )?;
        let h_in = inlet.enthalpy.get::<joule_per_kilogram>();
        let h_s_out = oracle
            .from_ps(p_out, inlet.entropy)?
            .enthalpy
            .get::<joule_per_kilogram>();

        let [u1, u2] = running.tip_speeds;
        let tip_speed_ratio = (u1 / running.sound_speed_int)
            .max(u2 / outlet.sound_speed.get::<meter_per_second>());

        Ok(RecompressorOperation {
            outlet,
            speed: AngularVelocity::new::<radian_per_second>(running.omega),
            flow_coefficients: running.phi.map(Ratio::new::<ratio>),
            efficiency: Ratio::new::<ratio>((h_s_out - h_in) / (running.h_out - h_in)),
            tip_speed_ratio: Ratio::new::<ratio>(tip_speed_ratio),
            surge: running.phi.iter().any(|&phi| phi < FLOW_COEFFICIENT_MIN),
        })
    }

    /// Runs both stages with first-stage flow coefficient `phi_1`.
    ///
    /// Returns `None` if either stage is off the usable part of the map.
    fn run(
        &self,
        oracle: &impl PropertyOracle,
        inlet: &Properties,
        m_dot: MassRate,
        phi_1: f64,
    ) -> Result<Option<Running>, PropertyError> {
        let m = m_dot.get::<kilogram_per_second>();
        let d1 = self.first_stage_diameter.get::<meter>();
        let d2 = self.second_stage_diameter.get::<meter>();
        let omega_design = self.design_speed.get::<radian_per_second>();
        let eta_design = self.stage_efficiency.get::<ratio>();

        let u1 = m / (phi_1 * inlet.density.get::<kilogram_per_cubic_meter>() * d1 * d1);
        let omega = 2.0 * u1 / d1;
        let speed_ratio = omega / omega_design;

        let point_1 = map::operating_point(phi_1, speed_ratio);
        let eta_1 = point_1.efficiency_ratio * eta_design;
        if point_1.head_coefficient <= 0.0 || eta_1 <= 0.0 {
            return Ok(None);
        }
        let dh_s_1 = point_1.head_coefficient * u1 * u1;
        let h_in = inlet.enthalpy.get::<joule_per_kilogram>();

        let p_int = oracle
            .from_hs(
                SpecificEnthalpy::new::<joule_per_kilogram>(h_in + dh_s_1),
                inlet.entropy,
            )?
            .pressure;
        let h_int = h_in + dh_s_1 / eta_1;
        let interstage =
            oracle.from_ph(p_int, SpecificEnthalpy::new::<joule_per_kilogram>(h_int))?;

        let u2 = 0.5 * d2 * omega;
        let phi_2 =
            m / (interstage.density.get::<kilogram_per_cubic_meter>() * u2 * d2 * d2);
        let point_2 = map::operating_point(phi_2, speed_ratio);
        let eta_2 = point_2.efficiency_ratio * eta_design;
        if point_2.head_coefficient <= 0.0 || eta_2 <= 0.0 {
            return Ok(None);
        }
        let dh_s_2 = point_2.head_coefficient * u2 * u2;

        let p_out = oracle
            .from_hs(
                SpecificEnthalpy::new::<joule_per_kilogram>(h_int + dh_s_2),
                interstage.entropy,
            )?
            .pressure
            .get::<pascal>();

        Ok(Some(Running {
            omega,
            phi: [phi_1, phi_2],
            p_out,
            h_out: h_int + dh_s_2 / eta_2,
            tip_speeds: [u1, u2],
            sound_speed_int: interstage.sound_speed.get::<meter_per_second>(),
        }))
    }
}

/// Solves the interstage pressure for a fixed stage efficiency.
fn size_at_stage_efficiency(
    oracle: &impl PropertyOracle,
    inlet: &Properties,
    outlet: &Properties,
    m_dot: MassRate,
    eta_stage: f64,
) -> Result<Stages, RecompressorError> {
    let m = m_dot.get::<kilogram_per_second>();
    let psi_design = map::design_head_coefficient();
    let h_in = inlet.enthalpy.get::<joule_per_kilogram>();
    let h_out = outlet.enthalpy.get::<joule_per_kilogram>();
    let rho_in = inlet.density.get::<kilogram_per_cubic_meter>();
    let p_in = inlet.pressure.get::<pascal>();
    let p_out = outlet.pressure.get::<pascal>();

    let config = secant::Config {
        max_iters: MAX_ITERS,
        x_abs_tol: 1e-3,
        first_step: FirstStep::Bisect,
        max_step_fraction: Some(0.5),
    };

    let solution = secant::solve(
        [p_in + 1e-3, p_out - 1e-3],
        Seed::at(0.5 * (p_in + p_out)),
        &config,
        |p_int| -> Result<Step<Stages>, RecompressorError> {
            let p_int = Pressure::new::<pascal>(p_int);

            let w_s_1 = oracle
                .from_ps(p_int, inlet.entropy)?
                .enthalpy
                .get::<joule_per_kilogram>()
                - h_in;
            let u1 = (w_s_1 / psi_design).sqrt();
            let d1 = (m / (FLOW_COEFFICIENT_DESIGN * rho_in * u1)).sqrt();
            let omega = 2.0 * u1 / d1;

            let h_int = h_in + w_s_1 / eta_stage;
            let interstage =
                oracle.from_ph(p_int, SpecificEnthalpy::new::<joule_per_kilogram>(h_int))?;

            let w_s_2 = oracle
                .from_ps(outlet.pressure, interstage.entropy)?
                .enthalpy
                .get::<joule_per_kilogram>()
                - h_int;
            let u2 = (w_s_2 / psi_design).sqrt();
            let d2 = 2.0 * u2 / omega;
            let phi_2 =
                m / (interstage.density.get::<kilogram_per_cubic_meter>() * u2 * d2 * d2);

            let stages = Stages {
                d1,
                d2,
                omega,
                eta_required: w_s_2 / (h_out - h_int),
                tip_speed_ratio: (u1 / interstage.sound_speed.get::<meter_per_second>())
                    .max(u2 / outlet.sound_speed.get::<meter_per_second>()),
            };

            let residual = phi_2 - FLOW_COEFFICIENT_DESIGN;
            if residual.abs() <= TOLERANCE {
                Ok(Step::Converged(stages))
            } else {
                Ok(Step::Residual(residual, stages))
            }
        },
    )
    .map_err(|error| error.or_else(|| RecompressorError::NotConverged))?;

    Ok(solution.value)
}
