//! Bypass fraction search for the HT recuperator heat shield topology.
//!
//! Part of the turbine flow skips the HT recuperator cold side and is heated
//! separately as a heat shield stream. The bypass fraction is chosen so that
//! stream takes [`HEAT_SHIELD_FRACTION`] of the total heat input.

use std::convert::Infallible;

use tracing::debug;
use twine_core::{EquationProblem, Model};
use twine_solvers::equation::bisection;

use crate::support::thermo::PropertyOracle;

use super::{
    super::{CycleError, CycleTolerances, DesignParameters, Loop},
    design::{DesignPoint, balance},
    topology::HEAT_SHIELD_FRACTION,
};

/// Bypass fraction search bracket.
const BYPASS_FRACTION: [f64; 2] = [0.01, 0.8];

const MAX_ITERS: usize = 50;

/// Solves the design point at the bypass fraction that meets the heat share.
///
/// # Errors
///
/// Returns [`CycleError::NotConverged`] for [`Loop::HeatShield`] if the
/// bisection fails or runs out of iterations.
pub(super) fn solve(
    oracle: &impl PropertyOracle,
    params: &DesignParameters,
    tolerances: &CycleTolerances,
) -> Result<DesignPoint, CycleError> {
    let model = HeatShieldModel {
        oracle,
        params,
        tolerances,
    };

    let solution = bisection::solve(
        &model,
        &HeatShieldProblem,
        BYPASS_FRACTION,
        &bisection::Config {
            max_iters: MAX_ITERS,
            x_abs_tol: 1e-9,
            x_rel_tol: 0.0,
            residual_tol: params.tol,
        },
        |event: &bisection::Event<'_, _, _>| {
            // Treat a failed balance as overshooting the heat share.
            if event.result().is_err() {
                return Some(bisection::Action::assume_positive());
            }
            None
        },
    )
    .map_err(|error| {
        debug!(%error, "heat shield bisection failed");
        CycleError::not_converged(Loop::HeatShield, MAX_ITERS)
    })?;

    if solution.status != bisection::Status::Converged {
        return Err(CycleError::not_converged(Loop::HeatShield, solution.iters));
    }

    debug!(
        bypass_fraction = solution.snapshot.output.ht_bypass_fraction,
        iters = solution.iters,
        "heat shield converged"
    );
    Ok(solution.snapshot.output)
}

/// The design balance as a function of the HT recuperator bypass fraction.
struct HeatShieldModel<'a, O> {
    oracle: &'a O,
    params: &'a DesignParameters,
    tolerances: &'a CycleTolerances,
}

impl<O: PropertyOracle> Model for HeatShieldModel<'_, O> {
    type Input = f64;
    type Output = DesignPoint;
    type Error = CycleError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        balance(self.oracle, self.params, self.tolerances, *input)
    }
}

/// Residual: heat shield share of total heat input minus its target.
struct HeatShieldProblem;

impl EquationProblem<1> for HeatShieldProblem {
    type Input = f64;
    type Output = DesignPoint;
    type Error = Infallible;

    fn input(&self, x: &[f64; 1]) -> Result<Self::Input, Self::Error> {
        Ok(x[0])
    }

    fn residuals(
        &self,
        _input: &Self::Input,
        output: &Self::Output,
    ) -> Result<[f64; 1], Self::Error> {
        Ok([output.q_dot_shield / output.q_dot_in - HEAT_SHIELD_FRACTION])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::power::recompression::{
        Topology,
        test_support::{oracle, recompression_parameters},
    };

    #[test]
    fn converged_design_meets_the_heat_share() {
        let params = DesignParameters {
            tol: 1e-4,
            topology: Topology::HtrBypassHeatShield,
            ..recompression_parameters()
        };

        match solve(&oracle(), &params, &CycleTolerances::default()) {
            Ok(point) => {
                let [low, high] = BYPASS_FRACTION;
                assert!((low..=high).contains(&point.ht_bypass_fraction));
                assert!(point.q_dot_in > point.q_dot_phx);

                let share = point.q_dot_shield / point.q_dot_in;
                let at_bound = point.ht_bypass_fraction - low < 1e-6
                    || high - point.ht_bypass_fraction < 1e-6;
                assert!((share - HEAT_SHIELD_FRACTION).abs() <= 1e-4 || at_bound);
            }
            Err(error) => assert_eq!(error.code(), 37),
        }
    }
}
