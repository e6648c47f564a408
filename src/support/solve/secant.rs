//! Bounded secant iteration with bisection fallback.
//!
//! The solver keeps a bracket `[lo, hi]` that always contains the root and
//! proposes secant steps from the two most recent residual evaluations. Any
//! proposal that is not finite or leaves the open bracket is replaced by the
//! bracket midpoint.
//!
//! Residuals must increase with `x`: a positive residual moves the upper bound
//! down, a negative one moves the lower bound up. Evaluators whose natural
//! residual decreases simply negate it.
//!
//! Besides a residual, an evaluator can report that the trial point is
//! infeasible and on which side the root lies ([`Step::Raise`],
//! [`Step::Lower`]). Those steps tighten the bracket and force a bisection
//! without touching the secant history. Evaluators also decide convergence
//! themselves ([`Step::Converged`]) because acceptance criteria are often
//! asymmetric in the sign of the residual.

use thiserror::Error;
use tracing::trace;

/// Outcome of evaluating one trial point.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<T> {
    /// The trial point is accepted.
    Converged(T),

    /// The trial point has the given residual; iteration continues.
    ///
    /// The payload is returned if the bracket collapses below the configured
    /// tolerance before an evaluation converges.
    Residual(f64, T),

    /// The trial point is infeasible and the root lies above it.
    Raise,

    /// The trial point is infeasible and the root lies below it.
    Lower,
}

/// How to choose the second trial point when no prior evaluation is known.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FirstStep {
    /// Bisect the bracket.
    Bisect,

    /// Perturb the first guess by a relative amount, `x·(1 + factor)`.
    Perturb(f64),
}

/// Solver settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Maximum number of evaluations.
    pub max_iters: usize,

    /// Bracket width below which the last residual payload is accepted.
    ///
    /// Zero disables the check.
    pub x_abs_tol: f64,

    /// Second trial point policy when the seed carries no prior evaluation.
    pub first_step: FirstStep,

    /// Largest accepted secant step as a fraction of the bracket width.
    ///
    /// Longer proposals fall back to bisection. `None` accepts any step that
    /// stays inside the bracket.
    pub max_step_fraction: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_iters: 100,
            x_abs_tol: 0.0,
            first_step: FirstStep::Bisect,
            max_step_fraction: None,
        }
    }
}

/// Where the search starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seed {
    /// First point evaluated. Guesses outside the bracket start at its midpoint.
    pub guess: f64,

    /// A previously known `(x, residual)` pair used for the first secant step.
    pub prior: Option<(f64, f64)>,
}

impl Seed {
    /// Starts at `guess` without prior knowledge.
    #[must_use]
    pub fn at(guess: f64) -> Self {
        Self { guess, prior: None }
    }

    /// Adds a known residual at some other point.
    #[must_use]
    pub fn with_prior(self, x: f64, residual: f64) -> Self {
        Self {
            prior: Some((x, residual)),
            ..self
        }
    }
}

/// A converged root.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<T> {
    pub x: f64,
    pub value: T,
    pub iters: usize,
}

/// Errors returned by [`solve`].
#[derive(Debug, Error)]
pub enum RootError<E> {
    #[error("evaluation failed")]
    Eval(#[source] E),

    #[error("bracket [{lo}, {hi}] is empty or not finite")]
    InvalidBracket { lo: f64, hi: f64 },

    #[error("no convergence after {iters} iterations (last x = {x})")]
    MaxIters { x: f64, iters: usize },
}

impl<E> RootError<E> {
    /// Returns the evaluator's own error, or builds one for solver failures.
    pub fn or_else(self, failure: impl FnOnce() -> E) -> E {
        match self {
            Self::Eval(error) => error,
            Self::InvalidBracket { .. } | Self::MaxIters { .. } => failure(),
        }
    }
}

/// Finds `x` in `bracket` where `evaluate` converges.
///
/// # Errors
///
/// Returns [`RootError::Eval`] as soon as `evaluate` fails,
/// [`RootError::InvalidBracket`] for an unusable bracket, and
/// [`RootError::MaxIters`] if no evaluation converges within the limit.
pub fn solve<T, E>(
    bracket: [f64; 2],
    seed: Seed,
    config: &Config,
    mut evaluate: impl FnMut(f64) -> Result<Step<T>, E>,
) -> Result<Solution<T>, RootError<E>> {
    let [mut lo, mut hi] = bracket;
    if !(lo.is_finite() && hi.is_finite()) || lo > hi {
        return Err(RootError::InvalidBracket { lo, hi });
    }

    let mut x = if seed.guess.is_finite() && (lo..=hi).contains(&seed.guess) {
        seed.guess
    } else {
        0.5 * (lo + hi)
    };
    let mut last = seed.prior;
    let mut fallback: Option<(f64, T)> = None;

    for iter in 1..=config.max_iters {
        let step = evaluate(x).map_err(RootError::Eval)?;

        let next = match step {
            Step::Converged(value) => {
                trace!(iter, x, "root accepted");
                return Ok(Solution { x, value, iters: iter });
            }
            Step::Raise => {
                trace!(iter, x, lo, hi, "infeasible trial, raising lower bound");
                lo = x;
                0.5 * (lo + hi)
            }
            Step::Lower => {
                trace!(iter, x, lo, hi, "infeasible trial, lowering upper bound");
                hi = x;
                0.5 * (lo + hi)
            }
            Step::Residual(residual, value) => {
                trace!(iter, x, residual, lo, hi, "residual");
                fallback = Some((x, value));

                if residual > 0.0 {
                    hi = x;
                } else {
                    lo = x;
                }

                let proposal = match last {
                    Some((x_prev, r_prev)) => secant(x_prev, r_prev, x, residual),
                    None => match config.first_step {
                        FirstStep::Bisect => f64::NAN,
                        FirstStep::Perturb(factor) => x * (1.0 + factor),
                    },
                };
                last = Some((x, residual));
                accept(proposal, x, lo, hi, config.max_step_fraction)
            }
        };

        if hi - lo < config.x_abs_tol
            && let Some((x, value)) = fallback.take()
        {
            trace!(iter, x, lo, hi, "bracket collapsed");
            return Ok(Solution { x, value, iters: iter });
        }

        x = next;
    }

    Err(RootError::MaxIters {
        x,
        iters: config.max_iters,
    })
}

fn secant(x_prev: f64, r_prev: f64, x: f64, r: f64) -> f64 {
    x - r * (x - x_prev) / (r - r_prev)
}

/// Keeps a proposal only if it lies strictly inside the bracket.
fn accept(proposal: f64, x: f64, lo: f64, hi: f64, max_step_fraction: Option<f64>) -> f64 {
    let midpoint = 0.5 * (lo + hi);
    if !proposal.is_finite() || proposal <= lo || proposal >= hi {
        return midpoint;
    }
    match max_step_fraction {
        Some(fraction) if (proposal - x).abs() > fraction * (hi - lo) => midpoint,
        _ => proposal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;

    fn residual_step(x: f64, residual: f64, tol: f64) -> Step<f64> {
        if residual.abs() < tol {
            Step::Converged(x)
        } else {
            Step::Residual(residual, x)
        }
    }

    #[test]
    fn finds_a_square_root() {
        let solution = solve([0.0, 4.0], Seed::at(1.0), &Config::default(), |x| {
            Ok::<_, Infallible>(residual_step(x, x * x - 2.0, 1e-12))
        })
        .expect("root is bracketed");

        assert_relative_eq!(solution.x, 2.0_f64.sqrt(), epsilon = 1e-10);
        assert!(solution.iters < 20);
    }

    #[test]
    fn prior_point_drives_the_first_secant_step() {
        // For a linear residual the first secant step lands on the root.
        let mut calls = 0;
        let solution = solve(
            [0.0, 10.0],
            Seed::at(2.0).with_prior(10.0, 7.0),
            &Config::default(),
            |x| {
                calls += 1;
                Ok::<_, Infallible>(residual_step(x, x - 3.0, 1e-12))
            },
        )
        .expect("linear root");

        assert_relative_eq!(solution.x, 3.0, epsilon = 1e-12);
        assert_eq!(calls, 2);
    }

    #[test]
    fn infeasible_points_move_the_bracket() {
        // Everything below 5 is infeasible; the root sits at 6.
        let solution = solve([0.0, 10.0], Seed::at(1.0), &Config::default(), |x| {
            if x < 5.0 {
                return Ok::<_, Infallible>(Step::Raise);
            }
            Ok(residual_step(x, x - 6.0, 1e-10))
        })
        .expect("root above infeasible region");

        assert_relative_eq!(solution.x, 6.0, epsilon = 1e-9);
    }

    #[test]
    fn lower_signal_moves_the_upper_bound() {
        let solution = solve([0.0, 10.0], Seed::at(9.0), &Config::default(), |x| {
            if x > 4.0 {
                return Ok::<_, Infallible>(Step::Lower);
            }
            Ok(residual_step(x, x - 1.5, 1e-10))
        })
        .expect("root below infeasible region");

        assert_relative_eq!(solution.x, 1.5, epsilon = 1e-9);
    }

    #[test]
    fn perturbed_first_step() {
        let config = Config {
            first_step: FirstStep::Perturb(1e-4),
            ..Config::default()
        };
        let solution = solve([0.0, 1.0], Seed::at(0.02), &config, |x| {
            Ok::<_, Infallible>(residual_step(x, 50.0 * x - 1.6, 1e-9))
        })
        .expect("linear root");

        assert_relative_eq!(solution.x, 0.032, epsilon = 1e-10);
        assert_eq!(solution.iters, 3);
    }

    #[test]
    fn bracket_collapse_returns_last_payload() {
        let config = Config {
            x_abs_tol: 1e-3,
            ..Config::default()
        };
        // The residual never drops below the acceptance threshold.
        let solution = solve([0.0, 1.0], Seed::at(0.5), &config, |x| {
            Ok::<_, Infallible>(Step::Residual(if x > 0.3 { 1.0 } else { -1.0 }, x))
        })
        .expect("collapse is accepted");

        assert!((solution.x - 0.3).abs() < 2e-3);
    }

    #[test]
    fn exhausting_iterations_is_an_error() {
        let config = Config {
            max_iters: 5,
            ..Config::default()
        };
        let error = solve([0.0, 1.0], Seed::at(0.5), &config, |x| {
            Ok::<_, Infallible>(Step::Residual(x + 1.0, x))
        })
        .unwrap_err();

        assert!(matches!(error, RootError::MaxIters { iters: 5, .. }));
    }

    #[test]
    fn evaluation_errors_stop_the_search() {
        #[derive(Debug, PartialEq)]
        struct Boom;

        let error = solve::<f64, _>([0.0, 1.0], Seed::at(0.5), &Config::default(), |_| Err(Boom))
            .unwrap_err();

        assert_eq!(error.or_else(|| Boom), Boom);
    }

    #[test]
    fn rejects_inverted_bracket() {
        let error = solve([2.0, 1.0], Seed::at(1.5), &Config::default(), |x| {
            Ok::<_, Infallible>(Step::Converged(x))
        })
        .unwrap_err();

        assert!(matches!(error, RootError::InvalidBracket { .. }));
    }
}
