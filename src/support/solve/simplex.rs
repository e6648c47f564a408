//! Bounded Nelder–Mead simplex search.
//!
//! A derivative-free local maximizer for black-box objectives. Trial points
//! are projected onto the bounds before evaluation, so the objective is never
//! called outside them. The objective may return zero (or any low value) for
//! infeasible points; the simplex simply contracts away from them.

use thiserror::Error;
use tracing::trace;

/// Search settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Maximum number of objective evaluations.
    pub max_evals: usize,

    /// Relative tolerance on the simplex extent along each coordinate.
    pub x_rel_tol: f64,

    /// Absolute tolerance on the simplex extent, used near zero.
    pub x_abs_tol: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_evals: 2000,
            x_rel_tol: 1e-4,
            x_abs_tol: 1e-9,
        }
    }
}

/// Box constraints and starting geometry for one variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Variable {
    pub initial: f64,
    pub lower: f64,
    pub upper: f64,
    pub step: f64,
}

/// How the search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Converged,
    MaxEvals,
}

/// Best point found by the search.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub x: Vec<f64>,
    pub objective: f64,
    pub evals: usize,
    pub status: Status,
}

/// Errors returned by [`maximize`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimplexError {
    #[error("no variables to optimize")]
    Empty,

    #[error("variable {index} has invalid bounds [{lower}, {upper}]")]
    Bounds {
        index: usize,
        lower: f64,
        upper: f64,
    },

    #[error("variable {index} has a non-positive initial step {step}")]
    Step { index: usize, step: f64 },
}

struct Vertex {
    x: Vec<f64>,
    f: f64,
}

/// Maximizes `objective` starting from the variables' initial values.
///
/// # Errors
///
/// Returns [`SimplexError`] if the variable definitions are unusable. A search
/// that runs out of evaluations is not an error; check [`Solution::status`].
pub fn maximize(
    variables: &[Variable],
    config: &Config,
    mut objective: impl FnMut(&[f64]) -> f64,
) -> Result<Solution, SimplexError> {
    validate(variables)?;

    let n = variables.len();
    let project = |x: &mut [f64]| {
        for (value, var) in x.iter_mut().zip(variables) {
            *value = value.clamp(var.lower, var.upper);
        }
    };

    let mut evals = 0;
    let mut evaluate = |x: &[f64], evals: &mut usize| {
        *evals += 1;
        let value = objective(x);
        if value.is_nan() { f64::NEG_INFINITY } else { value }
    };

    let mut start: Vec<f64> = variables.iter().map(|var| var.initial).collect();
    project(&mut start);

    let mut simplex = Vec::with_capacity(n + 1);
    let f0 = evaluate(&start, &mut evals);
    simplex.push(Vertex {
        x: start.clone(),
        f: f0,
    });
    for (i, var) in variables.iter().enumerate() {
        let mut x = start.clone();
        x[i] = if x[i] + var.step <= var.upper {
            x[i] + var.step
        } else {
            x[i] - var.step
        };
        project(&mut x);
        let f = evaluate(&x, &mut evals);
        simplex.push(Vertex { x, f });
    }

    loop {
        simplex.sort_by(|a, b| b.f.total_cmp(&a.f));

        if converged(&simplex, config) {
            return Ok(finish(simplex, evals, Status::Converged));
        }
        if evals >= config.max_evals {
            return Ok(finish(simplex, evals, Status::MaxEvals));
        }

        let centroid = centroid(&simplex[..n]);
        let best_f = simplex[0].f;
        let second_worst_f = simplex[n - 1].f;
        let worst_f = simplex[n].f;

        let mut reflected = along(&centroid, &simplex[n].x, -1.0);
        project(&mut reflected);
        let f_reflected = evaluate(&reflected, &mut evals);

        if f_reflected > best_f {
            let mut expanded = along(&centroid, &simplex[n].x, -2.0);
            project(&mut expanded);
            let f_expanded = evaluate(&expanded, &mut evals);
            simplex[n] = if f_expanded > f_reflected {
                Vertex {
                    x: expanded,
                    f: f_expanded,
                }
            } else {
                Vertex {
                    x: reflected,
                    f: f_reflected,
                }
            };
            trace!(evals, best_f, "simplex expanded");
            continue;
        }

        if f_reflected > second_worst_f {
            simplex[n] = Vertex {
                x: reflected,
                f: f_reflected,
            };
            continue;
        }

        // Outside contraction if the reflection beat the worst vertex, inside otherwise.
        let (factor, reference_f) = if f_reflected > worst_f {
            (-0.5, f_reflected)
        } else {
            (0.5, worst_f)
        };
        let mut contracted = along(&centroid, &simplex[n].x, factor);
        project(&mut contracted);
        let f_contracted = evaluate(&contracted, &mut evals);

        if f_contracted >= reference_f && f_contracted > worst_f {
            simplex[n] = Vertex {
                x: contracted,
                f: f_contracted,
            };
            continue;
        }

        trace!(evals, best_f, "simplex shrink");
        let best = simplex[0].x.clone();
        for vertex in simplex.iter_mut().skip(1) {
            for (value, anchor) in vertex.x.iter_mut().zip(&best) {
                *value = anchor + 0.5 * (*value - anchor);
            }
            vertex.f = evaluate(&vertex.x, &mut evals);
        }
    }
}

fn validate(variables: &[Variable]) -> Result<(), SimplexError> {
    if variables.is_empty() {
        return Err(SimplexError::Empty);
    }
    for (index, var) in variables.iter().enumerate() {
        if var.lower.is_nan() || var.upper.is_nan() || var.lower > var.upper {
            return Err(SimplexError::Bounds {
                index,
                lower: var.lower,
                upper: var.upper,
            });
        }
        if var.step.is_nan() || var.step <= 0.0 {
            return Err(SimplexError::Step {
                index,
                step: var.step,
            });
        }
    }
    Ok(())
}

fn centroid(vertices: &[Vertex]) -> Vec<f64> {
    let n = vertices.len() as f64;
    let mut centroid = vec![0.0; vertices[0].x.len()];
    for vertex in vertices {
        for (sum, value) in centroid.iter_mut().zip(&vertex.x) {
            *sum += value / n;
        }
    }
    centroid
}

/// Returns `centroid + factor·(point − centroid)`.
fn along(centroid: &[f64], point: &[f64], factor: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point)
        .map(|(c, p)| c + factor * (p - c))
        .collect()
}

fn converged(simplex: &[Vertex], config: &Config) -> bool {
    let best = &simplex[0].x;
    simplex.iter().skip(1).all(|vertex| {
        vertex
            .x
            .iter()
            .zip(best)
            .all(|(v, b)| (v - b).abs() <= config.x_rel_tol * b.abs() + config.x_abs_tol)
    })
}

fn finish(mut simplex: Vec<Vertex>, evals: usize, status: Status) -> Solution {
    let best = simplex.swap_remove(0);
    Solution {
        x: best.x,
        objective: best.f,
        evals,
        status,
    }
}
