//! Bounded Nelder-Mead simplex minimiser
//!
//! Used for the conditional-sum-of-squares ARIMA fits and the Holt-Winters
//! smoothing parameters. Fully deterministic: the same objective and start
//! point always walk the same simplex.

/// Result of a Nelder-Mead run
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The best point found
    pub optimal_point: Vec<f64>,
    /// Objective value at the best point
    pub optimal_value: f64,
    /// Number of iterations performed
    pub iterations: usize,
    /// Whether a convergence criterion was met before `max_iter`
    pub converged: bool,
}

/// Configuration for Nelder-Mead
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Relative tolerance on the spread of objective values
    pub tolerance: f64,
    /// Reflection coefficient
    pub alpha: f64,
    /// Expansion coefficient
    pub gamma: f64,
    /// Contraction coefficient
    pub rho: f64,
    /// Shrink coefficient
    pub sigma: f64,
    /// Initial simplex step, relative to the start coordinate
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            tolerance: 1e-10,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Minimise `objective` starting from `initial`.
///
/// Each coordinate is clamped to `bounds[i]` when bounds are given. The run
/// counts as converged once the objective spread across the simplex falls
/// below `tolerance * max(1, |best|)` or the simplex collapses to a point.
///
/// ```
/// use ship_math::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 1e-3);
/// assert!((result.optimal_point[1] + 1.0).abs() < 1e-3);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: objective(&[]),
            iterations: 0,
            converged: true,
        };
    }

    // Non-finite objective values are treated as +inf so they always lose
    let eval = |point: &[f64]| {
        let value = objective(point);
        if value.is_finite() {
            value
        } else {
            f64::INFINITY
        }
    };

    let start = apply_bounds(initial, bounds);
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(start.clone());

    for i in 0..n {
        let mut vertex = start.clone();
        let step = if start[i].abs() > 1e-10 {
            config.initial_step * start[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        let mut bounded = apply_bounds(&vertex, bounds);
        // Stepping into a bound would leave a degenerate simplex
        if bounded[i] == start[i] {
            vertex[i] = start[i] - step;
            bounded = apply_bounds(&vertex, bounds);
        }
        simplex.push(bounded);
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut indices: Vec<usize> = (0..=n).collect();
        indices.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

        let best_idx = indices[0];
        let worst_idx = indices[n];
        let second_worst_idx = indices[n - 1];

        let spread = values[worst_idx] - values[best_idx];
        if values[best_idx].is_finite()
            && spread <= config.tolerance * values[best_idx].abs().max(1.0)
        {
            converged = true;
            break;
        }

        let centroid = compute_centroid(&simplex, worst_idx);
        let scale = centroid.iter().map(|c| c.abs()).fold(1.0, f64::max);
        let max_dist = simplex
            .iter()
            .map(|v| euclidean_distance(v, &centroid))
            .fold(0.0, f64::max);
        if values[best_idx].is_finite() && max_dist < config.tolerance * scale {
            converged = true;
            break;
        }

        // Reflection
        let reflected = apply_bounds(&reflect(&simplex[worst_idx], &centroid, config.alpha), bounds);
        let reflected_value = eval(&reflected);

        if reflected_value < values[second_worst_idx] && reflected_value >= values[best_idx] {
            simplex[worst_idx] = reflected;
            values[worst_idx] = reflected_value;
            continue;
        }

        if reflected_value < values[best_idx] {
            // Expansion
            let expanded = apply_bounds(&expand(&centroid, &reflected, config.gamma), bounds);
            let expanded_value = eval(&expanded);

            if expanded_value < reflected_value {
                simplex[worst_idx] = expanded;
                values[worst_idx] = expanded_value;
            } else {
                simplex[worst_idx] = reflected;
                values[worst_idx] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[worst_idx] {
            // Outside contraction
            let contracted = apply_bounds(&contract(&centroid, &reflected, config.rho), bounds);
            let contracted_value = eval(&contracted);

            if contracted_value <= reflected_value {
                simplex[worst_idx] = contracted;
                values[worst_idx] = contracted_value;
                continue;
            }
        } else {
            // Inside contraction
            let contracted =
                apply_bounds(&contract(&centroid, &simplex[worst_idx], config.rho), bounds);
            let contracted_value = eval(&contracted);

            if contracted_value < values[worst_idx] {
                simplex[worst_idx] = contracted;
                values[worst_idx] = contracted_value;
                continue;
            }
        }

        // Shrink towards the best vertex
        let best = simplex[best_idx].clone();
        for i in 0..=n {
            if i != best_idx {
                for j in 0..n {
                    simplex[i][j] = best[j] + config.sigma * (simplex[i][j] - best[j]);
                }
                simplex[i] = apply_bounds(&simplex[i], bounds);
                values[i] = eval(&simplex[i]);
            }
        }
    }

    let best_idx = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(i, _)| i)
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: simplex[best_idx].clone(),
        optimal_value: values[best_idx],
        iterations,
        converged,
    }
}

/// Centroid of the simplex excluding one vertex
fn compute_centroid(simplex: &[Vec<f64>], exclude_idx: usize) -> Vec<f64> {
    let n = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; n];

    for (i, vertex) in simplex.iter().enumerate() {
        if i != exclude_idx {
            for (c, v) in centroid.iter_mut().zip(vertex) {
                *c += v;
            }
        }
    }

    for c in &mut centroid {
        *c /= count;
    }

    centroid
}

fn reflect(point: &[f64], centroid: &[f64], alpha: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point)
        .map(|(c, p)| c + alpha * (c - p))
        .collect()
}

fn expand(centroid: &[f64], reflected: &[f64], gamma: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(reflected)
        .map(|(c, r)| c + gamma * (r - c))
        .collect()
}

fn contract(centroid: &[f64], point: &[f64], rho: f64) -> Vec<f64> {
    centroid
        .iter()
        .zip(point)
        .map(|(c, p)| c + rho * (p - c))
        .collect()
}

fn apply_bounds(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point.to_vec(),
        Some(b) => point
            .iter()
            .enumerate()
            .map(|(i, &x)| match b.get(i) {
                Some(&(lo, hi)) => x.clamp(lo, hi),
                None => x,
            })
            .collect(),
    }
}

fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
