//! Global search backends: basin-hopping and differential evolution.
//!
//! Purpose
//! -------
//! Two stochastic global strategies sitting above the local searches in
//! [`run`](crate::fit::run). Basin-hopping chains local searches from
//! perturbed restarts with Metropolis acceptance; differential evolution
//! maintains a population over the full box constraints and needs no
//! local search at all.
//!
//! Invariants & assumptions
//! ------------------------
//! - Differential evolution requires a finite box on every coordinate and
//!   refuses to run otherwise; basin-hopping has no such requirement
//!   because the objective projects candidates into the box itself.
//! - Both backends are deterministic given the caller's RNG.
use ndarray::Array1;
use rand::Rng;

use crate::fit::{
    errors::{FitError, FitResult},
    loss::LossFunction,
    methods::{BasinOptions, DifferentialEvolutionOptions, SearchOutcome},
    objective::Objective,
    run::run_lbfgs,
};

/// Basin-hopping: a local search from `x0`, then repeated local searches
/// from uniformly perturbed restarts, accepting moves by the Metropolis
/// rule at the configured temperature.
pub fn basin_hopping<L: LossFunction, R: Rng + ?Sized>(
    objective: &Objective<'_, L>,
    x0: Array1<f64>,
    opts: &BasinOptions,
    rng: &mut R,
) -> FitResult<SearchOutcome> {
    let opts =
        BasinOptions::new(opts.n_iter, opts.step_size, opts.temperature, opts.local_max_iter)?;

    let mut current = run_lbfgs(objective, x0, opts.local_max_iter)?;
    let mut best = current.clone();

    for _ in 0..opts.n_iter {
        let start = current
            .x
            .mapv(|v| v + rng.gen_range(-opts.step_size..=opts.step_size));
        let candidate = run_lbfgs(objective, start, opts.local_max_iter)?;

        if candidate.loss < best.loss {
            best = candidate.clone();
        }
        let accept = candidate.loss <= current.loss || {
            let delta = candidate.loss - current.loss;
            rng.gen::<f64>() < (-delta / opts.temperature).exp()
        };
        if accept {
            current = candidate;
        }
    }

    Ok(SearchOutcome {
        x: best.x,
        loss: best.loss,
        iterations: opts.n_iter as u64,
        converged: best.converged,
        status: format!("basin hopping finished after {} hops", opts.n_iter),
    })
}

/// Differential evolution (rand/1/bin) over a finite box.
///
/// The starting point joins the initial population; the remaining members
/// are drawn uniformly from the box. The differential weight is redrawn
/// from the configured dither range each generation.
///
/// # Errors
/// [`FitError::UnboundedParameter`] if any coordinate lacks a finite
/// bound on either side.
pub fn differential_evolution<F, R>(
    mut fitness: F,
    x0: Array1<f64>,
    constraints: &[(Option<f64>, Option<f64>)],
    opts: &DifferentialEvolutionOptions,
    rng: &mut R,
) -> FitResult<SearchOutcome>
where
    F: FnMut(&Array1<f64>) -> FitResult<f64>,
    R: Rng + ?Sized,
{
    let opts = DifferentialEvolutionOptions::new(
        opts.max_generations,
        opts.popsize,
        opts.crossover,
        opts.weight,
        opts.tol,
    )?;
    let dim = x0.len();
    let mut bounds = Vec::with_capacity(dim);
    for (index, constraint) in constraints.iter().enumerate() {
        match constraint {
            (Some(lo), Some(hi)) => bounds.push((*lo, *hi)),
            _ => return Err(FitError::UnboundedParameter { index }),
        }
    }

    let pop_size = (opts.popsize * dim).max(4);
    let mut population: Vec<Array1<f64>> = Vec::with_capacity(pop_size);
    population.push(x0);
    for _ in 1..pop_size {
        population.push(Array1::from_iter(
            bounds.iter().map(|&(lo, hi)| rng.gen_range(lo..=hi)),
        ));
    }
    let mut losses = Vec::with_capacity(pop_size);
    for member in &population {
        losses.push(fitness(member)?);
    }

    let mut best_index = argmin_index(&losses);
    let mut generations = 0u64;
    let mut converged = false;

    for _ in 0..opts.max_generations {
        generations += 1;
        let weight = rng.gen_range(opts.weight.0..=opts.weight.1);
        for i in 0..pop_size {
            let (a, b, c) = distinct_indices(i, pop_size, rng);
            let j_rand = rng.gen_range(0..dim);
            let mut trial = population[i].clone();
            for j in 0..dim {
                if j == j_rand || rng.gen::<f64>() < opts.crossover {
                    let v = population[a][j] + weight * (population[b][j] - population[c][j]);
                    trial[j] = v.clamp(bounds[j].0, bounds[j].1);
                }
            }
            let trial_loss = fitness(&trial)?;
            if trial_loss <= losses[i] {
                population[i] = trial;
                losses[i] = trial_loss;
                if trial_loss < losses[best_index] {
                    best_index = i;
                }
            }
        }

        let mean = losses.iter().sum::<f64>() / pop_size as f64;
        let var =
            losses.iter().map(|l| (l - mean) * (l - mean)).sum::<f64>() / pop_size as f64;
        if var.sqrt() <= opts.tol * mean.abs() {
            converged = true;
            break;
        }
    }

    let status = if converged {
        "population converged".to_string()
    } else {
        "generation cap reached".to_string()
    };
    Ok(SearchOutcome {
        x: population[best_index].clone(),
        loss: losses[best_index],
        iterations: generations,
        converged,
        status,
    })
}

fn argmin_index(losses: &[f64]) -> usize {
    let mut best = 0;
    for (i, loss) in losses.iter().enumerate() {
        if *loss < losses[best] {
            best = i;
        }
    }
    best
}

/// Three distinct population indices, all different from `exclude`.
fn distinct_indices<R: Rng + ?Sized>(
    exclude: usize,
    pop_size: usize,
    rng: &mut R,
) -> (usize, usize, usize) {
    let mut pick = |taken: &[usize]| loop {
        let i = rng.gen_range(0..pop_size);
        if i != exclude && !taken.contains(&i) {
            return i;
        }
    };
    let a = pick(&[]);
    let b = pick(&[a]);
    let c = pick(&[a, b]);
    (a, b, c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::{rngs::StdRng, SeedableRng};

    fn sphere(x: &Array1<f64>) -> FitResult<f64> {
        Ok(x.iter().map(|v| v * v).sum())
    }

    /// Scope: differential evolution on a smooth bowl.
    #[test]
    fn differential_evolution_finds_the_bowl_minimum() {
        let mut rng = StdRng::seed_from_u64(42);
        let opts = DifferentialEvolutionOptions::default();
        let constraints = vec![(Some(-4.0), Some(4.0)), (Some(-4.0), Some(4.0))];

        let outcome =
            differential_evolution(sphere, array![3.0, -3.0], &constraints, &opts, &mut rng)
                .unwrap();
        assert!(outcome.loss < 0.1);
        assert!(outcome.x.iter().all(|v| v.abs() < 0.5));
    }

    /// Scope: finite-bounds requirement.
    #[test]
    fn unbounded_coordinates_are_rejected() {
        let mut rng = StdRng::seed_from_u64(42);
        let opts = DifferentialEvolutionOptions::default();
        let constraints = vec![(Some(-4.0), Some(4.0)), (None, Some(4.0))];

        let result =
            differential_evolution(sphere, array![0.0, 0.0], &constraints, &opts, &mut rng);
        assert!(matches!(result, Err(FitError::UnboundedParameter { index: 1 })));
    }

    /// Scope: index sampling.
    #[test]
    fn mutation_indices_are_pairwise_distinct() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let (a, b, c) = distinct_indices(0, 5, &mut rng);
            assert!(a != 0 && b != 0 && c != 0);
            assert!(a != b && b != c && a != c);
        }
    }
}
