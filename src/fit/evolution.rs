//! Mu-plus-lambda evolution strategy over a fallible fitness function.
//!
//! Purpose
//! -------
//! A small generic evolutionary minimizer: maintain a population around
//! the best candidates found so far, mutate coordinates with Gaussian
//! noise, and keep the best `mu` members as parents each generation. The
//! fitting layer drives it with the shared objective, but the function is
//! independent of models and usable on any `R^n -> R` fitness.
//!
//! Key behaviors
//! -------------
//! - The starting point joins the initial population unmutated, so the
//!   best loss ever returned is never worse than the fitness at `x0`.
//! - Every individual is scored exactly once, when it is created;
//!   surviving parents carry their cached fitness forward. The budget
//!   fixes the generation count at `floor(evals / lambda)`, so a run
//!   spends `lambda` calls on the initial population plus `lambda` per
//!   generation. A budget below `lambda` degrades to zero generations
//!   and returns the best of the initial population.
//! - Fitness errors abort the run and propagate to the caller.
use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::fit::{
    errors::{FitError, FitResult},
    methods::EvolutionOptions,
};

/// Result of an evolution-strategy run.
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionOutcome {
    /// Best candidate ever evaluated.
    pub x: Array1<f64>,
    /// Fitness at the best candidate.
    pub loss: f64,
    /// Generations performed.
    pub iterations: u64,
}

fn mutate<R: Rng + ?Sized>(
    x: &Array1<f64>,
    std: f64,
    prob: f64,
    rng: &mut R,
) -> FitResult<Array1<f64>> {
    let normal = Normal::new(0.0, std)
        .map_err(|_| FitError::InvalidOptions { name: "mutate_var", reason: "Must be finite and positive." })?;
    Ok(x.mapv(|v| if rng.gen::<f64>() < prob { v + normal.sample(rng) } else { v }))
}

/// Minimize `fitness` with a mu-plus-lambda evolution strategy started at
/// `x0`.
///
/// # Errors
/// - Option-validation errors surfaced by [`EvolutionOptions::new`] when
///   the caller constructs `opts` manually with inconsistent fields
///   (checked again here).
/// - Any error returned by `fitness`.
pub fn evolution_strategy<F, R>(
    mut fitness: F,
    x0: Array1<f64>,
    opts: &EvolutionOptions,
    rng: &mut R,
) -> FitResult<EvolutionOutcome>
where
    F: FnMut(&Array1<f64>) -> FitResult<f64>,
    R: Rng + ?Sized,
{
    // Re-validate so options built by struct literal cannot bypass the
    // lambda/mu contract.
    let opts = EvolutionOptions::new(
        opts.mu,
        opts.lambda,
        opts.copy_parents,
        opts.mutate_var,
        opts.mutate_prob,
        opts.evals,
    )?;
    let std = opts.mutate_var.sqrt();
    let generations = (opts.evals / opts.lambda) as u64;
    let offspring_per_parent = opts.lambda / opts.mu;

    // Individuals carry the fitness computed when they were created;
    // surviving parents are never re-scored.
    let loss0 = fitness(&x0)?;
    let mut best_x = x0.clone();
    let mut best_loss = loss0;
    let mut population: Vec<(Array1<f64>, f64)> = Vec::with_capacity(opts.lambda);
    population.push((x0, loss0));
    for _ in 1..opts.lambda {
        let member = mutate(&population[0].0, std, opts.mutate_prob, rng)?;
        let loss = fitness(&member)?;
        if loss < best_loss {
            best_loss = loss;
            best_x = member.clone();
        }
        population.push((member, loss));
    }

    for _ in 0..generations {
        population.sort_by(|a, b| a.1.total_cmp(&b.1));
        population.truncate(opts.mu);
        let parents = std::mem::take(&mut population);

        if opts.copy_parents {
            population.extend(parents.iter().cloned());
        }
        for (parent, _) in &parents {
            for _ in 0..offspring_per_parent {
                let child = mutate(parent, std, opts.mutate_prob, rng)?;
                let loss = fitness(&child)?;
                if loss < best_loss {
                    best_loss = loss;
                    best_x = child.clone();
                }
                population.push((child, loss));
            }
        }
    }

    Ok(EvolutionOutcome { x: best_x, loss: best_loss, iterations: generations })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::{rngs::StdRng, SeedableRng};

    fn sphere(x: &Array1<f64>) -> FitResult<f64> {
        Ok(x.iter().map(|v| v * v).sum())
    }

    /// Scope: monotonicity of the best-ever loss.
    #[test]
    fn best_loss_never_exceeds_the_starting_fitness() {
        let mut rng = StdRng::seed_from_u64(7);
        let opts = EvolutionOptions::default();
        let x0 = array![1.5, -0.5];
        let start = sphere(&x0).unwrap();

        let outcome = evolution_strategy(sphere, x0, &opts, &mut rng).unwrap();
        assert!(outcome.loss <= start);
        assert_eq!(outcome.iterations, (opts.evals / opts.lambda) as u64);
    }

    /// Scope: evaluation accounting.
    /// Given the default `mu=1, lambda=3, evals=100` configuration with
    /// parent copying, expect exactly one fitness call per created
    /// individual: `lambda` for the initial population plus `lambda` per
    /// generation, with surviving parents never re-scored.
    #[test]
    fn each_individual_is_scored_exactly_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let opts = EvolutionOptions::default();
        let mut calls = 0usize;

        evolution_strategy(
            |x: &Array1<f64>| {
                calls += 1;
                sphere(x)
            },
            array![1.5, -0.5],
            &opts,
            &mut rng,
        )
        .unwrap();

        let generations = opts.evals / opts.lambda;
        assert_eq!(calls, opts.lambda + generations * opts.lambda);
    }

    /// Scope: budgets below one generation.
    /// Given `evals < lambda`, expect a zero-generation run that still
    /// scores the initial population and returns its best member.
    #[test]
    fn budget_below_lambda_degrades_to_zero_generations() {
        let mut rng = StdRng::seed_from_u64(5);
        let opts = EvolutionOptions::new(1, 3, true, 0.002, 0.5, 1).unwrap();
        let x0 = array![2.0];
        let start = sphere(&x0).unwrap();
        let mut calls = 0usize;

        let outcome = evolution_strategy(
            |x: &Array1<f64>| {
                calls += 1;
                sphere(x)
            },
            x0,
            &opts,
            &mut rng,
        )
        .unwrap();

        assert_eq!(outcome.iterations, 0);
        assert_eq!(calls, opts.lambda);
        assert!(outcome.loss <= start);
    }

    /// Scope: lambda/mu contract.
    #[test]
    fn mismatched_lambda_and_mu_fail_before_any_evaluation() {
        let mut rng = StdRng::seed_from_u64(7);
        let opts = EvolutionOptions {
            mu: 2,
            lambda: 5,
            copy_parents: true,
            mutate_var: 0.002,
            mutate_prob: 0.5,
            evals: 100,
        };
        let mut calls = 0usize;
        let result = evolution_strategy(
            |x: &Array1<f64>| {
                calls += 1;
                sphere(x)
            },
            array![1.0],
            &opts,
            &mut rng,
        );
        assert!(matches!(result, Err(FitError::LambdaMuMismatch { lambda: 5, mu: 2 })));
        assert_eq!(calls, 0);
    }

    /// Scope: a compatible configuration runs to completion.
    #[test]
    fn multi_parent_configuration_descends_on_a_quadratic() {
        let mut rng = StdRng::seed_from_u64(11);
        let opts = EvolutionOptions::new(2, 6, true, 0.05, 0.8, 120).unwrap();
        let outcome = evolution_strategy(sphere, array![2.0, 2.0], &opts, &mut rng).unwrap();
        assert!(outcome.loss < 8.0);
    }

    /// Scope: fitness errors propagate.
    #[test]
    fn fitness_errors_abort_the_run() {
        let mut rng = StdRng::seed_from_u64(3);
        let opts = EvolutionOptions::default();
        let result = evolution_strategy(
            |_: &Array1<f64>| Err(FitError::NonFiniteLoss { value: f64::NAN }),
            array![1.0],
            &opts,
            &mut rng,
        );
        assert!(matches!(result, Err(FitError::NonFiniteLoss { .. })));
    }
}
