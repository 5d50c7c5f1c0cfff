//! Seeder (C10): initial-population construction strategies.

use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use rayon::prelude::*;

use crate::bounds::{self, Bounds};
use crate::fitness::DvaFitness;
use crate::population::{Individual, Population};
use crate::sobol;

/// Which strategy produces the initial population (spec section 4.10,
/// configuration enum `seeding_method`).
#[derive(Debug, Clone)]
pub enum SeedingMethod {
    Uniform,
    Sobol,
    Lhs,
    /// Jitter prior-run bests by a small Gaussian perturbation.
    MemoryReplay { prior: Vec<Vec<f64>> },
    /// Evaluate `pool_multiplier * n` uniform candidates, keep the best `n`.
    BestOfPool { pool_multiplier: usize },
    /// Candidates supplied externally (the neural-seeding model); only
    /// bounds/fixed validation happens here.
    Neural { candidates: Vec<Vec<f64>> },
}

/// Build the initial population of `n` individuals from `method`.
pub fn seed(method: &SeedingMethod, n: usize, bounds: &Bounds, seed: u64, fitness: &DvaFitness, rng: &mut StdRng) -> Population {
    let genes = match method {
        SeedingMethod::Uniform => uniform(n, bounds, rng),
        SeedingMethod::Sobol => low_discrepancy(n, bounds, seed),
        SeedingMethod::Lhs => latin_hypercube(n, bounds, rng),
        SeedingMethod::MemoryReplay { prior } => memory_replay(n, bounds, prior, rng),
        SeedingMethod::BestOfPool { pool_multiplier } => {
            return best_of_pool(n, *pool_multiplier, bounds, fitness, rng);
        }
        SeedingMethod::Neural { candidates } => neural(n, bounds, candidates),
    };
    Population::new(genes.into_iter().map(Individual::new).collect())
}

fn uniform(n: usize, bounds: &Bounds, rng: &mut StdRng) -> Vec<Vec<f64>> {
    (0..n)
        .map(|_| {
            bounds
                .iter()
                .map(|b| match b.fixed {
                    Some(v) => v,
                    None => rng.random_range(b.lo..=b.hi),
                })
                .collect()
        })
        .collect()
}

fn low_discrepancy(n: usize, bounds: &Bounds, seed: u64) -> Vec<Vec<f64>> {
    let unit = sobol::scrambled_halton(n, bounds.len(), seed);
    unit.iter().map(|p| sobol::scale_to_bounds(p, bounds)).collect()
}

/// Latin hypercube sampling: stratify each gene's range into `n` equal
/// bins, one randomly-jittered sample per bin, then shuffle the bin order
/// independently per gene so genes don't correlate.
fn latin_hypercube(n: usize, bounds: &Bounds, rng: &mut StdRng) -> Vec<Vec<f64>> {
    use rand::seq::SliceRandom;

    let dims = bounds.len();
    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(dims);
    for b in bounds {
        let mut bins: Vec<usize> = (0..n).collect();
        bins.shuffle(rng);
        let column: Vec<f64> = bins
            .iter()
            .map(|&bin| match b.fixed {
                Some(v) => v,
                None => {
                    let lo = b.lo + (bin as f64 / n as f64) * (b.hi - b.lo);
                    let hi = b.lo + ((bin + 1) as f64 / n as f64) * (b.hi - b.lo);
                    rng.random_range(lo..=hi)
                }
            })
            .collect();
        columns.push(column);
    }
    (0..n).map(|i| columns.iter().map(|c| c[i]).collect()).collect()
}

fn memory_replay(n: usize, bounds: &Bounds, prior: &[Vec<f64>], rng: &mut StdRng) -> Vec<Vec<f64>> {
    if prior.is_empty() {
        return uniform(n, bounds, rng);
    }
    (0..n)
        .map(|i| {
            let base = &prior[i % prior.len()];
            let mut jittered: Vec<f64> = base
                .iter()
                .zip(bounds.iter())
                .map(|(&x, b)| {
                    let std = 0.05 * (b.hi - b.lo).max(1e-12);
                    let normal = Normal::new(0.0, std).expect("std > 0");
                    x + normal.sample(rng)
                })
                .collect();
            bounds::enforce(&mut jittered, bounds);
            jittered
        })
        .collect()
}

fn best_of_pool(n: usize, pool_multiplier: usize, bounds: &Bounds, fitness: &DvaFitness, rng: &mut StdRng) -> Population {
    let pool_size = n * pool_multiplier.max(1);
    let pool = uniform(pool_size, bounds, rng);
    let mut scored: Vec<Individual> = pool
        .into_par_iter()
        .map(|genes| {
            let f = fitness.evaluate(&genes);
            Individual { genes, fitness: Some(f) }
        })
        .collect();
    scored.sort_by(|a, b| a.ordering_key().partial_cmp(&b.ordering_key()).unwrap());
    scored.truncate(n);
    Population::new(scored)
}

fn neural(n: usize, bounds: &Bounds, candidates: &[Vec<f64>]) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| {
            let mut genes = candidates[i % candidates.len().max(1)].clone();
            bounds::enforce(&mut genes, bounds);
            genes
        })
        .collect()
}
