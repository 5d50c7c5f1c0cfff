//! Guided Operators (C12): priority-weighted crossover and mutation,
//! consuming the per-parameter priority weights from Sobol sensitivity
//! (C11).

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::bounds::Bounds;
use crate::population::Individual;

/// Per-gene blend crossover where mixing strength scales with
/// `w_i / max(w)`: high-priority genes get a wider blend interval (more
/// exploration), low-priority genes stay closer to their parents.
pub fn guided_crossover<R: Rng + ?Sized>(offspring: &mut [Individual], p_c: f64, weights: &[f64], bounds: &Bounds, rng: &mut R) {
    let max_w = weights.iter().cloned().fold(0.0_f64, f64::max).max(1e-12);
    let mut i = 0;
    while i + 1 < offspring.len() {
        if rng.random::<f64>() < p_c {
            let (left, right) = offspring.split_at_mut(i + 1);
            let parent_a = &left[i];
            let parent_b = &right[0];
            let mut child_a = parent_a.genes.clone();
            let mut child_b = parent_b.genes.clone();
            for g in 0..child_a.len() {
                let alpha = 0.5 * (weights[g] / max_w);
                let (x1, x2) = (parent_a.genes[g], parent_b.genes[g]);
                let (lo, hi) = (x1.min(x2), x1.max(x2));
                let span = hi - lo;
                let lower = lo - alpha * span;
                let upper = hi + alpha * span;
                child_a[g] = rng.random_range(lower..=upper);
                child_b[g] = rng.random_range(lower..=upper);
            }
            crate::bounds::enforce(&mut child_a, bounds);
            crate::bounds::enforce(&mut child_b, bounds);
            offspring[i] = Individual::new(child_a);
            offspring[i + 1] = Individual::new(child_b);
        }
        i += 2;
    }
}

/// Per-gene mutation probability `min(0.9, p_m * w_i * scale / max(w))`;
/// perturbation magnitude also scales with `w_i`. Fixed genes are never
/// mutated.
pub fn guided_mutate<R: Rng + ?Sized>(offspring: &mut [Individual], p_m: f64, scale: f64, weights: &[f64], bounds: &Bounds, rng: &mut R) {
    let max_w = weights.iter().cloned().fold(0.0_f64, f64::max).max(1e-12);
    for ind in offspring.iter_mut() {
        let mut changed = false;
        for (gene, (spec, &w)) in ind.genes.iter_mut().zip(bounds.iter().zip(weights.iter())) {
            if spec.fixed.is_some() {
                continue;
            }
            let gene_p_m = (p_m * w * scale / max_w).min(0.9);
            if rng.random::<f64>() < gene_p_m {
                let std = 0.1 * (spec.hi - spec.lo) * (w / max_w).max(0.1);
                if std > 0.0 {
                    let normal = Normal::new(0.0, std).expect("std > 0 checked above");
                    *gene += normal.sample(rng);
                    changed = true;
                }
            }
        }
        if changed {
            crate::bounds::enforce(&mut ind.genes, bounds);
            ind.fitness = None;
        }
    }
}
