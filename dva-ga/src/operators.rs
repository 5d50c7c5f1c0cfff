//! Selection, crossover, and mutation operators (spec section 4.7, steps
//! 2-4): binary tournament, blend crossover (BLX-alpha), per-gene
//! Gaussian mutation.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::bounds::Bounds;
use crate::population::{Individual, Population};

/// Binary tournament selection: draw two individuals uniformly, keep the
/// lower-fitness one. Repeated `n` times to build an offspring pool.
pub fn tournament_select<R: Rng + ?Sized>(pop: &Population, n: usize, rng: &mut R) -> Vec<Individual> {
    let len = pop.len();
    (0..n)
        .map(|_| {
            let a = &pop.individuals[rng.random_range(0..len)];
            let b = &pop.individuals[rng.random_range(0..len)];
            if a.ordering_key() <= b.ordering_key() {
                a.clone()
            } else {
                b.clone()
            }
        })
        .collect()
}

/// Blend crossover (BLX-alpha, alpha=0.5): applied to consecutive pairs
/// with probability `p_c`. For each gene, sample uniformly from the
/// interval extended by `alpha` times the parents' gap on either side.
pub fn blend_crossover<R: Rng + ?Sized>(offspring: &mut [Individual], p_c: f64, bounds: &Bounds, rng: &mut R) {
    const ALPHA: f64 = 0.5;
    let mut i = 0;
    while i + 1 < offspring.len() {
        if rng.random::<f64>() < p_c {
            let (left, right) = offspring.split_at_mut(i + 1);
            let parent_a = &left[i];
            let parent_b = &right[0];
            let mut child_a = parent_a.genes.clone();
            let mut child_b = parent_b.genes.clone();
            for g in 0..child_a.len() {
                let (x1, x2) = (parent_a.genes[g], parent_b.genes[g]);
                let (lo, hi) = (x1.min(x2), x1.max(x2));
                let span = hi - lo;
                let lower = lo - ALPHA * span;
                let upper = hi + ALPHA * span;
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

/// Per-gene Gaussian mutation, std-dev `0.1 * (hi - lo)`, applied to each
/// gene independently with probability `p_m`. Fixed genes are restored to
/// their constant after perturbation rather than being skipped, matching
/// the spec's "clipped to [lo, hi]... fixed genes are restored" wording.
pub fn gaussian_mutate<R: Rng + ?Sized>(offspring: &mut [Individual], p_m: f64, bounds: &Bounds, rng: &mut R) {
    for ind in offspring.iter_mut() {
        let mut changed = false;
        for (g, (gene, spec)) in ind.genes.iter_mut().zip(bounds.iter()).enumerate() {
            let _ = g;
            if spec.fixed.is_some() {
                continue;
            }
            if rng.random::<f64>() < p_m {
                let std = 0.1 * (spec.hi - spec.lo);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::GeneSpec;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bounds() -> Bounds {
        vec![GeneSpec::free(0.0, 1.0), GeneSpec::fixed(0.5)]
    }

    #[test]
    fn tournament_select_prefers_lower_fitness_in_expectation() {
        let mut rng = StdRng::seed_from_u64(1);
        let pop = Population::new(vec![
            Individual { genes: vec![0.0, 0.5], fitness: Some(100.0) },
            Individual { genes: vec![1.0, 0.5], fitness: Some(0.0) },
        ]);
        let selected = tournament_select(&pop, 50, &mut rng);
        let better_count = selected.iter().filter(|i| i.genes[0] == 1.0).count();
        assert!(better_count > 25, "tournament should favor the fitter parent, got {better_count}/50");
    }

    #[test]
    fn mutation_never_touches_fixed_genes() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut pop = vec![Individual::new(vec![0.5, 0.5]); 20];
        gaussian_mutate(&mut pop, 1.0, &bounds(), &mut rng);
        for ind in &pop {
            assert_eq!(ind.genes[1], 0.5);
            assert!(ind.genes[0] >= 0.0 && ind.genes[0] <= 1.0);
        }
    }

    #[test]
    fn crossover_respects_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut pop = vec![
            Individual::new(vec![0.0, 0.5]),
            Individual::new(vec![1.0, 0.5]),
            Individual::new(vec![0.2, 0.5]),
            Individual::new(vec![0.8, 0.5]),
        ];
        blend_crossover(&mut pop, 1.0, &bounds(), &mut rng);
        for ind in &pop {
            assert!(ind.genes[0] >= 0.0 && ind.genes[0] <= 1.0);
            assert_eq!(ind.genes[1], 0.5);
        }
    }
}
