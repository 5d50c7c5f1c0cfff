//! Individuals and the population they live in (data model, spec section 3).

use crate::bounds::Bounds;

/// One candidate: a gene vector plus its cached fitness.
///
/// `fitness` is `None` until evaluated; `f64::INFINITY` means the FRF
/// pipeline rejected this individual (spec section 4.6, "Failure
/// semantics") but it still participates in selection and breeding.
#[derive(Debug, Clone)]
pub struct Individual {
    pub genes: Vec<f64>,
    pub fitness: Option<f64>,
}

impl Individual {
    pub fn new(genes: Vec<f64>) -> Self {
        Individual { genes, fitness: None }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.fitness, Some(f) if f.is_finite())
    }

    /// Fitness for ordering purposes: unevaluated or invalid individuals
    /// sort last.
    pub fn ordering_key(&self) -> f64 {
        self.fitness.unwrap_or(f64::INFINITY)
    }
}

/// An ordered set of individuals, always of fixed length `N` between
/// generations (spec section 4.7, step 6 "Elitism").
#[derive(Debug, Clone, Default)]
pub struct Population {
    pub individuals: Vec<Individual>,
}

impl Population {
    pub fn new(individuals: Vec<Individual>) -> Self {
        Population { individuals }
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Best (lowest) fitness currently in the population, or `+inf` if
    /// every individual is unevaluated or invalid.
    pub fn best_fitness(&self) -> f64 {
        self.individuals
            .iter()
            .map(Individual::ordering_key)
            .fold(f64::INFINITY, f64::min)
    }

    pub fn best_individual(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .min_by(|a, b| a.ordering_key().partial_cmp(&b.ordering_key()).unwrap())
    }

    pub fn mean_fitness(&self) -> f64 {
        let finite: Vec<f64> = self
            .individuals
            .iter()
            .map(Individual::ordering_key)
            .filter(|f| f.is_finite())
            .collect();
        if finite.is_empty() {
            return f64::INFINITY;
        }
        finite.iter().sum::<f64>() / finite.len() as f64
    }

    pub fn max_fitness(&self) -> f64 {
        self.individuals
            .iter()
            .map(Individual::ordering_key)
            .filter(|f| f.is_finite())
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Mean pairwise Euclidean distance across genes, the diversity
    /// measure C8's heuristic policy tracks.
    pub fn diversity(&self, bounds: &Bounds) -> f64 {
        let n = self.individuals.len();
        if n < 2 {
            return 0.0;
        }
        let span: Vec<f64> = bounds.iter().map(|b| (b.hi - b.lo).max(1e-12)).collect();
        let mut total = 0.0;
        let mut pairs = 0usize;
        for i in 0..n {
            for j in (i + 1)..n {
                let d: f64 = self.individuals[i]
                    .genes
                    .iter()
                    .zip(self.individuals[j].genes.iter())
                    .zip(span.iter())
                    .map(|((a, b), s)| ((a - b) / s).powi(2))
                    .sum::<f64>()
                    .sqrt();
                total += d;
                pairs += 1;
            }
        }
        total / pairs as f64
    }

    /// Keep the best `n` individuals by fitness, deterministically
    /// breaking ties by original index so parallel evaluation order never
    /// affects the result (spec section 5, "deterministic post-ordering").
    pub fn truncate_best(mut self, n: usize) -> Population {
        let mut indexed: Vec<(usize, Individual)> = self.individuals.drain(..).enumerate().collect();
        indexed.sort_by(|(ia, a), (ib, b)| {
            a.ordering_key()
                .partial_cmp(&b.ordering_key())
                .unwrap()
                .then(ia.cmp(ib))
        });
        indexed.truncate(n);
        Population::new(indexed.into_iter().map(|(_, ind)| ind).collect())
    }
}
