//! Fitness Function (C6): composes the FRF pipeline with sparsity,
//! activation, percentage-error, and cost terms, and memoizes the result.

use dva_frf::{DvaParams, FrfConfig, MainParams, MassTargets};

use crate::cache::FitnessCache;

/// Which cost category a DVA gene belongs to, for the enhanced
/// cost-benefit model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostCategory {
    Material,
    Manufacturing,
    Maintenance,
    Operational,
}

/// Per-category scale factors; conventionally sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryWeights {
    pub material: f64,
    pub manufacturing: f64,
    pub maintenance: f64,
    pub operational: f64,
}

impl CategoryWeights {
    pub fn of(&self, category: CostCategory) -> f64 {
        match category {
            CostCategory::Material => self.material,
            CostCategory::Manufacturing => self.manufacturing,
            CostCategory::Maintenance => self.maintenance,
            CostCategory::Operational => self.operational,
        }
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        CategoryWeights {
            material: 0.25,
            manufacturing: 0.25,
            maintenance: 0.25,
            operational: 0.25,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FitnessConfig {
    pub alpha: f64,
    pub percentage_error_scale: f64,
    pub cost_scale: f64,
    pub activation_threshold: f64,
    pub activation_penalty: f64,
    pub enhanced_cost: bool,
    pub cost_coefficients: Vec<f64>,
    pub cost_categories: Vec<CostCategory>,
    pub category_weights: CategoryWeights,
    pub epsilon: f64,
}

impl FitnessConfig {
    pub fn validate(&self, n: usize) -> Result<(), String> {
        if self.alpha < 0.0 {
            return Err("alpha must be >= 0".into());
        }
        if !(0.0..=1.0).contains(&self.activation_threshold) {
            return Err("activation_threshold must be in [0, 1]".into());
        }
        if self.cost_coefficients.len() != n {
            return Err(format!(
                "cost_coefficients has length {} but expected {n}",
                self.cost_coefficients.len()
            ));
        }
        if self.enhanced_cost && self.cost_categories.len() != n {
            return Err(format!(
                "cost_categories has length {} but expected {n}",
                self.cost_categories.len()
            ));
        }
        Ok(())
    }
}

/// Wraps the FRF evaluator (dva-frf) with the fitness composition and
/// cache of spec section 4.6. `genes` are the 48-length DVA parameter
/// vector; the main-system parameters and per-mass targets are fixed at
/// construction time, matching the "pure function of inputs plus
/// configuration captured at construction" contract of section 6.
pub struct DvaFitness {
    main: MainParams,
    frf_config: FrfConfig,
    mass_targets: [MassTargets; dva_frf::NUM_MASSES],
    fitness_config: FitnessConfig,
    cache: FitnessCache,
    hits: std::sync::atomic::AtomicU64,
    misses: std::sync::atomic::AtomicU64,
}

impl DvaFitness {
    pub fn new(
        main: MainParams,
        frf_config: FrfConfig,
        mass_targets: [MassTargets; dva_frf::NUM_MASSES],
        fitness_config: FitnessConfig,
    ) -> Self {
        DvaFitness {
            main,
            frf_config,
            mass_targets,
            fitness_config,
            cache: FitnessCache::new(),
            hits: std::sync::atomic::AtomicU64::new(0),
            misses: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Scalar fitness to minimize, `>= 0`, or `f64::INFINITY` on any FRF
    /// failure. Reads the cache first; on a miss, evaluates and stores.
    pub fn evaluate(&self, genes: &[f64]) -> f64 {
        use std::sync::atomic::Ordering::Relaxed;
        if let Some(cached) = self.cache.get(genes) {
            self.hits.fetch_add(1, Relaxed);
            return cached;
        }
        self.misses.fetch_add(1, Relaxed);
        let value = self.evaluate_uncached(genes);
        self.cache.insert(genes, value);
        value
    }

    /// Read and reset the cache hit/miss counters since the last call,
    /// for the per-generation `GenerationMetrics` record.
    pub fn take_hit_miss_counters(&self) -> (u64, u64) {
        use std::sync::atomic::Ordering::Relaxed;
        (self.hits.swap(0, Relaxed), self.misses.swap(0, Relaxed))
    }

    /// Canonical re-evaluation path (spec section 4.7 / 9): bypasses the
    /// cache entirely. Used for the terminal `Finished` event so the
    /// reported fitness always matches a fresh FRF evaluation.
    pub fn evaluate_uncached(&self, genes: &[f64]) -> f64 {
        let dva = match DvaParams::from_slice(genes) {
            Ok(d) => d,
            Err(_) => return f64::INFINITY,
        };
        let outcome = match dva_frf::evaluate(&self.main, &dva, &self.frf_config, &self.mass_targets) {
            Ok(o) => o,
            Err(e) => {
                log::warn!("individual rejected during fitness evaluation: {e}");
                return f64::INFINITY;
            }
        };

        let sparsity: f64 = genes.iter().map(|x| x.abs()).sum();
        let percentage_error = self.percentage_error(&outcome);
        let active_count = genes
            .iter()
            .filter(|&&x| x > self.fitness_config.activation_threshold)
            .count() as f64;
        let cost = if self.fitness_config.enhanced_cost {
            self.enhanced_cost(genes, outcome.singular_response)
        } else {
            self.simple_cost(genes)
        };

        (outcome.singular_response - 1.0).abs()
            + self.fitness_config.alpha * sparsity
            + self.fitness_config.percentage_error_scale * percentage_error
            + self.fitness_config.activation_penalty * active_count
            + self.fitness_config.cost_scale * cost
    }

    fn percentage_error(&self, outcome: &dva_frf::FrfOutcome) -> f64 {
        let eps = self.fitness_config.epsilon;
        let mut total = 0.0;
        for (mass, dict) in outcome.criteria.iter().enumerate() {
            for (name, &target) in &self.mass_targets[mass].targets {
                if let Some(actual) = dict.get_named(name) {
                    total += 100.0 * (actual - target).abs() / target.abs().max(eps);
                }
            }
        }
        total
    }

    fn simple_cost(&self, genes: &[f64]) -> f64 {
        genes
            .iter()
            .zip(self.fitness_config.cost_coefficients.iter())
            .map(|(x, c)| c * x)
            .sum()
    }

    fn enhanced_cost(&self, genes: &[f64], singular_response: f64) -> f64 {
        let weighted_cost: f64 = genes
            .iter()
            .zip(self.fitness_config.cost_coefficients.iter())
            .zip(self.fitness_config.cost_categories.iter())
            .map(|((x, c), category)| c * self.fitness_config.category_weights.of(*category) * x)
            .sum();
        let benefit = (1.0 - (singular_response - 1.0).abs()).max(0.0);
        weighted_cost - benefit
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dva_frf::NUM_DVA_PARAMS;

    fn nominal_main() -> MainParams {
        MainParams::from_slice(&[
            1.0, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 1.0, 0.5, 1.0, 1.0, 10.0, 0.05,
        ])
        .unwrap()
    }

    fn default_fitness_config() -> FitnessConfig {
        FitnessConfig {
            alpha: 0.01,
            percentage_error_scale: 0.0,
            cost_scale: 0.0,
            activation_threshold: 0.05,
            activation_penalty: 0.0,
            enhanced_cost: false,
            cost_coefficients: vec![0.0; NUM_DVA_PARAMS],
            cost_categories: Vec::new(),
            category_weights: CategoryWeights::default(),
            epsilon: 1e-9,
        }
    }

    #[test]
    fn cache_hit_is_bit_identical_to_first_evaluation() {
        let fitness = DvaFitness::new(
            nominal_main(),
            FrfConfig::default(),
            std::array::from_fn(|_| dva_frf::MassTargets::default()),
            default_fitness_config(),
        );
        let genes = vec![0.02; NUM_DVA_PARAMS];
        let first = fitness.evaluate(&genes);
        let second = fitness.evaluate(&genes);
        assert_eq!(first.to_bits(), second.to_bits());
        assert_eq!(fitness.cache_len(), 1);
    }

    #[test]
    fn invalid_length_genes_yield_infinity() {
        let fitness = DvaFitness::new(
            nominal_main(),
            FrfConfig::default(),
            std::array::from_fn(|_| dva_frf::MassTargets::default()),
            default_fitness_config(),
        );
        assert_eq!(fitness.evaluate(&[0.0, 1.0]), f64::INFINITY);
    }

    #[test]
    fn uncached_path_bypasses_cache_storage() {
        let fitness = DvaFitness::new(
            nominal_main(),
            FrfConfig::default(),
            std::array::from_fn(|_| dva_frf::MassTargets::default()),
            default_fitness_config(),
        );
        let genes = vec![0.02; NUM_DVA_PARAMS];
        let value = fitness.evaluate_uncached(&genes);
        assert!(value.is_finite());
        assert_eq!(fitness.cache_len(), 0);
    }
}
