//! Generation-level metrics record (spec section 4.7 step 7, section 6).

use serde::{Deserialize, Serialize};

/// Emitted once per generation. Adaptive controllers (C8) consume this;
/// the host receives it as `WorkerEvent::GenerationMetrics`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationMetrics {
    pub generation: u64,
    pub min_fitness: f64,
    pub mean_fitness: f64,
    pub max_fitness: f64,
    pub diversity: f64,
    pub crossover_prob: f64,
    pub mutation_prob: f64,
    pub population_size: usize,
    pub elapsed_ms: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

/// Emitted once on finalization: a summary across the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    pub generations: u64,
    pub total_evaluations: u64,
    pub cache_hit_rate: f64,
    pub best_fitness: f64,
    pub total_elapsed_ms: u64,
}
