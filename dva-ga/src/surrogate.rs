//! Surrogate Screener (C9): a k-NN predictor over observed `(x, f)` pairs
//! used to pre-filter mutation/crossover candidates before a full FRF
//! evaluation.

/// One observed `(parameter vector, true fitness)` pair.
#[derive(Debug, Clone)]
struct Observation {
    genes: Vec<f64>,
    fitness: f64,
}

#[derive(Debug, Clone)]
pub struct SurrogateConfig {
    pub k: usize,
    pub pass_through_percentile: f64,
    pub min_observations: usize,
}

impl Default for SurrogateConfig {
    fn default() -> Self {
        SurrogateConfig { k: 5, pass_through_percentile: 60.0, min_observations: 50 }
    }
}

/// Whether a screened candidate should go on to a full FRF evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenDecision {
    Evaluate,
    Discard,
}

pub struct SurrogateScreener {
    config: SurrogateConfig,
    observations: Vec<Observation>,
}

impl SurrogateScreener {
    pub fn new(config: SurrogateConfig) -> Self {
        SurrogateScreener { config, observations: Vec::new() }
    }

    pub fn observe(&mut self, genes: &[f64], fitness: f64) {
        if fitness.is_finite() {
            self.observations.push(Observation { genes: genes.to_vec(), fitness });
        }
    }

    pub fn is_active(&self) -> bool {
        self.observations.len() >= self.config.min_observations
    }

    /// Inverse-distance-weighted mean of the `k` nearest observed points.
    /// Returns `None` when the screener isn't active yet (not enough
    /// observations), in which case the caller should evaluate directly.
    pub fn predict(&self, genes: &[f64]) -> Option<f64> {
        if !self.is_active() {
            return None;
        }
        let mut distances: Vec<(f64, f64)> = self
            .observations
            .iter()
            .map(|o| (euclidean(genes, &o.genes), o.fitness))
            .collect();
        distances.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        let neighbors = &distances[..self.config.k.min(distances.len())];

        if let Some(&(d, f)) = neighbors.iter().find(|(d, _)| *d < 1e-12) {
            let _ = d;
            return Some(f);
        }
        let weight_sum: f64 = neighbors.iter().map(|(d, _)| 1.0 / d).sum();
        let weighted: f64 = neighbors.iter().map(|(d, f)| f / d).sum();
        Some(weighted / weight_sum)
    }

    /// Decide whether to pass a candidate through to full evaluation.
    /// Candidates predicted cheap (below the configured percentile of
    /// recently observed true fitnesses) pass through; others are
    /// discarded. The screener never gates individuals already destined
    /// for the elite set — callers must evaluate elites directly.
    pub fn screen(&self, genes: &[f64]) -> ScreenDecision {
        let Some(predicted) = self.predict(genes) else {
            return ScreenDecision::Evaluate;
        };
        let threshold = self.percentile(self.config.pass_through_percentile);
        if predicted <= threshold {
            ScreenDecision::Evaluate
        } else {
            ScreenDecision::Discard
        }
    }

    fn percentile(&self, p: f64) -> f64 {
        let mut values: Vec<f64> = self.observations.iter().map(|o| o.fitness).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        if values.is_empty() {
            return f64::INFINITY;
        }
        let idx = ((p / 100.0) * (values.len() - 1) as f64).round() as usize;
        values[idx.min(values.len() - 1)]
    }

    pub fn observation_count(&self) -> usize {
        self.observations.len()
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_below_min_observations() {
        let mut screener = SurrogateScreener::new(SurrogateConfig { k: 3, pass_through_percentile: 50.0, min_observations: 10 });
        for i in 0..5 {
            screener.observe(&[i as f64], i as f64);
        }
        assert!(!screener.is_active());
        assert_eq!(screener.screen(&[2.0]), ScreenDecision::Evaluate);
    }

    #[test]
    fn exact_match_returns_observed_fitness() {
        let mut screener = SurrogateScreener::new(SurrogateConfig { k: 3, pass_through_percentile: 60.0, min_observations: 2 });
        screener.observe(&[1.0, 2.0], 9.5);
        screener.observe(&[5.0, 5.0], 100.0);
        assert_eq!(screener.predict(&[1.0, 2.0]), Some(9.5));
    }

    #[test]
    fn cheap_candidates_pass_expensive_discarded() {
        let mut screener = SurrogateScreener::new(SurrogateConfig { k: 3, pass_through_percentile: 50.0, min_observations: 4 });
        screener.observe(&[0.0], 0.0);
        screener.observe(&[1.0], 1.0);
        screener.observe(&[2.0], 2.0);
        screener.observe(&[3.0], 3.0);
        assert_eq!(screener.screen(&[0.1]), ScreenDecision::Evaluate);
        assert_eq!(screener.screen(&[3.0]), ScreenDecision::Discard);
    }
}
