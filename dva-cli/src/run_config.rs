//! `RunConfig`: every GA hyperparameter enumerated in spec section 6,
//! loadable from a `--config` JSON file and overridable field-by-field by
//! CLI flags (file values override built-in defaults; CLI flags override
//! file values), matching the teacher's `Args`-struct-plus-`value_parser`
//! CLI convention.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, ValueEnum};
use serde::{Deserialize, Serialize};

use dva_ga::controller::{AdaptiveControllerKind, RateBounds};
use dva_ga::engine::GaConfig;
use dva_ga::error::GaError;
use dva_ga::fitness::CategoryWeights;
use dva_ga::seeder::SeedingMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedingKind {
    Uniform,
    Sobol,
    Lhs,
    BestOfPool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    Off,
    Heuristic,
    Bandit,
    Qlearning,
}

/// Every recognized configuration option from spec section 6, serializable
/// to/from JSON and carrying its own built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub population_size: usize,
    pub max_generations: u64,
    pub crossover_prob: f64,
    pub mutation_prob: f64,
    pub tolerance: f64,
    pub seeding_method: SeedingKind,
    pub pool_multiplier: usize,
    pub adaptive_controller: ControllerKind,
    pub bandit_exploration: f64,
    pub use_surrogate: bool,
    pub surrogate_k: usize,
    pub surrogate_min_obs: usize,
    pub alpha: f64,
    pub percentage_error_scale: f64,
    pub cost_scale: f64,
    pub activation_threshold: f64,
    pub activation_penalty: f64,
    pub enhanced_cost: bool,
    pub cost_weight_material: f64,
    pub cost_weight_manufacturing: f64,
    pub cost_weight_maintenance: f64,
    pub cost_weight_operational: f64,
    pub omega_start: f64,
    pub omega_end: f64,
    pub omega_points: usize,
    pub watchdog_seconds: u64,
    pub seed: u64,
    pub sobol_sample_size: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        let weights = CategoryWeights::default();
        RunConfig {
            population_size: 200,
            max_generations: 500,
            crossover_prob: 0.7,
            mutation_prob: 0.05,
            tolerance: 1e-6,
            seeding_method: SeedingKind::Lhs,
            pool_multiplier: 5,
            adaptive_controller: ControllerKind::Heuristic,
            bandit_exploration: 1.4,
            use_surrogate: false,
            surrogate_k: 5,
            surrogate_min_obs: 50,
            alpha: 0.01,
            percentage_error_scale: 0.0,
            cost_scale: 0.0,
            activation_threshold: 0.05,
            activation_penalty: 0.0,
            enhanced_cost: false,
            cost_weight_material: weights.material,
            cost_weight_manufacturing: weights.manufacturing,
            cost_weight_maintenance: weights.maintenance,
            cost_weight_operational: weights.operational,
            omega_start: 0.0,
            omega_end: 10_000.0,
            omega_points: 1000,
            watchdog_seconds: 3600,
            seed: 0,
            sobol_sample_size: None,
        }
    }
}

impl RunConfig {
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Spec section 6/12 validation, checked before the engine is ever
    /// constructed.
    pub fn validate(&self) -> Result<(), GaError> {
        let err = |msg: &str| Err(GaError::ConfigurationInvalid(msg.to_string()));
        if self.population_size == 0 {
            return err("population_size must be > 0");
        }
        if self.max_generations == 0 {
            return err("max_generations must be > 0");
        }
        if !(0.0..=1.0).contains(&self.crossover_prob) {
            return err("crossover_prob must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.mutation_prob) {
            return err("mutation_prob must be in [0, 1]");
        }
        if self.tolerance < 0.0 {
            return err("tolerance must be >= 0");
        }
        if self.alpha < 0.0 || self.percentage_error_scale < 0.0 || self.cost_scale < 0.0 {
            return err("alpha, percentage_error_scale, and cost_scale must be >= 0");
        }
        if !(0.0..=1.0).contains(&self.activation_threshold) {
            return err("activation_threshold must be in [0, 1]");
        }
        if self.activation_penalty < 0.0 {
            return err("activation_penalty must be >= 0");
        }
        if self.omega_start < 0.0 {
            return err("omega_start must be >= 0");
        }
        if self.omega_end <= self.omega_start {
            return err("omega_end must be > omega_start");
        }
        if self.omega_points < 2 {
            return err("omega_points must be >= 2");
        }
        if self.watchdog_seconds == 0 {
            return err("watchdog_seconds must be > 0");
        }
        if self.enhanced_cost {
            let weights = [
                self.cost_weight_material,
                self.cost_weight_manufacturing,
                self.cost_weight_maintenance,
                self.cost_weight_operational,
            ];
            if weights.iter().any(|&w| w < 0.0) {
                return err("cost_weight_material/manufacturing/maintenance/operational must all be >= 0");
            }
            let sum: f64 = weights.iter().sum();
            if (sum - 1.0).abs() > 1e-6 {
                return err("cost_weight_material/manufacturing/maintenance/operational must sum to 1");
            }
        }
        Ok(())
    }

    pub fn category_weights(&self) -> CategoryWeights {
        CategoryWeights {
            material: self.cost_weight_material,
            manufacturing: self.cost_weight_manufacturing,
            maintenance: self.cost_weight_maintenance,
            operational: self.cost_weight_operational,
        }
    }

    /// Assemble the engine-facing `GaConfig`; `bounds` comes from the
    /// problem file since per-gene bounds aren't a flat CLI option.
    pub fn to_ga_config(&self, bounds: Vec<dva_ga::bounds::GeneSpec>) -> GaConfig {
        let seeding_method = match self.seeding_method {
            SeedingKind::Uniform => SeedingMethod::Uniform,
            SeedingKind::Sobol => SeedingMethod::Sobol,
            SeedingKind::Lhs => SeedingMethod::Lhs,
            SeedingKind::BestOfPool => SeedingMethod::BestOfPool { pool_multiplier: self.pool_multiplier },
        };
        let adaptive_controller = match self.adaptive_controller {
            ControllerKind::Off => AdaptiveControllerKind::Off,
            ControllerKind::Heuristic => AdaptiveControllerKind::Heuristic,
            ControllerKind::Bandit => AdaptiveControllerKind::Bandit { exploration: self.bandit_exploration },
            ControllerKind::Qlearning => {
                AdaptiveControllerKind::QLearning { epsilon: 0.3, epsilon_decay: 0.995, alpha: 0.3, gamma: 0.9 }
            }
        };
        GaConfig {
            population_size: self.population_size,
            max_generations: self.max_generations,
            crossover_prob: self.crossover_prob,
            mutation_prob: self.mutation_prob,
            tolerance: self.tolerance,
            seeding_method,
            adaptive_controller,
            rate_bounds: RateBounds::default(),
            use_surrogate: self.use_surrogate,
            surrogate_k: self.surrogate_k,
            surrogate_min_obs: self.surrogate_min_obs,
            watchdog_seconds: self.watchdog_seconds,
            seed: self.seed,
            sobol_sample_size: self.sobol_sample_size,
            bounds,
        }
    }
}

/// CLI overrides: every field absent (`None`) unless the user actually
/// passed the flag, so `RunConfig::apply_overrides` only touches fields
/// the user named.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RunConfigOverrides {
    #[arg(long)]
    pub population_size: Option<usize>,
    #[arg(long)]
    pub max_generations: Option<u64>,
    #[arg(long, value_parser = parse_unit_interval)]
    pub crossover_prob: Option<f64>,
    #[arg(long, value_parser = parse_unit_interval)]
    pub mutation_prob: Option<f64>,
    #[arg(long, value_parser = parse_nonnegative_f64)]
    pub tolerance: Option<f64>,
    #[arg(long, value_enum)]
    pub seeding_method: Option<SeedingKind>,
    #[arg(long)]
    pub pool_multiplier: Option<usize>,
    #[arg(long, value_enum)]
    pub adaptive_controller: Option<ControllerKind>,
    #[arg(long)]
    pub bandit_exploration: Option<f64>,
    #[arg(long)]
    pub use_surrogate: Option<bool>,
    #[arg(long)]
    pub surrogate_k: Option<usize>,
    #[arg(long)]
    pub surrogate_min_obs: Option<usize>,
    #[arg(long, value_parser = parse_nonnegative_f64)]
    pub alpha: Option<f64>,
    #[arg(long, value_parser = parse_nonnegative_f64)]
    pub percentage_error_scale: Option<f64>,
    #[arg(long, value_parser = parse_nonnegative_f64)]
    pub cost_scale: Option<f64>,
    #[arg(long, value_parser = parse_unit_interval)]
    pub activation_threshold: Option<f64>,
    #[arg(long, value_parser = parse_nonnegative_f64)]
    pub activation_penalty: Option<f64>,
    #[arg(long)]
    pub enhanced_cost: Option<bool>,
    #[arg(long)]
    pub omega_start: Option<f64>,
    #[arg(long)]
    pub omega_end: Option<f64>,
    #[arg(long)]
    pub omega_points: Option<usize>,
    #[arg(long)]
    pub watchdog_seconds: Option<u64>,
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long)]
    pub sobol_sample_size: Option<usize>,
}

impl RunConfig {
    pub fn apply_overrides(&mut self, o: &RunConfigOverrides) {
        macro_rules! apply {
            ($field:ident) => {
                if let Some(v) = o.$field {
                    self.$field = v;
                }
            };
        }
        apply!(population_size);
        apply!(max_generations);
        apply!(crossover_prob);
        apply!(mutation_prob);
        apply!(tolerance);
        apply!(seeding_method);
        apply!(pool_multiplier);
        apply!(adaptive_controller);
        apply!(bandit_exploration);
        apply!(use_surrogate);
        apply!(surrogate_k);
        apply!(surrogate_min_obs);
        apply!(alpha);
        apply!(percentage_error_scale);
        apply!(cost_scale);
        apply!(activation_threshold);
        apply!(activation_penalty);
        apply!(enhanced_cost);
        apply!(omega_start);
        apply!(omega_end);
        apply!(omega_points);
        apply!(watchdog_seconds);
        apply!(seed);
        if o.sobol_sample_size.is_some() {
            self.sobol_sample_size = o.sobol_sample_size;
        }
    }
}

fn parse_unit_interval(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("invalid float: {s}"))?;
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err("value must be in [0, 1]".to_string())
    }
}

fn parse_nonnegative_f64(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|_| format!("invalid float: {s}"))?;
    if v >= 0.0 {
        Ok(v)
    } else {
        Err("value must be non-negative (>= 0)".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_population() {
        let mut config = RunConfig::default();
        config.population_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn enhanced_cost_requires_weights_summing_to_one() {
        let mut config = RunConfig::default();
        config.enhanced_cost = true;
        config.cost_weight_material = 0.5;
        config.cost_weight_manufacturing = 0.5;
        config.cost_weight_maintenance = 0.5;
        config.cost_weight_operational = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn enhanced_cost_rejects_negative_weight() {
        let mut config = RunConfig::default();
        config.enhanced_cost = true;
        config.cost_weight_material = -0.1;
        config.cost_weight_manufacturing = 0.4;
        config.cost_weight_maintenance = 0.4;
        config.cost_weight_operational = 0.3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn enhanced_cost_accepts_weights_summing_to_one() {
        let mut config = RunConfig::default();
        config.enhanced_cost = true;
        config.cost_weight_material = 0.25;
        config.cost_weight_manufacturing = 0.25;
        config.cost_weight_maintenance = 0.25;
        config.cost_weight_operational = 0.25;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn disabled_enhanced_cost_ignores_weight_sum() {
        let mut config = RunConfig::default();
        config.cost_weight_material = 0.0;
        config.cost_weight_manufacturing = 0.0;
        config.cost_weight_maintenance = 0.0;
        config.cost_weight_operational = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overrides_only_touch_named_fields() {
        let mut config = RunConfig::default();
        let baseline_generations = config.max_generations;
        let overrides = RunConfigOverrides { population_size: Some(42), ..Default::default() };
        config.apply_overrides(&overrides);
        assert_eq!(config.population_size, 42);
        assert_eq!(config.max_generations, baseline_generations);
    }

    #[test]
    fn round_trips_through_json() {
        let config = RunConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
