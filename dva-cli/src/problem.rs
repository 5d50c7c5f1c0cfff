//! JSON problem description: the main-system parameters, per-gene bounds,
//! per-mass targets, and cost model that together define one design run.
//! Loaded from the path given to `--problem`. Scalar GA/fitness/FRF-range
//! hyperparameters live in `RunConfig` instead, since those are flat
//! `--config`-overridable options rather than per-gene/per-mass structure.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use dva_frf::{FrfConfig, MainParams, MassTargets, NUM_DVA_PARAMS, NUM_MAIN_PARAMS, NUM_MASSES};
use dva_ga::bounds::GeneSpec;
use dva_ga::fitness::{CostCategory, FitnessConfig};

use crate::run_config::RunConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneSpecFile {
    pub lo: f64,
    pub hi: f64,
    #[serde(default)]
    pub fixed: Option<f64>,
}

impl From<&GeneSpecFile> for GeneSpec {
    fn from(g: &GeneSpecFile) -> Self {
        match g.fixed {
            Some(v) => GeneSpec::fixed(v),
            None => GeneSpec::free(g.lo, g.hi),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MassTargetsFile {
    #[serde(default)]
    pub targets: BTreeMap<String, f64>,
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
}

/// Numerical LU-solver tolerance for the FRF assembler; a physical/solver
/// detail, distinct from `RunConfig`'s omega sweep range and GA convergence
/// tolerance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrfSolverFile {
    pub tolerance: f64,
}

impl Default for FrfSolverFile {
    fn default() -> Self {
        FrfSolverFile { tolerance: FrfConfig::default().tolerance }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessConfigFile {
    #[serde(default)]
    pub cost_coefficients: Vec<f64>,
    #[serde(default)]
    pub cost_categories: Vec<String>,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

impl Default for FitnessConfigFile {
    fn default() -> Self {
        FitnessConfigFile { cost_coefficients: Vec::new(), cost_categories: Vec::new(), epsilon: default_epsilon() }
    }
}

fn default_epsilon() -> f64 {
    1e-9
}

/// The whole problem description: what system to optimize, over what
/// bounds, against what per-mass targets, under what cost model. GA
/// hyperparameters and the omega sweep range live in `RunConfig` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemFile {
    /// `MU, LANDA_1..5, NU_1..5, A_LOW, A_UPP, F_1, F_2, OMEGA_DC, ZETA_DC`.
    pub main_params: Vec<f64>,
    /// Exactly `NUM_DVA_PARAMS` (48) gene bounds, in `beta/lambda/mu/nu`
    /// declaration order.
    pub bounds: Vec<GeneSpecFile>,
    /// Exactly `NUM_MASSES` (5) per-mass target/weight maps.
    pub mass_targets: Vec<MassTargetsFile>,
    #[serde(default)]
    pub frf_solver: FrfSolverFile,
    #[serde(default)]
    pub fitness: FitnessConfigFile,
}

impl ProblemFile {
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading problem file {}", path.display()))?;
        let problem: ProblemFile = serde_json::from_str(&text)
            .with_context(|| format!("parsing problem file {}", path.display()))?;
        problem.validate()?;
        Ok(problem)
    }

    fn validate(&self) -> Result<()> {
        if self.main_params.len() != NUM_MAIN_PARAMS {
            anyhow::bail!("main_params has {} entries, expected {NUM_MAIN_PARAMS}", self.main_params.len());
        }
        if self.bounds.len() != NUM_DVA_PARAMS {
            anyhow::bail!("bounds has {} entries, expected {NUM_DVA_PARAMS}", self.bounds.len());
        }
        if self.mass_targets.len() != NUM_MASSES {
            anyhow::bail!("mass_targets has {} entries, expected {NUM_MASSES}", self.mass_targets.len());
        }
        Ok(())
    }

    pub fn main_params(&self) -> Result<MainParams> {
        MainParams::from_slice(&self.main_params).map_err(|e| anyhow::anyhow!("invalid main_params: {e}"))
    }

    pub fn bounds(&self) -> Vec<GeneSpec> {
        self.bounds.iter().map(GeneSpec::from).collect()
    }

    pub fn mass_targets(&self) -> [MassTargets; NUM_MASSES] {
        let mut iter = self.mass_targets.iter().map(|m| MassTargets {
            targets: m.targets.clone(),
            weights: m.weights.clone(),
        });
        std::array::from_fn(|_| iter.next().expect("validated length"))
    }

    pub fn frf_config(&self, run_config: &RunConfig) -> FrfConfig {
        FrfConfig {
            omega_start: run_config.omega_start,
            omega_end: run_config.omega_end,
            omega_points: run_config.omega_points,
            tolerance: self.frf_solver.tolerance,
        }
    }

    pub fn fitness_config(&self, run_config: &RunConfig) -> Result<FitnessConfig> {
        let cost_categories = self
            .fitness
            .cost_categories
            .iter()
            .map(|s| parse_cost_category(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(FitnessConfig {
            alpha: run_config.alpha,
            percentage_error_scale: run_config.percentage_error_scale,
            cost_scale: run_config.cost_scale,
            activation_threshold: run_config.activation_threshold,
            activation_penalty: run_config.activation_penalty,
            enhanced_cost: run_config.enhanced_cost,
            cost_coefficients: if self.fitness.cost_coefficients.is_empty() {
                vec![0.0; NUM_DVA_PARAMS]
            } else {
                self.fitness.cost_coefficients.clone()
            },
            cost_categories,
            category_weights: run_config.category_weights(),
            epsilon: self.fitness.epsilon,
        })
    }
}

fn parse_cost_category(s: &str) -> Result<CostCategory> {
    match s {
        "material" => Ok(CostCategory::Material),
        "manufacturing" => Ok(CostCategory::Manufacturing),
        "maintenance" => Ok(CostCategory::Maintenance),
        "operational" => Ok(CostCategory::Operational),
        other => anyhow::bail!("unknown cost category '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> String {
        let bounds: Vec<String> = (0..NUM_DVA_PARAMS).map(|_| r#"{"lo":0.0,"hi":0.2}"#.to_string()).collect();
        let mass_targets: Vec<&str> = (0..NUM_MASSES).map(|_| r#"{"targets":{},"weights":{}}"#).collect();
        format!(
            r#"{{"main_params":[1.0,0.1,0.1,0.1,0.1,0.1,0.1,0.1,0.1,0.1,0.1,1.0,0.5,1.0,1.0,10.0,0.05],
                "bounds":[{}],
                "mass_targets":[{}]}}"#,
            bounds.join(","),
            mass_targets.join(",")
        )
    }

    #[test]
    fn parses_minimal_problem_file() {
        let problem: ProblemFile = serde_json::from_str(&sample_json()).unwrap();
        problem.validate().unwrap();
        assert!(problem.main_params().is_ok());
        assert_eq!(problem.bounds().len(), NUM_DVA_PARAMS);
        let run_config = RunConfig::default();
        assert_eq!(problem.fitness_config(&run_config).unwrap().cost_coefficients.len(), NUM_DVA_PARAMS);
    }

    #[test]
    fn rejects_wrong_length_bounds() {
        let mut problem: ProblemFile = serde_json::from_str(&sample_json()).unwrap();
        problem.bounds.pop();
        assert!(problem.validate().is_err());
    }
}
