//! Frequency response evaluation for a coupled primary-structure plus
//! five-absorber dynamic vibration absorber system: System Assembler (C1),
//! DOF Reducer (C2), FRF Solver (C3), Criterion Extractor (C4), and
//! Scalarizer (C5).
//!
//! [`evaluate`] is the single entry point the fitness function (in
//! `dva-ga`) calls once per distinct individual.

pub mod assembler;
pub mod criteria;
pub mod error;
pub mod params;
pub mod reducer;
pub mod scalarizer;
pub mod solver;

pub use error::FrfError;
pub use params::{DvaParams, MainParams, NUM_DOF, NUM_DVA_PARAMS, NUM_MAIN_PARAMS, NUM_MASSES};

use criteria::CriterionDict;
use num_complex::Complex64;
use scalarizer::{TargetMap, WeightMap};

/// Omega-grid and reduction-tolerance configuration, spec section 6.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrfConfig {
    pub omega_start: f64,
    pub omega_end: f64,
    pub omega_points: usize,
    pub tolerance: f64,
}

impl FrfConfig {
    /// Spec section 6/12 validation, checked before the GA worker ever
    /// starts. `omega_start` is accepted at `0.0` (not strictly `> 0`) to
    /// admit scenario S1's `linspace(0, 10000, 1000)` grid.
    pub fn validate(&self) -> Result<(), String> {
        if self.omega_start < 0.0 {
            return Err("omega_start must be >= 0".into());
        }
        if self.omega_end <= self.omega_start {
            return Err("omega_end must be > omega_start".into());
        }
        if self.omega_points < 2 {
            return Err("omega_points must be >= 2".into());
        }
        if self.tolerance < 0.0 {
            return Err("tolerance must be >= 0".into());
        }
        Ok(())
    }
}

impl Default for FrfConfig {
    fn default() -> Self {
        FrfConfig {
            omega_start: 0.0,
            omega_end: 10_000.0,
            omega_points: 1000,
            tolerance: reducer::DEFAULT_TOLERANCE,
        }
    }
}

/// Targets and weights for one mass's composite measure.
#[derive(Debug, Clone, Default)]
pub struct MassTargets {
    pub targets: TargetMap,
    pub weights: WeightMap,
}

/// Result of one full FRF evaluation: per-mass criteria, composite
/// measures, and the singular response (their sum).
#[derive(Debug, Clone)]
pub struct FrfOutcome {
    pub composites: [f64; NUM_MASSES],
    pub singular_response: f64,
    pub criteria: Vec<CriterionDict>,
}

/// Run the full C1-C5 pipeline for one individual.
pub fn evaluate(
    main: &MainParams,
    dva: &DvaParams,
    config: &FrfConfig,
    mass_targets: &[MassTargets; NUM_MASSES],
) -> Result<FrfOutcome, FrfError> {
    let omega_grid = linspace(config.omega_start, config.omega_end, config.omega_points);

    let assembled = assembler::assemble(main, dva)?;

    let probe_omega = omega_grid[omega_grid.len() / 2];
    let probe = assembled.forcing(probe_omega);
    let reduced = reducer::reduce(&assembled.m, &assembled.c, &assembled.k, &probe, config.tolerance)?;

    let forcing_fn = |omega: f64| -> [Complex64; NUM_DOF] {
        let f = assembled.forcing(omega);
        let mut arr = [Complex64::new(0.0, 0.0); NUM_DOF];
        arr.copy_from_slice(f.as_slice());
        arr
    };
    let response = solver::solve_frf(&reduced, forcing_fn, &omega_grid, main.omega_dc)?;

    let mut composites = [0.0; NUM_MASSES];
    let mut criteria_out = Vec::with_capacity(NUM_MASSES);
    for mass in 0..NUM_MASSES {
        let dof = mass + 1; // mass k's response lives at DOF index k+1.
        let magnitude: Vec<f64> = (0..omega_grid.len())
            .map(|col| response[(dof, col)].norm())
            .collect();
        let dict = criteria::extract(&magnitude, &omega_grid);
        composites[mass] = scalarizer::composite_measure(
            mass,
            &dict,
            &mass_targets[mass].targets,
            &mass_targets[mass].weights,
        );
        criteria_out.push(dict);
    }

    let singular_response = scalarizer::singular_response(&composites);

    Ok(FrfOutcome {
        composites,
        singular_response,
        criteria: criteria_out,
    })
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}
