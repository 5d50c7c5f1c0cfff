//! Resolves the CLI's `--config` file and override flags into a validated
//! `RunConfig`, then assembles the engine-facing `GaConfig`.

use anyhow::Result;

use dva_ga::bounds::GeneSpec;
use dva_ga::engine::GaConfig;

use crate::cli::Args;
use crate::run_config::RunConfig;

/// Built-in defaults, overlaid by `--config <path>` if given, overlaid by
/// any CLI flags the user actually passed.
pub fn resolve_run_config(args: &Args) -> Result<RunConfig> {
    let mut run_config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    run_config.apply_overrides(&args.overrides);
    run_config.validate()?;
    Ok(run_config)
}

pub fn build_ga_config(run_config: &RunConfig, bounds: Vec<GeneSpec>) -> GaConfig {
    run_config.to_ga_config(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use dva_ga::controller::AdaptiveControllerKind;

    #[test]
    fn builds_config_matching_cli_defaults() {
        let args = Args::parse_from(["dva", "--problem", "problem.json"]);
        let run_config = resolve_run_config(&args).unwrap();
        assert_eq!(run_config.population_size, 200);
        let bounds: Vec<GeneSpec> = (0..dva_frf::NUM_DVA_PARAMS).map(|_| GeneSpec::free(0.0, 1.0)).collect();
        let config = build_ga_config(&run_config, bounds);
        assert_eq!(config.bounds.len(), dva_frf::NUM_DVA_PARAMS);
        assert!(matches!(config.adaptive_controller, AdaptiveControllerKind::Heuristic));
    }

    #[test]
    fn cli_override_beats_default() {
        let args = Args::parse_from(["dva", "--problem", "problem.json", "--population-size", "77"]);
        let run_config = resolve_run_config(&args).unwrap();
        assert_eq!(run_config.population_size, 77);
    }

    #[test]
    fn invalid_merged_config_is_rejected() {
        let args = Args::parse_from(["dva", "--problem", "problem.json", "--max-generations", "0"]);
        assert!(resolve_run_config(&args).is_err());
    }
}
