//! Command-line interface definition: file paths plus GA hyperparameter
//! overrides flattened in from `run_config::RunConfigOverrides`.

use std::path::PathBuf;

use clap::Parser;

use crate::run_config::RunConfigOverrides;

/// Run the guided genetic algorithm against a DVA design problem.
#[derive(Parser, Debug, Clone)]
#[command(author, about, long_about = None)]
pub struct Args {
    /// Path to the JSON problem file (main params, bounds, targets, costs).
    #[arg(short, long)]
    pub problem: PathBuf,

    /// Path to a JSON `RunConfig` file. File values override built-in
    /// defaults; explicit CLI flags override file values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the best individual and run history to this JSON path instead
    /// of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: RunConfigOverrides,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let args = Args::parse_from(["dva", "--problem", "problem.json"]);
        assert!(args.config.is_none());
        assert!(args.overrides.population_size.is_none());
    }

    #[test]
    fn crossover_prob_out_of_range_rejected() {
        let res = Args::try_parse_from(["dva", "--problem", "problem.json", "--crossover-prob", "1.5"]);
        assert!(res.is_err());
    }

    #[test]
    fn accepts_config_and_override_together() {
        let args = Args::parse_from([
            "dva",
            "--problem",
            "problem.json",
            "--config",
            "run.json",
            "--population-size",
            "64",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("run.json")));
        assert_eq!(args.overrides.population_size, Some(64));
    }
}
