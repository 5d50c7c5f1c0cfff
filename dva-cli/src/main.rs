//! DVA - command-line runner for the guided genetic algorithm design tool
//!
//! Copyright (C) 2026 DeVana contributors
//!
//! This program is free software: you can redistribute it and/or modify
//! it under the terms of the GNU General Public License as published by
//! the Free Software Foundation, either version 3 of the License, or
//! (at your option) any later version.
//!
//! This program is distributed in the hope that it will be useful,
//! but WITHOUT ANY WARRANTY; without even the implied warranty of
//! MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//! GNU General Public License for more details.
//!
//! You should have received a copy of the GNU General Public License
//! along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};

use clap::Parser;
use dva_ga::engine::GaEngine;
use dva_ga::events::WorkerEvent;
use serde::Serialize;

use dva_cli::cli::Args;
use dva_cli::config::{build_ga_config, resolve_run_config};
use dva_cli::problem::ProblemFile;

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    });
}

#[derive(Debug, Serialize)]
struct RunResult {
    best_genes: Vec<f64>,
    best_fitness: f64,
    generations: u64,
    total_evaluations: u64,
    cache_hit_rate: f64,
    total_elapsed_ms: u64,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Args::parse();

    let problem = ProblemFile::load(&args.problem)?;
    let run_config = resolve_run_config(&args)?;
    let ga_config = build_ga_config(&run_config, problem.bounds());

    let engine = GaEngine::new(
        ga_config,
        problem.main_params()?,
        problem.frf_config(&run_config),
        problem.mass_targets(),
        problem.fitness_config(&run_config)?,
    )?;

    let handle = engine.spawn();

    let aborted = Arc::new(AtomicBool::new(false));
    let aborted_for_handler = Arc::clone(&aborted);
    ctrlc::set_handler(move || {
        log::warn!("received interrupt signal, requesting graceful shutdown...");
        aborted_for_handler.store(true, Ordering::SeqCst);
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {e}"))?;

    let mut benchmark: Option<dva_ga::metrics::BenchmarkRecord> = None;
    let mut result: Option<RunResult> = None;

    loop {
        if aborted.load(Ordering::SeqCst) {
            handle.abort();
            aborted.store(false, Ordering::SeqCst); // one abort request is enough
        }
        match handle.recv() {
            Some(WorkerEvent::Progress(p)) => log::debug!("progress: {p}%"),
            Some(WorkerEvent::Status(s)) => log::info!("{s}"),
            Some(WorkerEvent::GenerationMetrics(m)) => log::info!(
                "gen {:>5}  min={:.6}  mean={:.6}  diversity={:.4}  p_c={:.3}  p_m={:.3}  n={}",
                m.generation,
                m.min_fitness,
                m.mean_fitness,
                m.diversity,
                m.crossover_prob,
                m.mutation_prob,
                m.population_size
            ),
            Some(WorkerEvent::Benchmark(b)) => benchmark = Some(b),
            Some(WorkerEvent::Finished { best_genes, best_fitness, history }) => {
                let b = benchmark.clone().unwrap_or(dva_ga::metrics::BenchmarkRecord {
                    generations: history.len() as u64,
                    total_evaluations: 0,
                    cache_hit_rate: 0.0,
                    best_fitness,
                    total_elapsed_ms: 0,
                });
                result = Some(RunResult {
                    best_genes,
                    best_fitness,
                    generations: b.generations,
                    total_evaluations: b.total_evaluations,
                    cache_hit_rate: b.cache_hit_rate,
                    total_elapsed_ms: b.total_elapsed_ms,
                });
                break;
            }
            Some(WorkerEvent::Error(e)) => anyhow::bail!("ga engine failed: {e}"),
            None => anyhow::bail!("worker event channel closed unexpectedly"),
        }
    }

    let result = result.expect("loop only exits via Finished or an early error return");
    log::info!(
        "finished: best_fitness={:.6} generations={} cache_hit_rate={:.1}%",
        result.best_fitness,
        result.generations,
        result.cache_hit_rate * 100.0
    );

    let json = serde_json::to_string_pretty(&result)?;
    match &args.output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
