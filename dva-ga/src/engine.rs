//! GA Engine (C7): the long-running, cancellable, adaptive genetic
//! algorithm worker, and the configuration that drives it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use dva_frf::{FrfConfig, MainParams, MassTargets, NUM_MASSES};

use crate::bounds::{self, Bounds};
use crate::controller::{AdaptiveController, AdaptiveControllerKind, RateBounds, Rates};
use crate::error::GaError;
use crate::fitness::{DvaFitness, FitnessConfig};
use crate::metrics::{BenchmarkRecord, GenerationMetrics};
use crate::operators::{blend_crossover, gaussian_mutate, tournament_select};
use crate::population::{Individual, Population};
use crate::seeder::{self, SeedingMethod};
use crate::sobol;
use crate::surrogate::{ScreenDecision, SurrogateConfig, SurrogateScreener};
use crate::events::{WorkerEvent, WorkerHandle};
use crate::guided::{guided_crossover, guided_mutate};

/// Every field enumerated in spec section 6's Configuration list, plus
/// the inputs needed to construct the FRF fitness function.
#[derive(Debug, Clone)]
pub struct GaConfig {
    pub population_size: usize,
    pub max_generations: u64,
    pub crossover_prob: f64,
    pub mutation_prob: f64,
    pub tolerance: f64,
    pub seeding_method: SeedingMethod,
    pub adaptive_controller: AdaptiveControllerKind,
    pub rate_bounds: RateBounds,
    pub use_surrogate: bool,
    pub surrogate_k: usize,
    pub surrogate_min_obs: usize,
    pub watchdog_seconds: u64,
    pub seed: u64,
    /// Run a C11 Sobol sensitivity study before the GA loop and, if set,
    /// feed its priority weights into C12's guided crossover/mutation for
    /// the rest of the run. `None` uses the plain blend/Gaussian
    /// operators throughout.
    pub sobol_sample_size: Option<usize>,
    pub bounds: Bounds,
}

impl GaConfig {
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
        if self.use_surrogate && self.surrogate_k == 0 {
            return err("surrogate_k must be > 0 when use_surrogate is set");
        }
        if self.watchdog_seconds == 0 {
            return err("watchdog_seconds must be > 0");
        }
        if self.bounds.is_empty() {
            return err("bounds must be non-empty");
        }
        Ok(())
    }
}

/// Why the run moved from `Running`/`Paused` into `Finalizing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TerminationReason {
    Converged,
    BudgetExhausted,
    Aborted,
    WatchdogExpired,
}

/// The GA Engine, spec section 4.7: owns population, cache, surrogate
/// observations, and controller state for exactly one run, released on
/// finalization regardless of outcome.
pub struct GaEngine {
    ga_config: GaConfig,
    main: MainParams,
    frf_config: FrfConfig,
    mass_targets: [MassTargets; NUM_MASSES],
    fitness_config: FitnessConfig,
}

impl GaEngine {
    pub fn new(
        ga_config: GaConfig,
        main: MainParams,
        frf_config: FrfConfig,
        mass_targets: [MassTargets; NUM_MASSES],
        fitness_config: FitnessConfig,
    ) -> Result<Self, GaError> {
        ga_config.validate()?;
        frf_config.validate().map_err(GaError::ConfigurationInvalid)?;
        fitness_config
            .validate(ga_config.bounds.len())
            .map_err(GaError::ConfigurationInvalid)?;
        Ok(GaEngine { ga_config, main, frf_config, mass_targets, fitness_config })
    }

    /// Spawn the worker thread (state `Idle -> Initializing`) and return a
    /// handle for pause/resume/abort and the event stream. Population,
    /// cache, surrogate, and controller state all live inside the spawned
    /// closure and are dropped together when it returns.
    pub fn spawn(self) -> WorkerHandle {
        let paused = Arc::new((Mutex::new(false), Condvar::new()));
        let aborted = Arc::new(AtomicBool::new(false));
        let (tx, rx) = std::sync::mpsc::channel();

        let paused_for_thread = Arc::clone(&paused);
        let aborted_for_thread = Arc::clone(&aborted);
        let join = std::thread::spawn(move || {
            run_worker(self, tx, paused_for_thread, aborted_for_thread);
        });

        WorkerHandle::new(paused, aborted, rx, join)
    }
}

fn send(tx: &Sender<WorkerEvent>, event: WorkerEvent) {
    // The host dropping its receiver (e.g. on shutdown) is not a worker
    // failure; there's nothing further to do but stop emitting.
    let _ = tx.send(event);
}

fn run_worker(engine: GaEngine, tx: Sender<WorkerEvent>, paused: Arc<(Mutex<bool>, Condvar)>, aborted: Arc<AtomicBool>) {
    let GaEngine { ga_config, main, frf_config, mass_targets, fitness_config } = engine;
    let bounds = ga_config.bounds.clone();
    let n = bounds.len();

    send(&tx, WorkerEvent::Status("initializing".into()));
    let fitness = DvaFitness::new(main, frf_config, mass_targets, fitness_config);
    let mut rng = StdRng::seed_from_u64(ga_config.seed);

    // Progress is monotonically non-decreasing end to end (spec section 5):
    // the Sobol study, when it runs, owns the first `SOBOL_PHASE_PCT` of the
    // range and the GA loop owns the rest, rather than each phase restarting
    // its own 0-100% sweep.
    let sobol_phase_pct: u8 = if ga_config.sobol_sample_size.is_some() { 10 } else { 0 };

    let priority_weights = match ga_config.sobol_sample_size {
        Some(sample_size) => {
            send(&tx, WorkerEvent::Status("sobol sensitivity study".into()));
            let tx_progress = tx.clone();
            let result = sobol::analyze(&bounds, sample_size, ga_config.seed, |genes| fitness.evaluate(genes), |p| {
                let scaled = ((p as f64 / 100.0) * sobol_phase_pct as f64) as u8;
                send(&tx_progress, WorkerEvent::Progress(scaled));
            });
            log::info!("sobol sensitivity: s_i={:?} s_ti={:?}", result.s_i, result.s_ti);
            Some(result.priority_weights)
        }
        None => None,
    };

    send(&tx, WorkerEvent::Status("seeding initial population".into()));
    let mut population = seeder::seed(&ga_config.seeding_method, ga_config.population_size, &bounds, ga_config.seed, &fitness, &mut rng);
    evaluate_population(&mut population, &fitness);

    let mut controller = ga_config
        .adaptive_controller
        .build(Rates { p_c: ga_config.crossover_prob, p_m: ga_config.mutation_prob, n: ga_config.population_size }, ga_config.rate_bounds);
    let mut surrogate = SurrogateScreener::new(SurrogateConfig {
        k: ga_config.surrogate_k,
        pass_through_percentile: 60.0,
        min_observations: ga_config.surrogate_min_obs,
    });

    let mut rates = Rates { p_c: ga_config.crossover_prob, p_m: ga_config.mutation_prob, n: ga_config.population_size };
    let mut history: Vec<GenerationMetrics> = Vec::new();
    let start = Instant::now();
    let watchdog = Duration::from_secs(ga_config.watchdog_seconds);

    send(&tx, WorkerEvent::Status("running".into()));

    let reason = 'generations: loop {
        if aborted.load(Ordering::SeqCst) {
            break 'generations TerminationReason::Aborted;
        }
        wait_while_paused(&paused, &aborted);
        if aborted.load(Ordering::SeqCst) {
            break 'generations TerminationReason::Aborted;
        }
        if start.elapsed() >= watchdog {
            log::info!("watchdog deadline exceeded, finalizing");
            break 'generations TerminationReason::WatchdogExpired;
        }
        if history.len() as u64 >= ga_config.max_generations {
            break 'generations TerminationReason::BudgetExhausted;
        }

        let gen_start = Instant::now();
        let mut offspring = tournament_select(&population, rates.n, &mut rng);

        match &priority_weights {
            Some(weights) => guided_crossover(&mut offspring, rates.p_c, weights, &bounds, &mut rng),
            None => blend_crossover(&mut offspring, rates.p_c, &bounds, &mut rng),
        }
        match &priority_weights {
            Some(weights) => guided_mutate(&mut offspring, rates.p_m, 1.0, weights, &bounds, &mut rng),
            None => gaussian_mutate(&mut offspring, rates.p_m, &bounds, &mut rng),
        }

        if aborted.load(Ordering::SeqCst) {
            break 'generations TerminationReason::Aborted;
        }

        evaluate_offspring(&mut offspring, &fitness, ga_config.use_surrogate, &mut surrogate);

        let mut merged = population.individuals.clone();
        merged.extend(offspring);
        population = Population::new(merged).truncate_best(ga_config.population_size);

        let (hits, misses) = fitness.take_hit_miss_counters();
        let metrics = GenerationMetrics {
            generation: history.len() as u64,
            min_fitness: population.best_fitness(),
            mean_fitness: population.mean_fitness(),
            max_fitness: population.max_fitness(),
            diversity: population.diversity(&bounds),
            crossover_prob: rates.p_c,
            mutation_prob: rates.p_m,
            population_size: population.len(),
            elapsed_ms: gen_start.elapsed().as_millis() as u64,
            cache_hits: hits,
            cache_misses: misses,
        };
        send(&tx, WorkerEvent::GenerationMetrics(metrics.clone()));
        send(
            &tx,
            WorkerEvent::Progress(progress_percent(metrics.generation, ga_config.max_generations, sobol_phase_pct)),
        );

        let next_rates = controller.step(&metrics, &mut rng);
        rates = reconcile_population_size(&mut population, next_rates, &bounds, &fitness, &mut rng);

        if metrics.min_fitness <= ga_config.tolerance {
            history.push(metrics);
            break 'generations TerminationReason::Converged;
        }
        history.push(metrics);
    };

    send(&tx, WorkerEvent::Status(format!("finalizing: {reason:?}")));
    log::info!("ga engine finalizing after {} generations: {:?}", history.len(), reason);

    let best = population.best_individual().cloned().unwrap_or_else(|| Individual::new(vec![0.0; n]));
    let best_fitness = fitness.evaluate_uncached(&best.genes);

    send(
        &tx,
        WorkerEvent::Benchmark(BenchmarkRecord {
            generations: history.len() as u64,
            total_evaluations: history.iter().map(|m| m.cache_hits + m.cache_misses).sum(),
            cache_hit_rate: {
                let (h, m): (u64, u64) = history.iter().fold((0, 0), |(h, m), g| (h + g.cache_hits, m + g.cache_misses));
                if h + m == 0 { 0.0 } else { h as f64 / (h + m) as f64 }
            },
            best_fitness,
            total_elapsed_ms: start.elapsed().as_millis() as u64,
        }),
    );
    send(&tx, WorkerEvent::Finished { best_genes: best.genes, best_fitness, history });
}

/// GA-loop progress, offset past `base_pct` (the Sobol phase's reserved
/// share, 0 if no Sobol study ran) so the combined progress stream never
/// decreases across the Sobol-to-GA handoff.
fn progress_percent(generation: u64, max_generations: u64, base_pct: u8) -> u8 {
    let span = 100 - base_pct as f64;
    if max_generations == 0 {
        return 100;
    }
    let fraction = (((generation + 1) as f64 / max_generations as f64) * span).min(span);
    (base_pct as f64 + fraction) as u8
}

fn wait_while_paused(paused: &Arc<(Mutex<bool>, Condvar)>, aborted: &Arc<AtomicBool>) {
    let (lock, cvar) = &**paused;
    let mut guard = lock.lock().unwrap();
    while *guard && !aborted.load(Ordering::SeqCst) {
        guard = cvar.wait(guard).unwrap();
    }
}

fn evaluate_population(population: &mut Population, fitness: &DvaFitness) {
    let results: Vec<f64> = population.individuals.par_iter().map(|ind| fitness.evaluate(&ind.genes)).collect();
    for (ind, f) in population.individuals.iter_mut().zip(results) {
        ind.fitness = Some(f);
    }
}

/// Evaluate every offspring whose fitness is `None` (spec section 4.7
/// step 5). When the surrogate is enabled and active, candidates
/// predicted expensive are discarded (their fitness set to `+inf`,
/// i.e. they simply lose every subsequent tournament and elitism
/// comparison) instead of incurring a full FRF evaluation.
fn evaluate_offspring(offspring: &mut [Individual], fitness: &DvaFitness, use_surrogate: bool, surrogate: &mut SurrogateScreener) {
    let to_evaluate: Vec<usize> = offspring
        .iter()
        .enumerate()
        .filter(|(_, ind)| ind.fitness.is_none())
        .filter_map(|(i, ind)| {
            if use_surrogate && surrogate.screen(&ind.genes) == ScreenDecision::Discard {
                None
            } else {
                Some(i)
            }
        })
        .collect();

    let results: Vec<(usize, f64)> = to_evaluate
        .par_iter()
        .map(|&i| (i, fitness.evaluate(&offspring[i].genes)))
        .collect();

    for (i, f) in &results {
        offspring[*i].fitness = Some(*f);
    }
    for (i, f) in results {
        surrogate.observe(&offspring[i].genes, f);
    }
    for ind in offspring.iter_mut().filter(|ind| ind.fitness.is_none()) {
        // Screened out: excluded from full evaluation, so it cannot win a
        // tournament or survive elitism against a truly scored peer.
        ind.fitness = Some(f64::INFINITY);
    }
}

/// Apply the controller's requested `N` for the next generation: grow by
/// seeding fresh uniform individuals, or shrink by keeping the best `N`.
/// Rates for crossover/mutation pass through unchanged.
fn reconcile_population_size(population: &mut Population, next: Rates, bounds: &Bounds, fitness: &DvaFitness, rng: &mut StdRng) -> Rates {
    let current = population.len();
    if next.n > current {
        let mut extra = seeder::seed(&SeedingMethod::Uniform, next.n - current, bounds, 0, fitness, rng);
        evaluate_population(&mut extra, fitness);
        let mut merged = std::mem::take(&mut population.individuals);
        merged.extend(extra.individuals);
        *population = Population::new(merged);
    } else if next.n < current {
        *population = std::mem::take(population).truncate_best(next.n);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::CategoryWeights;
    use crate::bounds::GeneSpec;
    use dva_frf::NUM_DVA_PARAMS;

    fn nominal_main() -> MainParams {
        MainParams::from_slice(&[
            1.0, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 1.0, 0.5, 1.0, 1.0, 10.0, 0.05,
        ])
        .unwrap()
    }

    fn dva_bounds() -> Bounds {
        (0..NUM_DVA_PARAMS).map(|_| GeneSpec::free(0.0, 0.2)).collect()
    }

    fn base_config() -> GaConfig {
        GaConfig {
            population_size: 12,
            max_generations: 6,
            crossover_prob: 0.7,
            mutation_prob: 0.1,
            tolerance: 0.0,
            seeding_method: SeedingMethod::Uniform,
            adaptive_controller: AdaptiveControllerKind::Off,
            rate_bounds: RateBounds::default(),
            use_surrogate: false,
            surrogate_k: 5,
            surrogate_min_obs: 50,
            watchdog_seconds: 3600,
            seed: 42,
            sobol_sample_size: None,
            bounds: dva_bounds(),
        }
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
    fn rejects_invalid_configuration_before_starting() {
        let mut config = base_config();
        config.population_size = 0;
        let engine = GaEngine::new(config, nominal_main(), FrfConfig::default(), std::array::from_fn(|_| MassTargets::default()), default_fitness_config());
        assert!(matches!(engine, Err(GaError::ConfigurationInvalid(_))));
    }

    #[test]
    fn run_emits_finished_with_bounded_best() {
        let engine = GaEngine::new(base_config(), nominal_main(), FrfConfig::default(), std::array::from_fn(|_| MassTargets::default()), default_fitness_config()).unwrap();
        let mut handle = engine.spawn();
        let mut finished = None;
        let mut last_generation: i64 = -1;
        while let Some(event) = handle.recv() {
            match event {
                WorkerEvent::GenerationMetrics(m) => {
                    assert!(m.generation as i64 > last_generation);
                    last_generation = m.generation as i64;
                }
                WorkerEvent::Finished { best_genes, best_fitness, .. } => {
                    assert!(bounds::is_within_bounds(&best_genes, &dva_bounds()));
                    assert!(best_fitness.is_finite() || best_fitness == f64::INFINITY);
                    finished = Some(());
                    break;
                }
                WorkerEvent::Error(e) => panic!("unexpected run-level error: {e}"),
                _ => {}
            }
        }
        handle.join();
        assert!(finished.is_some());
    }

    #[test]
    fn abort_terminates_within_one_generation() {
        let mut config = base_config();
        config.max_generations = 5000;
        let engine = GaEngine::new(config, nominal_main(), FrfConfig::default(), std::array::from_fn(|_| MassTargets::default()), default_fitness_config()).unwrap();
        let mut handle = engine.spawn();
        // Let a couple of generations run, then abort.
        let mut seen_generations = 0;
        loop {
            match handle.recv() {
                Some(WorkerEvent::GenerationMetrics(_)) => {
                    seen_generations += 1;
                    if seen_generations == 2 {
                        handle.abort();
                    }
                }
                Some(WorkerEvent::Finished { .. }) => break,
                Some(WorkerEvent::Error(e)) => panic!("unexpected error: {e}"),
                Some(_) => {}
                None => break,
            }
        }
        handle.join();
        assert!(seen_generations < 5000);
    }
}
