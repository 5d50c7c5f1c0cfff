//! Adaptive Controller (C8): heuristic, UCB bandit, and Q-learning
//! policies behind one `step` contract.
//!
//! Modeled as an enum with one inherent `step` method, not a trait object
//! (spec section 9, "Dynamic dispatch over controllers": a closed set of
//! three algorithms sharing one contract).

use rand::rngs::StdRng;
use rand::Rng;

use crate::metrics::GenerationMetrics;

/// Rate bounds every policy (including `Off`) respects.
#[derive(Debug, Clone, Copy)]
pub struct RateBounds {
    pub p_c_min: f64,
    pub p_c_max: f64,
    pub p_m_min: f64,
    pub p_m_max: f64,
    pub n_min: usize,
    pub n_max: usize,
}

impl Default for RateBounds {
    fn default() -> Self {
        RateBounds { p_c_min: 0.1, p_c_max: 0.95, p_m_min: 0.001, p_m_max: 0.5, n_min: 10, n_max: 2000 }
    }
}

/// Knobs returned by `step`, applied to the next generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rates {
    pub p_c: f64,
    pub p_m: f64,
    pub n: usize,
}

#[derive(Debug, Clone)]
struct HeuristicState {
    stagnation: u32,
    last_best: f64,
    baseline: Rates,
}

#[derive(Debug, Clone)]
struct BanditArm {
    rates: Rates,
    pulls: u64,
    reward_sum: f64,
}

#[derive(Debug, Clone)]
struct BanditState {
    arms: Vec<BanditArm>,
    total_pulls: u64,
    exploration: f64,
    last_best: f64,
    last_arm: usize,
}

#[derive(Debug, Clone)]
struct QLearningState {
    /// Q-table indexed by `(stagnation_bucket, diversity_bucket, action)`.
    q_table: Vec<[f64; 5]>,
    epsilon: f64,
    epsilon_decay: f64,
    alpha: f64,
    gamma: f64,
    last_best: f64,
    last_state: usize,
    last_action: usize,
    rates: Rates,
}

/// Which policy `GaConfig::adaptive_controller` selects (spec section 6,
/// `adaptive_controller ∈ {off, heuristic, bandit, qlearning}`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdaptiveControllerKind {
    Off,
    Heuristic,
    Bandit { exploration: f64 },
    QLearning { epsilon: f64, epsilon_decay: f64, alpha: f64, gamma: f64 },
}

impl AdaptiveControllerKind {
    pub fn build(self, baseline: Rates, bounds: RateBounds) -> AdaptiveController {
        match self {
            AdaptiveControllerKind::Off => AdaptiveController::off(baseline),
            AdaptiveControllerKind::Heuristic => AdaptiveController::heuristic(baseline, bounds),
            AdaptiveControllerKind::Bandit { exploration } => AdaptiveController::bandit(baseline, bounds, exploration),
            AdaptiveControllerKind::QLearning { epsilon, epsilon_decay, alpha, gamma } => {
                AdaptiveController::q_learning(baseline, bounds, epsilon, epsilon_decay, alpha, gamma)
            }
        }
    }
}

/// The three interchangeable rate-control policies, plus `Off` (rates
/// never change).
#[derive(Debug, Clone)]
pub enum AdaptiveController {
    Off { rates: Rates },
    Heuristic { bounds: RateBounds, state: HeuristicState },
    Bandit { bounds: RateBounds, state: BanditState },
    QLearning { bounds: RateBounds, state: QLearningState },
}

impl AdaptiveController {
    pub fn off(rates: Rates) -> Self {
        AdaptiveController::Off { rates }
    }

    pub fn heuristic(baseline: Rates, bounds: RateBounds) -> Self {
        AdaptiveController::Heuristic {
            bounds,
            state: HeuristicState { stagnation: 0, last_best: f64::INFINITY, baseline },
        }
    }

    /// Arms are a small discretized grid over `(p_c, p_m, n)`, centered on
    /// `baseline`, spanning the supplied bounds.
    pub fn bandit(baseline: Rates, bounds: RateBounds, exploration: f64) -> Self {
        let p_c_options = [bounds.p_c_min, baseline.p_c, bounds.p_c_max];
        let p_m_options = [bounds.p_m_min, baseline.p_m, bounds.p_m_max];
        let mut arms = Vec::new();
        for &p_c in &p_c_options {
            for &p_m in &p_m_options {
                arms.push(BanditArm { rates: Rates { p_c, p_m, n: baseline.n }, pulls: 0, reward_sum: 0.0 });
            }
        }
        AdaptiveController::Bandit {
            bounds,
            state: BanditState { arms, total_pulls: 0, exploration, last_best: f64::INFINITY, last_arm: 0 },
        }
    }

    pub fn q_learning(baseline: Rates, bounds: RateBounds, epsilon: f64, epsilon_decay: f64, alpha: f64, gamma: f64) -> Self {
        // 5 stagnation buckets x 5 diversity buckets, 5 actions (rate deltas).
        const STATES: usize = 25;
        AdaptiveController::QLearning {
            bounds,
            state: QLearningState {
                q_table: vec![[0.0; 5]; STATES],
                epsilon,
                epsilon_decay,
                alpha,
                gamma,
                last_best: f64::INFINITY,
                last_state: 0,
                last_action: 0,
                rates: baseline,
            },
        }
    }

    /// Advance the policy by one generation's metrics, returning the
    /// rates to apply next. All three policies, and `Off`, clamp to the
    /// same rate bounds.
    pub fn step(&mut self, metrics: &GenerationMetrics, rng: &mut StdRng) -> Rates {
        match self {
            AdaptiveController::Off { rates } => *rates,
            AdaptiveController::Heuristic { bounds, state } => step_heuristic(state, metrics, bounds),
            AdaptiveController::Bandit { bounds, state } => step_bandit(state, metrics, bounds, rng),
            AdaptiveController::QLearning { bounds, state } => step_q_learning(state, metrics, bounds, rng),
        }
    }
}

fn step_heuristic(state: &mut HeuristicState, metrics: &GenerationMetrics, bounds: &RateBounds) -> Rates {
    let improved = metrics.min_fitness < state.last_best - 1e-12;
    if improved {
        state.stagnation = 0;
    } else {
        state.stagnation += 1;
    }
    state.last_best = state.last_best.min(metrics.min_fitness);

    let mut p_c = state.baseline.p_c;
    let mut p_m = state.baseline.p_m;

    if state.stagnation > 3 {
        p_m *= 1.0 + 0.1 * state.stagnation as f64;
    }
    const DIVERSITY_FLOOR: f64 = 0.05;
    if metrics.diversity < DIVERSITY_FLOOR {
        p_m *= 1.5;
        p_c *= 0.7;
    }
    if improved {
        p_c = 0.5 * p_c + 0.5 * state.baseline.p_c;
        p_m = 0.5 * p_m + 0.5 * state.baseline.p_m;
    }

    Rates { p_c: p_c.clamp(bounds.p_c_min, bounds.p_c_max), p_m: p_m.clamp(bounds.p_m_min, bounds.p_m_max), n: metrics.population_size.clamp(bounds.n_min, bounds.n_max) }
}

fn step_bandit(state: &mut BanditState, metrics: &GenerationMetrics, bounds: &RateBounds, rng: &mut StdRng) -> Rates {
    // Reward the arm just played: negative change in best fitness (an
    // improvement, i.e. a fitness decrease, is a positive reward).
    let reward = (state.last_best - metrics.min_fitness).max(0.0);
    if state.total_pulls > 0 {
        let arm = &mut state.arms[state.last_arm];
        arm.pulls += 1;
        arm.reward_sum += reward;
    }
    state.last_best = metrics.min_fitness;
    state.total_pulls += 1;

    // UCB1: pull any never-tried arm first, otherwise the highest upper
    // confidence bound.
    let chosen = state
        .arms
        .iter()
        .position(|a| a.pulls == 0)
        .unwrap_or_else(|| {
            state
                .arms
                .iter()
                .enumerate()
                .map(|(i, a)| {
                    let mean = a.reward_sum / a.pulls as f64;
                    let bonus = state.exploration * ((state.total_pulls as f64).ln() / a.pulls as f64).sqrt();
                    (i, mean + bonus)
                })
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
                .map(|(i, _)| i)
                .unwrap_or(0)
        });
    state.last_arm = chosen;
    let _ = rng; // reserved for tie-breaking jitter; UCB1 as specified is deterministic given arm statistics.

    let rates = state.arms[chosen].rates;
    Rates { p_c: rates.p_c.clamp(bounds.p_c_min, bounds.p_c_max), p_m: rates.p_m.clamp(bounds.p_m_min, bounds.p_m_max), n: metrics.population_size.clamp(bounds.n_min, bounds.n_max) }
}

fn discretize(stagnation: u32, diversity: f64) -> usize {
    let s_bucket = (stagnation as usize).min(4);
    let d_bucket = ((diversity * 5.0) as usize).min(4);
    s_bucket * 5 + d_bucket
}

fn step_q_learning(state: &mut QLearningState, metrics: &GenerationMetrics, bounds: &RateBounds, rng: &mut StdRng) -> Rates {
    let stagnation: u32 = if metrics.min_fitness < state.last_best - 1e-12 { 0 } else { 4 };
    let current_state = discretize(stagnation, metrics.diversity);
    let reward = (state.last_best - metrics.min_fitness).max(0.0);

    // Tabular Q-update for the action taken on the previous call.
    let best_next = state.q_table[current_state].iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let old = state.q_table[state.last_state][state.last_action];
    state.q_table[state.last_state][state.last_action] = old + state.alpha * (reward + state.gamma * best_next - old);

    state.last_best = state.last_best.min(metrics.min_fitness);
    state.epsilon *= state.epsilon_decay;

    let action = if rng.random::<f64>() < state.epsilon {
        rng.random_range(0..5)
    } else {
        state.q_table[current_state]
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap_or(0)
    };
    state.last_state = current_state;
    state.last_action = action;

    // Action is a discrete rate delta applied to the running rates.
    let delta = match action {
        0 => (-0.05, -0.01),
        1 => (-0.02, 0.0),
        2 => (0.0, 0.0),
        3 => (0.02, 0.0),
        _ => (0.05, 0.01),
    };
    state.rates.p_c = (state.rates.p_c + delta.0).clamp(bounds.p_c_min, bounds.p_c_max);
    state.rates.p_m = (state.rates.p_m + delta.1).clamp(bounds.p_m_min, bounds.p_m_max);
    state.rates.n = metrics.population_size.clamp(bounds.n_min, bounds.n_max);
    state.rates
}
