//! Guided genetic algorithm engine for dynamic vibration absorber design:
//! fitness composition over the FRF pipeline (`dva-frf`), population and
//! variation operators, adaptive rate control, surrogate screening, Sobol
//! sensitivity analysis, and the cancellable worker-thread engine (C6-C12).

pub mod bounds;
pub mod cache;
pub mod controller;
pub mod engine;
pub mod error;
pub mod events;
pub mod fitness;
pub mod guided;
pub mod metrics;
pub mod operators;
pub mod population;
pub mod seeder;
pub mod sobol;
pub mod surrogate;

pub use bounds::{Bounds, GeneSpec};
pub use controller::{AdaptiveController, AdaptiveControllerKind, RateBounds, Rates};
pub use engine::{GaConfig, GaEngine};
pub use error::GaError;
pub use events::{WorkerEvent, WorkerHandle};
pub use fitness::{CategoryWeights, CostCategory, DvaFitness, FitnessConfig};
pub use metrics::{BenchmarkRecord, GenerationMetrics};
pub use population::{Individual, Population};
pub use seeder::SeedingMethod;
pub use sobol::SensitivityResult;
pub use surrogate::{ScreenDecision, SurrogateConfig, SurrogateScreener};
