//! Library surface for `dva-cli`'s own binary and for its integration
//! tests: CLI argument parsing (`cli`), the JSON problem file (`problem`),
//! and the `GaConfig` assembly logic (`config`).

pub mod cli;
pub mod config;
pub mod problem;
pub mod run_config;
