use thiserror::Error;

/// Individual-level failures of the FRF pipeline (C1-C5).
///
/// Every variant is contained at the fitness-function boundary: a bad
/// individual becomes `f64::INFINITY`, never a propagated panic.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FrfError {
    #[error("system assembly produced a non-finite matrix entry")]
    AssemblyInvalid,

    #[error("no active degrees of freedom remain after reduction")]
    AllZeroMass,

    #[error("linear solve failed at omega index {0}")]
    LinAlgError(usize),
}
