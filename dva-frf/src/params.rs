//! Main-system and DVA parameter vectors (data model, spec section 3).

use crate::error::FrfError;

/// Number of coupled degrees of freedom: one primary structure plus five
/// absorber masses.
pub const NUM_DOF: usize = 6;
/// Number of absorber masses scored individually by the criterion extractor.
pub const NUM_MASSES: usize = 5;
/// Number of unordered DOF pairs, `C(6, 2)`.
pub const NUM_PAIRS: usize = 15;
/// Length of the main-system parameter tuple.
pub const NUM_MAIN_PARAMS: usize = 17;
/// Length of the DVA parameter block.
pub const NUM_DVA_PARAMS: usize = 48;

/// Canonical ordering of the 15 unordered DOF pairs `(i, j)`, `i < j`, over
/// the 6 system DOFs. Pairs touching the primary DOF (index 0) come first,
/// so `PAIR_ORDER[0..5]` are exactly `(0, 1)..=(0, 5)`.
pub const PAIR_ORDER: [(usize, usize); NUM_PAIRS] = [
    (0, 1),
    (0, 2),
    (0, 3),
    (0, 4),
    (0, 5),
    (1, 2),
    (1, 3),
    (1, 4),
    (1, 5),
    (2, 3),
    (2, 4),
    (2, 5),
    (3, 4),
    (3, 5),
    (4, 5),
];

/// The 17-tuple describing the primary structure's excitation and damping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MainParams {
    pub mu: f64,
    pub landa: [f64; 5],
    pub nu: [f64; 5],
    pub a_low: f64,
    pub a_upp: f64,
    pub f_1: f64,
    pub f_2: f64,
    pub omega_dc: f64,
    pub zeta_dc: f64,
}

impl MainParams {
    /// Build from a flat slice in declaration order: `MU, LANDA_1..5,
    /// NU_1..5, A_LOW, A_UPP, F_1, F_2, OMEGA_DC, ZETA_DC`.
    pub fn from_slice(v: &[f64]) -> Result<Self, FrfError> {
        if v.len() != NUM_MAIN_PARAMS {
            return Err(FrfError::AssemblyInvalid);
        }
        let mut landa = [0.0; 5];
        landa.copy_from_slice(&v[1..6]);
        let mut nu = [0.0; 5];
        nu.copy_from_slice(&v[6..11]);
        Ok(MainParams {
            mu: v[0],
            landa,
            nu,
            a_low: v[11],
            a_upp: v[12],
            f_1: v[13],
            f_2: v[14],
            omega_dc: v[15],
            zeta_dc: v[16],
        })
    }
}

/// The 48-tuple decomposing into 15 `beta`, 15 `lambda`, 3 `mu`, 15 `nu`
/// values, in that fixed order.
#[derive(Debug, Clone, PartialEq)]
pub struct DvaParams {
    pub beta: [f64; NUM_PAIRS],
    pub lambda: [f64; NUM_PAIRS],
    pub mu: [f64; 3],
    pub nu: [f64; NUM_PAIRS],
}

impl DvaParams {
    /// Build from a flat slice: `beta(15), lambda(15), mu(3), nu(15)`.
    pub fn from_slice(v: &[f64]) -> Result<Self, FrfError> {
        if v.len() != NUM_DVA_PARAMS {
            return Err(FrfError::AssemblyInvalid);
        }
        let mut beta = [0.0; NUM_PAIRS];
        beta.copy_from_slice(&v[0..15]);
        let mut lambda = [0.0; NUM_PAIRS];
        lambda.copy_from_slice(&v[15..30]);
        let mut mu = [0.0; 3];
        mu.copy_from_slice(&v[30..33]);
        let mut nu = [0.0; NUM_PAIRS];
        nu.copy_from_slice(&v[33..48]);
        Ok(DvaParams { beta, lambda, mu, nu })
    }

    /// Absorber mass ratio for absorber DOF `k` (1-based, `1..=5`), the `mu`
    /// triple broadcast cyclically across the five absorber masses.
    pub fn absorber_mass(&self, k: usize) -> f64 {
        debug_assert!((1..=NUM_MASSES).contains(&k));
        self.mu[(k - 1) % 3]
    }
}
