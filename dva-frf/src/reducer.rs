//! DOF Reducer (C2): drops degrees of freedom that are numerically inert
//! across mass, damping, stiffness, and forcing simultaneously.

use nalgebra::{DMatrix, Matrix6, Vector6};
use num_complex::Complex64;

use crate::error::FrfError;
use crate::params::NUM_DOF;

/// Default tolerance below which a matrix/forcing entry is considered zero.
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Real matrices and complex forcing restricted to the active DOF set.
pub struct ReducedSystem {
    pub m: DMatrix<f64>,
    pub c: DMatrix<f64>,
    pub k: DMatrix<f64>,
    /// `true` at indices that survived reduction, in original DOF order.
    pub active_mask: [bool; NUM_DOF],
}

impl ReducedSystem {
    pub fn active_dofs(&self) -> usize {
        self.active_mask.iter().filter(|&&a| a).count()
    }
}

/// Identify the inactive DOF set and build the reduced matrices.
///
/// A DOF is inactive when its row and column are numerically zero (within
/// `tolerance`) in `m`, `c`, and `k` simultaneously, and the forcing entry at
/// every sampled frequency used to build `forcing_probe` is also zero. Since
/// forcing is a function of omega, callers probe it at a representative,
/// nonzero omega (any omega away from the harmonics' zero crossings) before
/// calling this function — `forcing_probe` is that single complex length-6
/// sample.
pub fn reduce(
    m: &Matrix6<f64>,
    c: &Matrix6<f64>,
    k: &Matrix6<f64>,
    forcing_probe: &Vector6<Complex64>,
    tolerance: f64,
) -> Result<ReducedSystem, FrfError> {
    let mut active_mask = [false; NUM_DOF];
    for i in 0..NUM_DOF {
        let row_col_zero = (0..NUM_DOF).all(|j| {
            m[(i, j)].abs() <= tolerance
                && m[(j, i)].abs() <= tolerance
                && c[(i, j)].abs() <= tolerance
                && c[(j, i)].abs() <= tolerance
                && k[(i, j)].abs() <= tolerance
                && k[(j, i)].abs() <= tolerance
        });
        let forcing_zero = forcing_probe[i].norm() <= tolerance;
        active_mask[i] = !(row_col_zero && forcing_zero);
    }

    let active_indices: Vec<usize> = (0..NUM_DOF).filter(|&i| active_mask[i]).collect();
    if active_indices.is_empty() {
        return Err(FrfError::AllZeroMass);
    }

    let n = active_indices.len();
    let mut rm = DMatrix::<f64>::zeros(n, n);
    let mut rc = DMatrix::<f64>::zeros(n, n);
    let mut rk = DMatrix::<f64>::zeros(n, n);
    for (ri, &i) in active_indices.iter().enumerate() {
        for (rj, &j) in active_indices.iter().enumerate() {
            rm[(ri, rj)] = m[(i, j)];
            rc[(ri, rj)] = c[(i, j)];
            rk[(ri, rj)] = k[(i, j)];
        }
    }

    Ok(ReducedSystem {
        m: rm,
        c: rc,
        k: rk,
        active_mask,
    })
}
