//! System Assembler (C1): builds the real mass/damping/stiffness matrices
//! and the frequency-dependent complex forcing vector.

use nalgebra::{Matrix6, Vector6};
use num_complex::Complex64;

use crate::error::FrfError;
use crate::params::{DvaParams, MainParams, NUM_DOF, PAIR_ORDER};

/// The assembled linear-time-invariant part of the system, plus a forcing
/// closure parameterized by angular frequency.
pub struct AssembledSystem {
    pub m: Matrix6<f64>,
    pub c: Matrix6<f64>,
    pub k: Matrix6<f64>,
    main: MainParams,
    dva: DvaParams,
}

impl AssembledSystem {
    /// Forcing vector `F(omega)`: two harmonic sources at `omega` and
    /// `2*omega`, distributed to the primary DOF directly and to each
    /// absorber DOF via its coupling term to the primary.
    pub fn forcing(&self, omega: f64) -> Vector6<Complex64> {
        let amplitude = self.main.a_low * self.main.f_1 * Complex64::from_polar(1.0, omega)
            + self.main.a_upp * self.main.f_2 * Complex64::from_polar(1.0, 2.0 * omega);
        let mut f = Vector6::zeros();
        f[0] = amplitude;
        for k in 1..NUM_DOF {
            // pair (0, k) is PAIR_ORDER[k - 1] by construction.
            let coupling = self.dva.nu[k - 1];
            f[k] = amplitude * coupling;
        }
        f
    }
}

/// Build `(M, C, K)` and the forcing closure from main and DVA parameters.
///
/// Damping carries the base term `2 * ZETA_DC * OMEGA_DC` on the primary
/// DOF; stiffness carries the base term `OMEGA_DC^2` on the primary DOF.
/// Every pair in [`PAIR_ORDER`] additionally contributes a spring/dashpot
/// scaled the same way, assembled as a standard two-node spring network.
pub fn assemble(main: &MainParams, dva: &DvaParams) -> Result<AssembledSystem, FrfError> {
    let mut m = Matrix6::<f64>::zeros();
    let mut c = Matrix6::<f64>::zeros();
    let mut k = Matrix6::<f64>::zeros();

    m[(0, 0)] = 1.0;
    for mass_idx in 1..NUM_DOF {
        m[(mass_idx, mass_idx)] = dva.absorber_mass(mass_idx);
    }

    let damping_scale = 2.0 * main.zeta_dc * main.omega_dc;
    let stiffness_scale = main.omega_dc * main.omega_dc;
    c[(0, 0)] += damping_scale;
    k[(0, 0)] += stiffness_scale;

    for (idx, &(i, j)) in PAIR_ORDER.iter().enumerate() {
        let k_ij = dva.beta[idx] * stiffness_scale;
        let c_ij = dva.lambda[idx] * damping_scale;

        k[(i, i)] += k_ij;
        k[(j, j)] += k_ij;
        k[(i, j)] -= k_ij;
        k[(j, i)] -= k_ij;

        c[(i, i)] += c_ij;
        c[(j, j)] += c_ij;
        c[(i, j)] -= c_ij;
        c[(j, i)] -= c_ij;
    }

    if !m.iter().all(|x| x.is_finite())
        || !c.iter().all(|x| x.is_finite())
        || !k.iter().all(|x| x.is_finite())
    {
        return Err(FrfError::AssemblyInvalid);
    }

    Ok(AssembledSystem {
        m,
        c,
        k,
        main: *main,
        dva: dva.clone(),
    })
}
