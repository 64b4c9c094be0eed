// ─────────────────────────────────────────────────────────────────────
// SCPN Wakefield — Spectral Poisson Solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Direct solver for `∇²u - a u = f` with uniform screening `a`.
//!
//! Diagonalises the same 5-point operator the multigrid smoother uses, so
//! both backends converge to one discrete solution.
//!
//! - Dirichlet edges: DST-I on the interior, the boundary ring is folded
//!   into the right-hand side.
//! - Periodic edges: FFT on the `(nx-1) × (ny-1)` block of unknowns; the
//!   duplicate row and column are synchronised afterwards. Without
//!   screening the zero mode is dropped, giving a zero-mean solution.

use std::f64::consts::PI;

use ndarray::{s, Array2};
use rayon::prelude::*;
use wake_types::error::{ensure_shape, WakeError, WakeResult};

use crate::fft::{Dst2, Fft2};
use crate::sor::{sync_periodic, Edges};

enum Transform {
    Sine(Dst2),
    Fourier(Fft2),
}

/// Planned spectral solver for one grid shape, spacing and screening.
pub struct SpectralPoisson {
    nx: usize,
    ny: usize,
    dx: f64,
    dy: f64,
    edges: Edges,
    /// Normalised inverse eigenvalue per mode.
    multiplier: Array2<f64>,
    transform: Transform,
}

impl SpectralPoisson {
    pub fn new(
        shape: (usize, usize),
        dx: f64,
        dy: f64,
        screening: f64,
        edges: Edges,
    ) -> WakeResult<Self> {
        let (nx, ny) = shape;
        if nx < 3 || ny < 3 {
            return Err(WakeError::Configuration(format!(
                "spectral solver needs at least 3x3 samples, got {nx}x{ny}"
            )));
        }
        if !(dx > 0.0 && dy > 0.0) {
            return Err(WakeError::Configuration(format!(
                "spectral solver needs positive spacing, got dx={dx}, dy={dy}"
            )));
        }
        if !(screening >= 0.0 && screening.is_finite()) {
            return Err(WakeError::Configuration(format!(
                "spectral screening must be finite and non-negative, got {screening}"
            )));
        }

        let (cx, cy) = (4.0 / (dx * dx), 4.0 / (dy * dy));
        let (multiplier, transform) = match edges {
            Edges::Dirichlet => {
                let (mx, my) = (nx - 2, ny - 2);
                let dst = Dst2::new(mx, my);
                let norm = dst.inverse_norm();
                let multiplier = Array2::from_shape_fn((mx, my), |(k, l)| {
                    let sx = (PI * (k + 1) as f64 / (2.0 * (mx + 1) as f64)).sin();
                    let sy = (PI * (l + 1) as f64 / (2.0 * (my + 1) as f64)).sin();
                    let lambda = -cx * sx * sx - cy * sy * sy - screening;
                    norm / lambda
                });
                (multiplier, Transform::Sine(dst))
            }
            Edges::Periodic => {
                let (mx, my) = (nx - 1, ny - 1);
                let fft = Fft2::new(mx, my);
                let multiplier = Array2::from_shape_fn((mx, my), |(k, l)| {
                    let sx = (PI * k as f64 / mx as f64).sin();
                    let sy = (PI * l as f64 / my as f64).sin();
                    let lambda = -cx * sx * sx - cy * sy * sy - screening;
                    if lambda == 0.0 {
                        0.0
                    } else {
                        1.0 / lambda
                    }
                });
                (multiplier, Transform::Fourier(fft))
            }
        };

        Ok(SpectralPoisson {
            nx,
            ny,
            dx,
            dy,
            edges,
            multiplier,
            transform,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    pub fn edges(&self) -> Edges {
        self.edges
    }

    /// Solve in place. On Dirichlet edges the outer ring of `u` supplies the
    /// boundary values and is left untouched.
    pub fn solve(&self, u: &mut Array2<f64>, source: &Array2<f64>) -> WakeResult<()> {
        ensure_shape("spectral solution", self.shape(), u.dim())?;
        ensure_shape("spectral source", self.shape(), source.dim())?;
        match &self.transform {
            Transform::Sine(dst) => self.solve_dirichlet(dst, u, source),
            Transform::Fourier(fft) => self.solve_periodic(fft, u, source),
        }
        Ok(())
    }

    /// Solve several independent systems sharing this plan.
    pub fn solve_batch(
        &self,
        solutions: &mut [Array2<f64>],
        sources: &[Array2<f64>],
    ) -> WakeResult<()> {
        if solutions.len() != sources.len() {
            return Err(WakeError::ShapeMismatch {
                what: "spectral batch".to_string(),
                expected: (solutions.len(), 1),
                found: (sources.len(), 1),
            });
        }
        solutions
            .par_iter_mut()
            .zip(sources.par_iter())
            .try_for_each(|(u, f)| self.solve(u, f))
    }

    fn solve_dirichlet(&self, dst: &Dst2, u: &mut Array2<f64>, source: &Array2<f64>) {
        let (nx, ny) = (self.nx, self.ny);
        let (idx2, idy2) = (1.0 / (self.dx * self.dx), 1.0 / (self.dy * self.dy));

        let mut rhs = source.slice(s![1..nx - 1, 1..ny - 1]).to_owned();
        for j in 1..ny - 1 {
            rhs[[0, j - 1]] -= u[[0, j]] * idx2;
            rhs[[nx - 3, j - 1]] -= u[[nx - 1, j]] * idx2;
        }
        for i in 1..nx - 1 {
            rhs[[i - 1, 0]] -= u[[i, 0]] * idy2;
            rhs[[i - 1, ny - 3]] -= u[[i, ny - 1]] * idy2;
        }

        dst.transform(&mut rhs);
        rhs *= &self.multiplier;
        dst.transform(&mut rhs);

        u.slice_mut(s![1..nx - 1, 1..ny - 1]).assign(&rhs);
    }

    fn solve_periodic(&self, fft: &Fft2, u: &mut Array2<f64>, source: &Array2<f64>) {
        let (nx, ny) = (self.nx, self.ny);
        let block = source.slice(s![..nx - 1, ..ny - 1]).to_owned();
        let mut spectrum = fft.forward(&block);
        spectrum.zip_mut_with(&self.multiplier, |c, &m| *c *= m);
        let solved = fft.inverse(&mut spectrum);

        u.slice_mut(s![..nx - 1, ..ny - 1]).assign(&solved);
        sync_periodic(u);
    }
}
