// ─────────────────────────────────────────────────────────────────────
// SCPN Wakefield — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Node-centred transverse grid of one mesh-refinement level.
///
/// Arrays on this level have shape `[nx, ny]` and are indexed `[[i, j]]`
/// with `x = x[i]`, `y = y[j]`. The outermost ring of samples holds
/// boundary values for Dirichlet solves.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelGeometry {
    pub level: usize,
    pub nx: usize,
    pub ny: usize,
    pub x: Array1<f64>, // x coordinates [nx] - linspace(x_lo, x_hi, nx)
    pub y: Array1<f64>, // y coordinates [ny] - linspace(y_lo, y_hi, ny)
    pub dx: f64,
    pub dy: f64,
}

impl LevelGeometry {
    /// Build a level spanning `[lo, hi]` with `n_cells` cells per axis,
    /// i.e. `n_cells + 1` samples per axis.
    pub fn new(level: usize, n_cells: [usize; 2], lo: [f64; 2], hi: [f64; 2]) -> Self {
        let nx = n_cells[0] + 1;
        let ny = n_cells[1] + 1;
        let x = Array1::linspace(lo[0], hi[0], nx);
        let y = Array1::linspace(lo[1], hi[1], ny);
        let dx = if nx > 1 { x[1] - x[0] } else { hi[0] - lo[0] };
        let dy = if ny > 1 { y[1] - y[0] } else { hi[1] - lo[1] };

        LevelGeometry {
            level,
            nx,
            ny,
            x,
            y,
            dx,
            dy,
        }
    }

    /// Array shape `(nx, ny)` of every field on this level.
    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    pub fn lo(&self) -> [f64; 2] {
        [self.x[0], self.y[0]]
    }

    pub fn hi(&self) -> [f64; 2] {
        [self.x[self.nx - 1], self.y[self.ny - 1]]
    }

    /// Whether `inner` lies within this level, touching at most its edges.
    pub fn encloses(&self, inner: &LevelGeometry) -> bool {
        let (lo, hi) = (self.lo(), self.hi());
        let (ilo, ihi) = (inner.lo(), inner.hi());
        let eps = 1e-9 * (self.dx.abs() + self.dy.abs());
        (0..2).all(|d| ilo[d] >= lo[d] - eps && ihi[d] <= hi[d] + eps)
    }

    /// Mirror index of `i` along x.
    #[inline]
    pub fn mirror_x(&self, i: usize) -> usize {
        self.nx - 1 - i
    }

    /// Mirror index of `j` along y.
    #[inline]
    pub fn mirror_y(&self, j: usize) -> usize {
        self.ny - 1 - j
    }

    /// Whether mirror indices map `x` to `-x` and `y` to `-y`, i.e. the
    /// level is centred on the origin.
    pub fn is_centred(&self) -> bool {
        let eps = 1e-9 * (self.dx.abs() + self.dy.abs());
        (0..self.nx).all(|i| (self.x[i] + self.x[self.mirror_x(i)]).abs() <= eps)
            && (0..self.ny).all(|j| (self.y[j] + self.y[self.mirror_y(j)]).abs() <= eps)
    }
}

/// How a predictor-corrector (or explicit) solve of one slice ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliceOutcome {
    Converged,
    MaxIterHit,
    Explicit,
}

/// Convergence record of one slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceRecord {
    pub islice: usize,
    pub iterations: usize,
    pub relative_error: f64,
    pub outcome: SliceOutcome,
}

/// Multigrid (or other backend) solve that missed its tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonConvergenceWarning {
    pub islice: usize,
    pub level: usize,
    pub quantity: String,
    pub cycles: usize,
    pub residual: f64,
}
