//! Red-black Gauss-Seidel / SOR smoother for the screened transverse
//! Laplacian
//!
//!   L[u] = d²u/dx² + d²u/dy² - a(x, y) u = f
//!
//! discretized with the 5-point stencil on a node-centred grid.
//!
//! Two edge treatments are supported:
//! - `Dirichlet`: the outermost ring holds fixed boundary values and is
//!   never written.
//! - `Periodic`: the last row/column duplicates the first; unknowns are
//!   `0..n-1` along each axis and neighbours wrap around.

use std::ops::Range;

use ndarray::Array2;

/// Edge treatment of a single solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edges {
    Dirichlet,
    Periodic,
}

/// Grid spacing and edge treatment of the 5-point operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stencil {
    pub dx: f64,
    pub dy: f64,
    pub edges: Edges,
}

impl Stencil {
    pub fn new(dx: f64, dy: f64, edges: Edges) -> Self {
        Stencil { dx, dy, edges }
    }

    /// Stencil of the next coarser multigrid level.
    pub fn coarsened(&self) -> Self {
        Stencil {
            dx: 2.0 * self.dx,
            dy: 2.0 * self.dy,
            edges: self.edges,
        }
    }

    /// Indices of the unknowns along an axis with `n` samples.
    #[inline]
    pub fn unknowns(&self, n: usize) -> Range<usize> {
        match self.edges {
            Edges::Dirichlet => 1..n - 1,
            Edges::Periodic => 0..n - 1,
        }
    }

    /// Lower and upper neighbour of unknown `i` along an axis of `n` samples.
    #[inline]
    pub fn neighbours(&self, i: usize, n: usize) -> (usize, usize) {
        match self.edges {
            Edges::Dirichlet => (i - 1, i + 1),
            Edges::Periodic => {
                let m = n - 1;
                ((i + m - 1) % m, (i + 1) % m)
            }
        }
    }
}

/// Copy the first row/column onto the duplicated last row/column.
pub fn sync_periodic(u: &mut Array2<f64>) {
    let (nx, ny) = u.dim();
    for j in 0..ny {
        u[[nx - 1, j]] = u[[0, j]];
    }
    for i in 0..nx {
        u[[i, ny - 1]] = u[[i, 0]];
    }
}

/// Perform one red-black sweep.
///
/// `coefficient` is the screening term `a(x, y)`; `None` means zero.
/// `omega = 1.0` is plain Gauss-Seidel.
pub fn sor_step(
    u: &mut Array2<f64>,
    source: &Array2<f64>,
    coefficient: Option<&Array2<f64>>,
    stencil: &Stencil,
    omega: f64,
) {
    let (nx, ny) = u.dim();
    let cx = 1.0 / (stencil.dx * stencil.dx);
    let cy = 1.0 / (stencil.dy * stencil.dy);

    for color in 0..2usize {
        for i in stencil.unknowns(nx) {
            let (im, ip) = stencil.neighbours(i, nx);
            for j in stencil.unknowns(ny) {
                if (i + j) % 2 != color {
                    continue;
                }
                let (jm, jp) = stencil.neighbours(j, ny);
                let a = coefficient.map_or(0.0, |c| c[[i, j]]);
                let diag = 2.0 * cx + 2.0 * cy + a;
                let gs = (cx * (u[[im, j]] + u[[ip, j]]) + cy * (u[[i, jm]] + u[[i, jp]])
                    - source[[i, j]])
                    / diag;
                u[[i, j]] = (1.0 - omega) * u[[i, j]] + omega * gs;
            }
        }
    }

    if stencil.edges == Edges::Periodic {
        sync_periodic(u);
    }
}

/// Run N sweeps.
pub fn sor_solve(
    u: &mut Array2<f64>,
    source: &Array2<f64>,
    coefficient: Option<&Array2<f64>>,
    stencil: &Stencil,
    omega: f64,
    iterations: usize,
) {
    for _ in 0..iterations {
        sor_step(u, source, coefficient, stencil, omega);
    }
}

/// Apply the operator, `L[u]`, on the unknowns (zero elsewhere).
pub fn apply_operator(
    u: &Array2<f64>,
    coefficient: Option<&Array2<f64>>,
    stencil: &Stencil,
) -> Array2<f64> {
    let (nx, ny) = u.dim();
    let cx = 1.0 / (stencil.dx * stencil.dx);
    let cy = 1.0 / (stencil.dy * stencil.dy);
    let mut out = Array2::zeros((nx, ny));

    for i in stencil.unknowns(nx) {
        let (im, ip) = stencil.neighbours(i, nx);
        for j in stencil.unknowns(ny) {
            let (jm, jp) = stencil.neighbours(j, ny);
            let a = coefficient.map_or(0.0, |c| c[[i, j]]);
            out[[i, j]] = cx * (u[[im, j]] + u[[ip, j]] - 2.0 * u[[i, j]])
                + cy * (u[[i, jm]] + u[[i, jp]] - 2.0 * u[[i, j]])
                - a * u[[i, j]];
        }
    }
    out
}

/// Residual vector `f - L[u]` on the unknowns (zero elsewhere).
pub fn residual(
    u: &Array2<f64>,
    source: &Array2<f64>,
    coefficient: Option<&Array2<f64>>,
    stencil: &Stencil,
) -> Array2<f64> {
    let mut r = apply_operator(u, coefficient, stencil);
    let (nx, ny) = u.dim();
    for i in stencil.unknowns(nx) {
        for j in stencil.unknowns(ny) {
            r[[i, j]] = source[[i, j]] - r[[i, j]];
        }
    }
    r
}

/// L-infinity norm of the residual.
pub fn sor_residual(
    u: &Array2<f64>,
    source: &Array2<f64>,
    coefficient: Option<&Array2<f64>>,
    stencil: &Stencil,
) -> f64 {
    residual(u, source, coefficient, stencil)
        .iter()
        .fold(0.0_f64, |m, v| m.max(v.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirichlet(n: usize) -> Stencil {
        let h = 2.0 / (n - 1) as f64;
        Stencil::new(h, h, Edges::Dirichlet)
    }

    #[test]
    fn test_sor_zero_source_stays_zero() {
        let st = dirichlet(16);
        let mut u = Array2::zeros((16, 16));
        let f = Array2::zeros((16, 16));
        sor_solve(&mut u, &f, None, &st, 1.5, 50);
        assert!(u.iter().all(|v| v.abs() < 1e-15));
    }

    #[test]
    fn test_sor_residual_decreases() {
        let st = dirichlet(33);
        let mut u = Array2::zeros((33, 33));
        let f = Array2::from_elem((33, 33), -1.0);
        let before = sor_residual(&u, &f, None, &st);
        sor_solve(&mut u, &f, None, &st, 1.5, 200);
        let after = sor_residual(&u, &f, None, &st);
        assert!(after < before, "residual {before} -> {after}");
    }

    #[test]
    fn test_sor_boundary_preserved() {
        let st = dirichlet(17);
        let mut u = Array2::zeros((17, 17));
        for k in 0..17 {
            u[[0, k]] = 1.0;
        }
        let f = Array2::from_elem((17, 17), -1.0);
        sor_solve(&mut u, &f, None, &st, 1.8, 40);
        for k in 0..17 {
            assert_eq!(u[[0, k]], 1.0, "fixed ring value changed");
            assert_eq!(u[[16, k]], 0.0);
        }
        for k in 1..17 {
            assert_eq!(u[[k, 0]], 0.0);
            assert_eq!(u[[k, 16]], 0.0);
        }
    }

    #[test]
    fn test_operator_of_quadratic() {
        // u = x² + y² → ∇²u = 4 exactly for the 5-point stencil
        let n = 9;
        let h = 0.25;
        let st = Stencil::new(h, h, Edges::Dirichlet);
        let u = Array2::from_shape_fn((n, n), |(i, j)| {
            let x = i as f64 * h;
            let y = j as f64 * h;
            x * x + y * y
        });
        let lu = apply_operator(&u, None, &st);
        for i in 1..n - 1 {
            for j in 1..n - 1 {
                assert!((lu[[i, j]] - 4.0).abs() < 1e-10, "L[u] = {}", lu[[i, j]]);
            }
        }
    }

    #[test]
    fn test_periodic_neighbours_wrap() {
        let st = Stencil::new(1.0, 1.0, Edges::Periodic);
        assert_eq!(st.neighbours(0, 9), (7, 1));
        assert_eq!(st.neighbours(7, 9), (6, 0));
        assert_eq!(st.unknowns(9), 0..8);
    }

    #[test]
    fn test_periodic_sweep_keeps_duplicates_in_sync() {
        let n = 9;
        let st = Stencil::new(0.5, 0.5, Edges::Periodic);
        let mut u = Array2::zeros((n, n));
        let f = Array2::from_shape_fn((n, n), |(i, _)| {
            (2.0 * std::f64::consts::PI * (i % (n - 1)) as f64 / (n - 1) as f64).sin()
        });
        sor_solve(&mut u, &f, None, &st, 1.0, 10);
        for k in 0..n {
            assert_eq!(u[[0, k]], u[[n - 1, k]]);
            assert_eq!(u[[k, 0]], u[[k, n - 1]]);
        }
    }
}
