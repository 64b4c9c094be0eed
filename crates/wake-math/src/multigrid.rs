// ─────────────────────────────────────────────────────────────────────
// SCPN Wakefield — Multigrid Solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Geometric multigrid V-cycle solver for the screened transverse
//! Laplacian `∇²u - a u = f`.
//!
//! Implements a standard V-cycle with:
//! - **Restriction**: full-weighting (bilinear) from fine to coarse
//! - **Prolongation**: bilinear interpolation from coarse to fine
//! - **Smoother**: red-black Gauss-Seidel (from [`crate::sor`])
//!
//! The screening coefficient `a` may vary in space; it is restricted with
//! the same full-weighting stencil as the residual.
//!
//! # Grid Size Requirements
//!
//! A level coarsens only when its sample count is odd (n = 2^k + 1 gives
//! the full hierarchy: 17, 33, 65, 129). Other sizes coarsen as far as
//! parity allows and then rely on `coarse_iters` smoothing sweeps.

use ndarray::Array2;

use crate::sor::{residual, sor_residual, sor_solve, sync_periodic, Edges, Stencil};

/// Configuration for the multigrid V-cycle solver.
#[derive(Debug, Clone)]
pub struct MultigridConfig {
    /// Number of pre-smoothing sweeps (default: 2)
    pub pre_smooth: usize,
    /// Number of post-smoothing sweeps (default: 2)
    pub post_smooth: usize,
    /// Relaxation parameter of the smoother (default: 1.0)
    pub omega: f64,
    /// Number of coarsest-level sweeps (default: 60)
    pub coarse_iters: usize,
    /// Minimum grid dimension for coarsening (default: 5)
    pub min_grid_size: usize,
}

impl Default for MultigridConfig {
    fn default() -> Self {
        MultigridConfig {
            pre_smooth: 2,
            post_smooth: 2,
            omega: 1.0,
            coarse_iters: 60,
            min_grid_size: 5,
        }
    }
}

/// Result of a multigrid solve.
#[derive(Debug, Clone, PartialEq)]
pub struct MultigridResult {
    /// Number of V-cycles performed.
    pub cycles: usize,
    /// Final L-infinity residual.
    pub residual: f64,
    /// Residual threshold the solve aimed for.
    pub threshold: f64,
    /// Whether convergence was achieved.
    pub converged: bool,
}

/// Coarse sample count for `n` fine samples, if `n` can be coarsened.
fn coarse_size(n: usize, min_grid_size: usize) -> Option<usize> {
    if n % 2 == 0 {
        return None;
    }
    let nc = (n + 1) / 2;
    (nc >= min_grid_size.max(3)).then_some(nc)
}

/// Full-weighting restriction: fine grid → coarse grid.
///
/// Standard 2D stencil:
///   1/16 [1 2 1; 2 4 2; 1 2 1]
///
/// Maps (2N-1) × (2M-1) → N × M. On Dirichlet edges the coarse ring is
/// injected; on periodic edges the stencil wraps.
fn restrict(fine: &Array2<f64>, coarse: &mut Array2<f64>, stencil: &Stencil) {
    let (fnx, fny) = fine.dim();
    let (cnx, cny) = coarse.dim();

    for ic in 0..cnx {
        for jc in 0..cny {
            let fi = 2 * ic;
            let fj = 2 * jc;
            let on_ring = ic == 0 || ic == cnx - 1 || jc == 0 || jc == cny - 1;

            if stencil.edges == Edges::Dirichlet && on_ring {
                coarse[[ic, jc]] = fine[[fi, fj]];
                continue;
            }
            if stencil.edges == Edges::Periodic && (ic == cnx - 1 || jc == cny - 1) {
                // duplicate, filled by sync below
                continue;
            }

            let (im, ip) = stencil.neighbours(fi, fnx);
            let (jm, jp) = stencil.neighbours(fj, fny);
            coarse[[ic, jc]] = (4.0 * fine[[fi, fj]]
                + 2.0 * (fine[[im, fj]] + fine[[ip, fj]] + fine[[fi, jm]] + fine[[fi, jp]])
                + fine[[im, jm]]
                + fine[[im, jp]]
                + fine[[ip, jm]]
                + fine[[ip, jp]])
                / 16.0;
        }
    }

    if stencil.edges == Edges::Periodic {
        sync_periodic(coarse);
    }
}

/// Bilinear prolongation: coarse grid → fine grid.
///
/// Maps N × M → (2N-1) × (2M-1). Adds to `fine`.
fn prolongate(coarse: &Array2<f64>, fine: &mut Array2<f64>) {
    let (cnx, cny) = coarse.dim();

    for ic in 0..cnx {
        for jc in 0..cny {
            fine[[2 * ic, 2 * jc]] += coarse[[ic, jc]];
        }
    }
    for ic in 0..cnx {
        for jc in 0..cny - 1 {
            fine[[2 * ic, 2 * jc + 1]] += 0.5 * (coarse[[ic, jc]] + coarse[[ic, jc + 1]]);
        }
    }
    for ic in 0..cnx - 1 {
        for jc in 0..cny {
            fine[[2 * ic + 1, 2 * jc]] += 0.5 * (coarse[[ic, jc]] + coarse[[ic + 1, jc]]);
        }
    }
    for ic in 0..cnx - 1 {
        for jc in 0..cny - 1 {
            fine[[2 * ic + 1, 2 * jc + 1]] += 0.25
                * (coarse[[ic, jc]]
                    + coarse[[ic, jc + 1]]
                    + coarse[[ic + 1, jc]]
                    + coarse[[ic + 1, jc + 1]]);
        }
    }
}

/// Perform one multigrid V-cycle.
///
/// Recursive: smooths on the current level, restricts the residual to
/// a coarser grid, solves the coarse correction, prolongs it back, and
/// post-smooths.
fn v_cycle(
    u: &mut Array2<f64>,
    source: &Array2<f64>,
    coefficient: Option<&Array2<f64>>,
    stencil: &Stencil,
    config: &MultigridConfig,
) {
    let (nx, ny) = u.dim();

    let coarse_dims = coarse_size(nx, config.min_grid_size)
        .zip(coarse_size(ny, config.min_grid_size));
    let Some((cnx, cny)) = coarse_dims else {
        sor_solve(u, source, coefficient, stencil, config.omega, config.coarse_iters);
        return;
    };

    // 1. Pre-smoothing
    sor_solve(u, source, coefficient, stencil, config.omega, config.pre_smooth);

    // 2. Restrict residual (and screening coefficient) to the coarse grid
    let residual_fine = residual(u, source, coefficient, stencil);
    let mut residual_coarse = Array2::zeros((cnx, cny));
    restrict(&residual_fine, &mut residual_coarse, stencil);
    if stencil.edges == Edges::Dirichlet {
        zero_ring(&mut residual_coarse);
    }

    let coefficient_coarse = coefficient.map(|a| {
        let mut ac = Array2::zeros((cnx, cny));
        restrict(a, &mut ac, stencil);
        ac
    });

    // 3. Solve the correction on the coarse grid (e = 0 initially)
    let coarse_stencil = stencil.coarsened();
    let mut correction_coarse = Array2::zeros((cnx, cny));
    v_cycle(
        &mut correction_coarse,
        &residual_coarse,
        coefficient_coarse.as_ref(),
        &coarse_stencil,
        config,
    );

    // 4. Prolongate and add on the unknowns
    let mut correction_fine = Array2::zeros((nx, ny));
    prolongate(&correction_coarse, &mut correction_fine);
    for i in stencil.unknowns(nx) {
        for j in stencil.unknowns(ny) {
            u[[i, j]] += correction_fine[[i, j]];
        }
    }
    if stencil.edges == Edges::Periodic {
        sync_periodic(u);
    }

    // 5. Post-smoothing
    sor_solve(u, source, coefficient, stencil, config.omega, config.post_smooth);
}

fn zero_ring(a: &mut Array2<f64>) {
    let (nx, ny) = a.dim();
    for j in 0..ny {
        a[[0, j]] = 0.0;
        a[[nx - 1, j]] = 0.0;
    }
    for i in 0..nx {
        a[[i, 0]] = 0.0;
        a[[i, ny - 1]] = 0.0;
    }
}

/// Solve `∇²u - a u = f` using multigrid V-cycles.
///
/// # Arguments
/// * `u` — initial guess / solution array [nx, ny] (modified in place);
///   on Dirichlet edges its outer ring holds the boundary values
/// * `source` — source term `f` [nx, ny]
/// * `coefficient` — screening term `a` [nx, ny], `None` for zero
/// * `stencil` — spacing and edge treatment
/// * `config` — V-cycle parameters
/// * `max_cycles` — maximum number of V-cycles
/// * `tol_rel`, `tol_abs` — converged once the L-infinity residual is at
///   most `max(tol_rel * scale, tol_abs)`, `scale` being the larger of the
///   source norm and the initial residual
///
/// With periodic edges and no screening the operator is singular; the
/// source mean is removed before solving and the solution is returned with
/// zero mean.
///
/// # Returns
/// A [`MultigridResult`]. Missing the tolerance is reported, not raised.
///
/// # Example
/// ```
/// use wake_math::multigrid::{multigrid_solve, MultigridConfig};
/// use wake_math::sor::{Edges, Stencil};
/// use ndarray::Array2;
///
/// let stencil = Stencil::new(0.25, 0.25, Edges::Dirichlet);
/// let mut u = Array2::zeros((33, 33));
/// let source = Array2::from_elem((33, 33), -1.0);
///
/// let result = multigrid_solve(
///     &mut u, &source, None, &stencil,
///     &MultigridConfig::default(), 30, 1e-8, 0.0,
/// );
/// assert!(result.converged);
/// ```
#[allow(clippy::too_many_arguments)]
pub fn multigrid_solve(
    u: &mut Array2<f64>,
    source: &Array2<f64>,
    coefficient: Option<&Array2<f64>>,
    stencil: &Stencil,
    config: &MultigridConfig,
    max_cycles: usize,
    tol_rel: f64,
    tol_abs: f64,
) -> MultigridResult {
    let (nx, ny) = u.dim();

    // Unscreened periodic problem is singular: project out the null space.
    let singular = stencil.edges == Edges::Periodic && coefficient.is_none();
    let projected;
    let source = if singular {
        projected = source - unknown_mean(source, stencil);
        &projected
    } else {
        source
    };

    let result = solve_cycles(u, source, coefficient, stencil, config, max_cycles, tol_rel, tol_abs);
    if singular {
        let mean = unknown_mean(u, stencil);
        u.mapv_inplace(|v| v - mean);
    }
    result
}

fn unknown_mean(a: &Array2<f64>, stencil: &Stencil) -> f64 {
    let (nx, ny) = a.dim();
    let mut sum = 0.0;
    let mut count = 0usize;
    for i in stencil.unknowns(nx) {
        for j in stencil.unknowns(ny) {
            sum += a[[i, j]];
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[allow(clippy::too_many_arguments)]
fn solve_cycles(
    u: &mut Array2<f64>,
    source: &Array2<f64>,
    coefficient: Option<&Array2<f64>>,
    stencil: &Stencil,
    config: &MultigridConfig,
    max_cycles: usize,
    tol_rel: f64,
    tol_abs: f64,
) -> MultigridResult {
    let (nx, ny) = u.dim();
    let mut source_norm = 0.0_f64;
    for i in stencil.unknowns(nx) {
        for j in stencil.unknowns(ny) {
            source_norm = source_norm.max(source[[i, j]].abs());
        }
    }

    let mut res = sor_residual(u, source, coefficient, stencil);
    let threshold = (tol_rel * source_norm.max(res)).max(tol_abs);
    if res <= threshold {
        return MultigridResult {
            cycles: 0,
            residual: res,
            threshold,
            converged: true,
        };
    }

    for cycle in 1..=max_cycles {
        v_cycle(u, source, coefficient, stencil, config);
        res = sor_residual(u, source, coefficient, stencil);

        if res <= threshold {
            return MultigridResult {
                cycles: cycle,
                residual: res,
                threshold,
                converged: true,
            };
        }
    }

    MultigridResult {
        cycles: max_cycles,
        residual: res,
        threshold,
        converged: false,
    }
}
