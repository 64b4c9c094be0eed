// ─────────────────────────────────────────────────────────────────────
// SCPN Wakefield — Elliptic Backends
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Interchangeable solvers for `∇²u - a u = f` on one level.
//!
//! The backend of each quantity is fixed by the configuration when the
//! engine is built. The spectral backend only handles a uniform (zero)
//! coefficient; the multigrid backend also takes a varying one.

use std::fmt;

use ndarray::Array2;
use wake_math::multigrid::{multigrid_solve, MultigridConfig};
use wake_math::sor::{Edges, Stencil};
use wake_math::spectral::SpectralPoisson;
use wake_types::config::{MultigridSettings, PoissonBackend};
use wake_types::error::{ensure_shape, WakeError, WakeResult};

/// Quantities obtained from an elliptic solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    Psi,
    Ez,
    Bz,
    Bx,
    By,
}

impl Quantity {
    pub const ALL: [Quantity; 5] = [
        Quantity::Psi,
        Quantity::Ez,
        Quantity::Bz,
        Quantity::Bx,
        Quantity::By,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Quantity::Psi => "Psi",
            Quantity::Ez => "Ez",
            Quantity::Bz => "Bz",
            Quantity::Bx => "Bx",
            Quantity::By => "By",
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one solve. Direct solves always report convergence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    pub cycles: usize,
    pub residual: f64,
    pub converged: bool,
}

impl SolveReport {
    pub fn direct() -> Self {
        SolveReport {
            cycles: 0,
            residual: 0.0,
            converged: true,
        }
    }

    /// Turn a missed tolerance into [`WakeError::NonConvergence`].
    pub fn escalate(self, solver: &str) -> WakeResult<Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(WakeError::NonConvergence {
                solver: solver.to_string(),
                iterations: self.cycles,
                residual: self.residual,
            })
        }
    }
}

/// One elliptic backend, planned for a single grid.
///
/// `u` carries the initial guess and, on Dirichlet edges, the boundary
/// values in its outer ring.
pub trait EllipticSolver: Send + Sync {
    fn backend(&self) -> PoissonBackend;

    fn shape(&self) -> (usize, usize);

    fn solve(
        &self,
        u: &mut Array2<f64>,
        source: &Array2<f64>,
        coefficient: Option<&Array2<f64>>,
    ) -> WakeResult<SolveReport>;

    /// Solve several unscreened systems on this grid.
    fn solve_batch(
        &self,
        solutions: &mut [Array2<f64>],
        sources: &[Array2<f64>],
    ) -> WakeResult<Vec<SolveReport>> {
        solutions
            .iter_mut()
            .zip(sources)
            .map(|(u, f)| self.solve(u, f, None))
            .collect()
    }
}

pub struct SpectralSolver {
    plan: SpectralPoisson,
}

impl SpectralSolver {
    pub fn new(shape: (usize, usize), dx: f64, dy: f64, edges: Edges) -> WakeResult<Self> {
        Ok(SpectralSolver {
            plan: SpectralPoisson::new(shape, dx, dy, 0.0, edges)?,
        })
    }
}

impl EllipticSolver for SpectralSolver {
    fn backend(&self) -> PoissonBackend {
        PoissonBackend::Spectral
    }

    fn shape(&self) -> (usize, usize) {
        self.plan.shape()
    }

    fn solve(
        &self,
        u: &mut Array2<f64>,
        source: &Array2<f64>,
        coefficient: Option<&Array2<f64>>,
    ) -> WakeResult<SolveReport> {
        if coefficient.is_some() {
            return Err(WakeError::Configuration(
                "the spectral backend cannot solve with a varying coefficient".to_string(),
            ));
        }
        self.plan.solve(u, source)?;
        Ok(SolveReport::direct())
    }

    fn solve_batch(
        &self,
        solutions: &mut [Array2<f64>],
        sources: &[Array2<f64>],
    ) -> WakeResult<Vec<SolveReport>> {
        self.plan.solve_batch(solutions, sources)?;
        Ok(vec![SolveReport::direct(); solutions.len()])
    }
}

pub struct MultigridSolver {
    shape: (usize, usize),
    stencil: Stencil,
    config: MultigridConfig,
    max_cycles: usize,
    tol_rel: f64,
    tol_abs: f64,
}

impl MultigridSolver {
    pub fn new(shape: (usize, usize), dx: f64, dy: f64, edges: Edges, settings: &MultigridSettings) -> Self {
        MultigridSolver {
            shape,
            stencil: Stencil::new(dx, dy, edges),
            config: MultigridConfig {
                pre_smooth: settings.pre_smooth,
                post_smooth: settings.post_smooth,
                coarse_iters: settings.coarse_iters,
                min_grid_size: settings.min_grid_size,
                ..MultigridConfig::default()
            },
            max_cycles: settings.max_cycles,
            tol_rel: settings.tol_rel,
            tol_abs: settings.tol_abs,
        }
    }
}

impl EllipticSolver for MultigridSolver {
    fn backend(&self) -> PoissonBackend {
        PoissonBackend::Multigrid
    }

    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn solve(
        &self,
        u: &mut Array2<f64>,
        source: &Array2<f64>,
        coefficient: Option<&Array2<f64>>,
    ) -> WakeResult<SolveReport> {
        ensure_shape("multigrid solution", self.shape, u.dim())?;
        ensure_shape("multigrid source", self.shape, source.dim())?;
        if let Some(a) = coefficient {
            ensure_shape("multigrid coefficient", self.shape, a.dim())?;
        }
        let result = multigrid_solve(
            u,
            source,
            coefficient,
            &self.stencil,
            &self.config,
            self.max_cycles,
            self.tol_rel,
            self.tol_abs,
        );
        Ok(SolveReport {
            cycles: result.cycles,
            residual: result.residual,
            converged: result.converged,
        })
    }
}

/// Plan a backend for a grid of `shape`.
pub fn make_solver(
    backend: PoissonBackend,
    shape: (usize, usize),
    dx: f64,
    dy: f64,
    edges: Edges,
    settings: &MultigridSettings,
) -> WakeResult<Box<dyn EllipticSolver>> {
    Ok(match backend {
        PoissonBackend::Spectral => Box::new(SpectralSolver::new(shape, dx, dy, edges)?),
        PoissonBackend::Multigrid => Box::new(MultigridSolver::new(shape, dx, dy, edges, settings)),
    })
}
