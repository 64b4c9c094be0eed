// ─────────────────────────────────────────────────────────────────────
// SCPN Wakefield — Field Solve Orchestrator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Fields — the slice-wise field engine.
//!
//! Owns the slice buffers of every level and sequences the elliptic solves
//! of one slice, coarsest level first:
//!
//! ```text
//!   ∇²Psi = -(rho - jz)         ExmBy = -∂x Psi, EypBx = -∂y Psi
//!   ∇²Ez  = ∂x jx + ∂y jy
//!   ∇²Bz  = ∂y jx - ∂x jy
//!   ∇²Bx  = ∂y jz - ∂ζ jy       ∂ζ j = (j_previous - j_next) / 2dz
//!   ∇²By  = -∂x jz + ∂ζ jx
//! ```
//!
//! Level 0 takes its boundary from the configured policy; every finer level
//! takes it from its parent, which has already been solved.

use std::sync::Arc;

use ndarray::{s, Array2, Zip};
use tracing::{debug, warn};
use wake_math::interp::{ddx_into, ddy_into};
use wake_math::reduce::{sum_sq, sum_sq_diff};
use wake_math::sor::Edges;
use wake_types::config::{FieldBoundary, FieldSolverMode, PoissonBackend, WakeConfig};
use wake_types::error::{WakeError, WakeResult};
use wake_types::state::{ConvergenceRecord, LevelGeometry, NonConvergenceWarning};

use crate::collaborators::{
    BoundarySource, DiagnosticsSink, MultipoleOpenBoundary, PlasmaResponse, SliceExchange,
    SliceSnapshot,
};
use crate::convergence::ConvergenceLog;
use crate::levels::{boundary_interpolate, full_interpolate};
use crate::poisson::{make_solver, EllipticSolver, Quantity, SolveReport};
use crate::registry::{Comp, FieldRegistry, Role};
use crate::schema::{register_fields, FieldIds};
use crate::slices::SliceBuffer;
use crate::symmetry::symmetrize;
use crate::{explicit, predcorr};

/// Outputs of `This` and the trial components, cleared before each slice.
fn per_slice_comps(ids: &FieldIds) -> Vec<Comp> {
    let (t, tr) = (ids.this, ids.trial);
    let mut comps = vec![t.exmby, t.eypbx, t.ez, t.bz, t.psi, t.jz, t.rhomjz];
    comps.extend(t.chi);
    comps.extend([tr.ez, tr.bx, tr.by, tr.jx, tr.jy, tr.jz]);
    comps
}

/// Backends planned for one level.
struct LevelSolvers {
    planned: Vec<Arc<dyn EllipticSolver>>,
    /// Index into `planned` per [`Quantity`], in [`Quantity::ALL`] order.
    by_quantity: [usize; 5],
    /// Multigrid backend for the screened Bx/By solve of the explicit path.
    screened: Option<Arc<dyn EllipticSolver>>,
    /// Rings excluded from the solve; they hold interpolated parent values.
    offset: usize,
    edges: Edges,
}

impl LevelSolvers {
    fn slot(&self, q: Quantity) -> usize {
        self.by_quantity[q as usize]
    }

    fn get(&self, q: Quantity) -> &dyn EllipticSolver {
        self.planned[self.slot(q)].as_ref()
    }
}

/// Scratch arrays of one level, allocated once.
struct Workspace {
    /// Full-level sources.
    full: [Array2<f64>; 2],
    deriv: Array2<f64>,
    /// Solve-region copies.
    u: [Array2<f64>; 2],
    src: [Array2<f64>; 2],
    coef: Array2<f64>,
}

impl Workspace {
    fn new(full: (usize, usize), solve: (usize, usize)) -> Self {
        Workspace {
            full: [Array2::zeros(full), Array2::zeros(full)],
            deriv: Array2::zeros(full),
            u: [Array2::zeros(solve), Array2::zeros(solve)],
            src: [Array2::zeros(solve), Array2::zeros(solve)],
            coef: Array2::zeros(solve),
        }
    }
}

/// The slice field engine.
pub struct Fields {
    config: WakeConfig,
    registry: FieldRegistry,
    pub(crate) ids: FieldIds,
    geoms: Vec<LevelGeometry>,
    pub(crate) slices: Vec<SliceBuffer>,
    solvers: Vec<LevelSolvers>,
    work: Vec<Workspace>,
    /// Components reset at the start of every slice.
    per_slice: Vec<Comp>,
    boundary: Box<dyn BoundarySource>,
    log: ConvergenceLog,
    islice: usize,
    /// Finalized slices available as history for the initial B guess.
    pub(crate) history: usize,
    /// Relative B error of the last finalized slice.
    pub(crate) last_error: f64,
}

impl Fields {
    /// Validate `config`, register the components and plan every backend.
    pub fn new(config: WakeConfig) -> WakeResult<Self> {
        config.validate()?;
        let explicit = matches!(config.mode, FieldSolverMode::Explicit(_));

        let mut registry = FieldRegistry::new();
        register_fields(&mut registry, explicit);
        let ids = FieldIds::resolve(&registry)?;
        let per_slice = per_slice_comps(&ids);

        let geoms = config.geometries();
        let mut slices = Vec::with_capacity(geoms.len());
        let mut solvers = Vec::with_capacity(geoms.len());
        let mut work = Vec::with_capacity(geoms.len());

        for geom in &geoms {
            let lev = geom.level;
            let edges = if lev == 0 && config.boundary == FieldBoundary::Periodic {
                Edges::Periodic
            } else {
                Edges::Dirichlet
            };
            let offset = if lev == 0 {
                0
            } else {
                config.coupling.inner_edge - 1
            };
            let shape = (geom.nx - 2 * offset, geom.ny - 2 * offset);

            let mut planned: Vec<Arc<dyn EllipticSolver>> = Vec::new();
            let mut kinds: Vec<PoissonBackend> = Vec::new();
            let mut plan = |backend: PoissonBackend| -> WakeResult<usize> {
                if let Some(k) = kinds.iter().position(|&b| b == backend) {
                    return Ok(k);
                }
                let solver = make_solver(backend, shape, geom.dx, geom.dy, edges, &config.multigrid)?;
                planned.push(Arc::from(solver));
                kinds.push(backend);
                Ok(planned.len() - 1)
            };

            let mut by_quantity = [0usize; 5];
            for (slot, q) in by_quantity.iter_mut().zip(Quantity::ALL) {
                *slot = plan(config.poisson.backend_for(q.name()))?;
            }
            let screened = if explicit {
                Some(plan(PoissonBackend::Multigrid)?)
            } else {
                None
            };
            let screened = screened.map(|k| Arc::clone(&planned[k]));

            debug!(
                level = lev,
                nx = geom.nx,
                ny = geom.ny,
                backends = planned.len(),
                "planned level"
            );
            slices.push(SliceBuffer::new(geom.clone(), registry.n_comps()));
            work.push(Workspace::new(geom.shape(), shape));
            solvers.push(LevelSolvers {
                planned,
                by_quantity,
                screened,
                offset,
                edges,
            });
        }

        Ok(Fields {
            config,
            registry,
            ids,
            geoms,
            slices,
            solvers,
            work,
            per_slice,
            boundary: Box::new(MultipoleOpenBoundary),
            log: ConvergenceLog::new(),
            islice: 0,
            history: 0,
            last_error: 0.0,
        })
    }

    /// Replace the open-boundary source used when the boundary is `open`.
    pub fn with_boundary_source(mut self, source: Box<dyn BoundarySource>) -> Self {
        self.boundary = source;
        self
    }

    pub fn config(&self) -> &WakeConfig {
        &self.config
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn ids(&self) -> &FieldIds {
        &self.ids
    }

    pub fn n_levels(&self) -> usize {
        self.slices.len()
    }

    pub fn geometry(&self, lev: usize) -> &LevelGeometry {
        &self.geoms[lev]
    }

    pub fn buffer(&self, lev: usize) -> &SliceBuffer {
        &self.slices[lev]
    }

    pub fn buffer_mut(&mut self, lev: usize) -> &mut SliceBuffer {
        &mut self.slices[lev]
    }

    pub fn buffers(&self) -> &[SliceBuffer] {
        &self.slices
    }

    pub fn log(&self) -> &ConvergenceLog {
        &self.log
    }

    /// Number of finalized slices usable for the initial B guess (0 to 2).
    pub fn history_depth(&self) -> usize {
        self.history
    }

    pub fn snapshot(&self) -> SliceSnapshot<'_> {
        SliceSnapshot {
            islice: self.islice,
            ids: &self.ids,
            buffers: &self.slices,
        }
    }

    /// Reset the per-slice outputs of every level.
    pub fn initialize_slice(&mut self, islice: usize) {
        self.islice = islice;
        for buf in &mut self.slices {
            buf.set_val(&self.per_slice, 0.0);
        }

        if self.config.interpolate_ion_background {
            let ions = self.ids.ion_rhomjz;
            for lev in 1..self.slices.len() {
                let (coarser, finer) = self.slices.split_at_mut(lev);
                full_interpolate(
                    coarser[lev - 1].field(ions),
                    &self.geoms[lev - 1],
                    finer[0].field_mut(ions),
                    &self.geoms[lev],
                );
            }
        }
    }

    /// `This.rhomjz += RhoIons.rhomjz` on every level.
    pub fn add_rho_ions(&mut self) {
        let (dst, src) = (self.ids.this.rhomjz, self.ids.ion_rhomjz);
        for buf in &mut self.slices {
            buf.add(dst, src);
        }
    }

    /// Enforce the mirror symmetry of the currents about both axes.
    pub fn symmetrize_currents(&mut self) {
        let t = self.ids.this;
        for (buf, work) in self.slices.iter_mut().zip(&mut self.work) {
            let scratch = &mut work.deriv;
            symmetrize(buf.field_mut(t.jx), scratch, -1.0, 1.0);
            symmetrize(buf.field_mut(t.jy), scratch, 1.0, -1.0);
            symmetrize(buf.field_mut(t.jz), scratch, 1.0, 1.0);
            symmetrize(buf.field_mut(t.rhomjz), scratch, 1.0, 1.0);
        }
    }

    /// Solve Psi and derive the transverse electric fields, then solve Ez
    /// and Bz, on every level.
    pub fn solve_psi_exmby_eypbx_ez_bz(&mut self) -> WakeResult<()> {
        let t = self.ids.this;
        for lev in 0..self.slices.len() {
            {
                let buf = &self.slices[lev];
                let full = &mut self.work[lev].full[0];
                Zip::from(full)
                    .and(buf.field(t.rhomjz))
                    .par_for_each(|s, &r| *s = -r);
            }
            self.solve_level(lev, &[(Quantity::Psi, t.psi)], None)?;

            let geom = &self.geoms[lev];
            let edges = self.solvers[lev].edges;
            let buf = &mut self.slices[lev];
            let psi = &mut self.work[lev].full[0];
            psi.assign(&buf.field(t.psi));
            ddx_into(psi.view(), geom.dx, edges, -1.0, buf.field_mut(t.exmby));
            ddy_into(psi.view(), geom.dy, edges, -1.0, buf.field_mut(t.eypbx));
        }
        self.solve_ez(Role::This)?;
        self.solve_bz()
    }

    /// Solve Ez into `target` (`This` or `TrialLoad`) from its currents.
    pub fn solve_ez(&mut self, target: Role) -> WakeResult<()> {
        let tg = self.target(target)?;
        for lev in 0..self.slices.len() {
            {
                let geom = &self.geoms[lev];
                let edges = self.solvers[lev].edges;
                let buf = &self.slices[lev];
                let Workspace { full, deriv, .. } = &mut self.work[lev];
                ddx_into(buf.field(tg.jx), geom.dx, edges, 1.0, full[0].view_mut());
                ddy_into(buf.field(tg.jy), geom.dy, edges, 1.0, deriv.view_mut());
                full[0] += &*deriv;
            }
            self.solve_level(lev, &[(Quantity::Ez, tg.ez)], None)?;
        }
        Ok(())
    }

    pub fn solve_bz(&mut self) -> WakeResult<()> {
        let t = self.ids.this;
        for lev in 0..self.slices.len() {
            {
                let geom = &self.geoms[lev];
                let edges = self.solvers[lev].edges;
                let buf = &self.slices[lev];
                let Workspace { full, deriv, .. } = &mut self.work[lev];
                ddy_into(buf.field(t.jx), geom.dy, edges, 1.0, full[0].view_mut());
                ddx_into(buf.field(t.jy), geom.dx, edges, 1.0, deriv.view_mut());
                full[0] -= &*deriv;
            }
            self.solve_level(lev, &[(Quantity::Bz, t.bz)], None)?;
        }
        Ok(())
    }

    /// Solve Bx and By into `target` from its `jz` and the currents of the
    /// neighbouring slices.
    pub fn solve_bx_by(&mut self, target: Role) -> WakeResult<()> {
        let tg = self.target(target)?;
        for lev in 0..self.slices.len() {
            self.assemble_bx_by_sources(lev, tg.jz);
            self.solve_level(lev, &[(Quantity::Bx, tg.bx), (Quantity::By, tg.by)], None)?;
        }
        Ok(())
    }

    /// Solve `∇²B - chi B = S` for Bx and By in `This`, with the
    /// susceptibility in `This.chi`.
    pub fn solve_bx_by_screened(&mut self) -> WakeResult<()> {
        let t = self.ids.this;
        let chi = t.chi.ok_or_else(|| {
            WakeError::Configuration("the screened solve needs the explicit field schema".to_string())
        })?;
        for lev in 0..self.slices.len() {
            self.assemble_bx_by_sources(lev, t.jz);
            self.solve_level(lev, &[(Quantity::Bx, t.bx), (Quantity::By, t.by)], Some(chi))?;
        }
        Ok(())
    }

    /// Bx source into `full[0]`, By source into `full[1]`.
    fn assemble_bx_by_sources(&mut self, lev: usize, jz: Comp) {
        let (prev, next) = (self.ids.previous, self.ids.next);
        let geom = &self.geoms[lev];
        let edges = self.solvers[lev].edges;
        let buf = &self.slices[lev];
        let [sx, sy] = &mut self.work[lev].full;
        let inv_2dz = 0.5 / self.config.dz;

        ddy_into(buf.field(jz), geom.dy, edges, 1.0, sx.view_mut());
        Zip::from(sx)
            .and(buf.field(prev.jy))
            .and(buf.field(next.jy))
            .par_for_each(|s, &p, &n| *s -= (p - n) * inv_2dz);

        ddx_into(buf.field(jz), geom.dx, edges, -1.0, sy.view_mut());
        Zip::from(sy)
            .and(buf.field(prev.jx))
            .and(buf.field(next.jx))
            .par_for_each(|s, &p, &n| *s += (p - n) * inv_2dz);
    }

    fn target(&self, role: Role) -> WakeResult<crate::schema::SolveTarget> {
        self.ids.target(role).ok_or_else(|| {
            WakeError::Configuration(format!(
                "fields can only be solved into roles this or trial_load, not {role}"
            ))
        })
    }

    /// Solve `jobs` on level `lev`; the source of job `k` is in
    /// `work[lev].full[k]`.
    fn solve_level(
        &mut self,
        lev: usize,
        jobs: &[(Quantity, Comp)],
        coefficient: Option<Comp>,
    ) -> WakeResult<()> {
        let coupling = self.config.coupling;
        let geom = &self.geoms[lev];
        let (nx, ny) = geom.shape();
        let solvers = &self.solvers[lev];
        let off = solvers.offset;
        let (coarser, finer) = self.slices.split_at_mut(lev);
        let buf = &mut finer[0];
        let Workspace { full, u, src, coef, .. } = &mut self.work[lev];

        for (k, &(q, dst)) in jobs.iter().enumerate() {
            if lev > 0 {
                boundary_interpolate(
                    coarser[lev - 1].field(dst),
                    &self.geoms[lev - 1],
                    buf.field_mut(dst),
                    geom,
                    coupling.outer_edge,
                    coupling.inner_edge,
                );
            }
            u[k].assign(&buf.field(dst).slice(s![off..nx - off, off..ny - off]));
            src[k].assign(&full[k].slice(s![off..nx - off, off..ny - off]));
            if lev == 0 {
                match self.config.boundary {
                    FieldBoundary::Dirichlet => zero_ring(&mut u[k]),
                    FieldBoundary::Open => self.boundary.fill_ring(q, &mut u[k], &src[k], geom)?,
                    FieldBoundary::Periodic => {}
                }
            }
        }

        let reports: Vec<SolveReport> = match coefficient {
            Some(a) => {
                coef.assign(&buf.field(a).slice(s![off..nx - off, off..ny - off]));
                let solver = solvers.screened.as_ref().ok_or_else(|| {
                    WakeError::Configuration("no multigrid backend planned for the screened solve".to_string())
                })?;
                jobs.iter()
                    .enumerate()
                    .map(|(k, _)| solver.solve(&mut u[k], &src[k], Some(&*coef)))
                    .collect::<WakeResult<_>>()?
            }
            None if jobs.len() == 2 && solvers.slot(jobs[0].0) == solvers.slot(jobs[1].0) => {
                solvers.get(jobs[0].0).solve_batch(&mut u[..2], &src[..2])?
            }
            None => jobs
                .iter()
                .enumerate()
                .map(|(k, &(q, _))| solvers.get(q).solve(&mut u[k], &src[k], None))
                .collect::<WakeResult<_>>()?,
        };

        for (k, (&(q, dst), report)) in jobs.iter().zip(&reports).enumerate() {
            buf.field_mut(dst)
                .slice_mut(s![off..nx - off, off..ny - off])
                .assign(&u[k]);
            if !report.converged {
                warn!(
                    islice = self.islice,
                    level = lev,
                    quantity = q.name(),
                    cycles = report.cycles,
                    residual = report.residual,
                    "elliptic solve did not reach its tolerance"
                );
                self.log.warn(NonConvergenceWarning {
                    islice: self.islice,
                    level: lev,
                    quantity: q.name().to_string(),
                    cycles: report.cycles,
                    residual: report.residual,
                });
            }
        }
        Ok(())
    }

    /// `‖B_this - B_iter‖ / ‖B_this‖` over Bx, By and every level; zero when
    /// either norm vanishes.
    pub fn compute_rel_b_error(&self) -> f64 {
        let (t, g) = (self.ids.this, self.ids.iter_current);
        let mut diff = 0.0;
        let mut norm = 0.0;
        for buf in &self.slices {
            diff += sum_sq_diff(buf.field(t.bx), buf.field(g.bx));
            diff += sum_sq_diff(buf.field(t.by), buf.field(g.by));
            norm += sum_sq(buf.field(t.bx));
            norm += sum_sq(buf.field(t.by));
        }
        if diff == 0.0 || norm == 0.0 {
            0.0
        } else {
            (diff / norm).sqrt()
        }
    }

    /// Move the finalized slice into `Previous` and the deposited currents
    /// of the next slice into `This`.
    pub fn shift_slices(&mut self) {
        let ids = self.ids;
        let (t, p, n) = (ids.this, ids.previous, ids.next);
        let ip = ids.iter_previous;
        for buf in &mut self.slices {
            buf.shift(ip.bx, p.bx);
            buf.shift(ip.by, p.by);
            buf.shift(p.bx, t.bx);
            buf.shift(p.by, t.by);
            buf.shift(p.jx, t.jx);
            buf.shift(p.jy, t.jy);
            buf.shift(t.jx, n.jx);
            buf.shift(t.jy, n.jy);
            buf.set_val(&[n.jx, n.jy], 0.0);
        }
        self.history = (self.history + 1).min(2);
    }

    /// Solve one slice: deposit, solve every field, make Bx and By
    /// self-consistent, record convergence and shift the slice buffers.
    ///
    /// After the shift `This` still holds the accepted fields; its `jx` and
    /// `jy` hold the currents deposited for the next slice.
    pub fn solve_slice(
        &mut self,
        islice: usize,
        response: &mut dyn PlasmaResponse,
    ) -> WakeResult<ConvergenceRecord> {
        let record = self.solve_fields(islice, response)?;
        self.shift_slices();
        Ok(record)
    }

    /// [`Fields::solve_slice`], handing the result to `sink` before the
    /// buffers are shifted.
    pub fn solve_slice_with(
        &mut self,
        islice: usize,
        response: &mut dyn PlasmaResponse,
        sink: &mut dyn DiagnosticsSink,
    ) -> WakeResult<ConvergenceRecord> {
        let record = self.solve_fields(islice, response)?;
        sink.record_slice(&record, &self.snapshot())?;
        self.shift_slices();
        Ok(record)
    }

    fn solve_fields(
        &mut self,
        islice: usize,
        response: &mut dyn PlasmaResponse,
    ) -> WakeResult<ConvergenceRecord> {
        self.initialize_slice(islice);
        response.deposit_current(islice, &mut self.slices, &self.ids)?;
        if self.config.symmetrize_currents {
            self.symmetrize_currents();
        }
        self.add_rho_ions();
        self.solve_psi_exmby_eypbx_ez_bz()?;

        let record = match self.config.mode.clone() {
            FieldSolverMode::PredictorCorrector(pc) => predcorr::run(self, islice, &pc, response)?,
            FieldSolverMode::Explicit(ex) => explicit::run(self, islice, &ex, response)?,
        };
        debug!(
            islice,
            iterations = record.iterations,
            error = record.relative_error,
            outcome = ?record.outcome,
            "slice solved"
        );
        self.last_error = record.relative_error;
        self.log.push(record.clone());
        Ok(record)
    }

    /// Send the contents of `role` on every level.
    pub fn export_role(
        &self,
        islice: usize,
        role: Role,
        exchange: &mut dyn SliceExchange,
    ) -> WakeResult<()> {
        for buf in &self.slices {
            let block = buf.role_block(&self.registry, role).to_owned();
            exchange.send(islice, role, buf.level(), block)?;
        }
        Ok(())
    }

    /// Receive the contents of `role` on every level. Returns whether every
    /// level received data.
    ///
    /// All levels are received and checked before any is written, so a
    /// mis-shaped block leaves every level untouched.
    pub fn import_role(
        &mut self,
        islice: usize,
        role: Role,
        exchange: &mut dyn SliceExchange,
    ) -> WakeResult<bool> {
        let mut blocks = Vec::with_capacity(self.slices.len());
        for buf in &self.slices {
            let lev = buf.level();
            let block = exchange.receive(islice, role, lev)?;
            if let Some(block) = &block {
                let (c, x, y) = buf.role_block(&self.registry, role).dim();
                let (bc, bx, by) = block.dim();
                if (bc, bx, by) != (c, x, y) {
                    return Err(WakeError::ShapeMismatch {
                        what: format!("{role} block of level {lev} ({c} vs {bc} components)"),
                        expected: (x, y),
                        found: (bx, by),
                    });
                }
            }
            blocks.push(block);
        }

        let complete = blocks.iter().all(Option::is_some);
        for (buf, block) in self.slices.iter_mut().zip(blocks) {
            if let Some(block) = block {
                buf.role_block_mut(&self.registry, role).assign(&block);
            }
        }
        Ok(complete)
    }
}

fn zero_ring(a: &mut Array2<f64>) {
    let (nx, ny) = a.dim();
    a.row_mut(0).fill(0.0);
    a.row_mut(nx - 1).fill(0.0);
    a.column_mut(0).fill(0.0);
    a.column_mut(ny - 1).fill(0.0);
}
