// ─────────────────────────────────────────────────────────────────────
// SCPN Wakefield — Collaborators
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Interfaces to the parts of a simulation that live outside the field
//! engine: the plasma push, the open-boundary field, the slice exchange
//! between partitions and diagnostics.

use std::collections::HashMap;

use ndarray::{Array2, Array3, ArrayView2};
use wake_types::constants::INV_TWO_PI;
use wake_types::error::{WakeError, WakeResult};
use wake_types::narrow::to_f32;
use wake_types::state::{ConvergenceRecord, LevelGeometry};

use crate::poisson::Quantity;
use crate::registry::{Comp, Role};
use crate::schema::FieldIds;
use crate::slices::SliceBuffer;

/// Plasma particles of the current slice.
///
/// Every call must start from the same pre-push particle state of slice
/// `islice`; the predictor-corrector calls [`PlasmaResponse::advance`]
/// once per iteration with a different field guess.
pub trait PlasmaResponse {
    /// Deposit the currents and charge of slice `islice` into `This`
    /// (`jx`, `jy`, `jz`, `rhomjz`) on every level.
    fn deposit_current(&mut self, islice: usize, slices: &mut [SliceBuffer], ids: &FieldIds) -> WakeResult<()>;

    /// Push with the fields in `This` and deposit the currents of the next
    /// slice into `Next` (`jx`, `jy`) on every level.
    fn advance(&mut self, islice: usize, slices: &mut [SliceBuffer], ids: &FieldIds) -> WakeResult<()>;

    /// Deposit the plasma susceptibility into `This.chi` and the zero-field
    /// currents of the next slice into `Next`, for the explicit path.
    fn deposit_linear_response(
        &mut self,
        _islice: usize,
        _slices: &mut [SliceBuffer],
        _ids: &FieldIds,
    ) -> WakeResult<()> {
        Err(WakeError::Configuration(
            "this plasma response has no linearized form; use the predictor-corrector".to_string(),
        ))
    }
}

/// Boundary values of a level-0 solve with open edges.
pub trait BoundarySource: Send + Sync {
    /// Write the outer ring of `u` for `quantity` given its `source`.
    fn fill_ring(
        &self,
        quantity: Quantity,
        u: &mut Array2<f64>,
        source: &Array2<f64>,
        geom: &LevelGeometry,
    ) -> WakeResult<()>;
}

/// Free-space boundary from the monopole and dipole moments of the source:
/// `u ≈ (Q ln r - x·p / r²) / 2π`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultipoleOpenBoundary;

impl BoundarySource for MultipoleOpenBoundary {
    fn fill_ring(
        &self,
        _quantity: Quantity,
        u: &mut Array2<f64>,
        source: &Array2<f64>,
        geom: &LevelGeometry,
    ) -> WakeResult<()> {
        let (nx, ny) = u.dim();
        let area = geom.dx * geom.dy;
        let (mut q, mut px, mut py) = (0.0, 0.0, 0.0);
        for i in 1..nx - 1 {
            for j in 1..ny - 1 {
                let w = source[[i, j]] * area;
                q += w;
                px += w * geom.x[i];
                py += w * geom.y[j];
            }
        }

        let mut put = |i: usize, j: usize| {
            let (x, y) = (geom.x[i], geom.y[j]);
            let r2 = x * x + y * y;
            u[[i, j]] = if r2 > 0.0 {
                INV_TWO_PI * (0.5 * q * r2.ln() - (x * px + y * py) / r2)
            } else {
                0.0
            };
        };
        for i in 0..nx {
            put(i, 0);
            put(i, ny - 1);
        }
        for j in 1..ny - 1 {
            put(0, j);
            put(nx - 1, j);
        }
        Ok(())
    }
}

/// Transport of role contents between partitions of the longitudinal axis.
pub trait SliceExchange {
    fn send(&mut self, islice: usize, role: Role, level: usize, data: Array3<f64>) -> WakeResult<()>;

    /// Contents sent for `(islice, role, level)`, if any arrived.
    fn receive(&mut self, islice: usize, role: Role, level: usize) -> WakeResult<Option<Array3<f64>>>;
}

/// Single-process exchange keeping sent blocks in memory.
#[derive(Debug, Default)]
pub struct MemoryExchange {
    blocks: HashMap<(usize, Role, usize), Array3<f64>>,
}

impl MemoryExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.blocks.len()
    }
}

impl SliceExchange for MemoryExchange {
    fn send(&mut self, islice: usize, role: Role, level: usize, data: Array3<f64>) -> WakeResult<()> {
        self.blocks.insert((islice, role, level), data);
        Ok(())
    }

    fn receive(&mut self, islice: usize, role: Role, level: usize) -> WakeResult<Option<Array3<f64>>> {
        Ok(self.blocks.remove(&(islice, role, level)))
    }
}

/// Read-only view of the solved slice.
pub struct SliceSnapshot<'a> {
    pub islice: usize,
    pub ids: &'a FieldIds,
    pub buffers: &'a [SliceBuffer],
}

impl<'a> SliceSnapshot<'a> {
    pub fn n_levels(&self) -> usize {
        self.buffers.len()
    }

    pub fn field(&self, level: usize, comp: Comp) -> Option<ArrayView2<'a, f64>> {
        self.buffers.get(level).map(|b| b.field(comp))
    }

    /// Single-precision copy for output.
    pub fn to_f32(&self, level: usize, comp: Comp) -> WakeResult<Array2<f32>> {
        let field = self.field(level, comp).ok_or_else(|| {
            WakeError::Configuration(format!(
                "snapshot has {} levels, level {level} requested",
                self.n_levels()
            ))
        })?;
        let mut out = Array2::zeros(field.dim());
        for (o, &v) in out.iter_mut().zip(field.iter()) {
            *o = to_f32(v, "field sample")?;
        }
        Ok(out)
    }
}

/// Receiver of per-slice results.
pub trait DiagnosticsSink {
    fn record_slice(&mut self, record: &ConvergenceRecord, snapshot: &SliceSnapshot<'_>) -> WakeResult<()>;
}
