// ─────────────────────────────────────────────────────────────────────
// SCPN Wakefield — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    MG_MAX_CYCLES, MG_TOLERANCE_ABS, MG_TOLERANCE_REL, PREDCORR_B_ERROR_TOLERANCE,
    PREDCORR_B_MIXING_FACTOR, PREDCORR_MAX_ITERATIONS,
};
use crate::error::{WakeError, WakeResult};
use crate::narrow::to_index;
use crate::state::LevelGeometry;

/// Quantities obtained from an elliptic solve, in solve order.
pub const SOLVED_QUANTITIES: [&str; 5] = ["Psi", "Ez", "Bz", "Bx", "By"];

/// Top-level configuration of the slice field engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WakeConfig {
    /// Mesh-refinement levels, coarsest first.
    pub levels: Vec<LevelConfig>,
    /// Longitudinal slice spacing.
    pub dz: f64,
    #[serde(default)]
    pub boundary: FieldBoundary,
    #[serde(default)]
    pub poisson: PoissonConfig,
    #[serde(default)]
    pub multigrid: MultigridSettings,
    #[serde(default)]
    pub coupling: CouplingConfig,
    #[serde(default)]
    pub mode: FieldSolverMode,
    /// Symmetrize the currents before the field solve.
    #[serde(default)]
    pub symmetrize_currents: bool,
    /// Interpolate the ion background from the parent level instead of
    /// expecting it to be deposited on finer levels.
    #[serde(default)]
    pub interpolate_ion_background: bool,
}

/// Boundary condition of the level-0 field solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldBoundary {
    #[default]
    Dirichlet,
    Periodic,
    Open,
}

/// Elliptic solver backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoissonBackend {
    #[default]
    Spectral,
    Multigrid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub n_cells: [usize; 2],
    pub lo: [f64; 2],
    pub hi: [f64; 2],
}

impl LevelConfig {
    /// Derive a refined patch of `parent` covering `[lo, hi]` with a cell
    /// size `ratio` times smaller.
    pub fn refined(parent: &LevelConfig, ratio: usize, lo: [f64; 2], hi: [f64; 2]) -> WakeResult<Self> {
        if ratio == 0 {
            return Err(WakeError::Configuration(
                "refinement ratio must be >= 1".to_string(),
            ));
        }
        let mut n_cells = [0usize; 2];
        for d in 0..2 {
            let parent_cell = (parent.hi[d] - parent.lo[d]) / parent.n_cells[d] as f64;
            let cells = (hi[d] - lo[d]) * ratio as f64 / parent_cell;
            n_cells[d] = to_index(cells, "refined level cell count")?;
        }
        Ok(LevelConfig { n_cells, lo, hi })
    }

    pub fn geometry(&self, level: usize) -> LevelGeometry {
        LevelGeometry::new(level, self.n_cells, self.lo, self.hi)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoissonConfig {
    /// Backend used by every quantity without an override.
    #[serde(default)]
    pub backend: PoissonBackend,
    /// Per-quantity backend, keyed by quantity name (see [`SOLVED_QUANTITIES`]).
    #[serde(default)]
    pub overrides: BTreeMap<String, PoissonBackend>,
}

impl PoissonConfig {
    pub fn backend_for(&self, quantity: &str) -> PoissonBackend {
        self.overrides.get(quantity).copied().unwrap_or(self.backend)
    }
}

/// Multigrid parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultigridSettings {
    /// Red-black sweeps before restriction (default: 2)
    pub pre_smooth: usize,
    /// Red-black sweeps after prolongation (default: 2)
    pub post_smooth: usize,
    /// Sweeps on the coarsest grid (default: 60)
    pub coarse_iters: usize,
    /// Stop coarsening at this many samples per axis (default: 5)
    pub min_grid_size: usize,
    pub max_cycles: usize,
    pub tol_rel: f64,
    pub tol_abs: f64,
}

impl Default for MultigridSettings {
    fn default() -> Self {
        MultigridSettings {
            pre_smooth: 2,
            post_smooth: 2,
            coarse_iters: 60,
            min_grid_size: 5,
            max_cycles: MG_MAX_CYCLES,
            tol_rel: MG_TOLERANCE_REL,
            tol_abs: MG_TOLERANCE_ABS,
        }
    }
}

/// Extent of the boundary ring filled from the parent level, counted in
/// samples from the outer edge: rings `outer_edge..inner_edge` are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouplingConfig {
    pub outer_edge: usize,
    pub inner_edge: usize,
}

impl Default for CouplingConfig {
    fn default() -> Self {
        CouplingConfig {
            outer_edge: 0,
            inner_edge: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredCorrConfig {
    pub tolerance: f64,
    pub max_iterations: usize,
    pub mixing_factor: f64,
    /// Blend the last two guesses by their errors before mixing.
    pub weighted_history: bool,
}

impl Default for PredCorrConfig {
    fn default() -> Self {
        PredCorrConfig {
            tolerance: PREDCORR_B_ERROR_TOLERANCE,
            max_iterations: PREDCORR_MAX_ITERATIONS,
            mixing_factor: PREDCORR_B_MIXING_FACTOR,
            weighted_history: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplicitConfig {
    /// Push the plasma once more with the solved field so that the
    /// deposited currents are the exact, non-linearized ones.
    pub push_for_diagnostics: bool,
}

/// How Bx and By are made self-consistent. Chosen once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldSolverMode {
    PredictorCorrector(PredCorrConfig),
    Explicit(ExplicitConfig),
}

impl Default for FieldSolverMode {
    fn default() -> Self {
        FieldSolverMode::PredictorCorrector(PredCorrConfig::default())
    }
}

impl WakeConfig {
    /// Minimal configuration with a single level and default solvers.
    pub fn single_level(n_cells: [usize; 2], lo: [f64; 2], hi: [f64; 2], dz: f64) -> Self {
        WakeConfig {
            levels: vec![LevelConfig { n_cells, lo, hi }],
            dz,
            boundary: FieldBoundary::default(),
            poisson: PoissonConfig::default(),
            multigrid: MultigridSettings::default(),
            coupling: CouplingConfig::default(),
            mode: FieldSolverMode::default(),
            symmetrize_currents: false,
            interpolate_ion_background: false,
        }
    }

    /// Load from a JSON file.
    pub fn from_file(path: &str) -> WakeResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> WakeResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Geometries of all levels, coarsest first.
    pub fn geometries(&self) -> Vec<LevelGeometry> {
        self.levels
            .iter()
            .enumerate()
            .map(|(lev, l)| l.geometry(lev))
            .collect()
    }

    /// Reject every combination the engine cannot run.
    pub fn validate(&self) -> WakeResult<()> {
        if self.levels.is_empty() {
            return Err(WakeError::Configuration(
                "at least one level is required".to_string(),
            ));
        }
        if !self.dz.is_finite() || self.dz <= 0.0 {
            return Err(WakeError::Configuration(format!(
                "dz must be finite and > 0, got {}",
                self.dz
            )));
        }

        let geoms = self.geometries();
        for (lev, (cfg, geom)) in self.levels.iter().zip(&geoms).enumerate() {
            if cfg.n_cells[0] < 2 || cfg.n_cells[1] < 2 {
                return Err(WakeError::Configuration(format!(
                    "level {lev} needs at least 2 cells per axis, got {:?}",
                    cfg.n_cells
                )));
            }
            if !(0..2).all(|d| cfg.hi[d] > cfg.lo[d]) {
                return Err(WakeError::Configuration(format!(
                    "level {lev} has an empty extent: lo={:?}, hi={:?}",
                    cfg.lo, cfg.hi
                )));
            }
            if lev == 0 {
                continue;
            }
            let parent = &geoms[lev - 1];
            if geom.dx >= parent.dx || geom.dy >= parent.dy {
                return Err(WakeError::Configuration(format!(
                    "level {lev} is not finer than level {}: dx={}, dy={} vs dx={}, dy={}",
                    lev - 1,
                    geom.dx,
                    geom.dy,
                    parent.dx,
                    parent.dy
                )));
            }
            if !parent.encloses(geom) {
                return Err(WakeError::Configuration(format!(
                    "level {lev} [{:?}, {:?}] is not nested in level {} [{:?}, {:?}]",
                    geom.lo(),
                    geom.hi(),
                    lev - 1,
                    parent.lo(),
                    parent.hi()
                )));
            }
            if lev == 1 && self.boundary == FieldBoundary::Periodic {
                let touches = (0..2).any(|d| {
                    geom.lo()[d] <= parent.lo()[d] + 0.5 * parent.dx
                        || geom.hi()[d] >= parent.hi()[d] - 0.5 * parent.dx
                });
                if touches {
                    return Err(WakeError::Configuration(
                        "a refined level must stay clear of a periodic level-0 edge".to_string(),
                    ));
                }
            }
        }

        if self.symmetrize_currents {
            if let Some(geom) = geoms.iter().find(|g| !g.is_centred()) {
                return Err(WakeError::Configuration(format!(
                    "symmetrize_currents mirrors about x = 0 and y = 0, but level {} spans {:?} to {:?}",
                    geom.level,
                    geom.lo(),
                    geom.hi()
                )));
            }
        }

        for name in self.poisson.overrides.keys() {
            if !SOLVED_QUANTITIES.contains(&name.as_str()) {
                return Err(WakeError::Configuration(format!(
                    "unknown poisson override '{name}', valid quantities: {}",
                    SOLVED_QUANTITIES.join(", ")
                )));
            }
        }

        let uses_multigrid = SOLVED_QUANTITIES
            .iter()
            .any(|q| self.poisson.backend_for(q) == PoissonBackend::Multigrid)
            || matches!(self.mode, FieldSolverMode::Explicit(_));
        let base = &self.levels[0];
        if self.boundary == FieldBoundary::Periodic
            && uses_multigrid
            && (base.n_cells[0] % 2 == 1 || base.n_cells[1] % 2 == 1)
        {
            return Err(WakeError::Configuration(format!(
                "periodic multigrid needs an even level-0 cell count, got {:?}",
                base.n_cells
            )));
        }

        let mg = &self.multigrid;
        if mg.max_cycles == 0 {
            return Err(WakeError::Configuration(
                "multigrid max_cycles must be >= 1".to_string(),
            ));
        }
        if !(mg.tol_rel >= 0.0 && mg.tol_abs >= 0.0 && mg.tol_rel + mg.tol_abs > 0.0) {
            return Err(WakeError::Configuration(format!(
                "multigrid tolerances must be >= 0 and not both zero: rel={}, abs={}",
                mg.tol_rel, mg.tol_abs
            )));
        }

        let c = self.coupling;
        if c.outer_edge >= c.inner_edge {
            return Err(WakeError::Configuration(format!(
                "coupling outer_edge ({}) must be < inner_edge ({})",
                c.outer_edge, c.inner_edge
            )));
        }
        for geom in geoms.iter().skip(1) {
            if 2 * c.inner_edge > geom.nx.min(geom.ny) {
                return Err(WakeError::Configuration(format!(
                    "coupling inner_edge {} exceeds half of level {} ({}x{})",
                    c.inner_edge, geom.level, geom.nx, geom.ny
                )));
            }
        }

        match &self.mode {
            FieldSolverMode::PredictorCorrector(pc) => {
                if !(pc.mixing_factor > 0.0 && pc.mixing_factor <= 1.0) {
                    return Err(WakeError::Configuration(format!(
                        "mixing factor must be in (0, 1], got {}",
                        pc.mixing_factor
                    )));
                }
                if !pc.tolerance.is_finite() || pc.tolerance <= 0.0 {
                    return Err(WakeError::Configuration(format!(
                        "predictor-corrector tolerance must be finite and > 0, got {}",
                        pc.tolerance
                    )));
                }
            }
            FieldSolverMode::Explicit(_) => {
                for q in ["Bx", "By"] {
                    if self.poisson.overrides.get(q) == Some(&PoissonBackend::Spectral) {
                        return Err(WakeError::Configuration(format!(
                            "explicit mode solves {q} with a varying coefficient; \
                             the spectral backend cannot be selected for it"
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}
