// ─────────────────────────────────────────────────────────────────────
// SCPN Wakefield — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Relative transverse B error below which the predictor-corrector stops.
pub const PREDCORR_B_ERROR_TOLERANCE: f64 = 4e-2;

/// Iteration budget of the predictor-corrector loop.
pub const PREDCORR_MAX_ITERATIONS: usize = 30;

/// Weight of the freshly solved B field when mixing with the previous guess.
pub const PREDCORR_B_MIXING_FACTOR: f64 = 0.05;

/// Width (in units of the tolerance) of the Gaussian that sets how much the
/// initial B guess trusts linear extrapolation.
pub const INITIAL_GUESS_ERROR_SCALE: f64 = 2.5;

/// Relative residual tolerance of the multigrid backend.
pub const MG_TOLERANCE_REL: f64 = 1e-4;

/// Absolute residual tolerance of the multigrid backend.
pub const MG_TOLERANCE_ABS: f64 = f64::MIN_POSITIVE;

/// V-cycle budget of the multigrid backend.
pub const MG_MAX_CYCLES: usize = 200;

/// 1 / (2π), prefactor of the free-space 2D Green's function.
pub const INV_TWO_PI: f64 = 0.5 / std::f64::consts::PI;
