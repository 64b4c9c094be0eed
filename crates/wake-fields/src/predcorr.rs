// ─────────────────────────────────────────────────────────────────────
// SCPN Wakefield — Predictor-Corrector
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Fixed-point iteration making Bx and By consistent with the plasma
//! currents they drive.
//!
//! ```text
//!   Init ──► IteratePush ──► IterateSolve ──► Converged
//!                 ▲               │      └──► MaxIterHit
//!                 └──── mix ◄─────┘
//! ```
//!
//! The loop is driven by [`next_state`], a pure function of the current
//! state and the progress so far, so termination does not depend on the
//! plasma model.

use tracing::{debug, warn};
use wake_types::config::PredCorrConfig;
use wake_types::constants::INITIAL_GUESS_ERROR_SCALE;
use wake_types::error::WakeResult;
use wake_types::state::{ConvergenceRecord, SliceOutcome};

use crate::collaborators::PlasmaResponse;
use crate::fields::Fields;
use crate::registry::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcState {
    Init,
    IteratePush,
    IterateSolve,
    Converged,
    MaxIterHit,
}

impl PcState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PcState::Converged | PcState::MaxIterHit)
    }
}

/// Corrections applied so far and the error of the last solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub iterations: usize,
    pub error: f64,
}

/// Transition function of the iteration. A non-finite error never counts
/// as converged.
pub fn next_state(state: PcState, progress: &Progress, tolerance: f64, max_iterations: usize) -> PcState {
    match state {
        PcState::Init => PcState::IteratePush,
        PcState::IteratePush => PcState::IterateSolve,
        PcState::IterateSolve => {
            if progress.error.is_finite() && progress.error <= tolerance {
                PcState::Converged
            } else if progress.iterations >= max_iterations {
                PcState::MaxIterHit
            } else {
                PcState::IteratePush
            }
        }
        terminal => terminal,
    }
}

/// Weight `m` of the linear extrapolation `(1+m) B1 - m B2`. Shrinks to
/// zero when the last slice was far from converged.
pub fn extrapolation_weight(last_error: f64, tolerance: f64) -> f64 {
    let x = last_error / (INITIAL_GUESS_ERROR_SCALE * tolerance);
    let m = (-0.5 * x * x).exp();
    if m.is_finite() {
        m
    } else {
        0.0
    }
}

/// Weights of the current and the older guess in the error-weighted blend.
pub fn history_weights(error: f64, previous_error: f64) -> (f64, f64) {
    let sum = error + previous_error;
    if !sum.is_finite() {
        return (1.0, 0.0);
    }
    if error == 0.0 || previous_error == 0.0 {
        return (0.5, 0.5);
    }
    (previous_error / sum, error / sum)
}

/// Seed `This.B` from the history of finalized slices.
fn initial_guess(fields: &mut Fields, tolerance: f64) {
    let ids = fields.ids;
    let (t, p, pp) = (ids.this, ids.previous, ids.iter_previous);
    let history = fields.history;
    let m = extrapolation_weight(fields.last_error, tolerance);
    for buf in &mut fields.slices {
        for (b, b1, b2) in [(t.bx, p.bx, pp.bx), (t.by, p.by, pp.by)] {
            match history {
                0 => buf.set_val(&[b], 0.0),
                1 => buf.shift(b, b1),
                _ => buf.lincomb(b, &[(1.0 + m, b1), (-m, b2)]),
            }
        }
    }
}

/// Keep the guess the next push uses.
fn save_guess(fields: &mut Fields) {
    let (t, g) = (fields.ids.this, fields.ids.iter_current);
    for buf in &mut fields.slices {
        buf.shift(g.bx, t.bx);
        buf.shift(g.by, t.by);
    }
}

/// `B = a B_new + (1-a) G`, `G` being the last guess or the error-weighted
/// blend of the last two.
fn mix(fields: &mut Fields, cfg: &PredCorrConfig, error: f64, previous_error: Option<f64>) {
    let ids = fields.ids;
    let (t, g, h) = (ids.this, ids.iter_current, ids.iter_previous);
    let a = cfg.mixing_factor;
    let blend = previous_error
        .filter(|_| cfg.weighted_history)
        .map(|e_prev| history_weights(error, e_prev));
    for buf in &mut fields.slices {
        for (new, current, older) in [(t.bx, g.bx, h.bx), (t.by, g.by, h.by)] {
            match blend {
                Some((wc, wo)) => buf.lincomb(
                    new,
                    &[(a, new), ((1.0 - a) * wc, current), ((1.0 - a) * wo, older)],
                ),
                None => buf.lincomb(new, &[(a, new), (1.0 - a, current)]),
            }
            buf.shift(older, current);
        }
    }
}

/// Iterate Bx and By of slice `islice` to self-consistency.
///
/// Reaching the iteration budget is an outcome, not an error: the last
/// solved field is kept and the record carries the outcome.
pub fn run(
    fields: &mut Fields,
    islice: usize,
    cfg: &PredCorrConfig,
    response: &mut dyn PlasmaResponse,
) -> WakeResult<ConvergenceRecord> {
    let mut state = PcState::Init;
    let mut progress = Progress {
        iterations: 0,
        error: f64::INFINITY,
    };
    let mut previous_error = None;

    while !state.is_terminal() {
        match state {
            PcState::Init => initial_guess(fields, cfg.tolerance),
            PcState::IteratePush => {
                save_guess(fields);
                response.advance(islice, &mut fields.slices, &fields.ids)?;
            }
            PcState::IterateSolve => {
                fields.solve_bx_by(Role::This)?;
                progress.error = fields.compute_rel_b_error();
                debug!(
                    islice,
                    iteration = progress.iterations,
                    error = progress.error,
                    "predictor-corrector step"
                );
            }
            PcState::Converged | PcState::MaxIterHit => {}
        }

        let next = next_state(state, &progress, cfg.tolerance, cfg.max_iterations);
        if state == PcState::IterateSolve && next == PcState::IteratePush {
            mix(fields, cfg, progress.error, previous_error);
            previous_error = Some(progress.error);
            progress.iterations += 1;
        }
        state = next;
    }

    let outcome = if state == PcState::Converged {
        SliceOutcome::Converged
    } else {
        warn!(
            islice,
            iterations = progress.iterations,
            error = progress.error,
            tolerance = cfg.tolerance,
            "predictor-corrector hit its iteration limit"
        );
        SliceOutcome::MaxIterHit
    };

    Ok(ConvergenceRecord {
        islice,
        iterations: progress.iterations,
        relative_error: progress.error,
        outcome,
    })
}
