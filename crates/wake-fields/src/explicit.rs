//! Direct solve of Bx and By with the linearized plasma response.
//!
//! The plasma deposits its susceptibility `chi` and the currents it would
//! carry without a transverse magnetic field; Bx and By then follow from one
//! screened multigrid solve per level, `∇²B - chi B = S`, without iterating.

use wake_types::config::ExplicitConfig;
use wake_types::error::WakeResult;
use wake_types::state::{ConvergenceRecord, SliceOutcome};

use crate::collaborators::PlasmaResponse;
use crate::fields::Fields;

pub fn run(
    fields: &mut Fields,
    islice: usize,
    cfg: &ExplicitConfig,
    response: &mut dyn PlasmaResponse,
) -> WakeResult<ConvergenceRecord> {
    response.deposit_linear_response(islice, &mut fields.slices, &fields.ids)?;
    fields.solve_bx_by_screened()?;
    if cfg.push_for_diagnostics {
        // exact currents of the next slice with the solved field
        response.advance(islice, &mut fields.slices, &fields.ids)?;
    }
    Ok(ConvergenceRecord {
        islice,
        iterations: 0,
        relative_error: 0.0,
        outcome: SliceOutcome::Explicit,
    })
}
