// ─────────────────────────────────────────────────────────────────────
// SCPN Wakefield — Checked Narrowing
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Checked conversions for derived parameters.
//!
//! A derived value that does not fit its target type is a hard error:
//! saturating it would silently corrupt every quantity computed from it.

use crate::error::{WakeError, WakeResult};

/// Narrow an `f64` to `f32`, failing on overflow or NaN.
pub fn to_f32(value: f64, what: &str) -> WakeResult<f32> {
    if value.is_nan() || value > f32::MAX as f64 || value < f32::MIN as f64 {
        return Err(WakeError::Overflow {
            what: what.to_string(),
            value,
            target: "f32",
        });
    }
    Ok(value as f32)
}

/// Round an `f64` to the nearest non-negative index, failing when it is
/// negative, non-finite or larger than `u32::MAX`.
pub fn to_index(value: f64, what: &str) -> WakeResult<usize> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded < 0.0 || rounded > u32::MAX as f64 {
        return Err(WakeError::Overflow {
            what: what.to_string(),
            value,
            target: "usize",
        });
    }
    Ok(rounded as usize)
}
