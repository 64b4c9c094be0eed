//! Coupling between nested refinement levels.
//!
//! A finer level only ever reads its parent, which is solved first for the
//! current slice.

use ndarray::parallel::prelude::*;
use ndarray::{ArrayView2, ArrayViewMut2, Zip};
use wake_math::interp::interp2d;
use wake_types::state::LevelGeometry;

/// Distance of `(i, j)` from the nearest edge, in samples.
#[inline]
pub fn edge_distance(i: usize, j: usize, nx: usize, ny: usize) -> usize {
    i.min(j).min(nx - 1 - i).min(ny - 1 - j)
}

/// Fill the rings `outer..inner` (counted from the edge) of `fine` with the
/// bilinear interpolation of `parent`.
pub fn boundary_interpolate(
    parent: ArrayView2<f64>,
    parent_geom: &LevelGeometry,
    fine: ArrayViewMut2<f64>,
    fine_geom: &LevelGeometry,
    outer: usize,
    inner: usize,
) {
    let (nx, ny) = fine.dim();
    Zip::indexed(fine).par_for_each(|(i, j), v| {
        let d = edge_distance(i, j, nx, ny);
        if d >= outer && d < inner {
            *v = interp2d(parent, parent_geom, fine_geom.x[i], fine_geom.y[j]);
        }
    });
}

/// Overwrite all of `fine` with the bilinear interpolation of `parent`.
pub fn full_interpolate(
    parent: ArrayView2<f64>,
    parent_geom: &LevelGeometry,
    fine: ArrayViewMut2<f64>,
    fine_geom: &LevelGeometry,
) {
    Zip::indexed(fine).par_for_each(|(i, j), v| {
        *v = interp2d(parent, parent_geom, fine_geom.x[i], fine_geom.y[j]);
    });
}
