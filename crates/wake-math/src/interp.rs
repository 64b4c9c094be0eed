//! Bilinear interpolation and finite-difference derivatives on a
//! [`LevelGeometry`].

use ndarray::{ArrayView2, ArrayViewMut2, Zip};
use wake_types::state::LevelGeometry;

use crate::sor::Edges;

/// Bilinear interpolation of `field` (living on `geom`) at `(x, y)`.
///
/// Clamps to grid boundaries if outside.
pub fn interp2d(field: ArrayView2<f64>, geom: &LevelGeometry, x: f64, y: f64) -> f64 {
    // Map (x, y) to fractional grid indices
    let fx = (x - geom.x[0]) / geom.dx;
    let fy = (y - geom.y[0]) / geom.dy;

    // Clamp to valid range
    let i0 = (fx.floor() as isize).clamp(0, (geom.nx as isize) - 2) as usize;
    let j0 = (fy.floor() as isize).clamp(0, (geom.ny as isize) - 2) as usize;

    let i1 = i0 + 1;
    let j1 = j0 + 1;

    // Fractional position within cell
    let tx = (fx - i0 as f64).clamp(0.0, 1.0);
    let ty = (fy - j0 as f64).clamp(0.0, 1.0);

    let v00 = field[[i0, j0]];
    let v10 = field[[i1, j0]];
    let v01 = field[[i0, j1]];
    let v11 = field[[i1, j1]];

    (1.0 - tx) * ((1.0 - ty) * v00 + ty * v01) + tx * ((1.0 - ty) * v10 + ty * v11)
}

/// Write `scale * ∂field/∂x` into `out`.
///
/// Central differences inside; at the edges one-sided differences, or
/// wrapped central differences for periodic edges.
pub fn ddx_into(field: ArrayView2<f64>, dx: f64, edges: Edges, scale: f64, out: ArrayViewMut2<f64>) {
    let nx = field.nrows();
    let c = scale / (2.0 * dx);
    Zip::indexed(out).par_for_each(|(i, j), o| {
        *o = if i > 0 && i < nx - 1 {
            c * (field[[i + 1, j]] - field[[i - 1, j]])
        } else if edges == Edges::Periodic {
            // samples 0 and nx-1 coincide
            c * (field[[1, j]] - field[[nx - 2, j]])
        } else if i == 0 {
            scale * (field[[1, j]] - field[[0, j]]) / dx
        } else {
            scale * (field[[nx - 1, j]] - field[[nx - 2, j]]) / dx
        };
    });
}

/// Write `scale * ∂field/∂y` into `out`. See [`ddx_into`].
pub fn ddy_into(field: ArrayView2<f64>, dy: f64, edges: Edges, scale: f64, out: ArrayViewMut2<f64>) {
    let ny = field.ncols();
    let c = scale / (2.0 * dy);
    Zip::indexed(out).par_for_each(|(i, j), o| {
        *o = if j > 0 && j < ny - 1 {
            c * (field[[i, j + 1]] - field[[i, j - 1]])
        } else if edges == Edges::Periodic {
            c * (field[[i, 1]] - field[[i, ny - 2]])
        } else if j == 0 {
            scale * (field[[i, 1]] - field[[i, 0]]) / dy
        } else {
            scale * (field[[i, ny - 1]] - field[[i, ny - 2]]) / dy
        };
    });
}
