//! Order-stable reductions over 2D fields.
//!
//! Rows are reduced in parallel into per-row partials which are then
//! summed sequentially in row order, so results are bit-identical for any
//! thread count.

use ndarray::ArrayView2;
use rayon::prelude::*;

fn row_partials<F>(nrows: usize, row: F) -> Vec<f64>
where
    F: Fn(usize) -> f64 + Sync + Send,
{
    (0..nrows).into_par_iter().map(row).collect()
}

/// `Σ a²`
pub fn sum_sq(a: ArrayView2<f64>) -> f64 {
    row_partials(a.nrows(), |i| a.row(i).iter().map(|v| v * v).sum())
        .into_iter()
        .sum()
}

/// `Σ (a - b)²`; `b` must have the shape of `a`.
pub fn sum_sq_diff(a: ArrayView2<f64>, b: ArrayView2<f64>) -> f64 {
    debug_assert_eq!(a.dim(), b.dim());
    row_partials(a.nrows(), |i| {
        a.row(i)
            .iter()
            .zip(b.row(i).iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum()
    })
    .into_iter()
    .sum()
}
