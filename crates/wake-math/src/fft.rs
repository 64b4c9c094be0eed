//! Cached-plan 2D transforms around rustfft.
//!
//! Convention matches numpy:
//! - Forward FFT: unnormalized
//! - Inverse FFT: normalized by 1/(nx*ny)
//!
//! The DST-I is computed from a complex FFT of the odd extension and is
//! unnormalized; applying it twice scales by `(n+1)/2` per axis.
//!
//! Lanes are transformed in parallel. Each lane is independent, so the
//! result does not depend on the thread count.

use std::sync::Arc;

use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayViewMut1, Axis};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Planned complex 2D FFT of a fixed shape.
pub struct Fft2 {
    nx: usize,
    ny: usize,
    forward_x: Arc<dyn Fft<f64>>,
    forward_y: Arc<dyn Fft<f64>>,
    inverse_x: Arc<dyn Fft<f64>>,
    inverse_y: Arc<dyn Fft<f64>>,
}

impl Fft2 {
    pub fn new(nx: usize, ny: usize) -> Self {
        let mut planner = FftPlanner::new();
        Fft2 {
            nx,
            ny,
            forward_x: planner.plan_fft_forward(nx),
            forward_y: planner.plan_fft_forward(ny),
            inverse_x: planner.plan_fft_inverse(nx),
            inverse_y: planner.plan_fft_inverse(ny),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Forward transform of a real array. Matches `numpy.fft.fft2()`.
    pub fn forward(&self, input: &Array2<f64>) -> Array2<Complex64> {
        let mut data = input.mapv(|v| Complex64::new(v, 0.0));
        transform_complex_lanes(&mut data, Axis(0), self.forward_y.as_ref());
        transform_complex_lanes(&mut data, Axis(1), self.forward_x.as_ref());
        data
    }

    /// Inverse transform in place, returning the real part.
    /// Matches `numpy.fft.ifft2().real`.
    pub fn inverse(&self, data: &mut Array2<Complex64>) -> Array2<f64> {
        let norm = 1.0 / (self.nx * self.ny) as f64;
        transform_complex_lanes(data, Axis(0), self.inverse_y.as_ref());
        transform_complex_lanes(data, Axis(1), self.inverse_x.as_ref());
        data.mapv(|c| c.re * norm)
    }
}

/// Planned 2D type-I discrete sine transform of a fixed shape.
///
/// `X[k, l] = Σ x[i, j] sin(π (k+1)(i+1)/(nx+1)) sin(π (l+1)(j+1)/(ny+1))`
pub struct Dst2 {
    nx: usize,
    ny: usize,
    plan_x: Arc<dyn Fft<f64>>,
    plan_y: Arc<dyn Fft<f64>>,
}

impl Dst2 {
    pub fn new(nx: usize, ny: usize) -> Self {
        let mut planner = FftPlanner::new();
        Dst2 {
            nx,
            ny,
            plan_x: planner.plan_fft_forward(2 * (nx + 1)),
            plan_y: planner.plan_fft_forward(2 * (ny + 1)),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Unnormalized transform in place along both axes.
    pub fn transform(&self, data: &mut Array2<f64>) {
        transform_sine_lanes(data, Axis(0), self.plan_y.as_ref());
        transform_sine_lanes(data, Axis(1), self.plan_x.as_ref());
    }

    /// Factor that makes `transform` its own inverse.
    pub fn inverse_norm(&self) -> f64 {
        (2.0 / (self.nx + 1) as f64) * (2.0 / (self.ny + 1) as f64)
    }
}

/// Transform every lane running perpendicular to `outer`.
fn transform_complex_lanes(data: &mut Array2<Complex64>, outer: Axis, plan: &dyn Fft<f64>) {
    let len = plan.len();
    let scratch_len = plan.get_inplace_scratch_len();
    data.axis_iter_mut(outer).into_par_iter().for_each_init(
        || (vec![ZERO; len], vec![ZERO; scratch_len]),
        |(buf, scratch), mut lane| {
            for (b, v) in buf.iter_mut().zip(lane.iter()) {
                *b = *v;
            }
            plan.process_with_scratch(buf, scratch);
            for (v, b) in lane.iter_mut().zip(buf.iter()) {
                *v = *b;
            }
        },
    );
}

fn transform_sine_lanes(data: &mut Array2<f64>, outer: Axis, plan: &dyn Fft<f64>) {
    let len = plan.len();
    let scratch_len = plan.get_inplace_scratch_len();
    data.axis_iter_mut(outer).into_par_iter().for_each_init(
        || (vec![ZERO; len], vec![ZERO; scratch_len]),
        |(buf, scratch), mut lane| dst_lane(&mut lane, buf, scratch, plan),
    );
}

/// DST-I of one lane through the odd extension of length `2(n+1)`:
/// `[0, x_1..x_n, 0, -x_n..-x_1]`, whose FFT is `-2i X`.
fn dst_lane(
    lane: &mut ArrayViewMut1<f64>,
    buf: &mut [Complex64],
    scratch: &mut [Complex64],
    plan: &dyn Fft<f64>,
) {
    let m = buf.len();
    buf.fill(ZERO);
    for (k, &v) in lane.iter().enumerate() {
        buf[k + 1] = Complex64::new(v, 0.0);
        buf[m - k - 1] = Complex64::new(-v, 0.0);
    }
    plan.process_with_scratch(buf, scratch);
    for (k, out) in lane.iter_mut().enumerate() {
        *out = -0.5 * buf[k + 1].im;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_fft2_roundtrip() {
        let original = Array2::from_shape_fn((16, 12), |(i, j)| (i * 16 + j) as f64);
        let fft = Fft2::new(16, 12);
        let mut spectrum = fft.forward(&original);
        let recovered = fft.inverse(&mut spectrum);

        for ((i, j), &val) in original.indexed_iter() {
            assert!(
                (recovered[[i, j]] - val).abs() < 1e-10,
                "FFT roundtrip failed at ({i}, {j}): {} vs {val}",
                recovered[[i, j]]
            );
        }
    }

    #[test]
    fn test_fft2_dc_component() {
        // For a constant field, the DC component (0,0) should be N*M*value
        let n = 8;
        let val = 3.0;
        let input = Array2::from_elem((n, n), val);
        let spectrum = Fft2::new(n, n).forward(&input);

        let expected_dc = (n * n) as f64 * val;
        assert!(
            (spectrum[[0, 0]].re - expected_dc).abs() < 1e-10,
            "DC component: {} vs {expected_dc}",
            spectrum[[0, 0]].re
        );
        assert!(spectrum[[0, 0]].im.abs() < 1e-10, "DC imaginary should be zero");
    }

    #[test]
    fn test_dst_single_mode() {
        // sin(π 2(i+1)/(n+1)) along x, sin(π (j+1)/(m+1)) along y
        let (n, m) = (7, 5);
        let input = Array2::from_shape_fn((n, m), |(i, j)| {
            (PI * 2.0 * (i + 1) as f64 / (n + 1) as f64).sin()
                * (PI * (j + 1) as f64 / (m + 1) as f64).sin()
        });
        let mut data = input.clone();
        let dst = Dst2::new(n, m);
        dst.transform(&mut data);

        let peak = (n + 1) as f64 / 2.0 * (m + 1) as f64 / 2.0;
        for ((k, l), &v) in data.indexed_iter() {
            let expected = if k == 1 && l == 0 { peak } else { 0.0 };
            assert!((v - expected).abs() < 1e-10, "({k}, {l}): {v} vs {expected}");
        }
    }

    #[test]
    fn test_dst_self_inverse() {
        let original = Array2::from_shape_fn((9, 6), |(i, j)| ((i * 7 + j * 3) % 5) as f64 - 2.0);
        let dst = Dst2::new(9, 6);
        let mut data = original.clone();
        dst.transform(&mut data);
        dst.transform(&mut data);
        data *= dst.inverse_norm();

        for (a, b) in data.iter().zip(original.iter()) {
            assert!((a - b).abs() < 1e-10, "{a} vs {b}");
        }
    }
}
