//! Mirror symmetrisation of a field about `x = 0` and `y = 0`.

use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayViewMut2, Zip};

/// Replace `f` by the average of `f(x, y)`, `sx f(-x, y)`, `sy f(x, -y)`
/// and `sx sy f(-x, -y)`. The level must be centred on the origin.
///
/// Terms are paired so that the result is exactly symmetric and a second
/// application leaves it bit-identical. `scratch` must have the shape of
/// `field`; it is overwritten.
pub fn symmetrize(mut field: ArrayViewMut2<f64>, scratch: &mut Array2<f64>, sx: f64, sy: f64) {
    let (nx, ny) = field.dim();
    scratch.assign(&field);
    let src = &*scratch;
    Zip::indexed(&mut field).par_for_each(|(i, j), v| {
        let (mi, mj) = (nx - 1 - i, ny - 1 - j);
        let a = src[[i, j]] + sx * src[[mi, j]];
        let b = sy * (src[[i, mj]] + sx * src[[mi, mj]]);
        *v = 0.25 * (a + b);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn field() -> Array2<f64> {
        Array2::from_shape_fn((9, 7), |(i, j)| ((i * 13 + j * 7) % 11) as f64 * 0.37 - 1.1)
    }

    #[test]
    fn test_symmetric_result() {
        let mut scratch = Array2::zeros((9, 7));
        for (sx, sy) in [(1.0, 1.0), (-1.0, 1.0), (1.0, -1.0), (-1.0, -1.0)] {
            let mut f = field();
            symmetrize(f.view_mut(), &mut scratch, sx, sy);
            for i in 0..9 {
                for j in 0..7 {
                    assert_eq!(f[[8 - i, j]], sx * f[[i, j]]);
                    assert_eq!(f[[i, 6 - j]], sy * f[[i, j]]);
                }
            }
        }
    }

    #[test]
    fn test_antisymmetric_axis_vanishes() {
        let mut f = field();
        let mut scratch = Array2::zeros(f.dim());
        symmetrize(f.view_mut(), &mut scratch, -1.0, 1.0);
        for j in 0..7 {
            assert_eq!(f[[4, j]], 0.0);
        }
    }

    #[test]
    fn test_idempotent() {
        let mut once = field();
        let mut scratch = Array2::zeros(once.dim());
        symmetrize(once.view_mut(), &mut scratch, -1.0, 1.0);
        let mut twice = once.clone();
        symmetrize(twice.view_mut(), &mut scratch, -1.0, 1.0);
        assert_eq!(once, twice);
    }
}
