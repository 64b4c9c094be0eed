// ─────────────────────────────────────────────────────────────────────
// SCPN Wakefield — Property-Based Tests (proptest) for wake-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for wake-math using proptest.
//!
//! Covers: SOR smoother, multigrid and spectral backends, bilinear
//! interpolation, order-stable reductions.

use ndarray::Array2;
use proptest::prelude::*;
use wake_math::interp::interp2d;
use wake_math::multigrid::{multigrid_solve, MultigridConfig};
use wake_math::reduce::{sum_sq, sum_sq_diff};
use wake_math::sor::{apply_operator, sor_residual, sor_solve, Edges, Stencil};
use wake_math::spectral::SpectralPoisson;
use wake_types::state::LevelGeometry;

fn smooth_source(n: usize, kx: f64, ky: f64) -> Array2<f64> {
    Array2::from_shape_fn((n, n), |(i, j)| {
        let x = i as f64 / (n - 1) as f64;
        let y = j as f64 / (n - 1) as f64;
        (kx * x).sin() * (ky * y).cos() - 0.3
    })
}

fn max_diff(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .fold(0.0_f64, |m, (x, y)| m.max((x - y).abs()))
}

// ── SOR Properties ───────────────────────────────────────────────────

proptest! {
    /// Zero source + zero boundary → solution stays zero.
    #[test]
    fn sor_zero_source_preserves_zero(n in 8usize..40) {
        let st = Stencil::new(0.1, 0.1, Edges::Dirichlet);
        let mut u = Array2::zeros((n, n));
        let source = Array2::zeros((n, n));
        sor_solve(&mut u, &source, None, &st, 1.6, 50);

        let max_val = u.iter().fold(0.0_f64, |a, b| a.max(b.abs()));
        prop_assert!(max_val < 1e-15, "Zero source gave max |u| = {}", max_val);
    }

    /// SOR with a screening term reduces the residual.
    #[test]
    fn sor_residual_decreases(n in 16usize..40, a in 0.0f64..4.0) {
        let st = Stencil::new(0.2, 0.3, Edges::Dirichlet);
        let mut u = Array2::zeros((n, n));
        let source = Array2::from_elem((n, n), 1.0);
        let coefficient = Array2::from_elem((n, n), a);
        let res0 = sor_residual(&u, &source, Some(&coefficient), &st);
        sor_solve(&mut u, &source, Some(&coefficient), &st, 1.5, 100);
        let res1 = sor_residual(&u, &source, Some(&coefficient), &st);
        prop_assert!(res1 < res0, "Residual should decrease: {} → {}", res0, res1);
    }
}

// ── Elliptic Backend Properties ──────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// The spectral solution satisfies the discrete operator on the interior.
    #[test]
    fn spectral_dirichlet_satisfies_operator(
        n in 5usize..40,
        h in 0.05f64..1.0,
        a in 0.0f64..3.0,
        kx in 0.5f64..6.0,
        ky in 0.5f64..6.0,
    ) {
        let source = smooth_source(n, kx, ky);
        let solver = SpectralPoisson::new((n, n), h, 1.3 * h, a, Edges::Dirichlet).unwrap();
        let mut u = Array2::zeros((n, n));
        solver.solve(&mut u, &source).unwrap();

        let coefficient = Array2::from_elem((n, n), a);
        let st = Stencil::new(h, 1.3 * h, Edges::Dirichlet);
        let lu = apply_operator(&u, Some(&coefficient), &st);
        let scale = source.iter().fold(1.0_f64, |m, v| m.max(v.abs()));
        for i in 1..n - 1 {
            for j in 1..n - 1 {
                prop_assert!((lu[[i, j]] - source[[i, j]]).abs() < 1e-8 * scale,
                    "residual at ({}, {})", i, j);
            }
        }
    }

    /// Multigrid and spectral converge to the same discrete solution.
    #[test]
    fn multigrid_agrees_with_spectral(
        k in 3u32..7,
        a in 0.0f64..2.0,
        kx in 0.5f64..6.0,
        ky in 0.5f64..6.0,
    ) {
        let n = (1usize << k) + 1;
        let h = 8.0 / (n - 1) as f64;
        let source = smooth_source(n, kx, ky);

        let solver = SpectralPoisson::new((n, n), h, h, a, Edges::Dirichlet).unwrap();
        let mut direct = Array2::zeros((n, n));
        solver.solve(&mut direct, &source).unwrap();

        let st = Stencil::new(h, h, Edges::Dirichlet);
        let coefficient = Array2::from_elem((n, n), a);
        let mut iterative = Array2::zeros((n, n));
        let result = multigrid_solve(
            &mut iterative, &source, Some(&coefficient), &st,
            &MultigridConfig::default(), 100, 1e-11, 0.0,
        );
        prop_assert!(result.converged, "multigrid residual {}", result.residual);

        let scale = direct.iter().fold(1e-12_f64, |m, v| m.max(v.abs()));
        prop_assert!(max_diff(&direct, &iterative) < 1e-6 * scale,
            "backends differ by {}", max_diff(&direct, &iterative));
    }
}

// ── Interpolation Properties ─────────────────────────────────────────

proptest! {
    /// Bilinear interpolation of a constant field returns that constant.
    #[test]
    fn interp_constant_field(
        val in -100.0f64..100.0,
        x in -2.0f64..2.0,
        y in -3.0f64..3.0,
    ) {
        let geom = LevelGeometry::new(0, [16, 24], [-2.0, -3.0], [2.0, 3.0]);
        let field = Array2::from_elem((geom.nx, geom.ny), val);
        let result = interp2d(field.view(), &geom, x, y);
        prop_assert!((result - val).abs() < 1e-10,
            "Constant field: interp({}, {}) = {}, expected {}", x, y, result, val);
    }

    /// Bilinear interpolation of f(x,y)=x+y returns x+y exactly.
    #[test]
    fn interp_linear_exact(x in -1.9f64..1.9, y in -2.9f64..2.9) {
        let geom = LevelGeometry::new(0, [16, 24], [-2.0, -3.0], [2.0, 3.0]);
        let field = Array2::from_shape_fn((geom.nx, geom.ny), |(i, j)| geom.x[i] + geom.y[j]);
        let result = interp2d(field.view(), &geom, x, y);
        prop_assert!((result - (x + y)).abs() < 1e-9,
            "Linear f(x,y)=x+y: interp({}, {}) = {}", x, y, result);
    }
}

// ── Reduction Properties ─────────────────────────────────────────────

proptest! {
    /// Σ(a-b)² is symmetric and vanishes only for equal arrays here.
    #[test]
    fn sum_sq_diff_symmetric(
        values in prop::collection::vec(-10.0f64..10.0, 36),
        shift in 0.1f64..5.0,
    ) {
        let a = Array2::from_shape_vec((6, 6), values).unwrap();
        let b = a.mapv(|v| v + shift);
        let ab = sum_sq_diff(a.view(), b.view());
        let ba = sum_sq_diff(b.view(), a.view());
        prop_assert_eq!(ab.to_bits(), ba.to_bits());
        prop_assert!((ab - 36.0 * shift * shift).abs() < 1e-9 * ab.max(1.0));
        prop_assert_eq!(sum_sq_diff(a.view(), a.view()), 0.0);
    }

    /// Σa² is non-negative and scales quadratically.
    #[test]
    fn sum_sq_scaling(values in prop::collection::vec(-10.0f64..10.0, 20), s in 0.5f64..3.0) {
        let a = Array2::from_shape_vec((4, 5), values).unwrap();
        let base = sum_sq(a.view());
        prop_assert!(base >= 0.0);
        let scaled = sum_sq(a.mapv(|v| v * s).view());
        prop_assert!((scaled - s * s * base).abs() < 1e-9 * scaled.max(1.0));
    }
}
