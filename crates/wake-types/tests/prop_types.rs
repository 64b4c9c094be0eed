// ─────────────────────────────────────────────────────────────────────
// SCPN Wakefield — Property-Based Tests (proptest) for wake-types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for wake-types using proptest.
//!
//! Covers: LevelGeometry construction invariants, refined level sizing,
//! checked narrowing, configuration serialization roundtrip.

use proptest::prelude::*;
use wake_types::config::{LevelConfig, WakeConfig};
use wake_types::error::WakeError;
use wake_types::narrow::{to_f32, to_index};
use wake_types::state::LevelGeometry;

// ── LevelGeometry Construction Invariants ────────────────────────────

proptest! {
    /// Sample counts are one more than the cell counts.
    #[test]
    fn geometry_dimensions_match(cx in 2usize..128, cy in 2usize..128) {
        let g = LevelGeometry::new(0, [cx, cy], [-1.0, -2.0], [1.0, 2.0]);

        prop_assert_eq!(g.nx, cx + 1);
        prop_assert_eq!(g.ny, cy + 1);
        prop_assert_eq!(g.x.len(), cx + 1);
        prop_assert_eq!(g.y.len(), cy + 1);
        prop_assert_eq!(g.shape(), (cx + 1, cy + 1));
    }

    /// Boundary coordinates and spacing are consistent.
    #[test]
    fn geometry_boundary_values(
        cx in 2usize..64,
        cy in 2usize..64,
        lo in -10.0f64..-0.1,
        width in 0.5f64..20.0,
    ) {
        let g = LevelGeometry::new(0, [cx, cy], [lo, lo], [lo + width, lo + 2.0 * width]);

        prop_assert!((g.lo()[0] - lo).abs() < 1e-12);
        prop_assert!((g.hi()[0] - (lo + width)).abs() < 1e-9);
        prop_assert!((g.dx - width / cx as f64).abs() < 1e-9);
        prop_assert!((g.dy - 2.0 * width / cy as f64).abs() < 1e-9);
    }

    /// Mirroring is an involution that maps x to -x on a symmetric grid.
    #[test]
    fn geometry_mirror_involution(c in 2usize..64, i_frac in 0.0f64..1.0) {
        let g = LevelGeometry::new(0, [c, c], [-3.0, -3.0], [3.0, 3.0]);
        let i = ((g.nx - 1) as f64 * i_frac) as usize;
        let m = g.mirror_x(i);
        prop_assert_eq!(g.mirror_x(m), i);
        prop_assert!((g.x[m] + g.x[i]).abs() < 1e-9);
    }

    /// A ratio-r refinement has r times the cells over the same extent.
    #[test]
    fn refined_level_cell_count(c in 4usize..64, ratio in 1usize..5) {
        let parent = LevelConfig { n_cells: [c, c], lo: [-4.0, -4.0], hi: [4.0, 4.0] };
        let fine = LevelConfig::refined(&parent, ratio, [-2.0, -2.0], [2.0, 2.0]).unwrap();
        let expected = (c * ratio) / 2;
        prop_assert!(fine.n_cells[0].abs_diff(expected) <= 1);
        let pg = parent.geometry(0);
        let fg = fine.geometry(1);
        prop_assert!(pg.encloses(&fg));
    }
}

// ── Checked Narrowing ────────────────────────────────────────────────

proptest! {
    /// Values inside the f32 range narrow without overflow.
    #[test]
    fn to_f32_in_range(v in -1e30f64..1e30) {
        let n = to_f32(v, "value").unwrap();
        prop_assert!(n.is_finite());
        prop_assert!(((n as f64) - v).abs() <= 1e-6 * v.abs().max(1e-30));
    }

    /// Values beyond f32::MAX are reported as overflow.
    #[test]
    fn to_f32_overflow(v in 1e39f64..1e300) {
        let err = to_f32(v, "value").unwrap_err();
        let is_overflow = matches!(err, WakeError::Overflow { .. });
        prop_assert!(is_overflow);
    }

    /// Negative counts are rejected, non-negative ones rounded.
    #[test]
    fn to_index_sign(v in -1e6f64..1e6) {
        match to_index(v, "count") {
            Ok(n) => prop_assert_eq!(n, v.round() as usize),
            Err(_) => prop_assert!(v.round() < 0.0),
        }
    }
}

// ── Serialization Roundtrip ──────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Config survives a JSON round trip and still validates.
    #[test]
    fn config_json_roundtrip(c in 4usize..64, dz in 0.001f64..1.0, sym in any::<bool>()) {
        let mut cfg = WakeConfig::single_level([c, c], [-4.0, -4.0], [4.0, 4.0], dz);
        cfg.symmetrize_currents = sym;
        cfg.validate().unwrap();

        let json = serde_json::to_string(&cfg).unwrap();
        let back = WakeConfig::from_json_str(&json).unwrap();
        back.validate().unwrap();
        prop_assert_eq!(back.levels, cfg.levels);
        prop_assert_eq!(back.dz, cfg.dz);
        prop_assert_eq!(back.symmetrize_currents, sym);
    }
}
