// ─────────────────────────────────────────────────────────────────────
// SCPN Wakefield — Slice Buffers
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-level storage of every registered component.
//!
//! One dense `[n_comps, nx, ny]` array per level, allocated once and
//! overwritten slice after slice.

use ndarray::{s, Array3, ArrayView2, ArrayView3, ArrayViewMut2, ArrayViewMut3, Axis, Zip};
use wake_types::error::{WakeError, WakeResult};
use wake_types::state::LevelGeometry;

use crate::registry::{Comp, FieldRegistry, Role};

#[derive(Debug, Clone)]
pub struct SliceBuffer {
    geom: LevelGeometry,
    data: Array3<f64>,
}

impl SliceBuffer {
    pub fn new(geom: LevelGeometry, n_comps: usize) -> Self {
        let data = Array3::zeros((n_comps, geom.nx, geom.ny));
        SliceBuffer { geom, data }
    }

    pub fn geometry(&self) -> &LevelGeometry {
        &self.geom
    }

    pub fn level(&self) -> usize {
        self.geom.level
    }

    pub fn n_comps(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    #[inline]
    pub fn field(&self, comp: Comp) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(0), comp.index())
    }

    #[inline]
    pub fn field_mut(&mut self, comp: Comp) -> ArrayViewMut2<'_, f64> {
        self.data.index_axis_mut(Axis(0), comp.index())
    }

    /// All components of `role`, in slot order.
    pub fn role_block(&self, registry: &FieldRegistry, role: Role) -> ArrayView3<'_, f64> {
        let start = registry.offset(role);
        self.data.slice(s![start..start + registry.len(role), .., ..])
    }

    pub fn role_block_mut(&mut self, registry: &FieldRegistry, role: Role) -> ArrayViewMut3<'_, f64> {
        let start = registry.offset(role);
        self.data.slice_mut(s![start..start + registry.len(role), .., ..])
    }

    pub fn set_val(&mut self, comps: &[Comp], value: f64) {
        for &c in comps {
            self.field_mut(c).fill(value);
        }
    }

    pub fn mult(&mut self, comps: &[Comp], factor: f64) {
        for &c in comps {
            self.field_mut(c).mapv_inplace(|v| v * factor);
        }
    }

    /// `dst = Σ w_k c_k`. `dst` may appear among the terms; its weights are
    /// applied first, in place.
    pub fn lincomb(&mut self, dst: Comp, terms: &[(f64, Comp)]) {
        let own: Vec<f64> = terms.iter().filter(|&&(_, c)| c == dst).map(|&(w, _)| w).collect();
        if own.is_empty() {
            self.field_mut(dst).fill(0.0);
        } else {
            let w: f64 = own.iter().sum();
            self.field_mut(dst).par_mapv_inplace(|v| w * v);
        }

        let d = dst.index();
        for &(w, c) in terms.iter().filter(|&&(_, c)| c != dst) {
            let (mut to, from) = self
                .data
                .multi_slice_mut((s![d, .., ..], s![c.index(), .., ..]));
            Zip::from(&mut to).and(&from).par_for_each(|t, &f| *t += w * f);
        }
    }

    /// Copy `src` into `dst`.
    pub fn shift(&mut self, dst: Comp, src: Comp) {
        if dst == src {
            return;
        }
        let (mut to, from) = self
            .data
            .multi_slice_mut((s![dst.index(), .., ..], s![src.index(), .., ..]));
        to.assign(&from);
    }

    /// Copy each of `src` into the matching entry of `dst`.
    pub fn duplicate(&mut self, dst: &[Comp], src: &[Comp]) -> WakeResult<()> {
        if dst.len() != src.len() {
            return Err(WakeError::Configuration(format!(
                "cannot duplicate {} components into {}",
                src.len(),
                dst.len()
            )));
        }
        for (&to, &from) in dst.iter().zip(src) {
            self.shift(to, from);
        }
        Ok(())
    }

    /// `dst += src`
    pub fn add(&mut self, dst: Comp, src: Comp) {
        self.lincomb(dst, &[(1.0, dst), (1.0, src)]);
    }
}
