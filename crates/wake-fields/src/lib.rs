// ─────────────────────────────────────────────────────────────────────
// SCPN Wakefield — Wake Fields
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Slice-wise self-consistent field engine for quasi-static plasma
//! wakefields.
//!
//! Layer 1: registry, schema, slice buffers
//! Layer 2: elliptic backends, level coupling, symmetry
//! Layer 3: orchestrator, predictor-corrector, explicit path

pub mod collaborators;
pub mod convergence;
pub mod explicit;
pub mod fields;
pub mod levels;
pub mod poisson;
pub mod predcorr;
pub mod registry;
pub mod schema;
pub mod slices;
pub mod symmetry;

pub use fields::Fields;
