// ─────────────────────────────────────────────────────────────────────
// SCPN Wakefield — Field Registry
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Name → component mapping for the slice buffers, scoped per role.
//!
//! Every role has its own dense slot space. Once registration is done the
//! slots of all roles are laid out back to back, role by role, and a name
//! resolves to a global [`Comp`] index. Names are resolved once during setup;
//! the solve paths only carry [`Comp`] values.

use std::fmt;

use wake_types::error::{WakeError, WakeResult};

pub const N_ROLES: usize = 7;

/// Purpose of a group of components in the slice buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Slice currently being solved.
    This,
    /// Currents of the slice after this one, deposited by the plasma push.
    Next,
    /// Accepted fields and currents of the slice before this one.
    Previous,
    /// Ion background charge density.
    RhoIons,
    /// Trial beam-loading fields.
    TrialLoad,
    /// Guess of the current predictor-corrector iteration.
    IterCurrent,
    /// Guess of the previous iteration; history for the initial guess.
    IterPrevious,
}

impl Role {
    pub const ALL: [Role; N_ROLES] = [
        Role::This,
        Role::Next,
        Role::Previous,
        Role::RhoIons,
        Role::TrialLoad,
        Role::IterCurrent,
        Role::IterPrevious,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::This => "this",
            Role::Next => "next",
            Role::Previous => "previous",
            Role::RhoIons => "rho_ions",
            Role::TrialLoad => "trial_load",
            Role::IterCurrent => "iter_current",
            Role::IterPrevious => "iter_previous",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Global component index into a slice buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Comp(usize);

impl Comp {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    names: [Vec<String>; N_ROLES],
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` in `role` and return its slot within the role.
    /// Registering a name twice returns the first slot.
    pub fn register(&mut self, role: Role, name: &str) -> usize {
        let names = &mut self.names[role.index()];
        if let Some(slot) = names.iter().position(|n| n == name) {
            return slot;
        }
        names.push(name.to_string());
        names.len() - 1
    }

    /// Slot of `name` within `role`.
    pub fn lookup(&self, role: Role, name: &str) -> WakeResult<usize> {
        let names = &self.names[role.index()];
        names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| WakeError::UnregisteredField {
                role: role.name().to_string(),
                name: name.to_string(),
                registered: names
                    .iter()
                    .enumerate()
                    .map(|(slot, n)| format!(" '{n}' ({slot}),"))
                    .collect(),
            })
    }

    /// Global component of `name` in `role`. Only stable once every role
    /// is fully registered.
    pub fn comp(&self, role: Role, name: &str) -> WakeResult<Comp> {
        Ok(Comp(self.offset(role) + self.lookup(role, name)?))
    }

    /// First global component of `role`.
    pub fn offset(&self, role: Role) -> usize {
        self.names[..role.index()].iter().map(Vec::len).sum()
    }

    pub fn len(&self, role: Role) -> usize {
        self.names[role.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_comps() == 0
    }

    /// Total number of components over all roles.
    pub fn n_comps(&self) -> usize {
        self.names.iter().map(Vec::len).sum()
    }

    pub fn names(&self, role: Role) -> &[String] {
        &self.names[role.index()]
    }
}
