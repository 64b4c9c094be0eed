//! Components allocated by the slice engine and their resolved indices.

use tracing::debug;
use wake_types::error::WakeResult;

use crate::registry::{Comp, FieldRegistry, Role};

const THIS_FIELDS: [&str; 11] = [
    "ExmBy", "EypBx", "Ez", "Bx", "By", "Bz", "Psi", "jx", "jy", "jz", "rhomjz",
];
const NEXT_FIELDS: [&str; 2] = ["jx", "jy"];
const PREVIOUS_FIELDS: [&str; 4] = ["Bx", "By", "jx", "jy"];
const ITER_FIELDS: [&str; 2] = ["Bx", "By"];
const ION_FIELDS: [&str; 1] = ["rhomjz"];
const TRIAL_FIELDS: [&str; 6] = ["Ez", "Bx", "By", "jx", "jy", "jz"];

/// Register every component the engine uses. `explicit` adds the
/// susceptibility of the explicit path.
pub fn register_fields(registry: &mut FieldRegistry, explicit: bool) {
    let groups: [(Role, &[&str]); 7] = [
        (Role::This, &THIS_FIELDS[..]),
        (Role::Next, &NEXT_FIELDS[..]),
        (Role::Previous, &PREVIOUS_FIELDS[..]),
        (Role::RhoIons, &ION_FIELDS[..]),
        (Role::TrialLoad, &TRIAL_FIELDS[..]),
        (Role::IterCurrent, &ITER_FIELDS[..]),
        (Role::IterPrevious, &ITER_FIELDS[..]),
    ];
    for (role, names) in groups {
        for name in names {
            registry.register(role, name);
        }
    }
    if explicit {
        registry.register(Role::This, "chi");
    }
    for role in Role::ALL {
        debug!(role = role.name(), components = registry.len(role), "registered slice components");
    }
}

/// Fields and currents a field solve reads and writes for one target role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveTarget {
    pub ez: Comp,
    pub bx: Comp,
    pub by: Comp,
    pub jx: Comp,
    pub jy: Comp,
    pub jz: Comp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThisIds {
    pub exmby: Comp,
    pub eypbx: Comp,
    pub ez: Comp,
    pub bx: Comp,
    pub by: Comp,
    pub bz: Comp,
    pub psi: Comp,
    pub jx: Comp,
    pub jy: Comp,
    pub jz: Comp,
    pub rhomjz: Comp,
    pub chi: Option<Comp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentIds {
    pub jx: Comp,
    pub jy: Comp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviousIds {
    pub bx: Comp,
    pub by: Comp,
    pub jx: Comp,
    pub jy: Comp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BIds {
    pub bx: Comp,
    pub by: Comp,
}

/// Every component index used on the solve paths, resolved once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldIds {
    pub this: ThisIds,
    pub next: CurrentIds,
    pub previous: PreviousIds,
    pub ion_rhomjz: Comp,
    pub trial: SolveTarget,
    pub iter_current: BIds,
    pub iter_previous: BIds,
}

impl FieldIds {
    pub fn resolve(reg: &FieldRegistry) -> WakeResult<Self> {
        let this = ThisIds {
            exmby: reg.comp(Role::This, "ExmBy")?,
            eypbx: reg.comp(Role::This, "EypBx")?,
            ez: reg.comp(Role::This, "Ez")?,
            bx: reg.comp(Role::This, "Bx")?,
            by: reg.comp(Role::This, "By")?,
            bz: reg.comp(Role::This, "Bz")?,
            psi: reg.comp(Role::This, "Psi")?,
            jx: reg.comp(Role::This, "jx")?,
            jy: reg.comp(Role::This, "jy")?,
            jz: reg.comp(Role::This, "jz")?,
            rhomjz: reg.comp(Role::This, "rhomjz")?,
            chi: reg.comp(Role::This, "chi").ok(),
        };
        let b = |role| -> WakeResult<BIds> {
            Ok(BIds {
                bx: reg.comp(role, "Bx")?,
                by: reg.comp(role, "By")?,
            })
        };
        Ok(FieldIds {
            this,
            next: CurrentIds {
                jx: reg.comp(Role::Next, "jx")?,
                jy: reg.comp(Role::Next, "jy")?,
            },
            previous: PreviousIds {
                bx: reg.comp(Role::Previous, "Bx")?,
                by: reg.comp(Role::Previous, "By")?,
                jx: reg.comp(Role::Previous, "jx")?,
                jy: reg.comp(Role::Previous, "jy")?,
            },
            ion_rhomjz: reg.comp(Role::RhoIons, "rhomjz")?,
            trial: SolveTarget {
                ez: reg.comp(Role::TrialLoad, "Ez")?,
                bx: reg.comp(Role::TrialLoad, "Bx")?,
                by: reg.comp(Role::TrialLoad, "By")?,
                jx: reg.comp(Role::TrialLoad, "jx")?,
                jy: reg.comp(Role::TrialLoad, "jy")?,
                jz: reg.comp(Role::TrialLoad, "jz")?,
            },
            iter_current: b(Role::IterCurrent)?,
            iter_previous: b(Role::IterPrevious)?,
        })
    }

    /// Components a solve for `role` works on. Only `This` and
    /// `TrialLoad` carry their own fields and currents.
    pub fn target(&self, role: Role) -> Option<SolveTarget> {
        match role {
            Role::This => Some(SolveTarget {
                ez: self.this.ez,
                bx: self.this.bx,
                by: self.this.by,
                jx: self.this.jx,
                jy: self.this.jy,
                jz: self.this.jz,
            }),
            Role::TrialLoad => Some(self.trial),
            _ => None,
        }
    }
}
