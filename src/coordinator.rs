//! Active-box claim reconciliation.
//!
//! A multi-box ensemble shares one cloud-synced "active box" variable.
//! This coordinator tracks the current claim, derives whether this
//! physical box is the active one, and reports role transitions so the
//! controller can fan presets out to the LED, buzzer, and motor.

use crate::config::BOX_NAME_MAX;
use heapless::String;

/// Where a claim came from. Decides whether the local operator gets an
/// audible notice about the transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClaimOrigin {
    /// This box's own switch drove the change.
    Local,
    /// The cloud reported another box's claim.
    Remote,
}

/// Role transition produced by a claim change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RoleChange {
    /// This box just became the active one.
    NowActive,
    /// This box just lost (or released) the active role.
    NowInactive(ClaimOrigin),
}

/// Owner of the shared claim string and the derived local role.
pub struct ActiveBoxCoordinator {
    this_box: &'static str,
    active_box: String<BOX_NAME_MAX>,
    is_active: bool,
}

impl ActiveBoxCoordinator {
    pub fn new(this_box: &'static str) -> Self {
        Self {
            this_box,
            active_box: String::new(),
            is_active: false,
        }
    }

    /// Name this box answers to.
    pub fn this_box(&self) -> &'static str {
        self.this_box
    }

    /// Identifier of whichever box currently holds the claim.
    pub fn active_box(&self) -> &str {
        self.active_box.as_str()
    }

    /// Is this physical box the active one right now?
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Record a claim (local switch or remote cloud write) and report
    /// the role transition, if any. Reclaiming the same name is quiet.
    pub fn set_claim(&mut self, name: &str, origin: ClaimOrigin) -> Option<RoleChange> {
        self.active_box.clear();
        for c in name.chars().take(BOX_NAME_MAX) {
            let _ = self.active_box.push(c);
        }

        let now_active = self.active_box.as_str() == self.this_box;
        if now_active == self.is_active {
            return None;
        }
        self.is_active = now_active;

        Some(if now_active {
            RoleChange::NowActive
        } else {
            RoleChange::NowInactive(origin)
        })
    }
}
