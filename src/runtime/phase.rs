//! Update phases
//!
//! A frame is a fixed sequence of phases. The host ticks each phase once per
//! frame in [`Phase::ALL`] order and fires the end-of-phase hook afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A named per-frame update pass.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Phase {
    /// Fixed-step simulation pass, runs first.
    PhysicsUpdate,
    /// Main per-frame pass.
    #[default]
    EarlyUpdate,
    /// Pass after every other update of the frame.
    LateUpdate,
}

impl Phase {
    /// Number of phases.
    pub const COUNT: usize = 3;

    /// Every phase in frame order.
    pub const ALL: [Phase; Phase::COUNT] = [Phase::PhysicsUpdate, Phase::EarlyUpdate, Phase::LateUpdate];

    /// Dense index, usable for per-phase arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Phase::PhysicsUpdate => 0,
            Phase::EarlyUpdate => 1,
            Phase::LateUpdate => 2,
        }
    }

    /// Short lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Phase::PhysicsUpdate => "physics-update",
            Phase::EarlyUpdate => "early-update",
            Phase::LateUpdate => "late-update",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}
