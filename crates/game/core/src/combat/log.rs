//! Combat log for presentation replay.

use crate::catalog::TemplateId;

use super::status::StatusKind;

/// One notable event during a combat tick. Unit references are indices into
/// the simulator's unit list.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatLogEntry {
    Attack {
        tick: u64,
        attacker: usize,
        target: usize,
        damage: u32,
    },
    Cast {
        tick: u64,
        caster: usize,
        ability: String,
    },
    StatusApplied {
        tick: u64,
        unit: usize,
        status: StatusKind,
        duration_ticks: u32,
    },
    StatusDamage {
        tick: u64,
        unit: usize,
        damage: u32,
    },
    Healed {
        tick: u64,
        unit: usize,
        amount: u32,
    },
    Summoned {
        tick: u64,
        caster: usize,
        unit: usize,
        template: TemplateId,
    },
    Death {
        tick: u64,
        unit: usize,
    },
}

impl CombatLogEntry {
    pub fn tick(&self) -> u64 {
        match self {
            Self::Attack { tick, .. }
            | Self::Cast { tick, .. }
            | Self::StatusApplied { tick, .. }
            | Self::StatusDamage { tick, .. }
            | Self::Healed { tick, .. }
            | Self::Summoned { tick, .. }
            | Self::Death { tick, .. } => *tick,
        }
    }
}
