//! Timed status effects on combat units.
//!
//! Durations count down once per tick. An effect applied with a duration of
//! N ticks influences exactly the next N ticks.

use arrayvec::ArrayVec;

use crate::config::GameConfig;

/// Kinds of status effect. Each variant carries its own magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusKind {
    /// Skips targeting, movement and attacks.
    Stunned,

    /// Loses `per_tick` health at the start of every tick.
    Burning { per_tick: u32 },

    /// Outgoing damage reduced by `percent`.
    Weakened { percent: u32 },

    /// Attack cooldown shortened: attack speed raised by `percent`.
    Hasted { percent: u32 },

    /// Absorbs up to `amount` incoming damage before health is touched.
    Shielded { amount: u32 },
}

impl StatusKind {
    fn same_variant(&self, other: &StatusKind) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }
}

/// A status effect with its remaining duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub remaining_ticks: u32,
}

/// Active status effects on one combat unit. At most one effect per variant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusSet {
    effects: ArrayVec<StatusEffect, { GameConfig::MAX_STATUS_EFFECTS }>,
}

impl StatusSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an effect. Re-applying a variant replaces its magnitude and keeps
    /// the longer duration.
    pub fn apply(&mut self, kind: StatusKind, duration_ticks: u32) {
        if duration_ticks == 0 {
            return;
        }
        if let Some(existing) = self.effects.iter_mut().find(|e| e.kind.same_variant(&kind)) {
            existing.kind = kind;
            existing.remaining_ticks = existing.remaining_ticks.max(duration_ticks);
            return;
        }
        if !self.effects.is_full() {
            self.effects.push(StatusEffect {
                kind,
                remaining_ticks: duration_ticks,
            });
        }
    }

    /// Advance one tick: drop expired effects, count down the rest, and
    /// return the burn damage owed this tick.
    pub fn tick(&mut self) -> u32 {
        self.effects.retain(|e| e.remaining_ticks > 0);
        let mut burn = 0;
        for effect in self.effects.iter_mut() {
            if let StatusKind::Burning { per_tick } = effect.kind {
                burn += per_tick;
            }
            effect.remaining_ticks -= 1;
        }
        burn
    }

    pub fn is_stunned(&self) -> bool {
        self.active().any(|kind| matches!(kind, StatusKind::Stunned))
    }

    pub fn weakened_percent(&self) -> u32 {
        self.active()
            .filter_map(|kind| match kind {
                StatusKind::Weakened { percent } => Some(percent.min(100)),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    pub fn hasted_percent(&self) -> u32 {
        self.active()
            .filter_map(|kind| match kind {
                StatusKind::Hasted { percent } => Some(percent),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Soak `damage` with any shield; returns the damage that gets through.
    pub fn absorb(&mut self, damage: u32) -> u32 {
        let mut rest = damage;
        for effect in self.effects.iter_mut() {
            if let StatusKind::Shielded { amount } = &mut effect.kind {
                let soaked = rest.min(*amount);
                *amount -= soaked;
                rest -= soaked;
            }
        }
        self.effects
            .retain(|e| !matches!(e.kind, StatusKind::Shielded { amount: 0 }));
        rest
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    fn active(&self) -> impl Iterator<Item = StatusKind> + '_ {
        self.effects.iter().map(|e| e.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burning_lasts_exactly_its_duration() {
        let mut set = StatusSet::new();
        set.apply(StatusKind::Burning { per_tick: 5 }, 2);

        assert_eq!(set.tick(), 5);
        assert_eq!(set.tick(), 5);
        assert_eq!(set.tick(), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn reapply_keeps_longer_duration() {
        let mut set = StatusSet::new();
        set.apply(StatusKind::Weakened { percent: 20 }, 10);
        set.apply(StatusKind::Weakened { percent: 50 }, 3);

        assert_eq!(set.iter().count(), 1);
        assert_eq!(set.weakened_percent(), 50);
        assert_eq!(set.iter().next().unwrap().remaining_ticks, 10);
    }

    #[test]
    fn shield_absorbs_then_breaks() {
        let mut set = StatusSet::new();
        set.apply(StatusKind::Shielded { amount: 30 }, 50);

        assert_eq!(set.absorb(20), 0);
        assert_eq!(set.absorb(25), 15);
        assert!(set.is_empty());
        assert_eq!(set.absorb(10), 10);
    }

    #[test]
    fn stun_expires() {
        let mut set = StatusSet::new();
        set.apply(StatusKind::Stunned, 1);
        set.tick();
        assert!(set.is_stunned());
        set.tick();
        assert!(!set.is_stunned());
    }
}
