//! Trait (synergy) ladders.

/// A synergy ladder: trait name → ordered list of unit-count thresholds.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraitDefinition {
    pub name: String,
    /// Sorted by ascending `count`.
    pub thresholds: Vec<TraitThreshold>,
}

/// One rung of a trait ladder.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TraitThreshold {
    /// Board units carrying the trait needed to reach this rung.
    pub count: u32,
    pub bonus: TraitBonus,
    pub description: String,
}

/// Stat bonus granted to every Board unit carrying an active trait.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TraitBonus {
    /// Flat bonus added to every basic attack.
    Damage(u32),
    /// Flat maximum health.
    Health(u32),
    /// Flat defense.
    Defense(u32),
    /// Percentage attack speed increase.
    AttackSpeed(u32),
    /// Starting mana.
    Mana(u32),
}

impl TraitDefinition {
    /// Highest threshold whose requirement is met by `count` units.
    pub fn threshold_for(&self, count: u32) -> Option<(usize, &TraitThreshold)> {
        self.thresholds
            .iter()
            .enumerate()
            .filter(|(_, threshold)| threshold.count <= count)
            .last()
    }

    pub(crate) fn is_sorted(&self) -> bool {
        self.thresholds
            .windows(2)
            .all(|pair| pair[0].count < pair[1].count)
            && self.thresholds.iter().all(|threshold| threshold.count > 0)
    }
}
