//! Ephemeral combat-space projections of owned units and enemies.

use crate::catalog::{AbilityDefinition, Stats, TemplateId};
use crate::config::GameConfig;
use crate::synergy::UnitBonus;
use crate::unit::UnitId;

use super::status::StatusSet;

/// Which team a combat unit fights for.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }
}

/// Continuous grid coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Starting position of the unit in Board slot `index` (rows 0-3).
    pub fn board_slot(index: usize) -> Self {
        let column = index % GameConfig::BOARD_COLUMNS;
        let row = index / GameConfig::BOARD_COLUMNS;
        Self::new(column as f32, row as f32)
    }

    /// Starting position of the `k`-th enemy, mirrored onto rows 4-7.
    pub fn enemy_slot(k: usize) -> Self {
        let column = k % GameConfig::BOARD_COLUMNS;
        let row = 2 * GameConfig::BOARD_ROWS - 1 - k / GameConfig::BOARD_COLUMNS;
        Self::new(column as f32, row as f32)
    }

    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Move up to `step` toward `target`, never past it.
    pub fn step_toward(&self, target: &Point, step: f32) -> Point {
        let distance = self.distance(target);
        if distance <= step || distance == 0.0 {
            return *target;
        }
        let ratio = step / distance;
        Point::new(
            self.x + (target.x - self.x) * ratio,
            self.y + (target.y - self.y) * ratio,
        )
    }
}

/// A unit during one combat phase. Never persisted and never written back to
/// the owned unit it was projected from.
#[derive(Clone, Debug, PartialEq)]
pub struct CombatUnit {
    pub side: Side,
    /// Owned unit this was projected from; `None` for enemies and summons.
    pub source: Option<UnitId>,
    pub template: TemplateId,
    pub star: u8,
    pub position: Point,
    pub health: u32,
    pub max_health: u32,
    pub attack: u32,
    pub defense: u32,
    /// Hundredths of attacks per second, after trait bonuses.
    pub attack_speed: u32,
    pub range: f32,
    /// Flat damage added to every basic attack.
    pub bonus_damage: u32,
    pub mana: u32,
    pub ability: Option<AbilityDefinition>,
    /// Ticks until the next attack fires; 0 means ready.
    pub cooldown: u32,
    /// Index of the current target in the simulator's unit list.
    pub target: Option<usize>,
    pub attacking: bool,
    pub statuses: StatusSet,
}

impl CombatUnit {
    pub fn new(
        side: Side,
        template: TemplateId,
        star: u8,
        stats: Stats,
        position: Point,
        ability: Option<AbilityDefinition>,
    ) -> Self {
        Self {
            side,
            source: None,
            template,
            star,
            position,
            health: stats.health,
            max_health: stats.health,
            attack: stats.attack,
            defense: stats.defense,
            attack_speed: stats.attack_speed,
            range: stats.range as f32,
            bonus_damage: 0,
            mana: 0,
            ability,
            cooldown: 0,
            target: None,
            attacking: false,
            statuses: StatusSet::new(),
        }
    }

    pub fn with_source(mut self, source: UnitId) -> Self {
        self.source = Some(source);
        self
    }

    /// Fold trait bonuses into the unit's starting state.
    pub fn with_bonus(mut self, bonus: UnitBonus) -> Self {
        self.max_health += bonus.health;
        self.health += bonus.health;
        self.defense += bonus.defense;
        self.bonus_damage += bonus.damage;
        self.attack_speed += self.attack_speed * bonus.attack_speed_pct / 100;
        self.mana += bonus.mana;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Mana needed to cast, if the unit has an ability.
    pub fn mana_cost(&self) -> Option<u32> {
        self.ability.as_ref().map(|ability| ability.mana_cost)
    }

    /// Ticks between attacks: `ceil(ticks_per_second × 100 / speed)`, at
    /// least 1. Haste raises the effective speed.
    pub fn cooldown_ticks(&self, ticks_per_second: u32) -> u32 {
        let haste = self.statuses.hasted_percent();
        let speed = self.attack_speed + self.attack_speed * haste / 100;
        if speed == 0 {
            return u32::MAX;
        }
        (ticks_per_second * 100).div_ceil(speed).max(1)
    }
}
