//! Tick-based combat resolution.
//!
//! Every tick reads from a snapshot taken before any unit acts and commits
//! all writes at the end, so iteration order never changes who survives:
//!
//! 1. status effects expire and burn
//! 2. targeting: nearest living opponent, ties to the lowest unit index
//! 3. move toward the target, or attack when in range
//! 4. cooldown countdown; ready attackers fire (or cast at full mana)
//! 5. damage, heals and statuses aggregated per unit
//! 6. commit: health floored at 0, deaths recorded, summons spawned
//! 7. clock advance and elimination check
//!
//! The countdown is driven separately ([`CombatSimulator::countdown`]), once
//! per simulated second, so a real-time driver can schedule it on its own.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::catalog::{AbilityEffect, CharacterTemplate, TemplateId};
use crate::config::GameConfig;
use crate::rng::PcgRng;

use super::damage::{DamageRules, apply_damage, attack_damage, mitigate, weaken};
use super::log::CombatLogEntry;
use super::status::StatusKind;
use super::unit::{CombatUnit, Point, Side};

/// How a combat phase ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatOutcome {
    /// Every enemy was eliminated (including a simultaneous wipe).
    Victory,
    /// Every player unit was eliminated while enemies remained.
    Defeat,
    /// The countdown ran out; live counts decide, the player wins ties.
    Timeout { player_won: bool },
}

impl CombatOutcome {
    pub fn is_victory(&self) -> bool {
        matches!(self, Self::Victory | Self::Timeout { player_won: true })
    }
}

/// `Started → Ticking → Resolved`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatPhase {
    Started,
    Ticking,
    Resolved(CombatOutcome),
}

/// Read-only view of one combat unit for presentation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitView {
    pub index: usize,
    pub side: Side,
    pub template: TemplateId,
    pub star: u8,
    pub position: Point,
    pub health: u32,
    pub max_health: u32,
    pub mana: u32,
    pub target: Option<usize>,
    pub attacking: bool,
    pub statuses: Vec<StatusKind>,
}

/// Per-tick presentation snapshot.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatSnapshot {
    pub tick: u64,
    pub seconds_remaining: u32,
    pub phase: CombatPhase,
    pub units: Vec<UnitView>,
}

/// State of the world before a tick acts.
struct TickSnapshot {
    positions: Vec<Point>,
    alive: Vec<bool>,
    sides: Vec<Side>,
    health: Vec<u32>,
    max_health: Vec<u32>,
    defense: Vec<u32>,
}

impl TickSnapshot {
    fn capture(units: &[CombatUnit]) -> Self {
        Self {
            positions: units.iter().map(|u| u.position).collect(),
            alive: units.iter().map(CombatUnit::is_alive).collect(),
            sides: units.iter().map(|u| u.side).collect(),
            health: units.iter().map(|u| u.health).collect(),
            max_health: units.iter().map(|u| u.max_health).collect(),
            defense: units.iter().map(|u| u.defense).collect(),
        }
    }

    /// Nearest living opponent of `index`. Strict comparison keeps the
    /// first-found unit on equal distances.
    fn nearest_opponent(&self, index: usize) -> Option<usize> {
        let origin = self.positions[index];
        let side = self.sides[index];
        let mut best: Option<(usize, f32)> = None;
        for (other, position) in self.positions.iter().enumerate() {
            if !self.alive[other] || self.sides[other] == side {
                continue;
            }
            let distance = origin.distance(position);
            if best.is_none_or(|(_, current)| distance < current) {
                best = Some((other, distance));
            }
        }
        best.map(|(other, _)| other)
    }

    /// Living ally (caster included) with the lowest health ratio.
    fn most_wounded_ally(&self, index: usize) -> usize {
        let side = self.sides[index];
        let mut best = index;
        let mut best_ratio = u64::MAX;
        for other in 0..self.alive.len() {
            if !self.alive[other] || self.sides[other] != side {
                continue;
            }
            let ratio =
                u64::from(self.health[other]) * 1000 / u64::from(self.max_health[other].max(1));
            if ratio < best_ratio {
                best = other;
                best_ratio = ratio;
            }
        }
        best
    }
}

/// Writes accumulated for one unit during a tick.
#[derive(Clone, Debug, Default)]
struct Pending {
    damage: u32,
    heal: u32,
    statuses: Vec<(StatusKind, u32)>,
    position: Option<Point>,
}

struct Spawn {
    caster: usize,
    template: TemplateId,
    count: u32,
}

/// Runs one combat phase to a [`CombatOutcome`].
///
/// Owns its units outright; nothing in here refers back to the roster, so
/// dropping the simulator discards the phase without side effects.
#[derive(Clone, Debug)]
pub struct CombatSimulator {
    units: Vec<CombatUnit>,
    /// Templates that abilities may summon, collected at combat start.
    summons: BTreeMap<TemplateId, CharacterTemplate>,
    rules: DamageRules,
    move_step: f32,
    mana_per_attack: u32,
    ticks_per_second: u32,
    rng: PcgRng,
    tick: u64,
    seconds_remaining: u32,
    phase: CombatPhase,
    log: Vec<CombatLogEntry>,
}

impl CombatSimulator {
    /// Upper bound on units in one combat, summons included.
    pub const MAX_UNITS: usize = 64;

    /// Start a phase. Player units are indexed before enemies.
    pub fn new(
        config: &GameConfig,
        players: Vec<CombatUnit>,
        enemies: Vec<CombatUnit>,
        summons: BTreeMap<TemplateId, CharacterTemplate>,
        rng: PcgRng,
    ) -> Self {
        let mut units = players;
        units.extend(enemies);
        info!(
            players = units.iter().filter(|u| u.side == Side::Player).count(),
            enemies = units.iter().filter(|u| u.side == Side::Enemy).count(),
            "combat started"
        );
        Self {
            units,
            summons,
            rules: DamageRules::from_config(config),
            move_step: config.move_step,
            mana_per_attack: config.mana_per_attack,
            ticks_per_second: config.ticks_per_second(),
            rng,
            tick: 0,
            seconds_remaining: config.combat_seconds,
            phase: CombatPhase::Started,
            log: Vec::new(),
        }
    }

    pub fn phase(&self) -> CombatPhase {
        self.phase
    }

    pub fn outcome(&self) -> Option<CombatOutcome> {
        match self.phase {
            CombatPhase::Resolved(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn units(&self) -> &[CombatUnit] {
        &self.units
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn ticks_per_second(&self) -> u32 {
        self.ticks_per_second
    }

    pub fn log(&self) -> &[CombatLogEntry] {
        &self.log
    }

    /// Take the log entries recorded since the last drain.
    pub fn drain_log(&mut self) -> Vec<CombatLogEntry> {
        std::mem::take(&mut self.log)
    }

    /// Living units per side: `(players, enemies)`.
    pub fn live_counts(&self) -> (usize, usize) {
        self.units
            .iter()
            .filter(|u| u.is_alive())
            .fold((0, 0), |(players, enemies), unit| match unit.side {
                Side::Player => (players + 1, enemies),
                Side::Enemy => (players, enemies + 1),
            })
    }

    pub fn snapshot(&self) -> CombatSnapshot {
        CombatSnapshot {
            tick: self.tick,
            seconds_remaining: self.seconds_remaining,
            phase: self.phase,
            units: self
                .units
                .iter()
                .enumerate()
                .map(|(index, unit)| UnitView {
                    index,
                    side: unit.side,
                    template: unit.template.clone(),
                    star: unit.star,
                    position: unit.position,
                    health: unit.health,
                    max_health: unit.max_health,
                    mana: unit.mana,
                    target: unit.target,
                    attacking: unit.attacking,
                    statuses: unit.statuses.iter().map(|e| e.kind).collect(),
                })
                .collect(),
        }
    }

    /// Advance one tick. Returns the outcome once the phase is resolved;
    /// ticking a resolved phase does nothing.
    pub fn tick(&mut self) -> Option<CombatOutcome> {
        if let Some(outcome) = self.outcome() {
            return Some(outcome);
        }
        self.phase = CombatPhase::Ticking;
        let now = self.tick;
        let mut pending = vec![Pending::default(); self.units.len()];

        for (index, unit) in self.units.iter_mut().enumerate() {
            if !unit.is_alive() {
                continue;
            }
            let burn = unit.statuses.tick();
            if burn > 0 {
                pending[index].damage += burn;
                self.log.push(CombatLogEntry::StatusDamage {
                    tick: now,
                    unit: index,
                    damage: burn,
                });
            }
        }

        let snapshot = TickSnapshot::capture(&self.units);
        let mut spawns = Vec::new();

        for index in 0..self.units.len() {
            if !snapshot.alive[index] {
                continue;
            }
            if self.units[index].statuses.is_stunned() {
                self.units[index].attacking = false;
                continue;
            }

            let previous = self.units[index].target;
            let Some(target) = snapshot.nearest_opponent(index) else {
                debug!(unit = index, "no living opponent, idling this tick");
                self.units[index].target = None;
                self.units[index].attacking = false;
                continue;
            };
            if let Some(previous) = previous
                && previous != target
                && !snapshot.alive[previous]
            {
                debug!(unit = index, previous, target, "invalid target, retargeting");
            }

            let unit = &mut self.units[index];
            unit.target = Some(target);
            let distance = snapshot.positions[index].distance(&snapshot.positions[target]);
            if distance > unit.range {
                unit.attacking = false;
                pending[index].position = Some(
                    snapshot.positions[index].step_toward(&snapshot.positions[target], self.move_step),
                );
                continue;
            }

            unit.attacking = true;
            unit.cooldown = unit.cooldown.saturating_sub(1);
            if unit.cooldown > 0 {
                continue;
            }
            unit.cooldown = unit.cooldown_ticks(self.ticks_per_second);
            self.fire(index, target, &snapshot, &mut pending, &mut spawns);
        }

        self.commit(&snapshot, pending, spawns);
        self.tick += 1;
        self.check_resolution()
    }

    /// Basic attack, or the unit's ability when its mana is full.
    fn fire(
        &mut self,
        index: usize,
        target: usize,
        snapshot: &TickSnapshot,
        pending: &mut [Pending],
        spawns: &mut Vec<Spawn>,
    ) {
        let now = self.tick;
        let unit = &mut self.units[index];

        let ability = match (&unit.ability, unit.mana_cost()) {
            (Some(ability), Some(cost)) if unit.mana >= cost => Some(ability.clone()),
            _ => None,
        };

        let Some(ability) = ability else {
            let raw = attack_damage(unit, &self.rules, &mut self.rng);
            let damage = mitigate(raw, snapshot.defense[target]);
            pending[target].damage += damage;
            if let Some(cost) = unit.mana_cost() {
                unit.mana = (unit.mana + self.mana_per_attack).min(cost);
            }
            self.log.push(CombatLogEntry::Attack {
                tick: now,
                attacker: index,
                target,
                damage,
            });
            return;
        };

        unit.mana = 0;
        self.log.push(CombatLogEntry::Cast {
            tick: now,
            caster: index,
            ability: ability.name.clone(),
        });
        match ability.effect {
            AbilityEffect::Damage { amount } => {
                pending[target].damage += mitigate(weaken(amount, unit), snapshot.defense[target]);
            }
            AbilityEffect::Heal { amount } => {
                pending[snapshot.most_wounded_ally(index)].heal += amount;
            }
            AbilityEffect::Buff {
                status,
                duration_ticks,
            } => pending[index].statuses.push((status, duration_ticks)),
            AbilityEffect::Debuff {
                status,
                duration_ticks,
            } => pending[target].statuses.push((status, duration_ticks)),
            AbilityEffect::Summon { template, count } => spawns.push(Spawn {
                caster: index,
                template,
                count,
            }),
            AbilityEffect::AreaDamage { amount, radius } => {
                let amount = weaken(amount, unit);
                let center = snapshot.positions[target];
                for other in 0..snapshot.alive.len() {
                    if snapshot.alive[other]
                        && snapshot.sides[other] != unit.side
                        && center.distance(&snapshot.positions[other]) <= radius
                    {
                        pending[other].damage += mitigate(amount, snapshot.defense[other]);
                    }
                }
            }
        }
    }

    /// Apply the tick's writes. Heals land before damage.
    fn commit(&mut self, snapshot: &TickSnapshot, pending: Vec<Pending>, spawns: Vec<Spawn>) {
        let now = self.tick;
        for (index, writes) in pending.into_iter().enumerate() {
            if !snapshot.alive[index] {
                continue;
            }
            let unit = &mut self.units[index];
            if let Some(position) = writes.position {
                unit.position = position;
            }
            if writes.heal > 0 {
                let before = unit.health;
                unit.health = (unit.health + writes.heal).min(unit.max_health);
                self.log.push(CombatLogEntry::Healed {
                    tick: now,
                    unit: index,
                    amount: unit.health - before,
                });
            }
            if writes.damage > 0 {
                let through = unit.statuses.absorb(writes.damage);
                unit.health = apply_damage(unit.health, through);
            }
            if !unit.is_alive() {
                unit.attacking = false;
                unit.target = None;
                self.log.push(CombatLogEntry::Death {
                    tick: now,
                    unit: index,
                });
                continue;
            }
            for (status, duration_ticks) in writes.statuses {
                unit.statuses.apply(status, duration_ticks);
                self.log.push(CombatLogEntry::StatusApplied {
                    tick: now,
                    unit: index,
                    status,
                    duration_ticks,
                });
            }
        }

        for spawn in spawns {
            let Some(template) = self.summons.get(&spawn.template) else {
                warn!(template = %spawn.template, "summon template missing, skipping");
                continue;
            };
            let side = snapshot.sides[spawn.caster];
            let position = snapshot.positions[spawn.caster];
            for _ in 0..spawn.count {
                if self.units.len() >= Self::MAX_UNITS {
                    warn!(caster = spawn.caster, "combat unit limit reached, summon dropped");
                    break;
                }
                let ability = template.abilities.first().cloned();
                self.units.push(CombatUnit::new(
                    side,
                    template.id.clone(),
                    1,
                    template.stats,
                    position,
                    ability,
                ));
                self.log.push(CombatLogEntry::Summoned {
                    tick: now,
                    caster: spawn.caster,
                    unit: self.units.len() - 1,
                    template: template.id.clone(),
                });
            }
        }
    }

    /// Resolve the phase as soon as one side has no living units.
    ///
    /// Safe to call at any time and from any schedule; a resolved phase
    /// keeps its outcome.
    pub fn check_resolution(&mut self) -> Option<CombatOutcome> {
        if let Some(outcome) = self.outcome() {
            return Some(outcome);
        }
        let (players, enemies) = self.live_counts();
        let outcome = if enemies == 0 {
            CombatOutcome::Victory
        } else if players == 0 {
            CombatOutcome::Defeat
        } else {
            return None;
        };
        Some(self.resolve(outcome))
    }

    /// Count down one simulated second. At zero the phase resolves by live
    /// unit count.
    pub fn countdown(&mut self) -> Option<CombatOutcome> {
        if let Some(outcome) = self.check_resolution() {
            return Some(outcome);
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining > 0 {
            return None;
        }
        let (players, enemies) = self.live_counts();
        Some(self.resolve(CombatOutcome::Timeout {
            player_won: players >= enemies,
        }))
    }

    /// Deterministic driver: tick until resolved, counting down once every
    /// `ticks_per_second` ticks. Bounded by the countdown.
    pub fn run_to_completion(&mut self) -> CombatOutcome {
        loop {
            if let Some(outcome) = self.tick() {
                return outcome;
            }
            if self.tick % u64::from(self.ticks_per_second) == 0
                && let Some(outcome) = self.countdown()
            {
                return outcome;
            }
        }
    }

    fn resolve(&mut self, outcome: CombatOutcome) -> CombatOutcome {
        self.phase = CombatPhase::Resolved(outcome);
        let (players, enemies) = self.live_counts();
        info!(?outcome, tick = self.tick, players, enemies, "combat resolved");
        outcome
    }
}
