//! Board and Bench ownership, placement, and the combine-to-upgrade rule.
//!
//! Units live in an arena keyed by [`UnitId`]; Board and Bench slots only
//! store identifiers. A unit's `location` always mirrors the slot holding it.
//!
//! # Combining
//!
//! Whenever three owned units share a (template, star) pair below the star
//! cap, they are consumed and replaced by one unit a star higher. Copies are
//! consumed Deferred first, then Bench, then Board, each by ascending id. The
//! upgraded unit takes the first free Bench slot once the consumed copies are
//! released. If there is none, the group stays pending and the newest copy
//! waits in [`Location::Deferred`] until a Bench slot frees.

use std::collections::BTreeMap;

use tracing::debug;

use crate::catalog::{Stats, TemplateId};
use crate::config::GameConfig;
use crate::error::{ErrorSeverity, GameError, InvariantViolation};
use crate::unit::{CharacterInstance, Location, UnitId};

/// Errors raised by roster commands. None of them change state.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RosterError {
    #[error("board is full ({capacity} units at this level)")]
    BoardFull { capacity: usize },

    #[error("bench is full")]
    BenchFull,

    #[error("unknown unit {0}")]
    UnknownUnit(UnitId),

    #[error("invalid destination {location}")]
    InvalidSlot { location: Location },

    #[error("unit {0} is waiting for a pending combine")]
    PendingCombine(UnitId),
}

impl GameError for RosterError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::BoardFull { .. } | Self::BenchFull | Self::PendingCombine(_) => {
                ErrorSeverity::Recoverable
            }
            Self::UnknownUnit(_) | Self::InvalidSlot { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BoardFull { .. } => "BOARD_FULL",
            Self::BenchFull => "BENCH_FULL",
            Self::UnknownUnit(_) => "UNKNOWN_UNIT",
            Self::InvalidSlot { .. } => "INVALID_SLOT",
            Self::PendingCombine(_) => "PENDING_COMBINE",
        }
    }
}

/// One combine: three consumed copies and the upgraded unit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombineRecord {
    pub template: TemplateId,
    /// Star of the upgraded unit.
    pub star: u8,
    pub consumed: [UnitId; 3],
    pub result: UnitId,
    pub location: Location,
}

/// Result of a new unit entering play.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcquireOutcome {
    /// The star-1 unit created by the purchase.
    pub unit: UnitId,
    /// Combines triggered, in order (cascades produce more than one).
    pub combines: Vec<CombineRecord>,
}

impl AcquireOutcome {
    /// The unit the purchase finally produced, after any combines.
    pub fn resulting_unit(&self) -> UnitId {
        self.combines
            .last()
            .map(|record| record.result)
            .unwrap_or(self.unit)
    }
}

/// Result of a placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaceOutcome {
    /// Unit that was displaced into the origin slot, if any.
    pub swapped: Option<UnitId>,
    /// Deferred combines released by a freed Bench slot.
    pub combines: Vec<CombineRecord>,
}

/// Board, Bench and the unit arena.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Roster {
    units: BTreeMap<UnitId, CharacterInstance>,
    board: [Option<UnitId>; GameConfig::BOARD_SLOTS],
    bench: [Option<UnitId>; GameConfig::BENCH_SLOTS],
    deferred: Vec<UnitId>,
    next_id: u32,
    star_multiplier_permille: u32,
}

impl Roster {
    pub fn new(star_multiplier_permille: u32) -> Self {
        Self {
            units: BTreeMap::new(),
            board: Default::default(),
            bench: Default::default(),
            deferred: Vec::new(),
            next_id: 1,
            star_multiplier_permille,
        }
    }

    // ===== queries =====

    pub fn unit(&self, id: UnitId) -> Option<&CharacterInstance> {
        self.units.get(&id)
    }

    /// Every owned unit, by ascending id.
    pub fn units(&self) -> impl Iterator<Item = &CharacterInstance> {
        self.units.values()
    }

    pub fn board_slots(&self) -> &[Option<UnitId>] {
        &self.board
    }

    pub fn bench_slots(&self) -> &[Option<UnitId>] {
        &self.bench
    }

    /// Units on the Board, in slot order.
    pub fn board_units(&self) -> impl Iterator<Item = &CharacterInstance> {
        self.board
            .iter()
            .flatten()
            .filter_map(|id| self.units.get(id))
    }

    /// Units on the Bench, in slot order.
    pub fn bench_units(&self) -> impl Iterator<Item = &CharacterInstance> {
        self.bench
            .iter()
            .flatten()
            .filter_map(|id| self.units.get(id))
    }

    pub fn deferred_units(&self) -> impl Iterator<Item = &CharacterInstance> {
        self.deferred.iter().filter_map(|id| self.units.get(id))
    }

    pub fn board_count(&self) -> usize {
        self.board.iter().flatten().count()
    }

    pub fn has_pending_combine(&self) -> bool {
        !self.deferred.is_empty()
    }

    pub fn free_bench_slot(&self) -> Option<usize> {
        self.bench.iter().position(Option::is_none)
    }

    pub fn free_board_slot(&self) -> Option<usize> {
        self.board.iter().position(Option::is_none)
    }

    /// Owned units sharing a (template, star) pair.
    pub fn count_kind(&self, template: &TemplateId, star: u8) -> usize {
        self.units
            .values()
            .filter(|unit| unit.same_kind(template, star))
            .count()
    }

    /// Template copies held across all owned units (a star-2 unit holds 3).
    pub fn owned_copies(&self, template: &TemplateId) -> u32 {
        self.units
            .values()
            .filter(|unit| &unit.template == template)
            .map(CharacterInstance::copies)
            .sum()
    }

    // ===== commands =====

    /// Whether a new star-1 copy of `template` has somewhere to go.
    ///
    /// A full Bench only accepts a copy that completes a triple.
    pub fn can_acquire(&self, template: &TemplateId) -> Result<(), RosterError> {
        if self.free_bench_slot().is_some() || self.count_kind(template, 1) >= 2 {
            return Ok(());
        }
        Err(RosterError::BenchFull)
    }

    /// Bring a new star-1 unit into play and run any combines it triggers.
    pub fn acquire(
        &mut self,
        template: TemplateId,
        stats: Stats,
    ) -> Result<AcquireOutcome, RosterError> {
        self.can_acquire(&template)?;

        let id = self.allocate_id();
        let location = match self.free_bench_slot() {
            Some(index) => {
                self.bench[index] = Some(id);
                Location::Bench(index)
            }
            None => {
                self.deferred.push(id);
                Location::Deferred
            }
        };
        debug!(unit = %id, %template, %location, "unit acquired");
        self.units.insert(
            id,
            CharacterInstance {
                id,
                template,
                star: 1,
                stats,
                location,
            },
        );

        let combines = self.resolve_combines();
        Ok(AcquireOutcome { unit: id, combines })
    }

    /// Move a unit to `destination`, swapping with any occupant.
    ///
    /// `capacity` is the Board limit for the current level; only a move that
    /// adds a unit to the Board without swapping one off can exceed it.
    pub fn place(
        &mut self,
        id: UnitId,
        destination: Location,
        capacity: usize,
    ) -> Result<PlaceOutcome, RosterError> {
        let origin = self.unit(id).ok_or(RosterError::UnknownUnit(id))?.location;
        if origin == Location::Deferred {
            return Err(RosterError::PendingCombine(id));
        }
        let occupant = match destination {
            Location::Board(index) if index < GameConfig::BOARD_SLOTS => self.board[index],
            Location::Bench(index) if index < GameConfig::BENCH_SLOTS => self.bench[index],
            location => return Err(RosterError::InvalidSlot { location }),
        };

        if origin == destination {
            return Ok(PlaceOutcome {
                swapped: None,
                combines: Vec::new(),
            });
        }

        if destination.is_board() && origin.is_bench() && occupant.is_none() {
            let occupied = self.board_count();
            if occupied + 1 > capacity {
                return Err(RosterError::BoardFull { capacity });
            }
        }

        self.set_slot(destination, Some(id));
        self.set_slot(origin, occupant);
        self.set_location(id, destination);
        if let Some(other) = occupant {
            self.set_location(other, origin);
        }
        debug!(unit = %id, from = %origin, to = %destination, swapped = ?occupant, "unit placed");

        // Any move can free a slot a pending combine was waiting on, including
        // a Board partner swapped onto a full Bench.
        let combines = self.resolve_combines();
        Ok(PlaceOutcome {
            swapped: occupant,
            combines,
        })
    }

    /// Permanently remove a unit (a sale). Returns it with any combines the
    /// freed slot released.
    pub fn remove(
        &mut self,
        id: UnitId,
    ) -> Result<(CharacterInstance, Vec<CombineRecord>), RosterError> {
        let unit = self.take_unit(id).ok_or(RosterError::UnknownUnit(id))?;
        debug!(unit = %id, template = %unit.template, star = unit.star, "unit removed");
        let combines = self.resolve_combines();
        Ok((unit, combines))
    }

    // ===== combine =====

    /// Combine every complete group that has a Bench slot for its result.
    fn resolve_combines(&mut self) -> Vec<CombineRecord> {
        let mut records = Vec::new();
        while let Some((members, slot)) = self.next_combinable_group() {
            records.push(self.combine(members, slot));
        }
        self.settle_deferred();
        records
    }

    /// Move deferred units whose group no longer forms a triple (a partner
    /// was sold) onto free Bench slots.
    fn settle_deferred(&mut self) {
        let stranded: Vec<UnitId> = self
            .deferred
            .iter()
            .copied()
            .filter(|id| {
                self.units
                    .get(id)
                    .is_some_and(|unit| self.count_kind(&unit.template, unit.star) < 3)
            })
            .collect();
        for id in stranded {
            let Some(index) = self.free_bench_slot() else {
                break;
            };
            self.deferred.retain(|other| *other != id);
            self.bench[index] = Some(id);
            self.set_location(id, Location::Bench(index));
            debug!(unit = %id, slot = index, "deferred unit settled on bench");
        }
    }

    /// The first complete group (lowest star, then template) whose result
    /// can be placed, with the Bench slot it will take.
    fn next_combinable_group(&self) -> Option<([UnitId; 3], usize)> {
        let mut groups: BTreeMap<(u8, &TemplateId), Vec<&CharacterInstance>> = BTreeMap::new();
        for unit in self.units.values() {
            if unit.star < GameConfig::MAX_STAR {
                groups
                    .entry((unit.star, &unit.template))
                    .or_default()
                    .push(unit);
            }
        }

        groups.into_values().find_map(|mut members| {
            if members.len() < 3 {
                return None;
            }
            members.sort_by_key(|unit| (Self::consume_priority(unit.location), unit.id));
            let chosen = [members[0], members[1], members[2]];

            let released = chosen.iter().filter_map(|unit| match unit.location {
                Location::Bench(index) => Some(index),
                _ => None,
            });
            let free = self
                .bench
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.is_none())
                .map(|(index, _)| index);
            let slot = released.chain(free).min()?;

            Some(([chosen[0].id, chosen[1].id, chosen[2].id], slot))
        })
    }

    fn consume_priority(location: Location) -> u8 {
        match location {
            Location::Deferred => 0,
            Location::Bench(_) => 1,
            Location::Board(_) => 2,
        }
    }

    fn combine(&mut self, members: [UnitId; 3], slot: usize) -> CombineRecord {
        let consumed: Vec<CharacterInstance> = members
            .iter()
            .filter_map(|id| self.take_unit(*id))
            .collect();
        debug_assert_eq!(consumed.len(), 3, "combine members must exist");

        let first = &consumed[0];
        let template = first.template.clone();
        let star = first.star + 1;
        let stats = first.stats.next_star(self.star_multiplier_permille);

        let id = self.allocate_id();
        let location = Location::Bench(slot);
        debug_assert!(self.bench[slot].is_none(), "combine target slot must be free");
        self.bench[slot] = Some(id);
        self.units.insert(
            id,
            CharacterInstance {
                id,
                template: template.clone(),
                star,
                stats,
                location,
            },
        );

        debug!(unit = %id, %template, star, consumed = ?members, "units combined");
        CombineRecord {
            template,
            star,
            consumed: members,
            result: id,
            location,
        }
    }

    // ===== internals =====

    fn allocate_id(&mut self) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        id
    }

    fn take_unit(&mut self, id: UnitId) -> Option<CharacterInstance> {
        let unit = self.units.remove(&id)?;
        match unit.location {
            Location::Deferred => self.deferred.retain(|other| *other != id),
            location => self.set_slot(location, None),
        }
        Some(unit)
    }

    fn set_slot(&mut self, location: Location, value: Option<UnitId>) {
        match location {
            Location::Board(index) => self.board[index] = value,
            Location::Bench(index) => self.bench[index] = value,
            Location::Deferred => {}
        }
    }

    fn set_location(&mut self, id: UnitId, location: Location) {
        if let Some(unit) = self.units.get_mut(&id) {
            unit.location = location;
        }
    }

    /// Check slot bookkeeping, Board capacity and the combine invariant.
    pub fn check_invariants(&self, capacity: usize) -> Result<(), InvariantViolation> {
        let mut seen = BTreeMap::new();
        let slots = self
            .board
            .iter()
            .enumerate()
            .map(|(index, slot)| (Location::Board(index), slot))
            .chain(
                self.bench
                    .iter()
                    .enumerate()
                    .map(|(index, slot)| (Location::Bench(index), slot)),
            );
        for (location, slot) in slots {
            let Some(id) = slot else { continue };
            if seen.insert(*id, location).is_some() {
                return Err(InvariantViolation::DuplicatePlacement { unit: id.0 });
            }
            match self.units.get(id) {
                Some(unit) if unit.location == location => {}
                _ => return Err(InvariantViolation::LocationMismatch { unit: id.0 }),
            }
        }
        for id in &self.deferred {
            if seen.insert(*id, Location::Deferred).is_some() {
                return Err(InvariantViolation::DuplicatePlacement { unit: id.0 });
            }
        }
        for unit in self.units.values() {
            if seen.get(&unit.id) != Some(&unit.location) {
                return Err(InvariantViolation::LocationMismatch { unit: unit.id.0 });
            }
        }

        let occupied = self.board_count();
        if occupied > capacity {
            return Err(InvariantViolation::BoardOverCapacity { occupied, capacity });
        }

        let mut groups: BTreeMap<(&TemplateId, u8), (usize, bool)> = BTreeMap::new();
        for unit in self.units.values() {
            if unit.star < GameConfig::MAX_STAR {
                let entry = groups.entry((&unit.template, unit.star)).or_default();
                entry.0 += 1;
                entry.1 |= unit.location == Location::Deferred;
            }
        }
        for ((template, star), (count, pending)) in groups {
            if count >= 3 && !pending {
                return Err(InvariantViolation::UncombinedTriple {
                    template: template.clone(),
                    star,
                    count,
                });
            }
        }

        // A pending group is only allowed while it has nowhere to land.
        if let Some((members, _)) = self.next_combinable_group() {
            let Some(unit) = self.units.get(&members[0]) else {
                return Err(InvariantViolation::LocationMismatch { unit: members[0].0 });
            };
            return Err(InvariantViolation::UncombinedTriple {
                template: unit.template.clone(),
                star: unit.star,
                count: self.count_kind(&unit.template, unit.star),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTIPLIER: u32 = 1800;

    fn soldier() -> (TemplateId, Stats) {
        (
            TemplateId::from("shadow_soldier"),
            Stats::new(500, 50, 20, 70, 1),
        )
    }

    fn buy(roster: &mut Roster, template: &str) -> AcquireOutcome {
        roster
            .acquire(TemplateId::from(template), Stats::new(100, 10, 0, 100, 1))
            .unwrap()
    }

    #[test]
    fn three_copies_combine_into_one_star_two() {
        let mut roster = Roster::new(MULTIPLIER);
        let (id, stats) = soldier();

        roster.acquire(id.clone(), stats).unwrap();
        roster.acquire(id.clone(), stats).unwrap();
        let outcome = roster.acquire(id.clone(), stats).unwrap();

        assert_eq!(outcome.combines.len(), 1);
        assert_eq!(roster.count_kind(&id, 1), 0);
        assert_eq!(roster.count_kind(&id, 2), 1);
        let upgraded = roster.unit(outcome.resulting_unit()).unwrap();
        assert_eq!(upgraded.stats.health, 900);
        assert_eq!(upgraded.location, Location::Bench(0));
        assert_eq!(roster.owned_copies(&id), 3);
        roster.check_invariants(1).unwrap();
    }

    #[test]
    fn nine_copies_cascade_to_star_three() {
        let mut roster = Roster::new(MULTIPLIER);
        let (id, stats) = soldier();

        let mut combines = 0;
        for _ in 0..9 {
            combines += roster.acquire(id.clone(), stats).unwrap().combines.len();
        }

        // Three star-2 combines plus one star-3 combine.
        assert_eq!(combines, 4);
        assert_eq!(roster.units().count(), 1);
        let unit = roster.units().next().unwrap();
        assert_eq!(unit.star, 3);
        assert_eq!(unit.stats.health, 1620);
        roster.check_invariants(1).unwrap();
    }

    #[test]
    fn combine_consumes_board_copies_and_lands_on_bench() {
        let mut roster = Roster::new(MULTIPLIER);
        let a = buy(&mut roster, "knight").unit;
        let b = buy(&mut roster, "knight").unit;
        roster.place(a, Location::Board(0), 2).unwrap();
        roster.place(b, Location::Board(1), 2).unwrap();

        let outcome = buy(&mut roster, "knight");

        assert_eq!(roster.board_count(), 0);
        let upgraded = roster.unit(outcome.resulting_unit()).unwrap();
        assert_eq!(upgraded.star, 2);
        assert!(upgraded.location.is_bench());
    }

    #[test]
    fn full_bench_defers_until_a_slot_frees() {
        let mut roster = Roster::new(MULTIPLIER);
        let a = buy(&mut roster, "knight").unit;
        let b = buy(&mut roster, "knight").unit;
        roster.place(a, Location::Board(0), 2).unwrap();
        roster.place(b, Location::Board(1), 2).unwrap();
        let fillers: Vec<UnitId> = (0..GameConfig::BENCH_SLOTS)
            .map(|n| buy(&mut roster, &format!("filler_{n}")).unit)
            .collect();
        assert!(roster.free_bench_slot().is_none());

        // A non-matching purchase is refused outright.
        assert_eq!(
            roster.acquire(TemplateId::from("mage"), Stats::default()),
            Err(RosterError::BenchFull)
        );

        // The third knight has nowhere to land: deferred, not dropped.
        let outcome = buy(&mut roster, "knight");
        assert!(outcome.combines.is_empty());
        assert_eq!(roster.unit(outcome.unit).unwrap().location, Location::Deferred);
        assert!(roster.has_pending_combine());
        roster.check_invariants(2).unwrap();

        // Selling a filler frees a slot and releases the combine.
        let (_, combines) = roster.remove(fillers[4]).unwrap();
        assert_eq!(combines.len(), 1);
        assert_eq!(combines[0].location, Location::Bench(4));
        assert!(!roster.has_pending_combine());
        assert_eq!(roster.board_count(), 0);
        roster.check_invariants(2).unwrap();
    }

    #[test]
    fn broken_group_releases_deferred_unit_to_bench() {
        let mut roster = Roster::new(MULTIPLIER);
        let a = buy(&mut roster, "knight").unit;
        let b = buy(&mut roster, "knight").unit;
        roster.place(a, Location::Board(0), 2).unwrap();
        roster.place(b, Location::Board(1), 2).unwrap();
        let fillers: Vec<UnitId> = (0..GameConfig::BENCH_SLOTS)
            .map(|n| buy(&mut roster, &format!("filler_{n}")).unit)
            .collect();
        let waiting = buy(&mut roster, "knight").unit;
        assert_eq!(
            roster.place(waiting, Location::Board(2), 3),
            Err(RosterError::PendingCombine(waiting))
        );

        // Selling a partner breaks the triple; the waiting unit stays
        // deferred only until a Bench slot frees.
        roster.remove(a).unwrap();
        assert_eq!(roster.unit(waiting).unwrap().location, Location::Deferred);
        roster.check_invariants(2).unwrap();

        roster.remove(fillers[0]).unwrap();
        assert_eq!(roster.unit(waiting).unwrap().location, Location::Bench(0));
        assert_eq!(roster.unit(waiting).unwrap().star, 1);
        assert!(!roster.has_pending_combine());
        roster.check_invariants(2).unwrap();
    }

    #[test]
    fn swapping_a_board_partner_onto_the_bench_releases_the_combine() {
        let mut roster = Roster::new(MULTIPLIER);
        let a = buy(&mut roster, "knight").unit;
        let b = buy(&mut roster, "knight").unit;
        roster.place(a, Location::Board(0), 3).unwrap();
        roster.place(b, Location::Board(1), 3).unwrap();
        let fillers: Vec<UnitId> = (0..GameConfig::BENCH_SLOTS)
            .map(|n| buy(&mut roster, &format!("filler_{n}")).unit)
            .collect();
        let waiting = buy(&mut roster, "knight").unit;
        assert_eq!(roster.unit(waiting).unwrap().location, Location::Deferred);

        // The partner trades places with a filler; its Bench slot can now
        // take the combined unit.
        let outcome = roster.place(a, Location::Bench(0), 3).unwrap();

        assert_eq!(outcome.swapped, Some(fillers[0]));
        assert_eq!(outcome.combines.len(), 1);
        assert_eq!(outcome.combines[0].location, Location::Bench(0));
        assert!(!roster.has_pending_combine());
        assert_eq!(roster.count_kind(&TemplateId::from("knight"), 1), 0);
        assert_eq!(roster.count_kind(&TemplateId::from("knight"), 2), 1);
        assert_eq!(roster.unit(fillers[0]).unwrap().location, Location::Board(0));
        roster.check_invariants(3).unwrap();
    }

    #[test]
    fn placement_swaps_and_respects_capacity() {
        let mut roster = Roster::new(MULTIPLIER);
        let a = buy(&mut roster, "a").unit;
        let b = buy(&mut roster, "b").unit;

        roster.place(a, Location::Board(3), 1).unwrap();
        assert_eq!(
            roster.place(b, Location::Board(4), 1),
            Err(RosterError::BoardFull { capacity: 1 })
        );
        assert_eq!(roster.unit(b).unwrap().location, Location::Bench(1));

        // Swapping onto an occupied Board slot is allowed at capacity.
        let outcome = roster.place(b, Location::Board(3), 1).unwrap();
        assert_eq!(outcome.swapped, Some(a));
        assert_eq!(roster.unit(a).unwrap().location, Location::Bench(1));
        assert_eq!(roster.unit(b).unwrap().location, Location::Board(3));
        roster.check_invariants(1).unwrap();
    }

    #[test]
    fn invalid_destinations_are_rejected() {
        let mut roster = Roster::new(MULTIPLIER);
        let a = buy(&mut roster, "a").unit;
        assert!(matches!(
            roster.place(a, Location::Board(GameConfig::BOARD_SLOTS), 9),
            Err(RosterError::InvalidSlot { .. })
        ));
        assert!(matches!(
            roster.place(a, Location::Deferred, 9),
            Err(RosterError::InvalidSlot { .. })
        ));
        assert_eq!(
            roster.place(UnitId(999), Location::Bench(0), 9),
            Err(RosterError::UnknownUnit(UnitId(999)))
        );
    }
}
