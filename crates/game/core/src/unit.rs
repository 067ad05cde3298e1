//! Owned units and their locations.

use std::fmt;

use crate::catalog::{Stats, TemplateId};

/// Opaque, stable identifier of an owned unit.
///
/// Identifiers are allocated by the roster and never reused within a raid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where an owned unit currently sits. A unit has exactly one location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Location {
    Board(usize),
    Bench(usize),
    /// Owned and waiting for a Bench slot so a pending combine can fire.
    Deferred,
}

impl Location {
    pub fn is_board(&self) -> bool {
        matches!(self, Self::Board(_))
    }

    pub fn is_bench(&self) -> bool {
        matches!(self, Self::Bench(_))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Board(index) => write!(f, "board[{index}]"),
            Self::Bench(index) => write!(f, "bench[{index}]"),
            Self::Deferred => f.write_str("deferred"),
        }
    }
}

/// A unit owned by the player.
///
/// Created at star 1 by a shop purchase or at star N+1 by a combine; destroyed
/// by a sale or by being consumed in a combine.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterInstance {
    pub id: UnitId,
    pub template: TemplateId,
    pub star: u8,
    /// Star-scaled stats. Combat never writes back into these.
    pub stats: Stats,
    pub location: Location,
}

impl CharacterInstance {
    /// Copies of the template this unit represents (3 per star step).
    pub fn copies(&self) -> u32 {
        3u32.pow(u32::from(self.star.saturating_sub(1)))
    }

    /// Whether `self` and `other` count toward the same combine group.
    pub fn same_kind(&self, template: &TemplateId, star: u8) -> bool {
        &self.template == template && self.star == star
    }
}
