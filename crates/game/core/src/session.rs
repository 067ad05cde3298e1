//! The raid aggregate: everything that survives between rounds.
//!
//! A [`RaidSession`] owns the pool, shop, roster, economy and the seeded
//! generator. Commands check every precondition before the first write, so
//! a failed command leaves the session exactly as it was.

use std::collections::BTreeMap;

use tracing::{debug, error, info};

use crate::catalog::{CharacterCatalog, CharacterTemplate, TemplateId};
use crate::combat::{
    CombatOutcome, CombatSimulator, CombatUnit, Point, ProgressionContext, Side, generate_enemies,
};
use crate::config::GameConfig;
use crate::economy::{RoundEconomy, VictoryReward};
use crate::error::{ErrorSeverity, GameError, InvariantViolation};
use crate::pool::ResourcePool;
use crate::rng::{PcgRng, compute_seed};
use crate::roster::{AcquireOutcome, CombineRecord, PlaceOutcome, Roster, RosterError};
use crate::round::PhaseError;
use crate::shop::{RollSummary, Shop, ShopError};
use crate::synergy::{self, ActiveTrait};
use crate::unit::{CharacterInstance, Location, UnitId};

/// Any command rejected by the session or the round controller.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandError {
    #[error(transparent)]
    Shop(#[from] ShopError),

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Phase(#[from] PhaseError),

    #[error("template {0} is not in the catalog")]
    UnknownTemplate(TemplateId),
}

impl GameError for CommandError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Shop(e) => e.severity(),
            Self::Roster(e) => e.severity(),
            Self::Phase(e) => e.severity(),
            Self::UnknownTemplate(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Shop(e) => e.error_code(),
            Self::Roster(e) => e.error_code(),
            Self::Phase(e) => e.error_code(),
            Self::UnknownTemplate(_) => "UNKNOWN_TEMPLATE",
        }
    }
}

/// Result of selling a unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaleOutcome {
    pub unit: CharacterInstance,
    pub refund: u32,
    /// Deferred combines released by the freed slot.
    pub combines: Vec<CombineRecord>,
}

/// What one combat phase did to the session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundReport {
    /// The round that was fought.
    pub round: u32,
    pub outcome: CombatOutcome,
    /// Payout, for victories.
    pub reward: Option<VictoryReward>,
    pub economy: RoundEconomy,
}

/// Running totals across the raid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RaidStats {
    pub rounds_won: u32,
    pub rounds_played: u32,
    /// Gold paid out by victories.
    pub gold_earned: u32,
}

/// Progression rewards granted when a raid closes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RaidRewards {
    pub experience: u32,
    pub currency: u32,
}

/// Terminal summary handed to the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RaidResult {
    pub success: bool,
    pub rounds_won: u32,
    pub rounds_played: u32,
    pub rewards: RaidRewards,
}

impl RaidResult {
    /// Progression experience granted per round won.
    pub const EXPERIENCE_PER_WIN: u32 = 25;
}

/// Setup-phase state of one raid.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RaidSession {
    config: GameConfig,
    seed: u64,
    round: u32,
    economy: RoundEconomy,
    pool: ResourcePool,
    roster: Roster,
    shop: Shop,
    synergies: Vec<ActiveTrait>,
    rng: PcgRng,
    stats: RaidStats,
}

impl RaidSession {
    /// Start a raid at round 1 with a free opening roll.
    pub fn new(config: GameConfig, catalog: &CharacterCatalog, seed: u64) -> Self {
        let mut session = Self {
            economy: RoundEconomy::new(&config),
            pool: ResourcePool::new(catalog),
            roster: Roster::new(config.star_multiplier_permille),
            shop: Shop::new(),
            synergies: Vec::new(),
            rng: PcgRng::seeded(compute_seed(seed, 0, 0)),
            stats: RaidStats::default(),
            round: 1,
            seed,
            config,
        };
        session.roll_shop(catalog);
        info!(seed, "raid session created");
        session
    }

    // ===== queries =====

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn economy(&self) -> &RoundEconomy {
        &self.economy
    }

    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn shop(&self) -> &Shop {
        &self.shop
    }

    pub fn synergies(&self) -> &[ActiveTrait] {
        &self.synergies
    }

    pub fn stats(&self) -> &RaidStats {
        &self.stats
    }

    /// The terminal summary for the raid as it stands.
    pub fn result(&self) -> RaidResult {
        RaidResult {
            success: self.stats.rounds_won >= self.config.target_rounds,
            rounds_won: self.stats.rounds_won,
            rounds_played: self.stats.rounds_played,
            rewards: RaidRewards {
                experience: RaidResult::EXPERIENCE_PER_WIN * self.stats.rounds_won,
                currency: self.stats.gold_earned,
            },
        }
    }

    /// Gold a sale of `unit` would refund: `tier × copies`, less 1 for
    /// upgraded units.
    pub fn sale_value(&self, unit: &CharacterInstance, template: &CharacterTemplate) -> u32 {
        let value = template.cost() * unit.copies();
        if unit.star >= 2 { value - 1 } else { value }
    }

    // ===== setup commands =====

    /// Buy the offer in `slot`.
    pub fn purchase(
        &mut self,
        slot: usize,
        catalog: &CharacterCatalog,
    ) -> Result<AcquireOutcome, CommandError> {
        let offer = self.shop.slot(slot)?.clone();
        self.economy.can_afford(offer.cost)?;
        self.roster.can_acquire(&offer.template)?;
        let template = catalog
            .character(&offer.template)
            .ok_or_else(|| CommandError::UnknownTemplate(offer.template.clone()))?;

        if let Err(exhausted) = self.pool.take(&offer.template) {
            error!(slot, %exhausted, "shop offer not backed by the pool");
            return Err(ShopError::EmptySlot { index: slot }.into());
        }
        self.economy.spend(offer.cost)?;
        self.shop.clear(slot)?;
        let outcome = self.roster.acquire(offer.template.clone(), template.stats)?;
        self.refresh_synergies(catalog);

        debug!(
            slot,
            template = %offer.template,
            cost = offer.cost,
            unit = %outcome.unit,
            combines = outcome.combines.len(),
            gold = self.economy.gold,
            "unit purchased"
        );
        Ok(outcome)
    }

    /// Pay to re-roll every unlocked slot.
    pub fn refresh(&mut self, catalog: &CharacterCatalog) -> Result<RollSummary, CommandError> {
        self.economy.spend(self.config.refresh_cost)?;
        Ok(self.roll_shop(catalog))
    }

    /// Pay for experience; returns levels gained.
    pub fn buy_experience(&mut self) -> Result<u8, CommandError> {
        let gained = self.economy.buy_experience(&self.config)?;
        debug!(
            level = self.economy.level,
            experience = self.economy.experience,
            gained,
            "experience purchased"
        );
        Ok(gained)
    }

    pub fn toggle_lock(&mut self, slot: usize) -> Result<bool, CommandError> {
        Ok(self.shop.toggle_lock(slot)?)
    }

    /// Move a unit, enforcing the level's Board capacity.
    pub fn place(
        &mut self,
        unit: UnitId,
        destination: Location,
        catalog: &CharacterCatalog,
    ) -> Result<PlaceOutcome, CommandError> {
        let outcome = self
            .roster
            .place(unit, destination, self.economy.max_team_size())?;
        self.refresh_synergies(catalog);
        Ok(outcome)
    }

    /// Sell a unit: refund gold and return its copies to the pool.
    pub fn sell(
        &mut self,
        unit: UnitId,
        catalog: &CharacterCatalog,
    ) -> Result<SaleOutcome, CommandError> {
        let owned = self
            .roster
            .unit(unit)
            .ok_or(RosterError::UnknownUnit(unit))?;
        let template = catalog
            .character(&owned.template)
            .ok_or_else(|| CommandError::UnknownTemplate(owned.template.clone()))?;
        let refund = self.sale_value(owned, template);

        let (sold, combines) = self.roster.remove(unit)?;
        self.pool.restore(&sold.template, sold.copies());
        self.economy.earn(refund);
        self.refresh_synergies(catalog);

        debug!(unit = %sold.id, template = %sold.template, star = sold.star, refund, "unit sold");
        Ok(SaleOutcome {
            unit: sold,
            refund,
            combines,
        })
    }

    // ===== combat =====

    /// Project the Board and a freshly generated enemy team into a new
    /// combat phase. The session itself is not borrowed by the result.
    pub fn build_combat(
        &mut self,
        catalog: &CharacterCatalog,
        progression: &ProgressionContext,
    ) -> CombatSimulator {
        let mut rng = self.rng.fork(self.round);
        let mut summons = BTreeMap::new();
        let mut collect_summons = |template: &CharacterTemplate| {
            for ability in &template.abilities {
                if let Some(id) = ability.effect.summoned_template()
                    && let Some(summoned) = catalog.template(id)
                {
                    summons.insert(id.clone(), summoned.clone());
                }
            }
        };

        let mut players = Vec::new();
        for owned in self.roster.board_units() {
            let Location::Board(index) = owned.location else {
                continue;
            };
            let Some(template) = catalog.character(&owned.template) else {
                error!(unit = %owned.id, template = %owned.template, "board unit has no template");
                continue;
            };
            collect_summons(template);
            let bonus = synergy::bonus_for(&template.traits, &self.synergies);
            players.push(
                CombatUnit::new(
                    Side::Player,
                    owned.template.clone(),
                    owned.star,
                    owned.stats,
                    Point::board_slot(index),
                    template.abilities.first().cloned(),
                )
                .with_source(owned.id)
                .with_bonus(bonus),
            );
        }

        let enemies = generate_enemies(self.round, progression, catalog, &self.config, &mut rng)
            .into_iter()
            .enumerate()
            .map(|(k, enemy)| {
                collect_summons(&enemy.template);
                CombatUnit::new(
                    Side::Enemy,
                    enemy.template.id.clone(),
                    enemy.star,
                    enemy.stats,
                    Point::enemy_slot(k),
                    enemy.template.abilities.first().cloned(),
                )
            })
            .collect();

        info!(round = self.round, "combat phase built");
        CombatSimulator::new(&self.config, players, enemies, summons, rng)
    }

    /// Fold a combat outcome into the economy. Victories advance the round
    /// and grant a free roll that keeps locked slots.
    pub fn apply_outcome(
        &mut self,
        outcome: CombatOutcome,
        catalog: &CharacterCatalog,
    ) -> RoundReport {
        let round = self.round;
        self.stats.rounds_played += 1;

        let reward = if outcome.is_victory() {
            let reward = self.economy.record_victory(round, &self.config);
            self.stats.rounds_won += 1;
            self.stats.gold_earned += reward.gold();
            self.round += 1;
            self.roll_shop(catalog);
            Some(reward)
        } else {
            self.economy.record_defeat();
            None
        };

        info!(
            round,
            ?outcome,
            gold = self.economy.gold,
            level = self.economy.level,
            win_streak = self.economy.win_streak,
            lose_streak = self.economy.lose_streak,
            "round resolved"
        );
        RoundReport {
            round,
            outcome,
            reward,
            economy: self.economy.clone(),
        }
    }

    // ===== invariants =====

    /// Verify pool conservation, roster bookkeeping and synergy freshness.
    pub fn check_invariants(&self, catalog: &CharacterCatalog) -> Result<(), InvariantViolation> {
        for unit in self.roster.units() {
            if catalog.character(&unit.template).is_none() {
                return Err(InvariantViolation::UnknownTemplate(unit.template.clone()));
            }
        }
        for template in catalog.characters() {
            let remaining = self.pool.remaining(&template.id);
            let owned = self.roster.owned_copies(&template.id);
            let expected = GameConfig::pool_size(template.tier);
            if remaining + owned != expected {
                return Err(InvariantViolation::PoolConservation {
                    template: template.id.clone(),
                    remaining,
                    owned,
                    expected,
                });
            }
        }
        self.roster
            .check_invariants(self.economy.max_team_size())?;
        if self.synergies != synergy::recompute(self.roster.board_units(), catalog) {
            return Err(InvariantViolation::StaleSynergies);
        }
        Ok(())
    }

    // ===== internals =====

    fn roll_shop(&mut self, catalog: &CharacterCatalog) -> RollSummary {
        self.shop
            .roll(self.economy.level, &self.pool, catalog, &mut self.rng)
    }

    fn refresh_synergies(&mut self, catalog: &CharacterCatalog) {
        self.synergies = synergy::recompute(self.roster.board_units(), catalog);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::sample_catalog;

    fn buy_template(session: &mut RaidSession, catalog: &CharacterCatalog, id: &str) -> AcquireOutcome {
        loop {
            if let Some(slot) = session
                .shop()
                .slots()
                .iter()
                .position(|s| s.as_ref().is_some_and(|s| s.template.as_str() == id))
            {
                return session.purchase(slot, catalog).unwrap();
            }
            session.economy.gold += session.config.refresh_cost;
            session.refresh(catalog).unwrap();
        }
    }

    #[test]
    fn purchase_spends_gold_and_takes_from_pool() {
        let catalog = sample_catalog();
        let mut session = RaidSession::new(GameConfig::default(), &catalog, 7);
        let offer = session.shop().slot(0).unwrap().clone();

        let outcome = session.purchase(0, &catalog).unwrap();

        assert_eq!(session.economy().gold, 10 - offer.cost);
        assert_eq!(session.pool().remaining(&offer.template), 28);
        assert!(session.shop().slots()[0].is_none());
        assert_eq!(session.roster().unit(outcome.unit).unwrap().star, 1);
        session.check_invariants(&catalog).unwrap();
    }

    #[test]
    fn failed_commands_change_nothing() {
        let catalog = sample_catalog();
        let mut session = RaidSession::new(GameConfig::default(), &catalog, 7);
        session.economy.gold = 0;
        let before = session.clone();

        assert!(matches!(
            session.purchase(0, &catalog),
            Err(CommandError::Shop(ShopError::InsufficientGold { .. }))
        ));
        assert!(session.refresh(&catalog).is_err());
        assert!(session.buy_experience().is_err());
        assert!(session.sell(UnitId(42), &catalog).is_err());
        assert_eq!(session, before);
    }

    #[test]
    fn three_purchases_combine_and_conserve_the_pool() {
        let catalog = sample_catalog();
        let mut session = RaidSession::new(GameConfig::default(), &catalog, 11);
        let soldier = TemplateId::from("shadow_soldier");

        for _ in 0..3 {
            session.economy.gold += 1;
            buy_template(&mut session, &catalog, "shadow_soldier");
        }

        assert_eq!(session.roster().count_kind(&soldier, 1), 0);
        assert_eq!(session.roster().count_kind(&soldier, 2), 1);
        let upgraded = session.roster().units().next().unwrap();
        assert_eq!(upgraded.stats.health, 900);
        assert_eq!(session.pool().remaining(&soldier), 26);
        session.check_invariants(&catalog).unwrap();
    }

    #[test]
    fn selling_refunds_and_restores_copies() {
        let catalog = sample_catalog();
        let mut session = RaidSession::new(GameConfig::default(), &catalog, 11);
        let soldier = TemplateId::from("shadow_soldier");
        let mut last = None;
        for _ in 0..3 {
            session.economy.gold += 1;
            last = Some(buy_template(&mut session, &catalog, "shadow_soldier"));
        }
        let upgraded = last.unwrap().resulting_unit();
        let gold = session.economy().gold;

        let sale = session.sell(upgraded, &catalog).unwrap();

        // tier 1 × 3 copies, less 1 for an upgraded unit.
        assert_eq!(sale.refund, 2);
        assert_eq!(session.economy().gold, gold + 2);
        assert_eq!(session.pool().remaining(&soldier), 29);
        session.check_invariants(&catalog).unwrap();
    }

    #[test]
    fn board_moves_update_synergies() {
        let catalog = sample_catalog();
        let mut session = RaidSession::new(GameConfig::default(), &catalog, 3);
        session.economy.add_experience(2);
        let a = buy_template(&mut session, &catalog, "shadow_soldier").unit;
        session.economy.gold += 1;
        let b = buy_template(&mut session, &catalog, "iron_guard").unit;

        session.place(a, Location::Board(0), &catalog).unwrap();
        assert!(session.synergies().is_empty());
        session.place(b, Location::Board(1), &catalog).unwrap();
        assert_eq!(session.synergies().len(), 1);
        assert_eq!(session.synergies()[0].name, "knight");

        session.place(b, Location::Bench(5), &catalog).unwrap();
        assert!(session.synergies().is_empty());
        session.check_invariants(&catalog).unwrap();
    }

    #[test]
    fn victory_advances_round_and_keeps_locks() {
        let catalog = sample_catalog();
        let mut session = RaidSession::new(GameConfig::default(), &catalog, 5);
        session.toggle_lock(2).unwrap();
        let locked = session.shop().slot(2).unwrap().clone();

        let report = session.apply_outcome(CombatOutcome::Victory, &catalog);

        assert_eq!(report.round, 1);
        assert_eq!(report.reward.unwrap().gold(), 6);
        assert_eq!(session.round(), 2);
        assert_eq!(session.economy().gold, 16);
        assert_eq!(session.shop().slot(2).unwrap(), &locked);
        assert_eq!(session.stats().gold_earned, 6);

        let report = session.apply_outcome(CombatOutcome::Defeat, &catalog);
        assert!(report.reward.is_none());
        assert_eq!(session.round(), 2);
        assert_eq!(session.economy().lose_streak, 1);

        let result = session.result();
        assert_eq!(result.rounds_won, 1);
        assert_eq!(result.rounds_played, 2);
        assert_eq!(result.rewards.experience, 25);
        assert!(!result.success);
    }

    #[test]
    fn combat_never_touches_owned_units() {
        let catalog = sample_catalog();
        let mut session = RaidSession::new(GameConfig::default(), &catalog, 9);
        let unit = buy_template(&mut session, &catalog, "iron_guard").unit;
        session.place(unit, Location::Board(3), &catalog).unwrap();
        let roster = session.roster().clone();
        let pool = session.pool().clone();

        let mut sim = session.build_combat(&catalog, &ProgressionContext::default());
        sim.run_to_completion();
        drop(sim);

        assert_eq!(session.roster(), &roster);
        assert_eq!(session.pool(), &pool);
    }
}
