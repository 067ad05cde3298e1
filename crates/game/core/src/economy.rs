//! Gold, experience, level and streak accounting.

use tracing::debug;

use crate::config::GameConfig;
use crate::shop::ShopError;

/// Economy state carried between rounds.
///
/// Invariants: `level` never decreases; `experience` stays below the current
/// level requirement; at most one of the two streaks is non-zero.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundEconomy {
    pub gold: u32,
    pub experience: u32,
    pub level: u8,
    pub win_streak: u32,
    pub lose_streak: u32,
}

/// Gold and experience granted by one victory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VictoryReward {
    pub base: u32,
    pub round_bonus: u32,
    pub interest: u32,
    pub experience: u32,
}

impl VictoryReward {
    pub fn gold(&self) -> u32 {
        self.base + self.round_bonus + self.interest
    }
}

impl RoundEconomy {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            gold: config.starting_gold,
            experience: 0,
            level: config.starting_level.clamp(1, GameConfig::MAX_LEVEL),
            win_streak: 0,
            lose_streak: 0,
        }
    }

    pub fn max_team_size(&self) -> usize {
        GameConfig::max_team_size(self.level)
    }

    /// Interest on the current gold.
    pub fn interest(&self, config: &GameConfig) -> u32 {
        config.interest(self.gold)
    }

    pub fn can_afford(&self, amount: u32) -> Result<(), ShopError> {
        if self.gold < amount {
            return Err(ShopError::InsufficientGold {
                required: amount,
                available: self.gold,
            });
        }
        Ok(())
    }

    /// Deduct gold, failing without change when short.
    pub fn spend(&mut self, amount: u32) -> Result<(), ShopError> {
        self.can_afford(amount)?;
        self.gold -= amount;
        Ok(())
    }

    pub fn earn(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Add experience, levelling up and carrying the remainder forward.
    ///
    /// Returns the number of levels gained. Experience is discarded at the cap.
    pub fn add_experience(&mut self, amount: u32) -> u8 {
        let mut gained = 0;
        self.experience += amount;
        while let Some(required) = GameConfig::experience_to_next(self.level) {
            if self.experience < required {
                break;
            }
            self.experience -= required;
            self.level += 1;
            gained += 1;
        }
        if GameConfig::experience_to_next(self.level).is_none() {
            self.experience = 0;
        }
        if gained > 0 {
            debug!(level = self.level, experience = self.experience, "level up");
        }
        gained
    }

    /// Pay for an experience purchase. Fails at the level cap or when short.
    pub fn buy_experience(&mut self, config: &GameConfig) -> Result<u8, ShopError> {
        if GameConfig::experience_to_next(self.level).is_none() {
            return Err(ShopError::MaxLevel);
        }
        self.spend(config.experience_cost)?;
        Ok(self.add_experience(config.experience_per_purchase))
    }

    /// Pay out a victory in `round`; interest is computed before the payout.
    pub fn record_victory(&mut self, round: u32, config: &GameConfig) -> VictoryReward {
        let reward = VictoryReward {
            base: config.victory_base_gold,
            round_bonus: config.round_bonus(round),
            interest: self.interest(config),
            experience: config.victory_experience,
        };
        self.earn(reward.gold());
        self.add_experience(reward.experience);
        self.win_streak += 1;
        self.lose_streak = 0;
        reward
    }

    pub fn record_defeat(&mut self) {
        self.win_streak = 0;
        self.lose_streak += 1;
    }
}
