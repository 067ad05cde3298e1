/// Game configuration constants and tunable parameters.
///
/// Capacity constants are compile-time and used as type parameters; every
/// other knob is a runtime-tunable field with the defaults below.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameConfig {
    /// Gold granted when a raid starts.
    pub starting_gold: u32,
    /// Player level when a raid starts.
    pub starting_level: u8,

    /// Gold cost of re-rolling all unlocked shop slots.
    pub refresh_cost: u32,
    /// Gold cost of one experience purchase.
    pub experience_cost: u32,
    /// Experience granted per purchase.
    pub experience_per_purchase: u32,

    /// Flat gold granted on every victory.
    pub victory_base_gold: u32,
    /// Experience granted on every victory.
    pub victory_experience: u32,
    /// Gold held per point of interest.
    pub interest_step: u32,
    /// Maximum interest paid per victory.
    pub interest_cap: u32,

    /// Stat multiplier per star step, in per-mille (1800 = ×1.8).
    pub star_multiplier_permille: u32,

    /// Length of one simulation tick in milliseconds.
    pub tick_ms: u32,
    /// Combat countdown in simulated seconds.
    pub combat_seconds: u32,
    /// Grid units travelled per tick by a unit out of range.
    pub move_step: f32,
    /// Flat damage component of every basic attack.
    pub damage_base: u32,
    /// Percentage of the attack stat added to every basic attack.
    pub attack_ratio_pct: u32,
    /// Inclusive upper bound of the random damage jitter.
    pub damage_jitter: u32,
    /// Mana gained per basic attack.
    pub mana_per_attack: u32,

    /// Rounds that must be won for a raid to count as a success.
    pub target_rounds: u32,
}

impl GameConfig {
    // ===== compile-time constants used as type parameters =====
    pub const SHOP_SLOTS: usize = 5;
    pub const BENCH_SLOTS: usize = 9;
    pub const BOARD_COLUMNS: usize = 7;
    pub const BOARD_ROWS: usize = 4;
    pub const BOARD_SLOTS: usize = Self::BOARD_COLUMNS * Self::BOARD_ROWS;
    pub const MAX_LEVEL: u8 = 9;
    pub const MAX_STAR: u8 = 3;
    pub const MAX_TIER: u8 = 5;
    pub const MAX_STATUS_EFFECTS: usize = 8;
    pub const MAX_ENEMIES: usize = 9;

    /// Tier weights per player level (row 0 = level 1). Each row sums to 100.
    pub const SHOP_ODDS: [[u32; 5]; 9] = [
        [100, 0, 0, 0, 0],
        [100, 0, 0, 0, 0],
        [75, 25, 0, 0, 0],
        [55, 30, 15, 0, 0],
        [45, 33, 20, 2, 0],
        [25, 40, 30, 5, 0],
        [19, 30, 35, 15, 1],
        [16, 20, 35, 25, 4],
        [9, 15, 30, 30, 16],
    ];

    /// Copies of each template in the shared pool, indexed by tier - 1.
    pub const POOL_SIZES: [u32; 5] = [29, 22, 18, 12, 10];

    /// Experience required to leave levels 1 through 8.
    pub const LEVEL_EXPERIENCE: [u32; 8] = [2, 2, 6, 10, 20, 36, 56, 80];

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_STARTING_GOLD: u32 = 10;
    pub const DEFAULT_REFRESH_COST: u32 = 2;
    pub const DEFAULT_EXPERIENCE_COST: u32 = 4;
    pub const DEFAULT_TICK_MS: u32 = 100;
    pub const DEFAULT_COMBAT_SECONDS: u32 = 30;

    pub fn new() -> Self {
        Self {
            starting_gold: Self::DEFAULT_STARTING_GOLD,
            starting_level: 1,
            refresh_cost: Self::DEFAULT_REFRESH_COST,
            experience_cost: Self::DEFAULT_EXPERIENCE_COST,
            experience_per_purchase: 4,
            victory_base_gold: 5,
            victory_experience: 2,
            interest_step: 10,
            interest_cap: 5,
            star_multiplier_permille: 1800,
            tick_ms: Self::DEFAULT_TICK_MS,
            combat_seconds: Self::DEFAULT_COMBAT_SECONDS,
            move_step: 0.5,
            damage_base: 10,
            attack_ratio_pct: 50,
            damage_jitter: 5,
            mana_per_attack: 10,
            target_rounds: 10,
        }
    }

    /// Tier weights for a player level, clamped into 1..=MAX_LEVEL.
    pub fn shop_odds(level: u8) -> &'static [u32; 5] {
        let index = level.clamp(1, Self::MAX_LEVEL) as usize - 1;
        &Self::SHOP_ODDS[index]
    }

    /// Fixed pool size of a template tier.
    pub fn pool_size(tier: u8) -> u32 {
        let index = tier.clamp(1, Self::MAX_TIER) as usize - 1;
        Self::POOL_SIZES[index]
    }

    /// Experience needed to leave `level`, or `None` at the level cap.
    pub fn experience_to_next(level: u8) -> Option<u32> {
        if level == 0 || level >= Self::MAX_LEVEL {
            return None;
        }
        Some(Self::LEVEL_EXPERIENCE[level as usize - 1])
    }

    /// Number of units that may stand on the board at `level`.
    pub fn max_team_size(level: u8) -> usize {
        (level.clamp(1, Self::MAX_LEVEL) as usize).min(Self::BOARD_SLOTS)
    }

    /// Interest earned on `gold` held at the end of a round.
    pub fn interest(&self, gold: u32) -> u32 {
        if self.interest_step == 0 {
            return 0;
        }
        (gold / self.interest_step).min(self.interest_cap)
    }

    /// Round-scaled part of the victory payout.
    pub fn round_bonus(&self, round: u32) -> u32 {
        round / 2
    }

    pub fn ticks_per_second(&self) -> u32 {
        (1000 / self.tick_ms.max(1)).max(1)
    }

    /// Upper bound on the number of ticks a combat phase can take.
    pub fn countdown_ticks(&self) -> u64 {
        u64::from(self.combat_seconds) * u64::from(self.ticks_per_second())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
