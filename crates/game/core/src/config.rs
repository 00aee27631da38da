use std::time::Duration;

use crate::skill::SkillId;

/// Auto-farm gameplay constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FarmConfig {
    /// Upper bound accepted for a hunter's search radius.
    pub max_radius: u32,
    /// A returning hunter counts as arrived once strictly inside this radius
    /// of its origin. Must stay below [`FarmConfig::LEASH_FLOOR`].
    pub arrival_radius: u32,
    /// A locked target that has not lost HP for longer than this is stuck.
    pub hit_timeout: Duration,
    /// A single target may not stay locked longer than this.
    pub same_target_timeout: Duration,
    /// Number of scheduler ticks between batched writes (and minute decay).
    pub save_interval: u32,
    /// Upper bound on rows per storage batch statement.
    pub batch_size: usize,
}

impl FarmConfig {
    // ===== fixed limits =====
    /// Number of loadout slots.
    pub const MAX_SLOTS: usize = 6;
    /// Corpse looting skill tracked separately by the routine.
    pub const LOOT_SKILL: SkillId = SkillId(42);
    /// Attack range used when nothing in the loadout reaches further.
    pub const MIN_ATTACK_RANGE: u32 = 40;
    /// The leash never gets shorter than this, whatever the search radius.
    pub const LEASH_FLOOR: u32 = 500;
    pub const MIN_RESOURCE_FLOOR: u8 = 10;
    pub const MAX_RESOURCE_FLOOR: u8 = 90;
    /// Purchasable time packs, in hours.
    pub const TIME_PACKS: [u32; 3] = [2, 4, 10];

    // ===== defaults for a fresh hunter =====
    pub const DEFAULT_RADIUS: u32 = 1200;
    pub const DEFAULT_HP_FLOOR: u8 = 50;
    pub const DEFAULT_MP_FLOOR: u8 = 50;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_RADIUS: u32 = 3000;
    pub const DEFAULT_ARRIVAL_RADIUS: u32 = 150;
    pub const DEFAULT_HIT_TIMEOUT: Duration = Duration::from_secs(15);
    pub const DEFAULT_SAME_TARGET_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_SAVE_INTERVAL: u32 = 60;
    pub const DEFAULT_BATCH_SIZE: usize = 500;

    pub fn new() -> Self {
        Self {
            max_radius: Self::DEFAULT_MAX_RADIUS,
            arrival_radius: Self::DEFAULT_ARRIVAL_RADIUS,
            hit_timeout: Self::DEFAULT_HIT_TIMEOUT,
            same_target_timeout: Self::DEFAULT_SAME_TARGET_TIMEOUT,
            save_interval: Self::DEFAULT_SAVE_INTERVAL,
            batch_size: Self::DEFAULT_BATCH_SIZE,
        }
    }

    /// Clamps a requested HP/MP floor percentage into the accepted range.
    pub fn clamp_resource_floor(percent: u32) -> u8 {
        let clamped = percent.clamp(
            u32::from(Self::MIN_RESOURCE_FLOOR),
            u32::from(Self::MAX_RESOURCE_FLOOR),
        );
        clamped as u8
    }

    /// Clamps a requested search radius to `1..=max_radius`.
    pub fn clamp_radius(&self, radius: u32) -> u32 {
        radius.clamp(1, self.max_radius.max(1))
    }

    /// Distance from origin beyond which a hunter must walk back.
    pub fn leash_radius(radius: u32) -> u32 {
        radius.max(Self::LEASH_FLOOR)
    }

    /// Repairs values that would break scheduler or leash invariants.
    pub fn normalized(mut self) -> Self {
        self.save_interval = self.save_interval.max(1);
        self.batch_size = self.batch_size.max(1);
        self.max_radius = self.max_radius.max(1);
        if self.arrival_radius >= Self::LEASH_FLOOR {
            self.arrival_radius = Self::LEASH_FLOOR - 1;
        }
        self
    }
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self::new()
    }
}
