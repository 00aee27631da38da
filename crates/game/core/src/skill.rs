//! Static skill metadata as reported by the game world.

use std::fmt;

/// Identifier of a skill template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SkillId(pub u32);

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Behavioural category of a skill, which decides who it is cast on.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SkillCategory {
    /// Direct damage or any other offensive effect aimed at the enemy.
    #[default]
    Attack,
    Heal,
    Buff,
    Debuff,
    /// Marks a live enemy so its corpse can later be looted.
    Spoil,
    /// Extracts loot from a spoiled corpse.
    Sweep,
    Sleep,
    Summon,
    Craft,
    Teleport,
    Recall,
    Resurrect,
    Siege,
    Signet,
    Seed,
    Fusion,
    Unlock,
}

impl SkillCategory {
    /// Categories that make no sense for an unattended hunter.
    pub const fn is_utility(self) -> bool {
        matches!(
            self,
            Self::Summon
                | Self::Craft
                | Self::Teleport
                | Self::Recall
                | Self::Resurrect
                | Self::Siege
                | Self::Signet
                | Self::Seed
                | Self::Fusion
                | Self::Unlock
        )
    }
}

/// Targeting mode of a skill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkillTarget {
    #[default]
    Single,
    Area,
    OwnSelf,
    Corpse,
    Summon,
}

/// Skill names that are technically active but are excluded from loadouts
/// (channelled, clan-wide or mount-only effects).
pub const EXCLUDED_SKILL_NAMES: &[&str] = &[
    "Aura Symphony",
    "Inferno",
    "Blizzard",
    "Demon Wind",
    "Elemental Assault",
    "Elemental Symphony",
    "Elemental Storm",
    "Harmony of Noblesse",
    "Symphony of Noblesse",
    "Clan Gate",
    "Wyvern Aegis",
];

/// Skill metadata the decision routine consults.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkillInfo {
    pub id: SkillId,
    pub name: String,
    pub category: SkillCategory,
    pub target: SkillTarget,
    pub cast_range: u32,
    /// Passive skills never appear in a loadout.
    pub active: bool,
}

impl SkillInfo {
    pub fn new(id: SkillId, name: impl Into<String>, category: SkillCategory) -> Self {
        Self {
            id,
            name: name.into(),
            category,
            target: SkillTarget::Single,
            cast_range: 0,
            active: true,
        }
    }

    pub fn with_cast_range(mut self, cast_range: u32) -> Self {
        self.cast_range = cast_range;
        self
    }

    pub fn with_target(mut self, target: SkillTarget) -> Self {
        self.target = target;
        self
    }

    pub fn passive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Whether the skill may be placed in a hunter loadout.
    ///
    /// Sweep is always allowed. Everything else must be an active, non-utility
    /// skill that targets neither corpses nor summons; single-target sleep and
    /// the names in [`EXCLUDED_SKILL_NAMES`] are rejected as well.
    pub fn is_farmable(&self) -> bool {
        if self.category == SkillCategory::Sweep {
            return true;
        }
        if !self.active || self.category.is_utility() {
            return false;
        }
        if matches!(self.target, SkillTarget::Corpse | SkillTarget::Summon) {
            return false;
        }
        if self.category == SkillCategory::Sleep && self.target == SkillTarget::Single {
            return false;
        }
        !EXCLUDED_SKILL_NAMES.contains(&self.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_is_always_farmable() {
        let sweep = SkillInfo::new(SkillId(42), "Sweeper", SkillCategory::Sweep)
            .with_target(SkillTarget::Corpse)
            .passive();
        assert!(sweep.is_farmable());
    }

    #[test]
    fn rejects_passive_utility_and_corpse_skills() {
        let passive = SkillInfo::new(SkillId(1), "Weapon Mastery", SkillCategory::Buff).passive();
        let summon = SkillInfo::new(SkillId(2), "Summon Cat", SkillCategory::Summon);
        let corpse = SkillInfo::new(SkillId(3), "Corpse Burst", SkillCategory::Attack)
            .with_target(SkillTarget::Corpse);
        let pet = SkillInfo::new(SkillId(4), "Servitor Heal", SkillCategory::Heal)
            .with_target(SkillTarget::Summon);

        assert!(!passive.is_farmable());
        assert!(!summon.is_farmable());
        assert!(!corpse.is_farmable());
        assert!(!pet.is_farmable());
    }

    #[test]
    fn single_target_sleep_is_rejected_but_area_sleep_is_not() {
        let single = SkillInfo::new(SkillId(5), "Sleep", SkillCategory::Sleep);
        let area = SkillInfo::new(SkillId(6), "Sleeping Cloud", SkillCategory::Sleep)
            .with_target(SkillTarget::Area);
        assert!(!single.is_farmable());
        assert!(area.is_farmable());
    }

    #[test]
    fn excluded_names_are_rejected() {
        let storm = SkillInfo::new(SkillId(7), "Elemental Storm", SkillCategory::Attack);
        let wind = SkillInfo::new(SkillId(8), "Wind Strike", SkillCategory::Attack);
        assert!(!storm.is_farmable());
        assert!(wind.is_farmable());
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("HEAL".parse::<SkillCategory>().ok(), Some(SkillCategory::Heal));
        assert_eq!(SkillCategory::Debuff.as_ref(), "debuff");
    }
}
