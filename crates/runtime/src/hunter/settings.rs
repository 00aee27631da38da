//! Player-tunable hunter settings.

use autofarm_core::Team;
use bitflags::bitflags;

/// Combat profile of a hunter.
///
/// Only two things depend on it: whether the routine issues melee attacks
/// and which team colour the hunter shows while running.
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
pub enum Archetype {
    #[default]
    Fighter,
    Caster,
}

impl Archetype {
    pub const fn team(self) -> Team {
        match self {
            Self::Fighter => Team::Blue,
            Self::Caster => Team::Red,
        }
    }

    pub const fn uses_melee(self) -> bool {
        matches!(self, Self::Fighter)
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Fighter => Self::Caster,
            Self::Caster => Self::Fighter,
        }
    }

    pub(crate) const fn to_u8(self) -> u8 {
        match self {
            Self::Fighter => 0,
            Self::Caster => 1,
        }
    }

    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Caster,
            _ => Self::Fighter,
        }
    }
}

/// Numeric setting currently awaiting a value from the player.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EditField {
    Radius,
    Hp,
    Mp,
}

impl EditField {
    pub(crate) const fn encode(field: Option<Self>) -> u8 {
        match field {
            None => 0,
            Some(Self::Radius) => 1,
            Some(Self::Hp) => 2,
            Some(Self::Mp) => 3,
        }
    }

    pub(crate) const fn decode(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Radius),
            2 => Some(Self::Hp),
            3 => Some(Self::Mp),
            _ => None,
        }
    }
}

bitflags! {
    /// Independent on/off behaviours.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct BehaviorFlags: u8 {
        /// Walk back to the origin once outside the leash.
        const KEEP_NEAR_ORIGIN = 1 << 0;
        /// Skip hostiles already fighting someone else.
        const ONLY_UNCLAIMED = 1 << 1;
        /// Follow the party leader around.
        const FOLLOW_LEADER = 1 << 2;
        /// Fight whatever the party leader is targeting.
        const ASSIST_LEADER = 1 << 3;
        /// Only engage targets that have been spoiled.
        const ONLY_LOOTABLE = 1 << 4;
    }
}

impl BehaviorFlags {
    pub const DEFAULT: Self = Self::KEEP_NEAR_ORIGIN.union(Self::ONLY_UNCLAIMED);

    /// Maps the short names used by player commands.
    pub fn from_command_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "keep" => Some(Self::KEEP_NEAR_ORIGIN),
            "respect" => Some(Self::ONLY_UNCLAIMED),
            "follow" => Some(Self::FOLLOW_LEADER),
            "assist" => Some(Self::ASSIST_LEADER),
            "spoiled" => Some(Self::ONLY_LOOTABLE),
            _ => None,
        }
    }
}

impl Default for BehaviorFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archetype_controls_team_and_melee() {
        assert_eq!(Archetype::Fighter.team(), Team::Blue);
        assert_eq!(Archetype::Caster.team(), Team::Red);
        assert!(Archetype::Fighter.uses_melee());
        assert!(!Archetype::Caster.uses_melee());
        assert_eq!(Archetype::Fighter.toggled(), Archetype::Caster);
    }

    #[test]
    fn archetype_survives_atomic_encoding() {
        for archetype in [Archetype::Fighter, Archetype::Caster] {
            assert_eq!(Archetype::from_u8(archetype.to_u8()), archetype);
        }
    }

    #[test]
    fn edit_field_encoding_covers_none() {
        for field in [None, Some(EditField::Radius), Some(EditField::Hp), Some(EditField::Mp)] {
            assert_eq!(EditField::decode(EditField::encode(field)), field);
        }
        assert_eq!("HP".parse::<EditField>().ok(), Some(EditField::Hp));
    }

    #[test]
    fn default_flags_keep_near_origin_and_respect_claims() {
        let flags = BehaviorFlags::default();
        assert!(flags.contains(BehaviorFlags::KEEP_NEAR_ORIGIN));
        assert!(flags.contains(BehaviorFlags::ONLY_UNCLAIMED));
        assert!(!flags.intersects(
            BehaviorFlags::FOLLOW_LEADER | BehaviorFlags::ASSIST_LEADER | BehaviorFlags::ONLY_LOOTABLE
        ));
    }

    #[test]
    fn command_names_map_to_flags() {
        assert_eq!(
            BehaviorFlags::from_command_name("Spoiled"),
            Some(BehaviorFlags::ONLY_LOOTABLE)
        );
        assert_eq!(BehaviorFlags::from_command_name("radius"), None);
    }
}
