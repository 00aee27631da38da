//! Collaborator traits through which the auto-farm engine sees the world.
//!
//! The engine never owns game state. Every observation goes through
//! [`WorldQuery`] and every effect through [`WorldCommand`]; a host server
//! implements both for its actor model. Queries about an entity that no longer
//! exists must answer as if the entity were dead or absent (`None`, `false`,
//! `0.0`) rather than fail, since references routinely go stale between
//! observation and use.

use crate::skill::{SkillId, SkillInfo};
use crate::types::{EntityId, Position, Team};

/// Special hostile kinds that the nearest-target scan never picks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HostileKind {
    #[default]
    Regular,
    /// Raid bosses and their minions.
    Raid,
    /// Treasure chests pretending to be monsters.
    Chest,
}

impl HostileKind {
    pub const fn is_farmable(self) -> bool {
        matches!(self, Self::Regular)
    }
}

/// A hostile entity reported by a radius scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nearby {
    pub id: EntityId,
    pub position: Position,
    pub kind: HostileKind,
    pub dead: bool,
    /// Whom this hostile is currently engaging, if anyone.
    pub target: Option<EntityId>,
}

/// Read-only view of the world.
pub trait WorldQuery: Send + Sync {
    fn is_online(&self, player: EntityId) -> bool;

    fn is_dead(&self, entity: EntityId) -> bool;

    fn name(&self, player: EntityId) -> Option<String>;

    /// Whether the player's class relies on spells rather than melee.
    fn is_caster_class(&self, player: EntityId) -> bool;

    /// PvP arenas, siege grounds and similar zones where farming is refused.
    fn in_restricted_zone(&self, player: EntityId) -> bool;

    fn position(&self, entity: EntityId) -> Option<Position>;

    fn target_of(&self, entity: EntityId) -> Option<EntityId>;

    /// Whether the entity is a hostile monster (alive or dead).
    fn is_hostile(&self, entity: EntityId) -> bool;

    /// Party leader of the player's party, `None` when solo.
    fn party_leader(&self, player: EntityId) -> Option<EntityId>;

    /// Hostiles the actor knows of within `radius`, in scan order.
    fn nearby_hostiles(&self, around: EntityId, radius: u32) -> Vec<Nearby>;

    /// Line of sight between two entities.
    fn can_see(&self, from: EntityId, to: EntityId) -> bool;

    /// Metadata of a skill the actor has learned.
    fn skill(&self, actor: EntityId, skill: SkillId) -> Option<SkillInfo>;

    /// Every skill the actor has learned.
    fn known_skills(&self, actor: EntityId) -> Vec<SkillInfo>;

    fn physical_attack_range(&self, actor: EntityId) -> u32;

    /// Current HP as a fraction in `[0, 1]`.
    fn hp_ratio(&self, entity: EntityId) -> f64;

    /// Current MP as a fraction in `[0, 1]`.
    fn mp_ratio(&self, entity: EntityId) -> f64;

    /// Whether the effect of `skill` is currently applied to `entity`.
    fn has_effect(&self, entity: EntityId, skill: SkillId) -> bool;

    /// Whether the hostile has been spoiled and can be swept once dead.
    fn is_lootable(&self, entity: EntityId) -> bool;
}

/// Effects the engine may issue. Commands are fire-and-forget requests to the
/// host's own AI layer; they may be ignored if the actor cannot comply.
pub trait WorldCommand: Send + Sync {
    fn set_target(&self, actor: EntityId, target: Option<EntityId>);

    fn move_to(&self, actor: EntityId, destination: Position);

    fn attack(&self, actor: EntityId, target: EntityId);

    fn cast(&self, actor: EntityId, target: EntityId, skill: SkillId);

    fn follow(&self, actor: EntityId, leader: EntityId);

    /// Changes the team colour and broadcasts the new appearance.
    fn set_team(&self, actor: EntityId, team: Team);

    /// Sends a short system notice to the player.
    fn notify(&self, player: EntityId, message: &str);
}

/// Full world collaborator.
pub trait World: WorldQuery + WorldCommand {}

impl<T: WorldQuery + WorldCommand + ?Sized> World for T {}
