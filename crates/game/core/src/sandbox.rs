//! In-memory world used by tests and the headless demo server.
//!
//! [`SandboxWorld`] keeps a handful of actors in a map and applies every
//! command with deliberately simple rules: moves advance a fixed step,
//! attacks and offensive casts remove a fixed slice of HP, heals restore it,
//! buffs/debuffs toggle an effect and spoil/sweep flip the lootable flag. Every
//! command is also appended to a log so callers can assert on what the engine
//! decided.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::skill::{SkillCategory, SkillId, SkillInfo};
use crate::types::{EntityId, Position, Team};
use crate::world::{HostileKind, Nearby, WorldCommand, WorldQuery};

/// Distance covered by a single `move_to` call.
pub const MOVE_STEP: u32 = 250;
/// HP fraction removed by a melee hit.
pub const MELEE_DAMAGE: f64 = 0.1;
/// HP fraction removed by an offensive skill.
pub const SKILL_DAMAGE: f64 = 0.2;
/// HP fraction restored by a heal.
pub const HEAL_AMOUNT: f64 = 0.3;
/// MP fraction consumed by any cast.
pub const CAST_COST: f64 = 0.05;

/// A command the engine issued, in call order.
#[derive(Clone, Debug, PartialEq)]
pub enum Issued {
    SetTarget {
        actor: EntityId,
        target: Option<EntityId>,
    },
    MoveTo {
        actor: EntityId,
        destination: Position,
    },
    Attack {
        actor: EntityId,
        target: EntityId,
    },
    Cast {
        actor: EntityId,
        target: EntityId,
        skill: SkillId,
    },
    Follow {
        actor: EntityId,
        leader: EntityId,
    },
    SetTeam {
        actor: EntityId,
        team: Team,
    },
    Notify {
        player: EntityId,
        message: String,
    },
}

/// Mutable state of one sandbox actor.
#[derive(Clone, Debug, PartialEq)]
pub struct SandboxActor {
    pub name: String,
    pub position: Position,
    pub hp: f64,
    pub mp: f64,
    pub dead: bool,
    pub online: bool,
    pub caster: bool,
    pub hostile: Option<HostileKind>,
    pub target: Option<EntityId>,
    pub lootable: bool,
    pub visible: bool,
    pub restricted_zone: bool,
    pub attack_range: u32,
    pub team: Team,
    pub skills: Vec<SkillId>,
    pub effects: HashSet<SkillId>,
}

impl SandboxActor {
    fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
            hp: 1.0,
            mp: 1.0,
            dead: false,
            online: true,
            caster: false,
            hostile: None,
            target: None,
            lootable: false,
            visible: true,
            restricted_zone: false,
            attack_range: 40,
            team: Team::None,
            skills: Vec::new(),
            effects: HashSet::new(),
        }
    }

    fn take_damage(&mut self, amount: f64) {
        self.hp = (self.hp - amount).max(0.0);
        if self.hp <= f64::EPSILON {
            self.hp = 0.0;
            self.dead = true;
        }
    }
}

#[derive(Default)]
struct Inner {
    actors: HashMap<EntityId, SandboxActor>,
    /// Scan order for hostiles (insertion order).
    hostiles: Vec<EntityId>,
    skills: HashMap<SkillId, SkillInfo>,
    leaders: HashMap<EntityId, EntityId>,
    issued: Vec<Issued>,
}

/// Thread-safe in-memory world.
#[derive(Default)]
pub struct SandboxWorld {
    inner: Mutex<Inner>,
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_player(&self, id: EntityId, name: impl Into<String>, position: Position) {
        self.lock()
            .actors
            .insert(id, SandboxActor::new(name, position));
    }

    pub fn add_hostile(&self, id: EntityId, position: Position, kind: HostileKind) {
        let mut actor = SandboxActor::new(format!("hostile{}", id.0), position);
        actor.hostile = Some(kind);
        let mut inner = self.lock();
        inner.actors.insert(id, actor);
        inner.hostiles.push(id);
    }

    pub fn remove(&self, id: EntityId) {
        let mut inner = self.lock();
        inner.actors.remove(&id);
        inner.hostiles.retain(|h| *h != id);
    }

    /// Registers skill metadata shared by every actor.
    pub fn define_skill(&self, info: SkillInfo) {
        self.lock().skills.insert(info.id, info);
    }

    pub fn grant_skill(&self, actor: EntityId, skill: SkillId) {
        self.update(actor, |a| {
            if !a.skills.contains(&skill) {
                a.skills.push(skill);
            }
        });
    }

    pub fn set_leader(&self, member: EntityId, leader: EntityId) {
        let mut inner = self.lock();
        inner.leaders.insert(member, leader);
        inner.leaders.insert(leader, leader);
    }

    /// Applies `f` to the actor, if present.
    pub fn update(&self, id: EntityId, f: impl FnOnce(&mut SandboxActor)) {
        if let Some(actor) = self.lock().actors.get_mut(&id) {
            f(actor);
        }
    }

    pub fn actor(&self, id: EntityId) -> Option<SandboxActor> {
        self.lock().actors.get(&id).cloned()
    }

    pub fn issued(&self) -> Vec<Issued> {
        self.lock().issued.clone()
    }

    /// Returns and clears the command log.
    pub fn take_issued(&self) -> Vec<Issued> {
        std::mem::take(&mut self.lock().issued)
    }

    fn read<T>(&self, id: EntityId, default: T, f: impl FnOnce(&SandboxActor) -> T) -> T {
        self.lock().actors.get(&id).map(f).unwrap_or(default)
    }
}

impl WorldQuery for SandboxWorld {
    fn is_online(&self, player: EntityId) -> bool {
        self.read(player, false, |a| a.online)
    }

    fn is_dead(&self, entity: EntityId) -> bool {
        self.read(entity, true, |a| a.dead)
    }

    fn name(&self, player: EntityId) -> Option<String> {
        self.lock().actors.get(&player).map(|a| a.name.clone())
    }

    fn is_caster_class(&self, player: EntityId) -> bool {
        self.read(player, false, |a| a.caster)
    }

    fn in_restricted_zone(&self, player: EntityId) -> bool {
        self.read(player, false, |a| a.restricted_zone)
    }

    fn position(&self, entity: EntityId) -> Option<Position> {
        self.lock().actors.get(&entity).map(|a| a.position)
    }

    fn target_of(&self, entity: EntityId) -> Option<EntityId> {
        self.lock().actors.get(&entity).and_then(|a| a.target)
    }

    fn is_hostile(&self, entity: EntityId) -> bool {
        self.read(entity, false, |a| a.hostile.is_some())
    }

    fn party_leader(&self, player: EntityId) -> Option<EntityId> {
        self.lock().leaders.get(&player).copied()
    }

    fn nearby_hostiles(&self, around: EntityId, radius: u32) -> Vec<Nearby> {
        let inner = self.lock();
        let Some(center) = inner.actors.get(&around).map(|a| a.position) else {
            return Vec::new();
        };
        inner
            .hostiles
            .iter()
            .filter_map(|id| inner.actors.get(id).map(|a| (*id, a)))
            .filter(|(_, a)| center.is_in_2d_radius(&a.position, radius))
            .map(|(id, a)| Nearby {
                id,
                position: a.position,
                kind: a.hostile.unwrap_or_default(),
                dead: a.dead,
                target: a.target,
            })
            .collect()
    }

    fn can_see(&self, _from: EntityId, to: EntityId) -> bool {
        self.read(to, false, |a| a.visible)
    }

    fn skill(&self, actor: EntityId, skill: SkillId) -> Option<SkillInfo> {
        let inner = self.lock();
        let known = inner.actors.get(&actor)?.skills.contains(&skill);
        if !known {
            return None;
        }
        inner.skills.get(&skill).cloned()
    }

    fn known_skills(&self, actor: EntityId) -> Vec<SkillInfo> {
        let inner = self.lock();
        let Some(a) = inner.actors.get(&actor) else {
            return Vec::new();
        };
        a.skills
            .iter()
            .filter_map(|id| inner.skills.get(id).cloned())
            .collect()
    }

    fn physical_attack_range(&self, actor: EntityId) -> u32 {
        self.read(actor, 0, |a| a.attack_range)
    }

    fn hp_ratio(&self, entity: EntityId) -> f64 {
        self.read(entity, 0.0, |a| a.hp)
    }

    fn mp_ratio(&self, entity: EntityId) -> f64 {
        self.read(entity, 0.0, |a| a.mp)
    }

    fn has_effect(&self, entity: EntityId, skill: SkillId) -> bool {
        self.read(entity, false, |a| a.effects.contains(&skill))
    }

    fn is_lootable(&self, entity: EntityId) -> bool {
        self.read(entity, false, |a| a.lootable)
    }
}

impl WorldCommand for SandboxWorld {
    fn set_target(&self, actor: EntityId, target: Option<EntityId>) {
        let mut inner = self.lock();
        if let Some(a) = inner.actors.get_mut(&actor) {
            a.target = target;
        }
        inner.issued.push(Issued::SetTarget { actor, target });
    }

    fn move_to(&self, actor: EntityId, destination: Position) {
        let mut inner = self.lock();
        if let Some(a) = inner.actors.get_mut(&actor) {
            a.position = step_towards(a.position, destination, MOVE_STEP);
        }
        inner.issued.push(Issued::MoveTo { actor, destination });
    }

    fn attack(&self, actor: EntityId, target: EntityId) {
        let mut inner = self.lock();
        if let Some(t) = inner.actors.get_mut(&target) {
            t.target = Some(actor);
            t.take_damage(MELEE_DAMAGE);
        }
        inner.issued.push(Issued::Attack { actor, target });
    }

    fn cast(&self, actor: EntityId, target: EntityId, skill: SkillId) {
        let mut inner = self.lock();
        let category = inner.skills.get(&skill).map(|s| s.category);
        if let Some(a) = inner.actors.get_mut(&actor) {
            a.mp = (a.mp - CAST_COST).max(0.0);
        }
        if let (Some(category), Some(t)) = (category, inner.actors.get_mut(&target)) {
            match category {
                SkillCategory::Heal => t.hp = (t.hp + HEAL_AMOUNT).min(1.0),
                SkillCategory::Buff | SkillCategory::Debuff => {
                    t.effects.insert(skill);
                }
                SkillCategory::Spoil => {
                    t.lootable = true;
                    t.target = Some(actor);
                }
                SkillCategory::Sweep => t.lootable = false,
                _ => {
                    t.target = Some(actor);
                    t.take_damage(SKILL_DAMAGE);
                }
            }
        }
        inner.issued.push(Issued::Cast {
            actor,
            target,
            skill,
        });
    }

    fn follow(&self, actor: EntityId, leader: EntityId) {
        self.lock().issued.push(Issued::Follow { actor, leader });
    }

    fn set_team(&self, actor: EntityId, team: Team) {
        let mut inner = self.lock();
        if let Some(a) = inner.actors.get_mut(&actor) {
            a.team = team;
        }
        inner.issued.push(Issued::SetTeam { actor, team });
    }

    fn notify(&self, player: EntityId, message: &str) {
        self.lock().issued.push(Issued::Notify {
            player,
            message: message.to_string(),
        });
    }
}

fn step_towards(from: Position, to: Position, step: u32) -> Position {
    let distance = from.distance_2d(&to);
    if distance <= f64::from(step) {
        return to;
    }
    let scale = f64::from(step) / distance;
    let x = f64::from(from.x) + (f64::from(to.x) - f64::from(from.x)) * scale;
    let y = f64::from(from.y) + (f64::from(to.y) - f64::from(from.y)) * scale;
    Position::new(x.round() as i32, y.round() as i32, to.z)
}
