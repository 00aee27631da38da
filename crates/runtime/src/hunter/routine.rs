//! Per-tick decision routine.
//!
//! Each step is a guard that may end the routine early. Observations are
//! taken fresh from the world at every step; an entity that vanished between
//! two queries simply fails the next guard.

use std::time::Instant;

use autofarm_core::{EntityId, FarmConfig, SkillCategory, SkillId, World};
use tracing::{debug, trace};

use super::{BehaviorFlags, Hunter};

const MP_LIMIT_NOTICE: &str = "You have reached your MP limit, use mana potion.";

/// Skills already cast during one routine run.
///
/// The self-cast fallback and the combat rotation may both want the same heal
/// or buff within a single tick; only the first request goes out.
#[derive(Debug, Default)]
struct CastLedger {
    cast: Vec<SkillId>,
}

impl CastLedger {
    /// Points the actor at `target` and casts, unless `skill` already went
    /// out this run.
    fn cast(&mut self, world: &dyn World, actor: EntityId, target: EntityId, skill: SkillId) {
        if self.cast.contains(&skill) {
            return;
        }
        self.cast.push(skill);
        if world.target_of(actor) != Some(target) {
            world.set_target(actor, Some(target));
        }
        world.cast(actor, target, skill);
    }
}

impl Hunter {
    /// Runs one decision step against the world.
    pub fn execute_routine(&self, world: &dyn World, now: Instant) {
        let me = self.id;
        let mut ledger = CastLedger::default();

        if self.movement().is_returning() {
            if let Some(position) = world.position(me) {
                self.movement()
                    .begin_return(world, me, position, self.config.arrival_radius);
            }
            return;
        }

        let flags = self.flags();
        if flags.contains(BehaviorFlags::FOLLOW_LEADER) {
            self.follow_party_leader(world);
        }

        // Self-targeted casts leave the hunter pointing at itself, which
        // still counts as having no world target.
        let current = world.target_of(me);
        if current.filter(|&t| t != me && world.is_hostile(t)).is_none() {
            self.cast_self_skills_with(world, &mut ledger);
        }

        let Some(target) = self.select_target(world, current, &mut ledger) else {
            return;
        };
        if current != Some(target) {
            world.set_target(me, Some(target));
        }

        if flags.contains(BehaviorFlags::ONLY_LOOTABLE) && !world.is_lootable(target) {
            trace!(player = %me, %target, "target not spoiled, waiting");
            return;
        }

        self.engage(world, target, now, &mut ledger);
    }

    /// Casts heals and buffs on the hunter itself.
    ///
    /// Does nothing at or below the MP floor. Heals go out only below the HP
    /// floor and buffs only when their effect is missing.
    pub fn cast_self_skills(&self, world: &dyn World) {
        self.cast_self_skills_with(world, &mut CastLedger::default());
    }

    fn cast_self_skills_with(&self, world: &dyn World, ledger: &mut CastLedger) {
        let loadout = self.loadout();
        if loadout.is_empty() {
            return;
        }

        let me = self.id;
        if world.mp_ratio(me) <= ratio(self.min_mp()) {
            return;
        }
        let low_hp = world.hp_ratio(me) < ratio(self.min_hp());

        for skill in loadout.skills() {
            let Some(info) = world.skill(me, skill) else {
                continue;
            };
            let wanted = match info.category {
                SkillCategory::Heal => low_hp,
                SkillCategory::Buff => !world.has_effect(me, skill),
                _ => false,
            };
            if wanted {
                ledger.cast(world, me, me, skill);
            }
        }
    }

    /// Picks the hostile to fight this tick.
    ///
    /// The current target wins while it is a visible live hostile. A visible
    /// spoiled corpse is swept and stays targeted. Otherwise the party
    /// leader's target (when assisting) or the nearest qualifying hostile.
    fn select_target(
        &self,
        world: &dyn World,
        current: Option<EntityId>,
        ledger: &mut CastLedger,
    ) -> Option<EntityId> {
        let me = self.id;
        if let Some(target) = current.filter(|&t| world.is_hostile(t) && world.can_see(me, t)) {
            if !world.is_dead(target) {
                return Some(target);
            }
            if self.has_loot_skill()
                && world.is_lootable(target)
                && world.skill(me, FarmConfig::LOOT_SKILL).is_some()
            {
                ledger.cast(world, me, target, FarmConfig::LOOT_SKILL);
                return Some(target);
            }
        }

        if self.has_flag(BehaviorFlags::ASSIST_LEADER) {
            self.leader_target(world)
        } else {
            self.find_nearest_hostile(world)
        }
    }

    /// Nearest visible, live, farmable hostile strictly inside the search
    /// radius. With [`BehaviorFlags::ONLY_UNCLAIMED`] set, hostiles engaging
    /// anyone other than this hunter are skipped.
    pub fn find_nearest_hostile(&self, world: &dyn World) -> Option<EntityId> {
        let me = self.id;
        let here = world.position(me)?;
        let radius = self.radius();
        let only_unclaimed = self.has_flag(BehaviorFlags::ONLY_UNCLAIMED);

        world
            .nearby_hostiles(me, radius)
            .into_iter()
            .filter(|mob| !mob.dead && mob.kind.is_farmable())
            .filter(|mob| !only_unclaimed || mob.target.is_none_or(|t| t == me))
            .filter(|mob| world.can_see(me, mob.id))
            .map(|mob| (mob.id, here.distance_2d(&mob.position)))
            .filter(|&(_, distance)| distance < f64::from(radius))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    fn leader_target(&self, world: &dyn World) -> Option<EntityId> {
        let leader = world.party_leader(self.id).filter(|&l| l != self.id)?;
        world.target_of(leader).filter(|&t| world.is_hostile(t))
    }

    /// Follows the party leader. Solo hunters and leaders stay put.
    pub fn follow_party_leader(&self, world: &dyn World) {
        if let Some(leader) = world.party_leader(self.id).filter(|&l| l != self.id) {
            world.follow(self.id, leader);
        }
    }

    fn engage(&self, world: &dyn World, target: EntityId, now: Instant, ledger: &mut CastLedger) {
        let me = self.id;
        let Some(here) = world.position(me) else {
            return;
        };

        {
            let mut movement = self.movement();
            if self.has_flag(BehaviorFlags::KEEP_NEAR_ORIGIN)
                && movement.is_far_from_origin(here, self.radius())
            {
                debug!(player = %me, "outside leash, returning to origin");
                movement.begin_return(world, me, here, self.config.arrival_radius);
                return;
            }
            if movement.check_stuck(target, world.hp_ratio(target), now, &self.config) {
                debug!(player = %me, %target, "target stuck, returning to origin");
                movement.reset_stuck();
                movement.begin_return(world, me, here, self.config.arrival_radius);
                return;
            }
        }

        if world.is_dead(target) {
            return;
        }
        let Some(there) = world.position(target) else {
            return;
        };

        if here.distance_2d(&there) > f64::from(self.effective_range()) {
            world.move_to(me, there);
            return;
        }

        if self.archetype().uses_melee() {
            world.attack(me, target);
        }
        self.cast_combat_skills(world, target, ledger);
    }

    fn cast_combat_skills(&self, world: &dyn World, target: EntityId, ledger: &mut CastLedger) {
        let loadout = self.loadout();
        if loadout.is_empty() {
            return;
        }

        let me = self.id;
        if world.mp_ratio(me) <= ratio(self.min_mp()) {
            debug!(player = %me, "mp floor reached, skipping skills");
            world.notify(me, MP_LIMIT_NOTICE);
            return;
        }
        let low_hp = world.hp_ratio(me) < ratio(self.min_hp());

        for skill in loadout.skills() {
            let Some(info) = world.skill(me, skill) else {
                continue;
            };
            let cast_on = match info.category {
                SkillCategory::Sweep => None,
                SkillCategory::Heal => low_hp.then_some(me),
                SkillCategory::Buff => (!world.has_effect(me, skill)).then_some(me),
                SkillCategory::Debuff => (!world.has_effect(target, skill)).then_some(target),
                SkillCategory::Spoil => (!world.is_lootable(target)).then_some(target),
                _ => Some(target),
            };
            if let Some(cast_on) = cast_on {
                ledger.cast(world, me, cast_on, skill);
            }
        }
    }
}

fn ratio(percent: u8) -> f64 {
    f64::from(percent) / 100.0
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use autofarm_core::sandbox::{Issued, SandboxWorld};
    use autofarm_core::{HostileKind, Position, SkillInfo, WorldQuery};

    use super::*;
    use crate::hunter::Archetype;

    const ME: EntityId = EntityId(1);
    const HEAL: SkillId = SkillId(1011);
    const BUFF: SkillId = SkillId(1068);
    const STRIKE: SkillId = SkillId(1177);

    fn setup() -> (SandboxWorld, Hunter) {
        let world = SandboxWorld::new();
        world.add_player(ME, "hunter", Position::ORIGIN);
        world.define_skill(SkillInfo::new(HEAL, "Heal", SkillCategory::Heal).with_cast_range(600));
        world.define_skill(SkillInfo::new(BUFF, "Might", SkillCategory::Buff));
        world.define_skill(
            SkillInfo::new(STRIKE, "Wind Strike", SkillCategory::Attack).with_cast_range(600),
        );
        for skill in [HEAL, BUFF, STRIKE] {
            world.grant_skill(ME, skill);
        }
        let hunter = Hunter::new(
            ME,
            "hunter",
            Archetype::Caster,
            60,
            Arc::new(FarmConfig::default()),
        );
        (world, hunter)
    }

    fn casts(issued: &[Issued]) -> Vec<(EntityId, SkillId)> {
        issued
            .iter()
            .filter_map(|i| match *i {
                Issued::Cast { target, skill, .. } => Some((target, skill)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn self_cast_respects_floors() {
        let (world, hunter) = setup();
        hunter.assign_skill(&world, 0, HEAL);
        hunter.assign_skill(&world, 1, BUFF);

        world.update(ME, |a| {
            a.hp = 0.8;
            a.mp = 0.9;
        });
        hunter.cast_self_skills(&world);
        assert_eq!(casts(&world.take_issued()), vec![(ME, BUFF)]);

        world.update(ME, |a| {
            a.hp = 0.2;
            a.mp = 0.9;
        });
        hunter.cast_self_skills(&world);
        assert_eq!(casts(&world.take_issued()), vec![(ME, HEAL)]);

        world.update(ME, |a| a.mp = 0.5 - f64::EPSILON);
        hunter.set_min_mp(50);
        hunter.cast_self_skills(&world);
        assert!(casts(&world.take_issued()).is_empty());
    }

    #[test]
    fn idle_hunter_keeps_healing_itself_every_tick() {
        let (world, hunter) = setup();
        hunter.assign_skill(&world, 0, HEAL);
        hunter.set_min_hp(50);
        hunter.set_min_mp(10);

        for tick in 0..3 {
            world.update(ME, |a| {
                a.hp = 0.05;
                a.mp = 0.9;
            });
            hunter.execute_routine(&world, Instant::now());
            assert_eq!(casts(&world.take_issued()), vec![(ME, HEAL)], "tick {tick}");
        }
        assert_eq!(world.target_of(ME), Some(ME));
    }

    #[test]
    fn blocked_repeat_cast_does_not_retarget() {
        let (world, hunter) = setup();
        let mob = EntityId(10);
        world.add_hostile(mob, Position::new(100, 0, 0), HostileKind::Regular);
        hunter.assign_skill(&world, 0, HEAL);
        hunter.set_min_hp(50);
        world.update(ME, |a| a.hp = 0.05);

        hunter.execute_routine(&world, Instant::now());
        assert_eq!(casts(&world.take_issued()), vec![(ME, HEAL)]);
        assert_eq!(world.target_of(ME), Some(mob));
    }

    #[test]
    fn nearest_hostile_skips_claimed_hidden_and_special() {
        let (world, hunter) = setup();
        let other = EntityId(2);
        world.add_player(other, "rival", Position::new(0, 50, 0));
        world.add_hostile(EntityId(10), Position::new(100, 0, 0), HostileKind::Regular);
        world.add_hostile(EntityId(11), Position::new(200, 0, 0), HostileKind::Regular);
        world.add_hostile(EntityId(12), Position::new(300, 0, 0), HostileKind::Regular);
        world.add_hostile(EntityId(13), Position::new(50, 0, 0), HostileKind::Raid);
        world.add_hostile(EntityId(14), Position::new(60, 0, 0), HostileKind::Regular);

        world.update(EntityId(10), |a| a.target = Some(other));
        world.update(EntityId(11), |a| a.visible = false);
        world.update(EntityId(14), |a| a.dead = true);
        assert_eq!(hunter.find_nearest_hostile(&world), Some(EntityId(12)));

        hunter.set_flag(BehaviorFlags::ONLY_UNCLAIMED, false);
        assert_eq!(hunter.find_nearest_hostile(&world), Some(EntityId(10)));

        world.update(EntityId(10), |a| a.target = Some(ME));
        hunter.set_flag(BehaviorFlags::ONLY_UNCLAIMED, true);
        assert_eq!(hunter.find_nearest_hostile(&world), Some(EntityId(10)));
    }

    #[test]
    fn nearest_hostile_ignores_mobs_beyond_radius() {
        let (world, hunter) = setup();
        hunter.set_radius(300);
        world.add_hostile(EntityId(10), Position::new(300, 0, 0), HostileKind::Regular);
        assert_eq!(hunter.find_nearest_hostile(&world), None);
    }

    #[test]
    fn out_of_range_target_is_approached() {
        let (world, hunter) = setup();
        let mob = EntityId(10);
        world.add_hostile(mob, Position::new(800, 0, 0), HostileKind::Regular);
        hunter.start(&world).unwrap();
        world.take_issued();

        hunter.execute_routine(&world, Instant::now());
        let issued = world.take_issued();
        assert!(issued.contains(&Issued::SetTarget {
            actor: ME,
            target: Some(mob)
        }));
        assert!(issued.contains(&Issued::MoveTo {
            actor: ME,
            destination: Position::new(800, 0, 0)
        }));
        assert!(casts(&issued).is_empty());
    }

    #[test]
    fn in_range_caster_casts_without_melee() {
        let (world, hunter) = setup();
        let mob = EntityId(10);
        world.add_hostile(mob, Position::new(500, 0, 0), HostileKind::Regular);
        hunter.assign_skill(&world, 0, STRIKE);
        hunter.start(&world).unwrap();
        world.take_issued();

        hunter.execute_routine(&world, Instant::now());
        let issued = world.take_issued();
        assert_eq!(casts(&issued), vec![(mob, STRIKE)]);
        assert!(!issued.iter().any(|i| matches!(i, Issued::Attack { .. })));
    }

    #[test]
    fn mp_floor_stops_combat_casts_with_notice() {
        let (world, hunter) = setup();
        let mob = EntityId(10);
        world.add_hostile(mob, Position::new(20, 0, 0), HostileKind::Regular);
        hunter.assign_skill(&world, 0, STRIKE);
        hunter.toggle_archetype(&world);
        hunter.start(&world).unwrap();
        world.update(ME, |a| a.mp = 0.3);
        world.take_issued();

        hunter.execute_routine(&world, Instant::now());
        let issued = world.take_issued();
        assert!(issued.contains(&Issued::Attack {
            actor: ME,
            target: mob
        }));
        assert!(casts(&issued).is_empty());
        assert!(issued.contains(&Issued::Notify {
            player: ME,
            message: MP_LIMIT_NOTICE.to_owned()
        }));
    }

    #[test]
    fn spoiled_corpse_is_swept_and_kept() {
        let (world, hunter) = setup();
        let mob = EntityId(10);
        world.define_skill(SkillInfo::new(
            FarmConfig::LOOT_SKILL,
            "Sweeper",
            SkillCategory::Sweep,
        ));
        world.grant_skill(ME, FarmConfig::LOOT_SKILL);
        world.add_hostile(mob, Position::new(20, 0, 0), HostileKind::Regular);
        world.update(mob, |a| {
            a.dead = true;
            a.lootable = true;
        });
        world.update(ME, |a| a.target = Some(mob));
        hunter.assign_skill(&world, 0, FarmConfig::LOOT_SKILL);
        hunter.start(&world).unwrap();
        world.take_issued();

        hunter.execute_routine(&world, Instant::now());
        assert_eq!(
            casts(&world.take_issued()),
            vec![(mob, FarmConfig::LOOT_SKILL)]
        );
        assert_eq!(world.target_of(ME), Some(mob));
    }

    #[test]
    fn follows_leader_and_assists() {
        let (world, hunter) = setup();
        let leader = EntityId(2);
        let mob = EntityId(10);
        world.add_player(leader, "leader", Position::new(0, 100, 0));
        world.add_hostile(mob, Position::new(30, 0, 0), HostileKind::Regular);
        world.add_hostile(EntityId(11), Position::new(10, 0, 0), HostileKind::Regular);
        world.set_leader(ME, leader);
        world.update(leader, |a| a.target = Some(mob));
        hunter.set_flag(BehaviorFlags::FOLLOW_LEADER, true);
        hunter.set_flag(BehaviorFlags::ASSIST_LEADER, true);
        hunter.start(&world).unwrap();
        world.take_issued();

        hunter.execute_routine(&world, Instant::now());
        let issued = world.take_issued();
        assert!(issued.contains(&Issued::Follow { actor: ME, leader }));
        assert!(issued.contains(&Issued::SetTarget {
            actor: ME,
            target: Some(mob)
        }));
    }

    #[test]
    fn only_lootable_waits_on_unspoiled_target() {
        let (world, hunter) = setup();
        let mob = EntityId(10);
        world.add_hostile(mob, Position::new(20, 0, 0), HostileKind::Regular);
        hunter.assign_skill(&world, 0, STRIKE);
        hunter.set_flag(BehaviorFlags::ONLY_LOOTABLE, true);
        hunter.start(&world).unwrap();
        world.take_issued();

        hunter.execute_routine(&world, Instant::now());
        let issued = world.take_issued();
        assert_eq!(
            issued,
            vec![Issued::SetTarget {
                actor: ME,
                target: Some(mob)
            }]
        );
    }
}
