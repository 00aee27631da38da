//! Per-player auto-farm session.
//!
//! A [`Hunter`] is shared between the scheduler thread, which runs its
//! decision routine once per tick, and request threads, which change its
//! settings. Every field is therefore independently atomic: numeric settings
//! and flags are plain atomics, the loadout is a copy-on-write snapshot, and
//! only the movement bookkeeping sits behind a short-lived mutex. The routine
//! tolerates reading any single setting one tick late, so no cross-field
//! transaction exists.

mod loadout;
mod routine;
mod settings;

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;
use autofarm_core::{EntityId, FarmConfig, Position, SkillId, Team, World};
use thiserror::Error;
use tracing::{debug, info};

use crate::movement::MovementController;
use crate::repository::HunterRecord;

pub use loadout::Loadout;
pub use settings::{Archetype, BehaviorFlags, EditField};

/// Why a hunter refused to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("It's not possible to do that in this location.")]
    RestrictedZone,

    #[error("You can't do that right now.")]
    Unavailable,

    #[error("You did not have available auto farm time.")]
    NoTime,
}

pub struct Hunter {
    id: EntityId,
    name: String,
    config: Arc<FarmConfig>,

    archetype: AtomicU8,
    active: AtomicBool,
    radius: AtomicU32,
    min_hp: AtomicU8,
    min_mp: AtomicU8,
    flags: AtomicU8,
    remaining_minutes: AtomicU32,
    editing: AtomicU8,

    loadout: ArcSwap<Loadout>,
    effective_range: AtomicU32,
    has_loot_skill: AtomicBool,

    movement: Mutex<MovementController>,
}

impl Hunter {
    /// Creates an inactive hunter with default settings and an empty loadout.
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        archetype: Archetype,
        remaining_minutes: u32,
        config: Arc<FarmConfig>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            config,
            archetype: AtomicU8::new(archetype.to_u8()),
            active: AtomicBool::new(false),
            radius: AtomicU32::new(FarmConfig::DEFAULT_RADIUS),
            min_hp: AtomicU8::new(FarmConfig::DEFAULT_HP_FLOOR),
            min_mp: AtomicU8::new(FarmConfig::DEFAULT_MP_FLOOR),
            flags: AtomicU8::new(BehaviorFlags::DEFAULT.bits()),
            remaining_minutes: AtomicU32::new(remaining_minutes),
            editing: AtomicU8::new(EditField::encode(None)),
            loadout: ArcSwap::from_pointee(Loadout::new()),
            effective_range: AtomicU32::new(FarmConfig::MIN_ATTACK_RANGE),
            has_loot_skill: AtomicBool::new(false),
            movement: Mutex::new(MovementController::new()),
        }
    }

    /// Snapshot written to storage.
    pub fn record(&self) -> HunterRecord {
        HunterRecord {
            player_id: self.id.get(),
            name: self.name.clone(),
            remaining_minutes: self.remaining_minutes(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &FarmConfig {
        &self.config
    }

    pub fn archetype(&self) -> Archetype {
        Archetype::from_u8(self.archetype.load(Ordering::Relaxed))
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn radius(&self) -> u32 {
        self.radius.load(Ordering::Relaxed)
    }

    /// HP floor in percent.
    pub fn min_hp(&self) -> u8 {
        self.min_hp.load(Ordering::Relaxed)
    }

    /// MP floor in percent.
    pub fn min_mp(&self) -> u8 {
        self.min_mp.load(Ordering::Relaxed)
    }

    pub fn flags(&self) -> BehaviorFlags {
        BehaviorFlags::from_bits_truncate(self.flags.load(Ordering::Relaxed))
    }

    pub fn has_flag(&self, flag: BehaviorFlags) -> bool {
        self.flags().contains(flag)
    }

    pub fn remaining_minutes(&self) -> u32 {
        self.remaining_minutes.load(Ordering::Acquire)
    }

    pub fn editing(&self) -> Option<EditField> {
        EditField::decode(self.editing.load(Ordering::Relaxed))
    }

    /// Reach used to decide between attacking and closing in.
    pub fn effective_range(&self) -> u32 {
        self.effective_range
            .load(Ordering::Relaxed)
            .max(FarmConfig::MIN_ATTACK_RANGE)
    }

    pub fn has_loot_skill(&self) -> bool {
        self.has_loot_skill.load(Ordering::Relaxed)
    }

    pub fn origin(&self) -> Option<Position> {
        self.movement().origin()
    }

    pub fn is_returning(&self) -> bool {
        self.movement().is_returning()
    }

    // ===== loadout =====

    /// Current loadout snapshot. The snapshot never changes; later edits
    /// publish a new one.
    pub fn loadout(&self) -> Arc<Loadout> {
        self.loadout.load_full()
    }

    pub fn skill_in_slot(&self, slot: usize) -> Option<SkillId> {
        self.loadout.load().get(slot)
    }

    pub fn slot_of(&self, skill: SkillId) -> Option<usize> {
        self.loadout.load().slot_of(skill)
    }

    pub fn first_empty_slot(&self) -> Option<usize> {
        self.loadout.load().first_empty_slot()
    }

    pub fn slots_in_use(&self) -> usize {
        self.loadout.load().len()
    }

    pub fn contains_skill(&self, skill: SkillId) -> bool {
        self.loadout.load().contains(skill)
    }

    /// Places `skill` in `slot` and returns the skill it displaced.
    ///
    /// Keeping a skill unique across slots is the caller's job.
    pub fn assign_skill(&self, world: &dyn World, slot: usize, skill: SkillId) -> Option<SkillId> {
        let previous = self.loadout.rcu(|current| {
            let mut next = Loadout::clone(current);
            next.assign(slot, skill);
            next
        });
        let displaced = previous.get(slot);

        if skill == FarmConfig::LOOT_SKILL {
            self.has_loot_skill.store(true, Ordering::Relaxed);
        } else if displaced == Some(FarmConfig::LOOT_SKILL) {
            self.has_loot_skill.store(false, Ordering::Relaxed);
        }
        self.recalculate_range(world);
        displaced
    }

    /// Empties `slot` and returns the skill that was there.
    pub fn remove_skill(&self, world: &dyn World, slot: usize) -> Option<SkillId> {
        let previous = self.loadout.rcu(|current| {
            let mut next = Loadout::clone(current);
            next.remove(slot);
            next
        });
        let removed = previous.get(slot);

        if removed == Some(FarmConfig::LOOT_SKILL) {
            self.has_loot_skill.store(false, Ordering::Relaxed);
        }
        self.recalculate_range(world);
        removed
    }

    /// Recomputes the effective range from base attack range and the cast
    /// range of every loadout skill. Call again whenever base stats change.
    pub fn recalculate_range(&self, world: &dyn World) {
        let loadout = self.loadout.load();
        let range = loadout
            .skills()
            .filter_map(|skill| world.skill(self.id, skill))
            .map(|info| info.cast_range)
            .fold(world.physical_attack_range(self.id), u32::max);
        self.effective_range.store(range, Ordering::Relaxed);
    }

    // ===== settings =====

    /// Sets the search radius, clamped to `1..=max_radius`.
    pub fn set_radius(&self, radius: u32) {
        self.radius
            .store(self.config.clamp_radius(radius), Ordering::Relaxed);
    }

    /// Sets the HP floor, clamped to the accepted percentage range.
    pub fn set_min_hp(&self, percent: u32) {
        self.min_hp
            .store(FarmConfig::clamp_resource_floor(percent), Ordering::Relaxed);
    }

    /// Sets the MP floor, clamped to the accepted percentage range.
    pub fn set_min_mp(&self, percent: u32) {
        self.min_mp
            .store(FarmConfig::clamp_resource_floor(percent), Ordering::Relaxed);
    }

    pub fn set_flag(&self, flag: BehaviorFlags, enabled: bool) {
        if enabled {
            self.flags.fetch_or(flag.bits(), Ordering::Relaxed);
        } else {
            self.flags.fetch_and(!flag.bits(), Ordering::Relaxed);
        }
        self.on_flags_changed(flag, enabled);
    }

    /// Flips `flag` and returns its new state.
    pub fn toggle_flag(&self, flag: BehaviorFlags) -> bool {
        let before = BehaviorFlags::from_bits_truncate(
            self.flags.fetch_xor(flag.bits(), Ordering::Relaxed),
        );
        let enabled = !before.contains(flag);
        self.on_flags_changed(flag, enabled);
        enabled
    }

    fn on_flags_changed(&self, flag: BehaviorFlags, enabled: bool) {
        if flag.contains(BehaviorFlags::KEEP_NEAR_ORIGIN) && !enabled {
            self.movement().set_returning(false);
        }
    }

    pub fn begin_edit(&self, field: EditField) {
        self.editing
            .store(EditField::encode(Some(field)), Ordering::Relaxed);
    }

    pub fn reset_editing(&self) {
        self.editing.store(EditField::encode(None), Ordering::Relaxed);
    }

    // ===== time budget =====

    /// Adds purchased minutes and returns the new balance.
    pub fn add_minutes(&self, minutes: u32) -> u32 {
        let previous = self
            .remaining_minutes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                Some(v.saturating_add(minutes))
            })
            .unwrap_or_else(|v| v);
        previous.saturating_add(minutes)
    }

    /// Removes minutes, never going below zero, and returns the new balance.
    pub fn remove_minutes(&self, minutes: u32) -> u32 {
        let previous = self
            .remaining_minutes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
                Some(v.saturating_sub(minutes))
            })
            .unwrap_or_else(|v| v);
        previous.saturating_sub(minutes)
    }

    // ===== lifecycle =====

    /// Activates the hunter at its current position.
    pub fn start(&self, world: &dyn World) -> Result<(), StartError> {
        let result = self.try_start(world);
        if let Err(reason) = result {
            debug!(player = %self.id, %reason, "hunter refused to start");
            world.notify(self.id, &reason.to_string());
        }
        result
    }

    fn try_start(&self, world: &dyn World) -> Result<(), StartError> {
        if world.in_restricted_zone(self.id) {
            return Err(StartError::RestrictedZone);
        }
        if world.is_dead(self.id) {
            return Err(StartError::Unavailable);
        }
        if self.remaining_minutes() == 0 {
            return Err(StartError::NoTime);
        }
        let position = world.position(self.id).ok_or(StartError::Unavailable)?;
        self.recalculate_range(world);

        {
            let mut movement = self.movement();
            movement.set_origin(position);
            movement.set_returning(false);
            movement.reset_stuck();
        }
        self.active.store(true, Ordering::Release);
        world.set_team(self.id, self.archetype().team());
        world.notify(self.id, "Your automatic farm system has been enabled.");
        info!(player = %self.id, origin = %position, "hunter started");
        Ok(())
    }

    /// Deactivates the hunter. The next tick skips it.
    pub fn stop(&self, world: &dyn World) {
        self.active.store(false, Ordering::Release);
        world.set_team(self.id, Team::None);
        world.notify(self.id, "Your automatic farm system has been disabled.");
        info!(player = %self.id, "hunter stopped");
    }

    /// Starts an inactive hunter or stops an active one. Returns the new
    /// activity state.
    pub fn toggle_active(&self, world: &dyn World) -> Result<bool, StartError> {
        if self.is_active() {
            self.stop(world);
            return Ok(false);
        }
        self.start(world).map(|()| true)
    }

    /// Switches between fighter and caster.
    pub fn toggle_archetype(&self, world: &dyn World) -> Archetype {
        let previous = Archetype::from_u8(
            self.archetype
                .fetch_xor(Archetype::Caster.to_u8(), Ordering::Relaxed),
        );
        let archetype = previous.toggled();
        if self.is_active() {
            world.set_team(self.id, archetype.team());
        }
        world.notify(self.id, "Your class has been successfully changed.");
        self.recalculate_range(world);
        archetype
    }

    pub(crate) fn movement(&self) -> MutexGuard<'_, MovementController> {
        self.movement.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Hunter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hunter")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("archetype", &self.archetype())
            .field("active", &self.is_active())
            .field("remaining_minutes", &self.remaining_minutes())
            .field("loadout", &*self.loadout.load())
            .finish_non_exhaustive()
    }
}
