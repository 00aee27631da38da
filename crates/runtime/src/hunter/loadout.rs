//! Sparse slot → skill mapping used in combat.
//!
//! A [`Loadout`] is an immutable value once published. Hunters hold the
//! current one behind an [`arc_swap::ArcSwap`]; writers clone it, edit the
//! clone and swap the new snapshot in, so readers on the scheduler thread
//! never see a half-edited map.

use autofarm_core::{FarmConfig, SkillId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Loadout {
    slots: [Option<SkillId>; FarmConfig::MAX_SLOTS],
}

impl Loadout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skill in `slot`, or `None` for an empty or out-of-range slot.
    pub fn get(&self, slot: usize) -> Option<SkillId> {
        self.slots.get(slot).copied().flatten()
    }

    pub fn slot_of(&self, skill: SkillId) -> Option<usize> {
        self.slots.iter().position(|s| *s == Some(skill))
    }

    pub fn contains(&self, skill: SkillId) -> bool {
        self.slot_of(skill).is_some()
    }

    pub fn first_empty_slot(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Populated slots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, SkillId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, skill)| skill.map(|skill| (slot, skill)))
    }

    pub fn skills(&self) -> impl Iterator<Item = SkillId> + '_ {
        self.slots.iter().flatten().copied()
    }

    /// Puts `skill` in `slot`, returning the skill it replaced. Slots past
    /// [`FarmConfig::MAX_SLOTS`] are ignored.
    pub(crate) fn assign(&mut self, slot: usize, skill: SkillId) -> Option<SkillId> {
        self.slots.get_mut(slot).and_then(|s| s.replace(skill))
    }

    pub(crate) fn remove(&mut self, slot: usize) -> Option<SkillId> {
        self.slots.get_mut(slot).and_then(Option::take)
    }
}
