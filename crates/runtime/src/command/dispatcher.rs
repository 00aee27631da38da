//! Applies parsed player commands to hunters.

use std::sync::Arc;

use autofarm_core::{EntityId, FarmConfig};
use tracing::debug;

use super::skills::{SkillPage, skill_page};
use super::{CommandError, EditTarget, FarmCommand};
use crate::hunter::{EditField, Hunter};
use crate::registry::HunterRegistry;

/// View the host should show after a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Index,
    Skills(SkillPage),
    BuyTime,
    /// Nothing changed; keep the current view.
    Unchanged,
}

pub struct CommandDispatcher {
    registry: Arc<HunterRegistry>,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<HunterRegistry>) -> Self {
        Self { registry }
    }

    /// Runs `text` for `player`. Failures are reported to the player when
    /// they warrant a notice and always fall back to the index view.
    pub fn dispatch(&self, player: EntityId, text: &str) -> Reply {
        match self.try_dispatch(player, text) {
            Ok(reply) => reply,
            Err(error) => {
                debug!(player = %player, %error, command = text, "command rejected");
                if let Some(notice) = error.notice() {
                    self.registry.world().notify(player, &notice);
                }
                Reply::Index
            }
        }
    }

    /// Like [`dispatch`](Self::dispatch) but hands the failure back. A
    /// rejected command leaves the hunter untouched.
    pub fn try_dispatch(&self, player: EntityId, text: &str) -> Result<Reply, CommandError> {
        let command = FarmCommand::parse(text)?;
        let hunter = self.registry.get_or_create(player);
        self.apply(&hunter, command)
    }

    fn apply(&self, hunter: &Hunter, command: FarmCommand) -> Result<Reply, CommandError> {
        let world = self.registry.world();

        match command {
            FarmCommand::Open => {
                hunter.reset_editing();
                Ok(Reply::Index)
            }
            FarmCommand::Index => Ok(Reply::Index),
            FarmCommand::ToggleState => {
                if !hunter.is_active() && hunter.remaining_minutes() == 0 {
                    return Err(CommandError::NoTime);
                }
                hunter.toggle_active(world)?;
                Ok(Reply::Index)
            }
            FarmCommand::SwitchArchetype => {
                hunter.toggle_archetype(world);
                Ok(Reply::Index)
            }
            FarmCommand::BuyTime { hours: None } => Ok(Reply::BuyTime),
            FarmCommand::BuyTime { hours: Some(hours) } => {
                if !FarmConfig::TIME_PACKS.contains(&hours) {
                    return Err(CommandError::UnknownTimePack(hours));
                }
                self.registry
                    .purchase_time(hunter, hours * 60)
                    .map_err(CommandError::PurchaseFailed)?;
                world.notify(hunter.id(), "The time was added successfully.");
                Ok(Reply::Index)
            }
            FarmCommand::Edit(EditTarget::Field(field)) => {
                hunter.begin_edit(field);
                Ok(Reply::Index)
            }
            FarmCommand::Edit(EditTarget::Flag(flag)) => {
                hunter.toggle_flag(flag);
                Ok(Reply::Index)
            }
            FarmCommand::Save { field, value } => {
                hunter.reset_editing();
                if let Ok(value @ 1..) = u32::try_from(value) {
                    match field {
                        EditField::Radius => hunter.set_radius(value),
                        EditField::Hp => hunter.set_min_hp(value),
                        EditField::Mp => hunter.set_min_mp(value),
                    }
                }
                Ok(Reply::Index)
            }
            FarmCommand::Skills { page } => Ok(Reply::Skills(skill_page(world, hunter, page))),
            FarmCommand::Page { page, current } if page == current => Ok(Reply::Unchanged),
            FarmCommand::Page { page, .. } => Ok(Reply::Skills(skill_page(world, hunter, page))),
            FarmCommand::Select { skill, page } => {
                let slot = hunter.first_empty_slot().ok_or(CommandError::LoadoutFull)?;
                if hunter.contains_skill(skill) {
                    return Err(CommandError::SkillAlreadyLoaded);
                }
                if !world
                    .skill(hunter.id(), skill)
                    .is_some_and(|info| info.is_farmable())
                {
                    return Err(CommandError::UnknownSkill(skill));
                }
                hunter.assign_skill(world, slot, skill);
                Ok(Reply::Skills(skill_page(world, hunter, page)))
            }
            FarmCommand::Remove { slot } => {
                hunter.remove_skill(world, slot);
                Ok(Reply::Index)
            }
        }
    }
}
