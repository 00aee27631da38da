//! Player command surface.
//!
//! The host's chat or bypass handler passes the raw text of an `autofarm`
//! command to [`CommandDispatcher::dispatch`], which applies it to the
//! player's hunter and answers with the [`Reply`] view to show. Rendering is
//! left to the host.

mod dispatcher;
mod skills;

use autofarm_core::{FarmConfig, SkillId};
use thiserror::Error;

use crate::hunter::{BehaviorFlags, EditField, StartError};
use crate::repository::RepositoryError;

pub use dispatcher::{CommandDispatcher, Reply};
pub use skills::{SKILLS_PER_PAGE, SkillPage, skill_page};

/// Keyword every command starts with.
pub const COMMAND_PREFIX: &str = "autofarm";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("`{command}` is missing its {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("`{0}` is not a valid number")]
    InvalidNumber(String),

    #[error("unknown setting `{0}`")]
    UnknownField(String),

    #[error("You did not have available auto farm time.")]
    NoTime,

    #[error("You have reached the limit of {} skills.", FarmConfig::MAX_SLOTS)]
    LoadoutFull,

    #[error("This skill is already in use.")]
    SkillAlreadyLoaded,

    #[error("skill {0} cannot be used by the auto farm")]
    UnknownSkill(SkillId),

    #[error("There is no auto farm pack of {0} hours.")]
    UnknownTimePack(u32),

    #[error("The time could not be added, try again later.")]
    PurchaseFailed(#[source] RepositoryError),

    #[error(transparent)]
    Refused(#[from] StartError),
}

impl CommandError {
    /// Text shown to the player, if the failure warrants one. Malformed
    /// input gets none; the index view is simply shown again.
    pub fn notice(&self) -> Option<String> {
        match self {
            Self::NoTime
            | Self::LoadoutFull
            | Self::SkillAlreadyLoaded
            | Self::UnknownTimePack(_)
            | Self::PurchaseFailed(_) => Some(self.to_string()),
            // refused starts are announced by the hunter itself
            _ => None,
        }
    }
}

/// Target of `autofarm edit`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditTarget {
    /// Numeric setting; the value arrives later through `save`.
    Field(EditField),
    /// Boolean behaviour, toggled immediately.
    Flag(BehaviorFlags),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FarmCommand {
    /// Bare `autofarm`: opens the feature and abandons any pending edit.
    Open,
    Index,
    /// Start or stop farming.
    ToggleState,
    /// Fighter/caster switch.
    SwitchArchetype,
    /// Without hours, asks for the purchase view.
    BuyTime { hours: Option<u32> },
    Edit(EditTarget),
    Save { field: EditField, value: i64 },
    Skills { page: usize },
    Page { page: usize, current: usize },
    Select { skill: SkillId, page: usize },
    Remove { slot: usize },
}

impl FarmCommand {
    /// Parses `autofarm <command> [args..]`. The leading keyword is optional
    /// and matching is case-insensitive.
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let mut words = text.split_whitespace().peekable();
        if words.peek().is_none() {
            return Err(CommandError::Empty);
        }
        if words
            .peek()
            .is_some_and(|word| word.eq_ignore_ascii_case(COMMAND_PREFIX))
        {
            words.next();
        }

        let Some(command) = words.next() else {
            return Ok(Self::Open);
        };
        let command = command.to_ascii_lowercase();
        let mut arg = |argument: &'static str, command: &'static str| {
            words
                .next()
                .ok_or(CommandError::MissingArgument { command, argument })
        };

        let parsed = match command.as_str() {
            "index" => Self::Index,
            "state" => Self::ToggleState,
            "switch" => Self::SwitchArchetype,
            "buytime" => match arg("hours", "buytime") {
                Ok(hours) => Self::BuyTime {
                    hours: Some(number(hours)?),
                },
                Err(_) => Self::BuyTime { hours: None },
            },
            "edit" => Self::Edit(edit_target(arg("setting", "edit")?)?),
            "save" => {
                let field = arg("setting", "save")?;
                let value = arg("value", "save")?;
                let field = field
                    .parse::<EditField>()
                    .map_err(|_| CommandError::UnknownField(field.to_owned()))?;
                Self::Save {
                    field,
                    value: number(value)?,
                }
            }
            "skills" => Self::Skills {
                page: number(arg("page", "skills")?)?,
            },
            "page" => Self::Page {
                page: number(arg("page", "page")?)?,
                current: number(arg("current page", "page")?)?,
            },
            "select" => Self::Select {
                skill: SkillId(number(arg("skill", "select")?)?),
                page: number(arg("page", "select")?)?,
            },
            "remove" => Self::Remove {
                slot: number(arg("slot", "remove")?)?,
            },
            other => return Err(CommandError::UnknownCommand(other.to_owned())),
        };
        Ok(parsed)
    }
}

fn number<T: std::str::FromStr>(raw: &str) -> Result<T, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::InvalidNumber(raw.to_owned()))
}

fn edit_target(raw: &str) -> Result<EditTarget, CommandError> {
    if let Ok(field) = raw.parse::<EditField>() {
        return Ok(EditTarget::Field(field));
    }
    BehaviorFlags::from_command_name(raw)
        .map(EditTarget::Flag)
        .ok_or_else(|| CommandError::UnknownField(raw.to_owned()))
}
