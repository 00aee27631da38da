//! Auto-farm engine: hunters, their decision routine and the tick driver.
//!
//! A host game server implements [`autofarm_core::World`] and hands it to a
//! [`HunterRegistry`]. Player commands reach hunters through
//! [`CommandDispatcher`]; a [`Scheduler`] ticks the registry at a fixed rate.
//!
//! Modules are organized by responsibility:
//! - [`hunter`] holds per-player session state and the decision routine
//! - [`movement`] tracks the leash and stuck engagements
//! - [`registry`] owns all hunters and runs ticks
//! - [`command`] parses and applies player commands
//! - [`repository`] persists time budgets
//! - [`config`] and [`logging`] carry process-level setup
pub mod command;
pub mod config;
pub mod error;
pub mod hunter;
pub mod logging;
pub mod movement;
pub mod registry;
pub mod repository;

mod workers;

pub use command::{CommandDispatcher, CommandError, FarmCommand, Reply, SkillPage};
pub use config::{LogConfig, RuntimeConfig};
pub use error::{Result, RuntimeError};
pub use hunter::{Archetype, BehaviorFlags, EditField, Hunter, Loadout, StartError};
pub use movement::{Homing, MovementController};
pub use registry::{HunterRegistry, TickReport};
pub use repository::{
    FileHunterRepository, HunterRecord, HunterRepository, InMemoryHunterRepository,
    RepositoryError, RepositoryStats,
};
pub use workers::Scheduler;
