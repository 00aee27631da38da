//! World-facing vocabulary shared by the auto-farm runtime and its hosts.
//!
//! `autofarm-core` defines the identifiers, geometry, skill metadata and the
//! collaborator traits through which the decision engine observes and acts on
//! the game world. The engine itself lives in `autofarm-runtime`; game servers
//! implement [`WorldQuery`] and [`WorldCommand`] for their own actor model.
pub mod config;
pub mod skill;
pub mod types;
pub mod world;

#[cfg(feature = "sandbox")]
pub mod sandbox;

pub use config::FarmConfig;
pub use skill::{SkillCategory, SkillId, SkillInfo, SkillTarget};
pub use types::{EntityId, Position, Team};
pub use world::{HostileKind, Nearby, World, WorldCommand, WorldQuery};
