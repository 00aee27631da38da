//! Persistence of hunter time budgets.
//!
//! Only the remaining minutes and the display name survive a restart. Live
//! settings and the loadout are rebuilt with defaults when a hunter is
//! rehydrated.

mod error;
mod file;
mod memory;
mod record;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileHunterRepository;
pub use memory::{InMemoryHunterRepository, RepositoryStats};
pub use record::HunterRecord;
pub use traits::HunterRepository;
