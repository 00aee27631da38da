//! In-memory repository implementations for testing and development.

mod hunter;

pub use hunter::{InMemoryHunterRepository, RepositoryStats};
