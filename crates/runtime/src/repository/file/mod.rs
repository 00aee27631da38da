//! File-based repository implementations.

mod hunter;

pub use hunter::FileHunterRepository;
