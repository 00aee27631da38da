//! Background tasks that drive the registry.

mod scheduler;

pub use scheduler::Scheduler;
