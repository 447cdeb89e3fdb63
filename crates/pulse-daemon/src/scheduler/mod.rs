mod cadence;
mod core;

pub use self::cadence::Cadence;
pub use self::core::{Scheduler, SchedulerStatus};

#[cfg(test)]
mod tests;
