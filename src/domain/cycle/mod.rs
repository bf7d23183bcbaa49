//! Cycle module - the study cycle aggregate and its progress math.

mod aggregate;
mod progress;

pub use aggregate::{Cycle, CycleHistoryEntry, CycleItem};
pub use progress::{round1, CycleProgress, ItemProgress};
