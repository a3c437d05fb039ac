//! Bounded-history management for user contexts.

pub mod compaction;

pub use compaction::{CompactionConfig, HistoryCompactor};
