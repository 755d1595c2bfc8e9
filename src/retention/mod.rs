//! Age-based retention for the synced collections.
//!
//! A sweep deletes every record whose write timestamp is strictly older than
//! the cutoff, as one atomic batch. It runs on demand (`POST /cleanup-articles`,
//! the `sweep` command) and, when enabled, from a periodic background worker.

mod sweeper;
mod worker;

use serde::Serialize;
pub use sweeper::{RetentionSweeper, SweepResult};
pub use worker::start_retention_worker;

/// A swept collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Emails,
    Articles,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Emails => "emails",
            Collection::Articles => "articles",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
