//! Publishing finished snapshot files to an external store.

use async_trait::async_trait;
use common::Result;
use std::path::Path;

pub mod git;

pub use git::{GitPublisher, GitPublisherConfig};

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A new revision containing the file was recorded.
    Committed { commit: String },
    /// The store already holds an identical copy; nothing was recorded.
    Unchanged,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Durably records the file at `path` in `destination`.
    async fn publish(&self, path: &Path, destination: &str) -> Result<PublishOutcome>;
}
