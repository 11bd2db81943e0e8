pub mod client;
pub mod collector;
pub mod models;
pub mod snapshot;

pub use client::{PriceClient, PriceSource};
pub use collector::{CollectionReport, CollectorSettings, SnapshotCollector};
pub use snapshot::{SnapshotArtifact, SnapshotWriter, cheapest_by_route, read_snapshot};

use common::config::Settings;
use common::{Error, Result};
use publisher::{PublishOutcome, Publisher};

/// Outcome of a full run: the collected snapshot and, when a publisher was
/// supplied, what publishing it did.
#[derive(Debug)]
pub struct RunSummary {
    pub report: CollectionReport,
    pub published: Option<PublishOutcome>,
}

/// Collects today's snapshot and hands it to `publisher`, if any.
///
/// Configuration problems fail before the first request. A publish failure
/// is returned after the snapshot is already on disk.
pub async fn run_snapshot_pipeline(
    settings: &Settings,
    publisher: Option<&dyn Publisher>,
) -> Result<RunSummary> {
    settings.validate()?;

    let collector_settings = CollectorSettings::from_settings(settings)?;
    let client = PriceClient::new(&settings.api)?;
    let collector = SnapshotCollector::new(client, collector_settings);

    let report = collector.run().await?;

    let published = match publisher {
        Some(publisher) => {
            let destination = settings
                .publisher
                .destination()
                .ok_or(Error::MissingSetting("publisher.repo"))?;
            Some(publisher.publish(&report.artifact.path, destination).await?)
        }
        None => None,
    };

    Ok(RunSummary { report, published })
}
