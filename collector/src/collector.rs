//! Snapshot collection: one pass over every ordered city pair.

use chrono::{Local, NaiveDate};
use common::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::client::PriceSource;
use crate::models::{
    AirportCode, CityList, PriceItem, PriceQuote, horizon_cutoff, parse_depart_date,
};
use crate::snapshot::{SnapshotArtifact, SnapshotWriter};

/// Everything a run needs besides the price source. Built once at startup.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub cities: CityList,
    pub horizon_days: u32,
    pub output_dir: PathBuf,
    pub file_prefix: String,
    /// Pause after each pair; zero disables it.
    pub request_delay: Duration,
}

impl CollectorSettings {
    pub fn from_settings(settings: &common::config::Settings) -> Result<Self> {
        Ok(Self {
            cities: CityList::from_codes(settings.cities.codes.as_slice())?,
            horizon_days: settings.collector.horizon_days,
            output_dir: settings.collector.output_dir.clone(),
            file_prefix: settings.collector.file_prefix.clone(),
            request_delay: Duration::from_millis(settings.api.request_delay_ms),
        })
    }
}

/// What happened during one run.
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub artifact: SnapshotArtifact,
    pub pairs_attempted: usize,
    pub pairs_with_data: usize,
    pub pairs_without_data: usize,
    pub pairs_failed: usize,
    pub items_invalid: usize,
    pub items_beyond_horizon: usize,
    pub elapsed: Duration,
}

impl CollectionReport {
    pub fn rows_written(&self) -> usize {
        self.artifact.rows
    }
}

#[derive(Debug, Default)]
struct PairOutcome {
    quotes: Vec<PriceQuote>,
    invalid: usize,
    beyond_horizon: usize,
}

pub struct SnapshotCollector<S> {
    source: S,
    settings: CollectorSettings,
}

impl<S: PriceSource> SnapshotCollector<S> {
    pub fn new(source: S, settings: CollectorSettings) -> Self {
        Self { source, settings }
    }

    /// Collects today's snapshot.
    pub async fn run(&self) -> Result<CollectionReport> {
        self.collect(Local::now().date_naive()).await
    }

    /// Collects the snapshot keyed by `search_date`. Only failures of the
    /// snapshot file itself are returned; per-pair and per-item problems are
    /// logged, counted and skipped.
    pub async fn collect(&self, search_date: NaiveDate) -> Result<CollectionReport> {
        let started = Instant::now();
        let cutoff = horizon_cutoff(search_date, self.settings.horizon_days);
        let total_pairs = self.settings.cities.pair_count();

        tracing::info!(
            %search_date,
            %cutoff,
            cities = self.settings.cities.len(),
            pairs = total_pairs,
            "Starting snapshot collection"
        );

        let mut writer = SnapshotWriter::create(
            &self.settings.output_dir,
            &self.settings.file_prefix,
            search_date,
        )?;

        let mut pairs_attempted = 0;
        let mut pairs_with_data = 0;
        let mut pairs_without_data = 0;
        let mut pairs_failed = 0;
        let mut items_invalid = 0;
        let mut items_beyond_horizon = 0;

        for (origin, destination) in self.settings.cities.pairs() {
            if pairs_attempted > 0 && !self.settings.request_delay.is_zero() {
                sleep(self.settings.request_delay).await;
            }
            pairs_attempted += 1;

            tracing::debug!(
                %origin,
                %destination,
                pair = pairs_attempted,
                of = total_pairs,
                "Querying"
            );

            let response = match self.source.latest_prices(origin, destination).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(
                        %origin,
                        %destination,
                        error = %e,
                        "Price request failed, skipping pair"
                    );
                    pairs_failed += 1;
                    continue;
                }
            };

            if !response.has_data() {
                tracing::info!(
                    %origin,
                    %destination,
                    success = response.success,
                    api_error = response.error.as_deref().unwrap_or(""),
                    "No price data"
                );
                pairs_without_data += 1;
                continue;
            }

            pairs_with_data += 1;
            let outcome = quotes_for_pair(origin, destination, search_date, cutoff, &response.data);
            items_invalid += outcome.invalid;
            items_beyond_horizon += outcome.beyond_horizon;

            for quote in &outcome.quotes {
                writer.append(quote)?;
            }
            writer.flush()?;

            tracing::info!(
                %origin,
                %destination,
                rows = outcome.quotes.len(),
                received = response.data.len(),
                "Pair collected"
            );
        }

        let artifact = writer.finish()?;
        let report = CollectionReport {
            artifact,
            pairs_attempted,
            pairs_with_data,
            pairs_without_data,
            pairs_failed,
            items_invalid,
            items_beyond_horizon,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            rows = report.rows_written(),
            pairs = report.pairs_attempted,
            with_data = report.pairs_with_data,
            without_data = report.pairs_without_data,
            failed = report.pairs_failed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Snapshot collection finished"
        );

        Ok(report)
    }
}

/// Turns one response's items into rows. Items with an unusable date or
/// price are skipped individually; items past `cutoff` are dropped. Several
/// items for the same departure date collapse into one row with the lowest
/// price, at the position of the first of them.
fn quotes_for_pair(
    origin: AirportCode,
    destination: AirportCode,
    search_date: NaiveDate,
    cutoff: NaiveDate,
    items: &[PriceItem],
) -> PairOutcome {
    let mut outcome = PairOutcome::default();
    let mut by_date: HashMap<NaiveDate, usize> = HashMap::new();

    for item in items {
        let Some(raw_date) = item.depart_date.as_deref() else {
            tracing::warn!(%origin, %destination, "Item without depart_date, skipping");
            outcome.invalid += 1;
            continue;
        };

        let depart_date = match parse_depart_date(raw_date) {
            Ok(date) => date,
            Err(e) => {
                tracing::warn!(
                    %origin,
                    %destination,
                    error = %e,
                    "Unparsable depart_date, skipping item"
                );
                outcome.invalid += 1;
                continue;
            }
        };

        let price = match item.value {
            Some(value) if !value.is_sign_negative() => value,
            other => {
                tracing::warn!(
                    %origin,
                    %destination,
                    %depart_date,
                    value = ?other,
                    "Missing or negative price, skipping item"
                );
                outcome.invalid += 1;
                continue;
            }
        };

        let quote = PriceQuote {
            origin,
            destination,
            search_date,
            depart_date,
            price,
        };

        if !quote.within_horizon(cutoff) {
            outcome.beyond_horizon += 1;
            continue;
        }

        match by_date.get(&depart_date) {
            Some(&index) => {
                let existing = &mut outcome.quotes[index];
                if quote.price < existing.price {
                    existing.price = quote.price;
                }
            }
            None => {
                by_date.insert(depart_date, outcome.quotes.len());
                outcome.quotes.push(quote);
            }
        }
    }

    outcome
}
