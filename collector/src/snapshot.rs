//! CSV snapshot artifacts, one file per collection day.

use chrono::NaiveDate;
use common::Result;
use csv::{Writer, WriterBuilder};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::models::{AirportCode, PriceQuote, SNAPSHOT_HEADER};

/// Deterministic file name of the snapshot taken on `search_date`.
pub fn snapshot_file_name(prefix: &str, search_date: NaiveDate) -> String {
    format!("{}_{}.csv", prefix, search_date.format("%Y-%m-%d"))
}

/// A finished snapshot file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotArtifact {
    pub path: PathBuf,
    pub search_date: NaiveDate,
    pub rows: usize,
}

impl SnapshotArtifact {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Appends rows to the run's CSV file. The header is on disk as soon as the
/// writer is created, and `flush` makes everything appended so far durable.
pub struct SnapshotWriter {
    writer: Writer<File>,
    path: PathBuf,
    search_date: NaiveDate,
    rows: usize,
}

impl SnapshotWriter {
    pub fn create(output_dir: &Path, prefix: &str, search_date: NaiveDate) -> Result<Self> {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(snapshot_file_name(prefix, search_date));

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        writer.write_record(SNAPSHOT_HEADER)?;
        writer.flush()?;

        tracing::info!(path = %path.display(), "Snapshot file created");

        Ok(Self {
            writer,
            path,
            search_date,
            rows: 0,
        })
    }

    pub fn append(&mut self, quote: &PriceQuote) -> Result<()> {
        self.writer.serialize(quote)?;
        self.rows += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn finish(mut self) -> Result<SnapshotArtifact> {
        self.writer.flush()?;
        tracing::info!(path = %self.path.display(), rows = self.rows, "Snapshot finalized");

        Ok(SnapshotArtifact {
            path: self.path,
            search_date: self.search_date,
            rows: self.rows,
        })
    }
}

/// Reads a snapshot file back into quotes.
pub fn read_snapshot(path: &Path) -> Result<Vec<PriceQuote>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut quotes = Vec::new();

    for row in reader.deserialize::<PriceQuote>() {
        quotes.push(row?);
    }

    Ok(quotes)
}

/// Lowest quote per (origin, destination), ordered by route. On a price tie
/// the earlier row wins.
pub fn cheapest_by_route(
    quotes: &[PriceQuote],
) -> BTreeMap<(AirportCode, AirportCode), &PriceQuote> {
    let mut cheapest: BTreeMap<(AirportCode, AirportCode), &PriceQuote> = BTreeMap::new();
    for quote in quotes {
        cheapest
            .entry((quote.origin, quote.destination))
            .and_modify(|best| {
                if quote.price < best.price {
                    *best = quote;
                }
            })
            .or_insert(quote);
    }
    cheapest
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn quote(origin: &str, destination: &str, depart: &str, price: &str) -> PriceQuote {
        PriceQuote {
            origin: origin.parse().unwrap(),
            destination: destination.parse().unwrap(),
            search_date: date("2025-01-01"),
            depart_date: date(depart),
            price: Decimal::from_str(price).unwrap(),
        }
    }

    #[test]
    fn test_file_name_is_keyed_by_date() {
        assert_eq!(
            snapshot_file_name("flight_prices", date("2025-01-01")),
            "flight_prices_2025-01-01.csv"
        );
    }

    #[test]
    fn test_header_only_snapshot() {
        let dir = tempdir().unwrap();
        let writer =
            SnapshotWriter::create(dir.path(), "flight_prices", date("2025-01-01")).unwrap();
        let artifact = writer.finish().unwrap();

        assert_eq!(artifact.rows, 0);
        assert_eq!(artifact.file_name(), "flight_prices_2025-01-01.csv");

        let contents = fs::read_to_string(&artifact.path).unwrap();
        assert_eq!(contents, "origin,destination,search_date,depart_date,price\n");
        assert!(read_snapshot(&artifact.path).unwrap().is_empty());
    }

    #[test]
    fn test_rows_are_on_disk_after_flush() {
        let dir = tempdir().unwrap();
        let mut writer =
            SnapshotWriter::create(dir.path(), "flight_prices", date("2025-01-01")).unwrap();

        writer.append(&quote("NYC", "LHR", "2025-03-01", "450")).unwrap();
        writer.flush().unwrap();

        // Not finished yet: the partial file must already be readable.
        let contents = fs::read_to_string(writer.path()).unwrap();
        assert_eq!(
            contents,
            "origin,destination,search_date,depart_date,price\nNYC,LHR,2025-01-01,2025-03-01,450\n"
        );
    }

    #[test]
    fn test_written_rows_read_back_unchanged() {
        let dir = tempdir().unwrap();
        let mut writer =
            SnapshotWriter::create(&dir.path().join("nested/out"), "prices", date("2025-01-01"))
                .unwrap();

        let quotes = vec![
            quote("NYC", "LHR", "2025-03-01", "450"),
            quote("LHR", "NYC", "2025-02-14", "399.99"),
            quote("DXB", "SIN", "2025-01-01", "0"),
        ];
        for q in &quotes {
            writer.append(q).unwrap();
        }
        let artifact = writer.finish().unwrap();

        assert_eq!(artifact.rows, 3);
        assert_eq!(read_snapshot(&artifact.path).unwrap(), quotes);
    }

    #[test]
    fn test_cheapest_quote_per_route() {
        let quotes = vec![
            quote("NYC", "LHR", "2025-03-01", "450"),
            quote("LHR", "NYC", "2025-02-14", "399.99"),
            quote("NYC", "LHR", "2025-03-08", "410.50"),
            quote("NYC", "LHR", "2025-03-15", "410.50"),
            quote("LHR", "NYC", "2025-02-21", "520"),
        ];

        let cheapest = cheapest_by_route(&quotes);
        let routes: Vec<_> = cheapest
            .iter()
            .map(|((o, d), q)| (o.as_str(), d.as_str(), q.depart_date))
            .collect();

        assert_eq!(
            routes,
            vec![
                ("LHR", "NYC", date("2025-02-14")),
                ("NYC", "LHR", date("2025-03-08")),
            ]
        );
        assert!(cheapest_by_route(&[]).is_empty());
    }

    #[test]
    fn test_create_truncates_previous_run_of_same_day() {
        let dir = tempdir().unwrap();

        let mut first =
            SnapshotWriter::create(dir.path(), "flight_prices", date("2025-01-01")).unwrap();
        first.append(&quote("NYC", "LHR", "2025-03-01", "450")).unwrap();
        first.finish().unwrap();

        let second = SnapshotWriter::create(dir.path(), "flight_prices", date("2025-01-01"))
            .unwrap()
            .finish()
            .unwrap();

        assert!(read_snapshot(&second.path).unwrap().is_empty());
    }
}
