use chrono::{DateTime, Days, NaiveDate};
use common::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::airport::AirportCode;

/// Column order of every snapshot file.
pub const SNAPSHOT_HEADER: [&str; 5] = [
    "origin",
    "destination",
    "search_date",
    "depart_date",
    "price",
];

/// One snapshot row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub origin: AirportCode,
    pub destination: AirportCode,
    pub search_date: NaiveDate,
    pub depart_date: NaiveDate,
    pub price: Decimal,
}

impl PriceQuote {
    pub fn within_horizon(&self, cutoff: NaiveDate) -> bool {
        self.depart_date <= cutoff
    }
}

/// Last departure date that still belongs in a snapshot taken on `search_date`.
pub fn horizon_cutoff(search_date: NaiveDate, horizon_days: u32) -> NaiveDate {
    search_date
        .checked_add_days(Days::new(u64::from(horizon_days)))
        .unwrap_or(NaiveDate::MAX)
}

/// Parses the API's departure field: a bare `YYYY-MM-DD`, or an RFC 3339
/// timestamp where a trailing `Z` stands for `+00:00`. Timestamps keep the
/// calendar date of their own offset.
pub fn parse_depart_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }

    let normalized = match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        Some(stripped) => format!("{}+00:00", stripped),
        None => raw.to_string(),
    };

    DateTime::parse_from_rfc3339(&normalized)
        .map(|ts| ts.date_naive())
        .map_err(|_| Error::InvalidDate(raw.to_string()))
}
