mod airport;
mod quote;
mod response;

pub use airport::{AirportCode, CityList};
pub use quote::{PriceQuote, SNAPSHOT_HEADER, horizon_cutoff, parse_depart_date};
pub use response::{PriceItem, PricesResponse};
