//! HTTP client for the latest-prices endpoint.

use async_trait::async_trait;
use common::config::ApiConfig;
use common::{Error, Result};
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use url::Url;

use crate::models::{AirportCode, PricesResponse};

/// Where the collector gets its prices from.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn latest_prices(
        &self,
        origin: AirportCode,
        destination: AirportCode,
    ) -> Result<PricesResponse>;
}

/// Query parameters that are the same for every pair of a run.
#[derive(Debug, Clone)]
struct QueryDefaults {
    currency: String,
    market: String,
    period_type: String,
    beginning_of_period: Option<String>,
    one_way: bool,
}

impl QueryDefaults {
    fn from_config(config: &ApiConfig) -> Self {
        Self {
            currency: config.currency.clone(),
            market: config.market.clone(),
            period_type: config.period_type.clone(),
            beginning_of_period: config.beginning_of_period.clone(),
            one_way: config.one_way,
        }
    }
}

pub struct PriceClient {
    client: Client,
    endpoint: Url,
    token: String,
    query: QueryDefaults,
}

impl PriceClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let token = config
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(Error::MissingSetting("api.token"))?
            .to_string();

        let endpoint = Url::parse(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidInput(format!("header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::InvalidInput(format!("header value for '{}': {}", name, e)))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            token,
            query: QueryDefaults::from_config(config),
        })
    }

    /// Full request URL for one pair, token included.
    pub fn request_url(&self, origin: AirportCode, destination: AirportCode) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("origin", origin.as_str())
                .append_pair("destination", destination.as_str())
                .append_pair("currency", &self.query.currency)
                .append_pair("market", &self.query.market)
                .append_pair("period_type", &self.query.period_type)
                .append_pair("one_way", if self.query.one_way { "true" } else { "false" });

            if let Some(ref beginning) = self.query.beginning_of_period {
                pairs.append_pair("beginning_of_period", beginning);
            }

            pairs.append_pair("token", &self.token);
        }
        url
    }
}

#[async_trait]
impl PriceSource for PriceClient {
    async fn latest_prices(
        &self,
        origin: AirportCode,
        destination: AirportCode,
    ) -> Result<PricesResponse> {
        let url = self.request_url(origin, destination);

        tracing::debug!(
            %origin,
            %destination,
            endpoint = %self.endpoint,
            "Requesting latest prices"
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                endpoint: self.endpoint.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;
        Ok(serde_json::from_slice(&body)?)
    }
}
