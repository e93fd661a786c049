use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::config::UpstreamConfig;

use super::domain::MarketQuery;
use super::gateway::{FetchError, FetchOutcome, MarketDataGateway};
use super::registry::EndpointSpec;

/// Per-request ceiling; a stuck upstream must not hold a whole aggregate
/// open indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HouseCanary v2 API client. One `reqwest::Client` is built up front and
/// shared by every concurrent fetch; requests authenticate with HTTP basic
/// auth and are attempted exactly once.
#[derive(Clone)]
pub struct HouseCanaryClient {
    base_url: String,
    api_key: String,
    api_secret: String,
    http: Client,
}

impl HouseCanaryClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| FetchError::Client(err.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            http,
        })
    }

    fn endpoint_url(&self, spec: &EndpointSpec) -> String {
        format!("{}{}", self.base_url, spec.path)
    }
}

// Debug must not expose the credentials held inside.
impl fmt::Debug for HouseCanaryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HouseCanaryClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MarketDataGateway for HouseCanaryClient {
    async fn fetch(&self, spec: &EndpointSpec, query: &MarketQuery) -> FetchOutcome {
        let url = self.endpoint_url(spec);
        debug!(category = spec.category.key(), %url, "requesting market data");

        let mut request = self
            .http
            .get(&url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .query(&[(query.location.param(), query.location.value())]);

        if spec.requires_date_range {
            if let Some(range) = &query.dates {
                request = request.query(&[
                    ("start", range.start.format("%Y-%m-%d").to_string()),
                    ("end", range.end.format("%Y-%m-%d").to_string()),
                ]);
            }
        }

        let response = request
            .send()
            .await
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| FetchError::Decode(err.to_string()))
    }
}
