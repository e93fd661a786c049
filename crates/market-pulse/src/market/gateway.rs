use async_trait::async_trait;
use serde_json::Value;

use super::domain::MarketQuery;
use super::registry::EndpointSpec;

/// Result of fetching one category: the decoded body, or a contained
/// failure the aggregate absorbs.
pub type FetchOutcome = Result<Value, FetchError>;

/// Failure while reaching the upstream API for a single category.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("failed to build the upstream client: {0}")]
    Client(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected upstream status {0}")]
    Status(u16),
    #[error("response body is not valid JSON: {0}")]
    Decode(String),
}

/// Boundary for one authenticated GET against the upstream market data API.
///
/// Implementations must be cheap to share; the aggregator clones one
/// handle per in-flight category.
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    async fn fetch(&self, spec: &EndpointSpec, query: &MarketQuery) -> FetchOutcome;
}
