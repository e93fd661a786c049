use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::debug;

use super::domain::{AddressSlug, DateRange, MarketLocation, MarketQuery, NormalizedRecord, ZipCode};
use super::gateway::MarketDataGateway;
use super::normalizer;
use super::registry::{EndpointSpec, ADDRESS_REGISTRY, ZIP_REGISTRY};

/// Failure of the aggregation machinery itself. Upstream failures never
/// produce this; only a panicked or cancelled fetch task does.
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error("market data task failed to complete: {0}")]
    Join(String),
}

/// Fans out one fetch task per registered category and merges whatever
/// survives normalization into a single record.
#[derive(Debug)]
pub struct MarketDataService<G> {
    gateway: Arc<G>,
}

impl<G> MarketDataService<G>
where
    G: MarketDataGateway + 'static,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Aggregate every ZIP category for one ZIP code.
    pub async fn zip_market_data(&self, zip: ZipCode) -> Result<NormalizedRecord, AggregationError> {
        let query = MarketQuery {
            location: MarketLocation::Zip(zip),
            dates: None,
        };
        self.aggregate(ZIP_REGISTRY, query).await
    }

    /// Aggregate every address category for one slug over the given window.
    pub async fn address_market_data(
        &self,
        slug: AddressSlug,
        dates: DateRange,
    ) -> Result<NormalizedRecord, AggregationError> {
        let query = MarketQuery {
            location: MarketLocation::Address(slug),
            dates: Some(dates),
        };
        self.aggregate(ADDRESS_REGISTRY, query).await
    }

    async fn aggregate(
        &self,
        registry: &'static [EndpointSpec],
        query: MarketQuery,
    ) -> Result<NormalizedRecord, AggregationError> {
        let query = Arc::new(query);
        let mut tasks = JoinSet::new();

        for spec in registry {
            let gateway = Arc::clone(&self.gateway);
            let query = Arc::clone(&query);
            tasks.spawn(async move {
                let outcome = gateway.fetch(spec, &query).await;
                (spec, outcome)
            });
        }

        // Every task gets joined, however the individual fetches end; a
        // join failure aborts whatever is still in flight when `tasks`
        // drops.
        let mut record = NormalizedRecord::new();
        while let Some(joined) = tasks.join_next().await {
            let (spec, outcome) = joined.map_err(|err| AggregationError::Join(err.to_string()))?;
            let contribution = normalizer::normalize(spec, outcome);
            debug!(
                category = spec.category.key(),
                fields = contribution.len(),
                "category resolved"
            );
            record.merge(contribution);
        }

        Ok(record)
    }
}
