//! Market data aggregation: fan out one authenticated fetch per registered
//! HouseCanary endpoint, unwrap each envelope, and merge the survivors into
//! a single flat record.

pub mod aggregator;
pub mod client;
pub mod domain;
pub mod gateway;
pub(crate) mod normalizer;
pub mod registry;
pub mod router;

#[cfg(test)]
mod tests;

pub use aggregator::{AggregationError, MarketDataService};
pub use client::HouseCanaryClient;
pub use domain::{
    resolve_date_range, AddressSlug, DateRange, MarketLocation, MarketQuery, NormalizedRecord,
    Period, QueryError, ZipCode,
};
pub use gateway::{FetchError, FetchOutcome, MarketDataGateway};
pub use registry::{EndpointSpec, MarketCategory, ADDRESS_REGISTRY, ZIP_REGISTRY};
pub use router::market_data_router;
