use serde_json::{Map, Value};

use super::normalizer;

/// One logical class of market data served by a dedicated upstream endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketCategory {
    Details,
    Rental,
    Grade,
    RpiForecast,
    RpiHistorical,
    RpiTsForecast,
    RpiTsHistorical,
}

impl MarketCategory {
    /// Stable key used in logs and as the record field for whole-payload
    /// categories.
    pub const fn key(self) -> &'static str {
        match self {
            MarketCategory::Details => "details",
            MarketCategory::Rental => "rental",
            MarketCategory::Grade => "grade",
            MarketCategory::RpiForecast => "rpi_forecast",
            MarketCategory::RpiHistorical => "rpi_historical",
            MarketCategory::RpiTsForecast => "rpi_ts_forecast",
            MarketCategory::RpiTsHistorical => "rpi_ts_historical",
        }
    }
}

/// Builds a category's record contribution from the unwrapped `result`
/// payload. Projections only copy fields that are actually present.
pub type Projection = fn(MarketCategory, &Value) -> Map<String, Value>;

/// Static description of one upstream endpoint.
#[derive(Debug, Clone, Copy)]
pub struct EndpointSpec {
    pub category: MarketCategory,
    pub path: &'static str,
    pub requires_date_range: bool,
    pub project: Projection,
}

impl EndpointSpec {
    /// Key under which the upstream envelope nests this endpoint's entry:
    /// the request path minus its leading slash.
    pub fn envelope_key(&self) -> &'static str {
        let path: &'static str = self.path;
        path.trim_start_matches('/')
    }
}

/// Endpoints consulted for a ZIP code query, one task each.
pub const ZIP_REGISTRY: &[EndpointSpec] = &[
    EndpointSpec {
        category: MarketCategory::Details,
        path: "/zip/details",
        requires_date_range: false,
        project: normalizer::project_details,
    },
    EndpointSpec {
        category: MarketCategory::Rental,
        path: "/zip/hcri",
        requires_date_range: false,
        project: normalizer::project_rental,
    },
    EndpointSpec {
        category: MarketCategory::Grade,
        path: "/zip/market_grade",
        requires_date_range: false,
        project: normalizer::project_grade,
    },
];

/// Endpoints consulted for an address query, one task each.
pub const ADDRESS_REGISTRY: &[EndpointSpec] = &[
    EndpointSpec {
        category: MarketCategory::RpiForecast,
        path: "/address/rpi_forecast",
        requires_date_range: false,
        project: normalizer::project_whole_result,
    },
    EndpointSpec {
        category: MarketCategory::RpiHistorical,
        path: "/address/rpi_historical",
        requires_date_range: false,
        project: normalizer::project_whole_result,
    },
    EndpointSpec {
        category: MarketCategory::RpiTsForecast,
        path: "/address/rpi_ts_forecast",
        requires_date_range: true,
        project: normalizer::project_whole_result,
    },
    EndpointSpec {
        category: MarketCategory::RpiTsHistorical,
        path: "/address/rpi_ts_historical",
        requires_date_range: true,
        project: normalizer::project_whole_result,
    },
];
