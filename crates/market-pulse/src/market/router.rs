use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::aggregator::MarketDataService;
use super::domain::{resolve_date_range, AddressSlug, DateRange, Period, QueryError, ZipCode};
use super::gateway::MarketDataGateway;

/// Body served when aggregation itself breaks; upstream detail stays in
/// the logs.
const AGGREGATION_FAILED: &str = "unexpected error aggregating market data";

/// Router exposing the two market data query endpoints.
pub fn market_data_router<G>(service: Arc<MarketDataService<G>>) -> Router
where
    G: MarketDataGateway + 'static,
{
    Router::new()
        .route("/api/market-data", get(zip_market_data_handler::<G>))
        .route(
            "/api/market-data-by-address",
            get(address_market_data_handler::<G>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ZipQueryParams {
    #[serde(default)]
    zipcode: Option<String>,
}

pub(crate) async fn zip_market_data_handler<G>(
    State(service): State<Arc<MarketDataService<G>>>,
    Query(params): Query<ZipQueryParams>,
) -> Response
where
    G: MarketDataGateway + 'static,
{
    let zip = match ZipCode::parse(params.zipcode.as_deref().unwrap_or_default()) {
        Ok(zip) => zip,
        Err(err) => {
            let body = json!({ "success": false, "error": err.to_string() });
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    match service.zip_market_data(zip.clone()).await {
        Ok(record) => {
            let body = json!({
                "success": true,
                "data": record,
                "zipcode": zip.as_str(),
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            error!(zipcode = zip.as_str(), %err, "zip aggregation failed");
            let body = json!({ "success": false, "error": AGGREGATION_FAILED });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AddressQueryParams {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
    #[serde(default)]
    period: Option<String>,
}

pub(crate) async fn address_market_data_handler<G>(
    State(service): State<Arc<MarketDataService<G>>>,
    Query(params): Query<AddressQueryParams>,
) -> Response
where
    G: MarketDataGateway + 'static,
{
    let today = Local::now().date_naive();
    let (slug, dates) = match resolve_address_query(&params, today) {
        Ok(resolved) => resolved,
        Err(err) => {
            let body = json!({ "error": err.to_string() });
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    match service.address_market_data(slug.clone(), dates).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => {
            error!(slug = slug.as_str(), %err, "address aggregation failed");
            let body = json!({ "error": AGGREGATION_FAILED });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// Validate the raw address query parameters into a slug plus an
/// effective date window. Nothing leaves this function until every
/// parameter checks out, so no upstream call is attempted on bad input.
fn resolve_address_query(
    params: &AddressQueryParams,
    today: NaiveDate,
) -> Result<(AddressSlug, DateRange), QueryError> {
    let slug = AddressSlug::parse(params.address.as_deref().unwrap_or_default())?;
    let period = params.period.as_deref().map(Period::parse).transpose()?;
    let start = params.start.as_deref().map(parse_date).transpose()?;
    let end = params.end.as_deref().map(parse_date).transpose()?;
    let dates = resolve_date_range(period, start, end, today)?;
    Ok((slug, dates))
}

fn parse_date(raw: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| QueryError::InvalidDate(raw.trim().to_string()))
}
