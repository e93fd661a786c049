use serde_json::{Map, Value};
use tracing::warn;

use super::gateway::FetchOutcome;
use super::registry::{EndpointSpec, MarketCategory};

/// Success sentinel carried in the envelope's `api_code` field.
const API_CODE_OK: i64 = 0;

/// Rejected upstream envelope. Each variant names the validation layer
/// that failed, so log lines point at the exact shape violation.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub(crate) enum ShapeError {
    #[error("body is not a JSON array")]
    NotAnArray,
    #[error("body array is empty")]
    EmptyBody,
    #[error("first element is not an object")]
    ElementNotObject,
    #[error("envelope key '{0}' is missing")]
    MissingEnvelopeKey(&'static str),
    #[error("envelope entry is not an object")]
    EntryNotObject,
    #[error("api_code is missing or not an integer")]
    MissingApiCode,
    #[error("upstream reported api_code {code}: {description}")]
    FailureCode { code: i64, description: String },
    #[error("result payload is missing")]
    MissingResult,
}

/// Reduce one fetch outcome to the category's record contribution.
///
/// Any failure, transport or shape, is logged and absorbed into an empty
/// contribution; the merged record simply omits the category.
pub(crate) fn normalize(spec: &EndpointSpec, outcome: FetchOutcome) -> Map<String, Value> {
    let body = match outcome {
        Ok(body) => body,
        Err(error) => {
            warn!(category = spec.category.key(), %error, "market data fetch failed");
            return Map::new();
        }
    };

    match unwrap_envelope(spec, &body) {
        Ok(result) => (spec.project)(spec.category, result),
        Err(error) => {
            warn!(
                category = spec.category.key(),
                %error,
                "discarding malformed upstream envelope"
            );
            Map::new()
        }
    }
}

/// Walk the HouseCanary envelope down to the `result` payload.
///
/// Expected shape: a non-empty array whose first element is an object
/// keyed by the endpoint path (minus its leading slash); that entry holds
/// an integer `api_code` and, on success, the `result` payload.
fn unwrap_envelope<'a>(spec: &EndpointSpec, body: &'a Value) -> Result<&'a Value, ShapeError> {
    let items = body.as_array().ok_or(ShapeError::NotAnArray)?;
    let first = items.first().ok_or(ShapeError::EmptyBody)?;
    let element = first.as_object().ok_or(ShapeError::ElementNotObject)?;

    let entry = element
        .get(spec.envelope_key())
        .ok_or(ShapeError::MissingEnvelopeKey(spec.envelope_key()))?
        .as_object()
        .ok_or(ShapeError::EntryNotObject)?;

    let code = entry
        .get("api_code")
        .and_then(Value::as_i64)
        .ok_or(ShapeError::MissingApiCode)?;
    if code != API_CODE_OK {
        let description = entry
            .get("api_code_description")
            .and_then(Value::as_str)
            .unwrap_or("no description provided")
            .to_string();
        return Err(ShapeError::FailureCode { code, description });
    }

    entry.get("result").ok_or(ShapeError::MissingResult)
}

pub(crate) fn project_details(_category: MarketCategory, result: &Value) -> Map<String, Value> {
    let mut fields = Map::new();
    for segment in ["single_family", "multi_family"] {
        if let Some(value) = result.get(segment) {
            fields.insert(segment.to_string(), value.clone());
        }
    }
    fields
}

pub(crate) fn project_rental(_category: MarketCategory, result: &Value) -> Map<String, Value> {
    let mut stats = Map::new();
    for field in ["average", "median", "count"] {
        if let Some(value) = result.get(field) {
            stats.insert(field.to_string(), value.clone());
        }
    }

    let mut fields = Map::new();
    if !stats.is_empty() {
        fields.insert("rental".to_string(), Value::Object(stats));
    }
    fields
}

pub(crate) fn project_grade(_category: MarketCategory, result: &Value) -> Map<String, Value> {
    let mut fields = Map::new();
    if let Some(grade) = result.get("market_grade") {
        fields.insert("market_grade".to_string(), grade.clone());
    }
    fields
}

/// Retain the whole `result` payload under the category's own key; the
/// rental price index endpoints have no stable sub-schema worth picking
/// apart.
pub(crate) fn project_whole_result(category: MarketCategory, result: &Value) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(category.key().to_string(), result.clone());
    fields
}
