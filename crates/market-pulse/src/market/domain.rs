use chrono::{Duration, NaiveDate};
use serde::Serialize;
use serde_json::{Map, Value};

/// Validated 5-digit ZIP code accepted by the ZIP endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ZipCode(String);

impl ZipCode {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QueryError::MissingZipcode);
        }
        if trimmed.len() != 5 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(QueryError::InvalidZipcode);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Street address reduced to the hyphenated slug the upstream expects.
///
/// Whitespace runs become single hyphens and anything outside
/// `[A-Za-z0-9-]` is dropped; letter case is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AddressSlug(String);

impl AddressSlug {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        if raw.trim().is_empty() {
            return Err(QueryError::MissingAddress);
        }
        let slug: String = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        if !slug.bytes().any(|b| b.is_ascii_alphanumeric()) {
            return Err(QueryError::InvalidAddress);
        }
        Ok(Self(slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Where a query points: one ZIP code or one address slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketLocation {
    Zip(ZipCode),
    Address(AddressSlug),
}

impl MarketLocation {
    /// Upstream query parameter carrying the location value.
    pub const fn param(&self) -> &'static str {
        match self {
            MarketLocation::Zip(_) => "zipcode",
            MarketLocation::Address(_) => "slug",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            MarketLocation::Zip(zip) => zip.as_str(),
            MarketLocation::Address(slug) => slug.as_str(),
        }
    }
}

/// Inclusive date window forwarded to time-series endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Named lookback window ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    OneYear,
    FiveYears,
    TenYears,
    All,
}

impl Period {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "1Y" => Ok(Self::OneYear),
            "5Y" => Ok(Self::FiveYears),
            "10Y" => Ok(Self::TenYears),
            "ALL" => Ok(Self::All),
            _ => Err(QueryError::UnknownPeriod(raw.trim().to_string())),
        }
    }

    const fn lookback_days(self) -> i64 {
        match self {
            Period::OneYear => 365,
            Period::FiveYears => 1825,
            Period::TenYears => 3650,
            Period::All => 7300,
        }
    }

    pub fn date_range(self, today: NaiveDate) -> DateRange {
        DateRange {
            start: today - Duration::days(self.lookback_days()),
            end: today,
        }
    }
}

/// Resolve the effective date window for a time-series query.
///
/// A period always wins over explicit dates; explicit dates must arrive as
/// a pair in order; with neither, the widest lookback applies.
pub fn resolve_date_range(
    period: Option<Period>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<DateRange, QueryError> {
    if let Some(period) = period {
        return Ok(period.date_range(today));
    }

    match (start, end) {
        (Some(start), Some(end)) => {
            if start > end {
                return Err(QueryError::InvertedDateRange);
            }
            Ok(DateRange { start, end })
        }
        (None, None) => Ok(Period::All.date_range(today)),
        _ => Err(QueryError::IncompleteDateRange),
    }
}

/// One aggregation request as handed to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketQuery {
    pub location: MarketLocation,
    pub dates: Option<DateRange>,
}

/// Flat client-facing record merged from per-category contributions.
///
/// Categories that fail upstream simply never contribute, so their fields
/// are absent rather than null.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedRecord(Map<String, Value>);

impl NormalizedRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn merge(&mut self, contribution: Map<String, Value>) {
        self.0.extend(contribution);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Rejected request input; every variant backs a 400 response.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("ZIP code is required")]
    MissingZipcode,
    #[error("Please enter a valid 5-digit ZIP code")]
    InvalidZipcode,
    #[error("address is required")]
    MissingAddress,
    #[error("address must contain at least one letter or digit")]
    InvalidAddress,
    #[error("either a ZIP code or an address is required")]
    MissingLocation,
    #[error("failed to parse '{0}' as YYYY-MM-DD")]
    InvalidDate(String),
    #[error("start date must not be after end date")]
    InvertedDateRange,
    #[error("start and end must be provided together")]
    IncompleteDateRange,
    #[error("unknown period '{0}' (expected 1Y, 5Y, 10Y, or All)")]
    UnknownPeriod(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid test date")
    }

    #[test]
    fn zip_accepts_five_digits_and_trims() {
        let zip = ZipCode::parse(" 50309 ").expect("valid zip");
        assert_eq!(zip.as_str(), "50309");
    }

    #[test]
    fn zip_rejects_blank_input() {
        assert_eq!(ZipCode::parse("   "), Err(QueryError::MissingZipcode));
    }

    #[test]
    fn zip_rejects_wrong_shapes() {
        for raw in ["1234", "123456", "5030a", "5030 9", "50-30"] {
            assert_eq!(
                ZipCode::parse(raw),
                Err(QueryError::InvalidZipcode),
                "{raw:?} must be rejected"
            );
        }
    }

    #[test]
    fn address_slug_hyphenates_whitespace() {
        let slug = AddressSlug::parse(" 123   Main  St ").expect("valid address");
        assert_eq!(slug.as_str(), "123-Main-St");
    }

    #[test]
    fn address_slug_preserves_case_and_drops_punctuation() {
        let slug = AddressSlug::parse("123 Main St, Apt #4").expect("valid address");
        assert_eq!(slug.as_str(), "123-Main-St-Apt-4");
    }

    #[test]
    fn address_slug_is_idempotent() {
        let once = AddressSlug::parse("123 Main St").expect("valid address");
        let twice = AddressSlug::parse(once.as_str()).expect("slug stays valid");
        assert_eq!(once, twice);
    }

    #[test]
    fn address_slug_rejects_blank_and_symbol_only_input() {
        assert_eq!(AddressSlug::parse("  "), Err(QueryError::MissingAddress));
        assert_eq!(
            AddressSlug::parse("!!! ???"),
            Err(QueryError::InvalidAddress)
        );
    }

    #[test]
    fn period_parse_is_case_insensitive() {
        assert_eq!(Period::parse("1y"), Ok(Period::OneYear));
        assert_eq!(Period::parse("5Y"), Ok(Period::FiveYears));
        assert_eq!(Period::parse("10y"), Ok(Period::TenYears));
        assert_eq!(Period::parse("all"), Ok(Period::All));
        assert_eq!(
            Period::parse("2Y"),
            Err(QueryError::UnknownPeriod("2Y".to_string()))
        );
    }

    #[test]
    fn period_lookbacks_count_back_from_today() {
        let today = date("2024-06-15");
        assert_eq!(Period::OneYear.date_range(today).start, date("2023-06-16"));
        assert_eq!(Period::FiveYears.date_range(today).start, date("2019-06-17"));
        assert_eq!(Period::TenYears.date_range(today).start, date("2014-06-18"));
        assert_eq!(Period::All.date_range(today).start, date("2004-06-20"));
        assert_eq!(Period::All.date_range(today).end, today);
    }

    #[test]
    fn period_overrides_explicit_dates() {
        let today = date("2024-06-15");
        let range = resolve_date_range(
            Some(Period::OneYear),
            Some(date("2001-01-01")),
            Some(date("2002-01-01")),
            today,
        )
        .expect("period wins");
        assert_eq!(range, Period::OneYear.date_range(today));
    }

    #[test]
    fn explicit_dates_pass_through_in_order() {
        let range = resolve_date_range(
            None,
            Some(date("2020-01-01")),
            Some(date("2024-12-31")),
            date("2025-06-15"),
        )
        .expect("ordered pair accepted");
        assert_eq!(range.start, date("2020-01-01"));
        assert_eq!(range.end, date("2024-12-31"));
    }

    #[test]
    fn inverted_dates_are_rejected() {
        let result = resolve_date_range(
            None,
            Some(date("2024-12-31")),
            Some(date("2020-01-01")),
            date("2025-06-15"),
        );
        assert_eq!(result, Err(QueryError::InvertedDateRange));
    }

    #[test]
    fn lone_date_is_rejected() {
        let today = date("2025-06-15");
        assert_eq!(
            resolve_date_range(None, Some(date("2020-01-01")), None, today),
            Err(QueryError::IncompleteDateRange)
        );
        assert_eq!(
            resolve_date_range(None, None, Some(date("2020-01-01")), today),
            Err(QueryError::IncompleteDateRange)
        );
    }

    #[test]
    fn missing_dates_default_to_the_widest_lookback() {
        let today = date("2025-06-15");
        let range = resolve_date_range(None, None, None, today).expect("default applies");
        assert_eq!(range, Period::All.date_range(today));
    }

    #[test]
    fn record_merge_keeps_contributions_from_every_category() {
        let mut record = NormalizedRecord::new();
        let mut first = Map::new();
        first.insert("market_grade".to_string(), Value::from("B+"));
        let mut second = Map::new();
        second.insert("rental".to_string(), serde_json::json!({ "count": 42 }));
        record.merge(first);
        record.merge(second);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("market_grade"), Some(&Value::from("B+")));
    }

    #[test]
    fn record_serializes_as_a_flat_object() {
        let mut record = NormalizedRecord::new();
        let mut fields = Map::new();
        fields.insert("market_grade".to_string(), Value::from("A"));
        record.merge(fields);
        let rendered = serde_json::to_string(&record).expect("record serializes");
        assert_eq!(rendered, r#"{"market_grade":"A"}"#);
    }
}
