use chrono::{Local, NaiveDate};
use clap::Args;
use market_pulse::config::AppConfig;
use market_pulse::error::AppError;
use market_pulse::market::{
    resolve_date_range, AddressSlug, HouseCanaryClient, MarketDataService, Period, QueryError,
    ZipCode,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct FetchArgs {
    /// 5-digit ZIP code to aggregate
    #[arg(long, conflicts_with = "address")]
    pub(crate) zipcode: Option<String>,
    /// Street address to aggregate (slugified before the lookup)
    #[arg(long)]
    pub(crate) address: Option<String>,
    /// Time-series window start (YYYY-MM-DD); requires --end
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start: Option<NaiveDate>,
    /// Time-series window end (YYYY-MM-DD); requires --start
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) end: Option<NaiveDate>,
    /// Lookback period (1Y, 5Y, 10Y, or All); overrides --start/--end
    #[arg(long)]
    pub(crate) period: Option<String>,
    /// Pretty-print the merged record
    #[arg(long)]
    pub(crate) pretty: bool,
}

pub(crate) async fn run_fetch(args: FetchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let gateway = Arc::new(HouseCanaryClient::new(&config.upstream)?);
    let service = MarketDataService::new(gateway);

    let record = if let Some(raw) = args.zipcode.as_deref() {
        let zip = ZipCode::parse(raw)?;
        service.zip_market_data(zip).await?
    } else if let Some(raw) = args.address.as_deref() {
        let slug = AddressSlug::parse(raw)?;
        let period = args.period.as_deref().map(Period::parse).transpose()?;
        let dates = resolve_date_range(period, args.start, args.end, Local::now().date_naive())?;
        service.address_market_data(slug, dates).await?
    } else {
        return Err(AppError::Query(QueryError::MissingLocation));
    };

    let value = record.into_value();
    if args.pretty {
        println!("{value:#}");
    } else {
        println!("{value}");
    }

    Ok(())
}
