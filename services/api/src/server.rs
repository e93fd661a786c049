use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_market_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use market_pulse::config::AppConfig;
use market_pulse::error::AppError;
use market_pulse::market::{HouseCanaryClient, MarketDataService};
use market_pulse::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(log_level) = args.log_level.take() {
        config.telemetry.log_level = log_level;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let gateway = Arc::new(HouseCanaryClient::new(&config.upstream)?);
    let market_service = Arc::new(MarketDataService::new(gateway));

    let app = with_market_routes(market_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "market data service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
