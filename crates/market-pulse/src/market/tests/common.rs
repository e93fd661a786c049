use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};

use crate::market::aggregator::MarketDataService;
use crate::market::domain::MarketQuery;
use crate::market::gateway::{FetchError, FetchOutcome, MarketDataGateway};
use crate::market::registry::{EndpointSpec, MarketCategory};
use crate::market::router::market_data_router;

/// Canned behavior for one category.
#[derive(Clone)]
pub(super) enum Script {
    Ok(Value),
    SlowOk(u64, Value),
    Status(u16),
    Transport,
    Panic,
}

/// Gateway fake driven by a per-category script table. Categories without
/// a script fail with a 404 so forgotten setup shows up in assertions.
#[derive(Default)]
pub(super) struct ScriptedGateway {
    scripts: HashMap<&'static str, Script>,
    calls: Mutex<Vec<(String, MarketQuery)>>,
}

impl ScriptedGateway {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn with(mut self, category: MarketCategory, script: Script) -> Self {
        self.scripts.insert(category.key(), script);
        self
    }

    pub(super) fn calls(&self) -> Vec<(String, MarketQuery)> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    pub(super) fn called_categories(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.calls().into_iter().map(|(key, _)| key).collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl MarketDataGateway for ScriptedGateway {
    async fn fetch(&self, spec: &EndpointSpec, query: &MarketQuery) -> FetchOutcome {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push((spec.category.key().to_string(), query.clone()));

        match self.scripts.get(spec.category.key()) {
            Some(Script::Ok(body)) => Ok(body.clone()),
            Some(Script::SlowOk(delay_ms, body)) => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                Ok(body.clone())
            }
            Some(Script::Status(code)) => Err(FetchError::Status(*code)),
            Some(Script::Transport) => Err(FetchError::Transport("connection reset".to_string())),
            Some(Script::Panic) => panic!("scripted gateway panic"),
            None => Err(FetchError::Status(404)),
        }
    }
}

/// Wrap a payload in the upstream envelope under the given key.
pub(super) fn envelope(key: &str, result: Value) -> Value {
    json!([{
        key: {
            "api_code": 0,
            "api_code_description": "ok",
            "result": result,
        }
    }])
}

pub(super) fn service_with(
    gateway: ScriptedGateway,
) -> (Arc<ScriptedGateway>, MarketDataService<ScriptedGateway>) {
    let gateway = Arc::new(gateway);
    let service = MarketDataService::new(Arc::clone(&gateway));
    (gateway, service)
}

pub(super) fn router_with(gateway: ScriptedGateway) -> (Arc<ScriptedGateway>, Router) {
    let gateway = Arc::new(gateway);
    let service = Arc::new(MarketDataService::new(Arc::clone(&gateway)));
    (gateway, market_data_router(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("response body is readable");
    serde_json::from_slice(&bytes).expect("response body is json")
}
