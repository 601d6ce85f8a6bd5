//! Controller wiring: shared `Context`/`State` and the `Controller<Function>`
//! event loop, generalized from the original `Context`/`State`/`run` trio.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use kube::{
    api::{Api, ListParams},
    client::Client,
    runtime::{controller::Controller, events::Reporter, watcher::Config},
};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, trace};

use litefunctions_registry::Function;

use crate::metrics::Metrics;
use crate::reconcile::{error_policy, reconcile};

/// Context injected into every `reconcile`/`error_policy` invocation.
pub struct Context {
    pub client: Client,
    pub diagnostics: Arc<RwLock<Diagnostics>>,
    pub metrics: Arc<Metrics>,
}

/// Diagnostics read by the health/metrics web server.
#[derive(Clone, Serialize)]
pub struct Diagnostics {
    #[serde(deserialize_with = "from_ts")]
    pub last_event: DateTime<Utc>,
    #[serde(skip)]
    pub reporter: Reporter,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            last_event: Utc::now(),
            reporter: "litefunctions-operator".into(),
        }
    }
}

fn from_ts<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(DateTime::<Utc>::deserialize(deserializer).unwrap_or_else(|_| Utc::now()))
}

/// State shared between the controller and the web server.
#[derive(Clone, Default)]
pub struct State {
    diagnostics: Arc<RwLock<Diagnostics>>,
    metrics: Arc<Metrics>,
}

impl State {
    pub fn new(metrics: Metrics) -> Self {
        Self {
            diagnostics: Arc::default(),
            metrics: Arc::new(metrics),
        }
    }

    pub fn metrics(&self) -> String {
        let mut buffer = String::new();
        let registry = &*self.metrics.registry;
        prometheus_client::encoding::text::encode(&mut buffer, registry).unwrap();
        buffer
    }

    pub async fn diagnostics(&self) -> Diagnostics {
        self.diagnostics.read().await.clone()
    }

    pub fn to_context(&self, client: Client) -> Arc<Context> {
        Arc::new(Context {
            client,
            metrics: self.metrics.clone(),
            diagnostics: self.diagnostics.clone(),
        })
    }
}

/// Runs the Function controller to completion (on shutdown signal), assuming
/// the CRD is already installed.
pub async fn run(state: State, client: Client) {
    let functions = Api::<Function>::all(client.clone());
    if let Err(e) = functions.list(&ListParams::default().limit(1)).await {
        error!("CRD is not queryable; {e:?}. Is the CRD installed?");
        std::process::exit(1);
    }

    trace!("init Function controller");
    Controller::new(functions, Config::default().any_semantic())
        .shutdown_on_signal()
        .run(reconcile, error_policy, state.to_context(client))
        .filter_map(|x| async move { std::result::Result::ok(x) })
        .for_each(|_| futures::future::ready(()))
        .await;
}
