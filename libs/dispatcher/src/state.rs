use std::time::Duration;

use litefunctions_broker::Broker;

use crate::client::SchedulerClient;
use crate::metrics::DispatcherMetrics;

/// Process-wide state shared by every handler: one scheduler client, one
/// broker connection, one `reqwest` client for the proxy path. Constructed
/// once at server start, never rebuilt per request.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: SchedulerClient,
    pub broker: Broker,
    pub http_client: reqwest::Client,
    pub namespace: String,
    pub reply_timeout: Duration,
    pub metrics: DispatcherMetrics,
}
