//! Ingestion Dispatcher (C4): the HTTP front door that resolves an
//! activation, then proxies, round-trips over the broker, or bridges a
//! streaming session to broker subjects.

pub mod client;
pub mod error;
pub mod metrics;
pub mod path;
pub mod routes;
pub mod state;

pub use client::SchedulerClient;
pub use error::DispatcherError;
pub use state::AppState;

use actix_web::web::{self, ServiceConfig};

/// Registers every dispatcher endpoint on an `actix_web::App`, so the
/// binary's `main.rs` only has to build `AppState` and call this once.
///
/// Order matters: `/lambda/sse/...` and `/lambda/ws/...` are registered
/// before the catch-all `/lambda/{tail:.*}` sync route so the more specific
/// patterns win the match.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(routes::healthz)
        .service(routes::hook)
        .service(routes::lambda_sse)
        .service(routes::lambda_ws)
        .route("/lambda/{tail:.*}", web::to(routes::lambda_sync));
}
