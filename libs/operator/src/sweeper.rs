//! Cluster-wide cleanup sweep: periodically deactivates Functions whose
//! lease has expired and tears down their worker.
//!
//! Grounded on the standalone Go `cleanup` subcommand
//! (`operator/cmd/cleanup.go`), folded here into a background task inside the
//! long-lived operator process instead of a separate one-shot CLI invocation,
//! since the controller already holds a live client and reconcile path.

use std::time::Duration;

use chrono::Utc;
use kube::client::Client;
use kube::ResourceExt;
use tracing::{debug, error, info, warn};

use litefunctions_registry::Registry;

use crate::reconcile::teardown;

/// Runs the sweep loop forever, waking up every `interval`.
pub async fn run(client: Client, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        if let Err(e) = sweep_once(client.clone()).await {
            error!(msg = "cleanup sweep failed", %e);
        }
    }
}

async fn sweep_once(client: Client) -> Result<(), litefunctions_registry::Error> {
    let now = Utc::now();
    let functions = Registry::list_all(client.clone()).await?;
    let mut expired = 0usize;

    for function in functions {
        if !function.spec.is_active {
            continue;
        }
        let Some(deprovision_time) = function.spec.deprovision_time else {
            continue;
        };
        if deprovision_time > now {
            continue;
        }

        let Some(namespace) = function.namespace() else {
            warn!(msg = "active Function without namespace, skipping", name = %function.name_any());
            continue;
        };
        let name = function.name_any();
        debug!(msg = "lease expired, deactivating", %namespace, %name);

        let registry = Registry::new(client.clone(), &namespace);
        match registry.deactivate(&name).await {
            Ok(deactivated) => {
                if let Err(e) = teardown(client.clone(), &deactivated).await {
                    error!(msg = "failed to tear down expired worker", %namespace, %name, %e);
                } else {
                    expired += 1;
                }
            }
            Err(e) => error!(msg = "failed to deactivate expired function", %namespace, %name, %e),
        }
    }

    if expired > 0 {
        info!(msg = "cleanup sweep deactivated expired functions", count = expired);
    }
    Ok(())
}
