//! Reconciles one `Function` resource into (or out of) a running worker
//! Deployment/Service pair. Grounded on the original
//! `FunctionReconciler.Reconcile` (`operator/internal/controller/function_controller.go`):
//! get the Function, build the desired Deployment, create it if missing or
//! update it if present.

use std::sync::Arc;

use kube::api::ResourceExt;
use kube::client::Client;
use kube::runtime::controller::Action;
use kube::Resource as _;
use tokio::time::Duration;
use tracing::{field, info, instrument, Span};

use litefunctions_common::capability_for;
use litefunctions_registry::{Function, Registry};

use crate::config::ProvisionerConfig;
use crate::controller::Context;
use crate::deployment::{apply_deployment, apply_service, delete_worker, desired_deployment, desired_service};
use crate::error::{Error, Result};
use crate::finalizer;
use litefunctions_common::telemetry;

const REQUEUE_AFTER: Duration = Duration::from_secs(30);

#[instrument(skip(ctx, function), fields(trace_id))]
pub async fn reconcile(function: Arc<Function>, ctx: Arc<Context>) -> Result<Action> {
    let trace_id = telemetry::get_trace_id();
    Span::current().record("trace_id", field::display(&trace_id));
    let _timer = ctx.metrics.reconcile.count_and_measure(&trace_id);

    let client: Client = ctx.client.clone();
    let namespace = function.namespace().ok_or_else(|| {
        Error::UserInputError("Function resource must be namespaced".to_owned())
    })?;
    let name = function.name_any();

    if function.meta().deletion_timestamp.is_some() {
        info!(msg = "tearing down function worker", %namespace, %name);
        teardown(client.clone(), &function).await?;
        finalizer::delete(client, &name, &namespace).await?;
        return Ok(Action::await_change());
    }

    if !finalizer::has(&function) {
        finalizer::add(client.clone(), &name, &namespace).await?;
    }

    if function.spec.is_active {
        info!(msg = "provisioning function worker", %namespace, %name);
        provision(client, &function, ProvisionerConfig::get()).await?;
    } else {
        teardown(client, &function).await?;
    }

    Ok(Action::requeue(REQUEUE_AFTER))
}

pub fn error_policy(function: Arc<Function>, error: &Error, ctx: Arc<Context>) -> Action {
    tracing::warn!(msg = "reconcile failed", %error);
    ctx.metrics.reconcile.set_failure(&function, error);
    Action::requeue(Duration::from_secs(5 * 60))
}

async fn provision(client: Client, function: &Function, cfg: &ProvisionerConfig) -> Result<()> {
    let cap = capability_for(&function.spec.language);
    let namespace = function.namespace().unwrap_or_default();

    let deployment = desired_deployment(function, &cap, cfg);
    apply_deployment(client.clone(), &namespace, &deployment).await?;

    if cap.supports_direct_http {
        let service = desired_service(function, &cap);
        apply_service(client, &namespace, &service).await?;
    }
    Ok(())
}

/// Tears down a function's worker, unless it is a shared dynamic-language
/// worker still backing another active sibling function (invariant I4).
pub(crate) async fn teardown(client: Client, function: &Function) -> Result<()> {
    if function.is_shared_worker() {
        let namespace = function.namespace().unwrap_or_default();
        let registry = Registry::new(client.clone(), &namespace);
        let siblings = registry
            .list_other_active_siblings(&function.spec.project, &function.spec.language, &function.name_any())
            .await?;
        if !siblings.is_empty() {
            info!(
                msg = "shared worker still has other active tenants, skipping teardown",
                count = siblings.len()
            );
            return Ok(());
        }
    }
    delete_worker(client, function).await?;
    Ok(())
}
