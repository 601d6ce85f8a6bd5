//! Finalizer bookkeeping on the `Function` resource itself.
//!
//! Patched directly with a merge patch rather than going through
//! `kube::runtime::finalizer`, so it can be interleaved with the rest of
//! `reconcile` the way the original teardown/provision logic expects.

use kube::api::{Api, Patch, PatchParams};
use kube::client::Client;
use kube::Resource;

use litefunctions_registry::Function;

use crate::error::Result;

pub const FINALIZER_NAME: &str = "litefunctions.io/worker-cleanup";

fn api(client: Client, namespace: &str) -> Api<Function> {
    Api::namespaced(client, namespace)
}

pub fn has(function: &Function) -> bool {
    function
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|finalizers| finalizers.iter().any(|f| f == FINALIZER_NAME))
}

/// Adds the finalizer if it isn't already present, guaranteeing reconcile
/// runs once more before the apiserver actually deletes the Function.
pub async fn add(client: Client, name: &str, namespace: &str) -> Result<Function> {
    let patch = serde_json::json!({
        "metadata": { "finalizers": [FINALIZER_NAME] }
    });
    Ok(api(client, namespace)
        .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?)
}

/// Removes the finalizer, letting the apiserver complete the delete.
pub async fn delete(client: Client, name: &str, namespace: &str) -> Result<Function> {
    let patch = serde_json::json!({
        "metadata": { "finalizers": null }
    });
    Ok(api(client, namespace)
        .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?)
}
