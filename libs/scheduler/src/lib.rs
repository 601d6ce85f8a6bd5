//! Activation Scheduler (C3): maps a function invocation to a warm runtime,
//! extending or creating its lease under concurrency, and builds the routing
//! descriptor the Ingestion Dispatcher uses to reach it.
//!
//! This crate holds the RPC-agnostic domain logic; [`service`] wraps it in
//! the generated `tonic` server trait.

pub mod error;
pub mod service;

use chrono::{DateTime, Utc};
use kube::Client;
use tracing::instrument;

use litefunctions_common::capability_for;
use litefunctions_registry::Registry;

pub use error::{Error, Result};

/// Derived routing descriptor returned by `Activate`. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationDescriptor {
    pub is_active: bool,
    pub language: String,
    pub is_async: bool,
    pub project: String,
    pub name: String,
    pub method: String,
    pub service_name: Option<String>,
    pub service_port: Option<u16>,
}

/// RPC-agnostic scheduler logic, backed by one `Registry` per namespace.
#[derive(Clone)]
pub struct Scheduler {
    client: Client,
    keep_warm: chrono::Duration,
}

impl Scheduler {
    pub fn new(client: Client, keep_warm: std::time::Duration) -> Self {
        Self {
            client,
            keep_warm: chrono::Duration::from_std(keep_warm)
                .unwrap_or_else(|_| chrono::Duration::seconds(300)),
        }
    }

    fn registry(&self, namespace: &str) -> Registry {
        Registry::new(self.client.clone(), namespace)
    }

    /// `CreateFunction(namespace,name,project,language,git_creds,is_async) -> {created}`.
    #[instrument(skip(self, git_creds_ref))]
    pub async fn create_function(
        &self,
        namespace: &str,
        name: &str,
        project: &str,
        language: &str,
        method: &str,
        is_async: bool,
        git_creds_ref: Option<String>,
    ) -> Result<bool> {
        Ok(self
            .registry(namespace)
            .create_if_not_exists(name, project, language, method, is_async, git_creds_ref)
            .await?)
    }

    /// `Activate(namespace,name) -> ActivationDescriptor`. Marks the function
    /// active, extends its lease to `now + keep_warm` without ever shortening
    /// an existing, still-valid lease (I3), and builds the descriptor. Does
    /// not wait for deployment readiness.
    #[instrument(skip(self))]
    pub async fn activate(&self, namespace: &str, name: &str) -> Result<ActivationDescriptor> {
        let registry = self.registry(namespace);
        // Step 1: load, mapping NotFound the way `INVALID_ARGUMENT` requires.
        registry
            .get(name)
            .await
            .map_err(|_| Error::NotFound(name.to_owned()))?;

        let deadline: DateTime<Utc> = Utc::now() + self.keep_warm;
        let function = registry.activate(name, deadline).await?;
        Ok(descriptor(&function))
    }

    /// `GetStatus(namespace,name) -> {is_active}`. If already active,
    /// best-effort extends the lease; failure to extend does not toggle
    /// `is_active` and is surfaced as an error to the caller.
    #[instrument(skip(self))]
    pub async fn get_status(&self, namespace: &str, name: &str) -> Result<bool> {
        let registry = self.registry(namespace);
        let function = registry
            .get(name)
            .await
            .map_err(|_| Error::NotFound(name.to_owned()))?;

        if function.spec.is_active {
            let deadline: DateTime<Utc> = Utc::now() + self.keep_warm;
            registry.extend_lease(name, deadline).await?;
        }
        Ok(function.spec.is_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litefunctions_registry::{Function, FunctionSpec};

    fn function(language: &str, is_active: bool) -> Function {
        Function::new(
            "fast",
            FunctionSpec {
                project: "alpha".into(),
                language: language.into(),
                method: "POST".into(),
                is_async: false,
                is_active,
                deprovision_time: None,
                git_creds_ref: None,
            },
        )
    }

    #[test]
    fn direct_http_capable_language_gets_a_service() {
        let d = descriptor(&function("go", true));
        assert_eq!(d.service_name.as_deref(), Some("runtime-go-alpha-fast-svc"));
        assert_eq!(d.service_port, Some(8080));
    }

    #[test]
    fn broker_only_language_has_no_service() {
        let d = descriptor(&function("js", true));
        assert_eq!(d.service_name, None);
        assert_eq!(d.service_port, None);
    }
}

fn descriptor(function: &litefunctions_registry::Function) -> ActivationDescriptor {
    let cap = capability_for(&function.spec.language);
    let (service_name, service_port) = if cap.supports_direct_http {
        (Some(function.worker_identity() + "-svc"), Some(cap.port))
    } else {
        (None, None)
    };
    ActivationDescriptor {
        is_active: function.spec.is_active,
        language: function.spec.language.clone(),
        is_async: function.spec.is_async,
        project: function.spec.project.clone(),
        name: function
            .metadata
            .name
            .clone()
            .unwrap_or_else(|| "unnamed".to_owned()),
        method: function.spec.method.clone(),
        service_name,
        service_port,
    }
}
