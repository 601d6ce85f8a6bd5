use chrono::{DateTime, Utc};
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};
use tracing::debug;

use crate::crd::{Function, FunctionSpec};
use crate::error::{Error, Result};

/// Bound on optimistic-concurrency retries for a single registry mutation.
const MAX_CONFLICT_RETRIES: u32 = 5;

const FIELD_MANAGER: &str = "litefunctions-registry";

/// Thin, retrying client over `kube::Api<Function>`.
///
/// Holds no cache of its own: every call round-trips to the API server. Reads
/// are cheap and the write path tolerates lost updates as long as a lease is
/// never shortened (see `extend_active`).
#[derive(Clone)]
pub struct Registry {
    api: Api<Function>,
}

impl Registry {
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
        }
    }

    pub async fn get(&self, name: &str) -> Result<Function> {
        match self.api.get(name).await {
            Ok(f) => Ok(f),
            Err(kube::Error::Api(e)) if e.code == 404 => Err(Error::NotFound(name.to_owned())),
            Err(e) => Err(Error::from(e)),
        }
    }

    pub async fn list_namespace(&self) -> Result<Vec<Function>> {
        Ok(self.api.list(&Default::default()).await?.items)
    }

    /// Lists every Function across all namespaces, used by the provisioner's
    /// cluster-wide cleanup sweep (mirrors the standalone Go `cleanup` command).
    pub async fn list_all(client: Client) -> Result<Vec<Function>> {
        let api: Api<Function> = Api::all(client);
        Ok(api.list(&Default::default()).await?.items)
    }

    /// Lists active functions sharing `(project, language)` with `exclude_name`,
    /// used by the provisioner to decide whether a shared dynamic-language
    /// worker still has other tenants before tearing it down (invariant I4).
    pub async fn list_other_active_siblings(
        &self,
        project: &str,
        language: &str,
        exclude_name: &str,
    ) -> Result<Vec<Function>> {
        Ok(self
            .list_namespace()
            .await?
            .into_iter()
            .filter(|f| {
                f.name_any() != exclude_name
                    && f.spec.is_active
                    && f.spec.project == project
                    && f.spec.language == language
            })
            .collect())
    }

    pub async fn is_active(&self, name: &str) -> Result<bool> {
        Ok(self.get(name).await?.spec.is_active)
    }

    /// Creates the function if it does not already exist. Returns `true` if a
    /// new object was created, `false` if one with this name was already
    /// present (matching `CreateFunction`'s idempotent-create contract).
    pub async fn create_if_not_exists(
        &self,
        name: &str,
        project: &str,
        language: &str,
        method: &str,
        is_async: bool,
        git_creds_ref: Option<String>,
    ) -> Result<bool> {
        if self.api.get_opt(name).await?.is_some() {
            return Ok(false);
        }
        let function = Function::new(
            name,
            FunctionSpec {
                project: project.to_owned(),
                language: language.to_owned(),
                method: method.to_owned(),
                is_async,
                is_active: false,
                deprovision_time: None,
                git_creds_ref,
            },
        );
        match self.api.create(&PostParams::default(), &function).await {
            Ok(_) => Ok(true),
            // lost a race with another creator: treat as already-present
            Err(kube::Error::Api(e)) if e.code == 409 => Ok(false),
            Err(e) => Err(Error::from(e)),
        }
    }

    /// Marks the function active and pushes `deprovision_time` to
    /// `now + keep_warm`, never shortening an existing, still-valid lease
    /// (invariant I3: lease monotonicity).
    pub async fn activate(&self, name: &str, keep_warm_deadline: DateTime<Utc>) -> Result<Function> {
        self.retry_update(name, |spec| {
            spec.is_active = true;
            spec.deprovision_time = Some(match spec.deprovision_time {
                Some(existing) if existing > keep_warm_deadline => existing,
                _ => keep_warm_deadline,
            });
        })
        .await
    }

    /// Extends the lease of an already-active function without touching
    /// `is_active`. Best-effort: callers treat failure as non-fatal.
    pub async fn extend_lease(&self, name: &str, keep_warm_deadline: DateTime<Utc>) -> Result<Function> {
        self.retry_update(name, |spec| {
            if spec.is_active {
                spec.deprovision_time = Some(match spec.deprovision_time {
                    Some(existing) if existing > keep_warm_deadline => existing,
                    _ => keep_warm_deadline,
                });
            }
        })
        .await
    }

    /// Flips `is_active` to `false`, used by the cleanup sweeper once
    /// `deprovision_time` has elapsed.
    pub async fn deactivate(&self, name: &str) -> Result<Function> {
        self.retry_update(name, |spec| {
            spec.is_active = false;
        })
        .await
    }

    /// Applies `mutate` to the current spec and patches it, retrying on HTTP
    /// 409 (resourceVersion conflict) up to `MAX_CONFLICT_RETRIES` times by
    /// re-reading the object and reapplying the same intended mutation.
    async fn retry_update<F>(&self, name: &str, mutate: F) -> Result<Function>
    where
        F: Fn(&mut FunctionSpec),
    {
        let mut attempt = 0;
        loop {
            let mut current = self.get(name).await?;
            mutate(&mut current.spec);

            let patch = serde_json::json!({ "spec": current.spec });
            match self
                .api
                .patch(
                    name,
                    &PatchParams::apply(FIELD_MANAGER).force(),
                    &Patch::Apply(&patch),
                )
                .await
            {
                Ok(updated) => return Ok(updated),
                Err(kube::Error::Api(e)) if e.code == 409 && attempt < MAX_CONFLICT_RETRIES => {
                    attempt += 1;
                    debug!(name, attempt, "registry update conflict, retrying");
                    continue;
                }
                Err(e) => return Err(Error::from(e)),
            }
        }
    }

}
