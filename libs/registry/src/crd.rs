use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Condition;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Declarative state for one user function.
///
/// Mutated by the scheduler (`is_active`, `deprovision_time`) and by the
/// provisioner's cleanup sweeper (`is_active` only); created and destroyed by
/// the owning project's management surface, which sits outside this crate.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[kube(
    group = "litefunctions.io",
    version = "v1",
    kind = "Function",
    namespaced,
    status = "FunctionStatus",
    shortname = "fn",
    printcolumn = r#"{"name":"Project", "type":"string", "jsonPath":".spec.project"}"#,
    printcolumn = r#"{"name":"Language", "type":"string", "jsonPath":".spec.language"}"#,
    printcolumn = r#"{"name":"Active", "type":"boolean", "jsonPath":".spec.isActive"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSpec {
    pub project: String,
    pub language: String,
    pub method: String,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub is_active: bool,
    pub deprovision_time: Option<DateTime<Utc>>,
    pub git_creds_ref: Option<String>,
}

/// Observed state, analogous to the upstream controller's ready/condition
/// reporting on the workload it owns.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunctionStatus {
    pub conditions: Option<Vec<Condition>>,
}

impl Function {
    pub fn is_shared_worker(&self) -> bool {
        litefunctions_common::capability_for(&self.spec.language).is_shared_worker
    }

    /// Name of the deployment/service this function's worker runs under.
    ///
    /// Dynamic languages share one worker per `(project, language)`; compiled
    /// languages get one worker per function.
    pub fn worker_identity(&self) -> String {
        if self.is_shared_worker() {
            format!("runtime-{}-{}", self.spec.language, self.spec.project)
        } else {
            format!(
                "runtime-{}-{}-{}",
                self.spec.language,
                self.spec.project,
                self.name_any_or("unnamed")
            )
        }
    }

    fn name_any_or(&self, fallback: &str) -> String {
        self.metadata
            .name
            .clone()
            .unwrap_or_else(|| fallback.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::ResourceExt;

    fn function(language: &str) -> Function {
        let mut f = Function::new(
            "echo",
            FunctionSpec {
                project: "alpha".into(),
                language: language.into(),
                method: "POST".into(),
                is_async: false,
                is_active: false,
                deprovision_time: None,
                git_creds_ref: None,
            },
        );
        f.meta_mut().namespace = Some("default".into());
        f
    }

    #[test]
    fn compiled_language_identity_is_per_function() {
        let f = function("go");
        assert_eq!(f.worker_identity(), "runtime-go-alpha-echo");
    }

    #[test]
    fn dynamic_language_identity_is_shared() {
        let f = function("python");
        assert_eq!(f.worker_identity(), "runtime-python-alpha");
    }
}
