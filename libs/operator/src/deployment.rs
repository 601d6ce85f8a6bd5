//! Builds and applies the Kubernetes Deployment/Service pair a Function maps
//! to, grounded on the original `operator/internal/controller/spec.go`
//! `NewDeployment` and `operator/internal/client/functions.go`
//! `CreateOrUpdateDeployment`/`DeleteDeployment`.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, EnvVarSource, LocalObjectReference, PodSpec,
    PodTemplateSpec, SecretKeySelector, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::{Api, DeleteParams, ObjectMeta, Patch, PatchParams, PostParams};
use kube::{Client, ResourceExt};

use litefunctions_common::capability::Capability;
use litefunctions_registry::Function;

use crate::config::ProvisionerConfig;
use crate::error::{Error, Result};

const FIELD_MANAGER: &str = "litefunctions-operator";
const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
const MANAGED_BY_VALUE: &str = "litefunctions-operator";

fn labels(function: &Function) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("app".to_owned(), "runtime".to_owned());
    labels.insert("lang".to_owned(), function.spec.language.clone());
    labels.insert("project".to_owned(), function.spec.project.clone());
    labels.insert(MANAGED_BY_LABEL.to_owned(), MANAGED_BY_VALUE.to_owned());
    labels
}

/// Builds the desired `Deployment` for `function`, never reading cluster
/// state: the caller diffs it against what already exists.
pub fn desired_deployment(function: &Function, cap: &Capability, cfg: &ProvisionerConfig) -> Deployment {
    let name = function.worker_identity();
    let namespace = function.namespace().unwrap_or_default();
    let labels = labels(function);

    let image = if cap.image.starts_with("litefunctions/") || cap.image.contains('/') {
        // static table / unknown-language fallback both already carry a full
        // image reference; the registry-templated form only applies to the
        // table's own placeholder shape.
        cap.image.to_owned()
    } else {
        format!("{}/{}/{}", cfg.registry, cfg.registry_user, cap.image)
    };

    let mut env = vec![
        EnvVar {
            name: "DATABASE_URL".to_owned(),
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: cfg.db_secret_name.clone(),
                    key: cfg.db_secret_key.clone(),
                    optional: Some(false),
                }),
                ..Default::default()
            }),
            ..Default::default()
        },
        EnvVar {
            name: "REDIS_URL".to_owned(),
            value: Some(cfg.redis_url.clone()),
            ..Default::default()
        },
        EnvVar {
            name: "NATS_URL".to_owned(),
            value: Some(cfg.nats_url.clone()),
            ..Default::default()
        },
        EnvVar {
            name: "PROJECT".to_owned(),
            value: Some(function.spec.project.clone()),
            ..Default::default()
        },
        EnvVar {
            name: "LANGUAGE".to_owned(),
            value: Some(function.spec.language.clone()),
            ..Default::default()
        },
    ];
    // NAME is only injected for a per-function (non-shared) worker; a shared
    // dynamic-language worker infers the function name from each exec subject.
    if !function.is_shared_worker() {
        env.push(EnvVar {
            name: "NAME".to_owned(),
            value: Some(function.name_any()),
            ..Default::default()
        });
    }
    if let Some(git_creds_ref) = &function.spec.git_creds_ref {
        env.push(EnvVar {
            name: "GIT_CREDS_REF".to_owned(),
            value: Some(git_creds_ref.clone()),
            ..Default::default()
        });
    }
    if cap.supports_direct_http {
        env.push(EnvVar {
            name: "HTTP_PORT".to_owned(),
            value: Some(cap.port.to_string()),
            ..Default::default()
        });
    }

    Deployment {
        metadata: ObjectMeta {
            name: Some(name.clone()),
            namespace: Some(namespace),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    image_pull_secrets: Some(vec![LocalObjectReference {
                        name: cfg.pull_secret.clone(),
                    }]),
                    containers: vec![Container {
                        name: name.clone(),
                        image: Some(image),
                        image_pull_policy: Some("Always".to_owned()),
                        env: Some(env),
                        ports: cap.supports_direct_http.then(|| {
                            vec![ContainerPort {
                                container_port: cap.port as i32,
                                ..Default::default()
                            }]
                        }),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Builds the desired `Service` fronting a direct-HTTP-capable worker.
/// Named as the deployment name suffixed with `-svc`, matching the
/// Activation Scheduler's own `service_name` derivation (see `DESIGN.md`).
pub fn desired_service(function: &Function, cap: &Capability) -> Service {
    let deployment_name = function.worker_identity();
    let name = format!("{deployment_name}-svc");
    let namespace = function.namespace().unwrap_or_default();
    let mut selector = BTreeMap::new();
    selector.insert("app".to_owned(), "runtime".to_owned());
    selector.insert("lang".to_owned(), function.spec.language.clone());
    selector.insert("project".to_owned(), function.spec.project.clone());

    Service {
        metadata: ObjectMeta {
            name: Some(name),
            namespace: Some(namespace),
            labels: Some(labels(function)),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(selector),
            ports: Some(vec![ServicePort {
                port: cap.port as i32,
                target_port: Some(IntOrString::Int(cap.port as i32)),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Creates or server-side-applies `deployment`, idempotent either way.
pub async fn apply_deployment(client: Client, namespace: &str, deployment: &Deployment) -> Result<()> {
    let api: Api<Deployment> = Api::namespaced(client, namespace);
    let name = deployment.metadata.name.as_deref().unwrap_or_default();
    match api.get_opt(name).await? {
        None => {
            api.create(&PostParams::default(), deployment).await?;
        }
        Some(_) => {
            api.patch(
                name,
                &PatchParams::apply(FIELD_MANAGER).force(),
                &Patch::Apply(deployment),
            )
            .await?;
        }
    }
    Ok(())
}

/// Creates or server-side-applies `service`, idempotent either way.
pub async fn apply_service(client: Client, namespace: &str, service: &Service) -> Result<()> {
    let api: Api<Service> = Api::namespaced(client, namespace);
    let name = service.metadata.name.as_deref().unwrap_or_default();
    match api.get_opt(name).await? {
        None => {
            api.create(&PostParams::default(), service).await?;
        }
        Some(existing) => {
            let mut service = service.clone();
            // cluster IP is allocated by the API server; carrying it forward
            // avoids a spurious immutable-field patch rejection.
            if let Some(spec) = &mut service.spec {
                spec.cluster_ip = existing.spec.and_then(|s| s.cluster_ip);
            }
            api.patch(
                name,
                &PatchParams::apply(FIELD_MANAGER).force(),
                &Patch::Apply(&service),
            )
            .await?;
        }
    }
    Ok(())
}

/// Deletes the deployment and service named by `function`'s identity.
/// `NotFound` is success (idempotent teardown).
pub async fn delete_worker(client: Client, function: &Function) -> Result<()> {
    let namespace = function
        .namespace()
        .ok_or_else(|| Error::UserInputError("Function has no namespace".to_owned()))?;
    let deployment_name = function.worker_identity();
    let service_name = format!("{deployment_name}-svc");

    let deployments: Api<Deployment> = Api::namespaced(client.clone(), &namespace);
    delete_if_present(&deployments, &deployment_name).await?;

    let services: Api<Service> = Api::namespaced(client, &namespace);
    delete_if_present(&services, &service_name).await?;

    Ok(())
}

async fn delete_if_present<K>(api: &Api<K>, name: &str) -> Result<()>
where
    K: kube::Resource + Clone + std::fmt::Debug + for<'de> serde::Deserialize<'de>,
{
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
        Err(e) => Err(Error::from(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::ResourceExt;
    use litefunctions_common::capability_for;
    use litefunctions_registry::FunctionSpec;

    fn function(language: &str, name: &str) -> Function {
        let mut f = Function::new(
            name,
            FunctionSpec {
                project: "alpha".into(),
                language: language.into(),
                method: "POST".into(),
                is_async: false,
                is_active: true,
                deprovision_time: None,
                git_creds_ref: None,
            },
        );
        f.meta_mut().namespace = Some("default".into());
        f
    }

    #[test]
    fn per_function_deployment_injects_name_env() {
        let f = function("go", "echo");
        let cap = capability_for("go");
        let cfg = ProvisionerConfig::get();
        let deployment = desired_deployment(&f, &cap, cfg);
        assert_eq!(deployment.metadata.name.as_deref(), Some("runtime-go-alpha-echo"));
        let env = deployment.spec.unwrap().template.spec.unwrap().containers[0]
            .env
            .clone()
            .unwrap();
        assert!(env.iter().any(|e| e.name == "NAME" && e.value.as_deref() == Some("echo")));
        assert!(env.iter().any(|e| e.name == "HTTP_PORT"));
    }

    #[test]
    fn shared_worker_deployment_has_no_name_env() {
        let f = function("python", "echo");
        let cap = capability_for("python");
        let cfg = ProvisionerConfig::get();
        let deployment = desired_deployment(&f, &cap, cfg);
        assert_eq!(deployment.metadata.name.as_deref(), Some("runtime-python-alpha"));
        let env = deployment.spec.unwrap().template.spec.unwrap().containers[0]
            .env
            .clone()
            .unwrap();
        assert!(!env.iter().any(|e| e.name == "NAME"));
    }

    #[test]
    fn service_name_matches_deployment_name_suffixed() {
        let f = function("go", "echo");
        let cap = capability_for("go");
        let service = desired_service(&f, &cap);
        assert_eq!(service.metadata.name.as_deref(), Some("runtime-go-alpha-echo-svc"));
    }

    #[test]
    fn broker_only_language_has_no_container_ports() {
        let f = function("lua", "echo");
        let cap = capability_for("lua");
        let cfg = ProvisionerConfig::get();
        let deployment = desired_deployment(&f, &cap, cfg);
        assert!(deployment.spec.unwrap().template.spec.unwrap().containers[0]
            .ports
            .is_none());
    }
}
