#[cfg(all(test, feature = "e2e-tests"))]
mod test {
    use std::time::Duration;

    use k8s_openapi::api::apps::v1::Deployment;
    use k8s_openapi::api::core::v1::Service;
    use kube::api::{Api, Patch, PatchParams, PostParams};
    use kube::client::Client;
    use kube::runtime::wait::{await_condition, conditions, Condition};
    use kube::ResourceExt;
    use litefunctions_registry::{Function, FunctionSpec};
    use tokio::time::timeout;

    fn is_deployment_ready() -> impl Condition<Deployment> {
        |obj: Option<&Deployment>| {
            if let Some(deployment) = &obj {
                if let Some(status) = &deployment.status {
                    return status.replicas == status.updated_replicas
                        && status.replicas == status.ready_replicas;
                }
            }
            false
        }
    }

    async fn wait_for<R, C>(api: Api<R>, name: &str, condition: C)
    where
        R: kube::Resource
            + Clone
            + std::fmt::Debug
            + for<'de> k8s_openapi::serde::Deserialize<'de>
            + 'static
            + Send,
        C: Condition<R>,
    {
        timeout(
            Duration::from_secs(20),
            await_condition(api, name, condition),
        )
        .await
        .unwrap()
        .unwrap();
    }

    fn function_spec(project: &str, language: &str) -> FunctionSpec {
        FunctionSpec {
            project: project.to_owned(),
            language: language.to_owned(),
            method: "POST".to_owned(),
            is_async: false,
            is_active: true,
            deprovision_time: None,
            git_creds_ref: None,
        }
    }

    /// Creates an active Function and waits for its (per-function, direct-HTTP)
    /// worker Deployment to come up.
    async fn setup(name: &str) -> (Api<Function>, Api<Deployment>, String) {
        let function = Function::new(name, function_spec("e2e", "go"));
        let deployment_name = format!("runtime-go-e2e-{name}");

        let client = Client::try_default().await.unwrap();
        let function_api = Api::<Function>::namespaced(client.clone(), "default");

        function_api
            .create(&PostParams::default(), &function)
            .await
            .unwrap();

        let deployment_api = Api::<Deployment>::namespaced(client.clone(), "default");
        wait_for(deployment_api.clone(), &deployment_name, is_deployment_ready()).await;
        (function_api, deployment_api, deployment_name)
    }

    #[tokio::test]
    async fn active_function_gets_a_worker_deployment() {
        setup("test-create").await;
    }

    #[tokio::test]
    async fn active_function_gets_a_service_for_direct_http_languages() {
        let (_function_api, _deployment_api, deployment_name) = setup("test-service").await;
        let client = Client::try_default().await.unwrap();
        let service_api = Api::<Service>::namespaced(client, "default");
        service_api
            .get(&format!("{deployment_name}-svc"))
            .await
            .expect("direct-http language should get a ClusterIP service");
    }

    #[tokio::test]
    async fn deleting_the_deployment_gets_it_recreated() {
        let (_function_api, deployment_api, deployment_name) = setup("test-recreate").await;

        let deploy = deployment_api.get(&deployment_name).await.unwrap();
        deployment_api
            .delete(&deployment_name, &Default::default())
            .await
            .unwrap();

        wait_for(
            deployment_api.clone(),
            &deployment_name,
            conditions::is_deleted(&deploy.uid().unwrap()),
        )
        .await;
        wait_for(deployment_api, &deployment_name, is_deployment_ready()).await;
    }

    #[tokio::test]
    async fn deactivating_a_function_tears_down_its_worker() {
        let (function_api, deployment_api, deployment_name) = setup("test-deactivate").await;

        let mut function = function_api.get("test-deactivate").await.unwrap();
        function.spec.is_active = false;
        function.metadata.managed_fields = None;
        function_api
            .patch(
                "test-deactivate",
                &PatchParams::apply("e2e-tests").force(),
                &Patch::Apply(&function),
            )
            .await
            .unwrap();

        let deploy = deployment_api.get(&deployment_name).await.unwrap();
        wait_for(
            deployment_api,
            &deployment_name,
            conditions::is_deleted(&deploy.uid().unwrap()),
        )
        .await;
    }

    #[tokio::test]
    async fn deleting_a_function_tears_down_its_worker() {
        let (function_api, deployment_api, deployment_name) = setup("test-delete").await;

        let function = function_api.get("test-delete").await.unwrap();
        let deploy = deployment_api.get(&deployment_name).await.unwrap();
        function_api
            .delete("test-delete", &Default::default())
            .await
            .unwrap();

        wait_for(
            function_api,
            "test-delete",
            conditions::is_deleted(&function.uid().unwrap()),
        )
        .await;
        wait_for(
            deployment_api,
            &deployment_name,
            conditions::is_deleted(&deploy.uid().unwrap()),
        )
        .await;
    }

    #[tokio::test]
    async fn shared_worker_survives_an_active_sibling() {
        let client = Client::try_default().await.unwrap();
        let function_api = Api::<Function>::namespaced(client.clone(), "default");
        let deployment_api = Api::<Deployment>::namespaced(client, "default");
        let deployment_name = "runtime-python-e2e-siblings".to_owned();

        let a = Function::new("sibling-a", function_spec("e2e-siblings", "python"));
        let b = Function::new("sibling-b", function_spec("e2e-siblings", "python"));
        function_api.create(&PostParams::default(), &a).await.unwrap();
        function_api.create(&PostParams::default(), &b).await.unwrap();
        wait_for(deployment_api.clone(), &deployment_name, is_deployment_ready()).await;

        let mut a = function_api.get("sibling-a").await.unwrap();
        a.spec.is_active = false;
        a.metadata.managed_fields = None;
        function_api
            .patch(
                "sibling-a",
                &PatchParams::apply("e2e-tests").force(),
                &Patch::Apply(&a),
            )
            .await
            .unwrap();

        // give the reconciler a beat, then the shared deployment must still exist
        tokio::time::sleep(Duration::from_secs(5)).await;
        deployment_api
            .get(&deployment_name)
            .await
            .expect("shared worker must survive while sibling-b is still active");
    }
}
