//! gRPC client over the Activation Scheduler's `FunctionService`, constructed
//! once at process start and cloned (cheap: `tonic::transport::Channel` is a
//! handle) into every request handler.

use std::time::Duration;

use tonic::transport::Channel;

use litefunctions_proto::function_service_client::FunctionServiceClient;
use litefunctions_proto::ActivateRequest;

use crate::error::{map_scheduler_status, DispatcherError};

/// Bounds the gRPC round trip to the Activation Scheduler.
const SCHEDULER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SchedulerClient {
    inner: FunctionServiceClient<Channel>,
}

/// The routing descriptor resolved for one invocation, as consumed by the
/// lambda handlers (mirrors `ActivateResponse` without the gRPC wire types).
#[derive(Debug, Clone)]
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

impl SchedulerClient {
    pub async fn connect(url: String) -> Result<Self, tonic::transport::Error> {
        let channel = Channel::from_shared(url)
            .expect("invalid scheduler URL")
            .connect()
            .await?;
        Ok(Self {
            inner: FunctionServiceClient::new(channel),
        })
    }

    pub async fn activate(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ActivationDescriptor, DispatcherError> {
        let mut request = tonic::Request::new(ActivateRequest {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        });
        request.set_timeout(SCHEDULER_TIMEOUT);

        let response = self
            .inner
            .clone()
            .activate(request)
            .await
            .map_err(map_scheduler_status)?
            .into_inner();

        Ok(ActivationDescriptor {
            is_active: response.is_active,
            language: response.language,
            is_async: response.is_async,
            project: response.project,
            name: response.name,
            method: response.method,
            service_name: response.service_name,
            service_port: response.service_port.map(|p| p as u16),
        })
    }
}
