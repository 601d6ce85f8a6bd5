use tonic::{Request, Response, Status};

use litefunctions_proto::function_service_server::FunctionService;
use litefunctions_proto::{
    ActivateRequest, ActivateResponse, CreateFunctionRequest, CreateFunctionResponse,
    GetStatusRequest, GetStatusResponse,
};

use crate::Scheduler;

pub struct FunctionServiceImpl {
    scheduler: Scheduler,
}

impl FunctionServiceImpl {
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }
}

#[tonic::async_trait]
impl FunctionService for FunctionServiceImpl {
    async fn create_function(
        &self,
        request: Request<CreateFunctionRequest>,
    ) -> Result<Response<CreateFunctionResponse>, Status> {
        let req = request.into_inner();
        let created = self
            .scheduler
            .create_function(
                &req.namespace,
                &req.name,
                &req.project,
                &req.language,
                &req.method,
                req.is_async,
                req.git_creds_ref,
            )
            .await?;
        Ok(Response::new(CreateFunctionResponse { created }))
    }

    async fn activate(
        &self,
        request: Request<ActivateRequest>,
    ) -> Result<Response<ActivateResponse>, Status> {
        let req = request.into_inner();
        let descriptor = self.scheduler.activate(&req.namespace, &req.name).await?;
        Ok(Response::new(ActivateResponse {
            is_active: descriptor.is_active,
            language: descriptor.language,
            is_async: descriptor.is_async,
            project: descriptor.project,
            name: descriptor.name,
            method: descriptor.method,
            service_name: descriptor.service_name,
            service_port: descriptor.service_port.map(u32::from),
        }))
    }

    async fn get_status(
        &self,
        request: Request<GetStatusRequest>,
    ) -> Result<Response<GetStatusResponse>, Status> {
        let req = request.into_inner();
        let is_active = self.scheduler.get_status(&req.namespace, &req.name).await?;
        Ok(Response::new(GetStatusResponse { is_active }))
    }
}
