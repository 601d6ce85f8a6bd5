use actix_web::{get, middleware, web::Data, App, HttpRequest, HttpResponse, HttpServer, Responder};
use clap::{crate_authors, crate_description, crate_version, Parser};
use kube::Config;
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use tonic::transport::Server;

use litefunctions_common::telemetry::{self, LogFormat};
use litefunctions_k8s_util::client::new_client_with_metrics;
use litefunctions_proto::function_service_server::FunctionServiceServer;
use litefunctions_scheduler::service::FunctionServiceImpl;
use litefunctions_scheduler::Scheduler;

#[get("/metrics")]
async fn metrics(registry: Data<std::sync::Mutex<Registry>>) -> impl Responder {
    let mut buffer = String::new();
    match encode(&mut buffer, &registry.lock().unwrap()) {
        Ok(()) => HttpResponse::Ok()
            .content_type("application/openmetrics-text; version=1.0.0; charset=utf-8")
            .body(buffer),
        Err(e) => {
            tracing::error!("failed to encode metrics: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/healthz")]
async fn health(_: HttpRequest) -> impl Responder {
    HttpResponse::Ok().body("ok")
}

#[derive(Parser, Debug)]
#[command(
    name = "litefunctions-scheduler",
    about = crate_description!(),
    version = crate_version!(),
    author = crate_authors!("\n"),
)]
struct Args {
    /// Port the Activation Scheduler's gRPC `FunctionService` listens on.
    #[arg(long, default_value_t = 50051, env)]
    grpc_port: u16,

    /// Port the health/metrics HTTP listener binds on.
    #[arg(long, default_value_t = 8080, env = "HTTP_PORT")]
    http_port: u16,

    /// How long a freshly activated function stays warm before it is eligible
    /// for deprovisioning.
    #[arg(long, default_value_t = 300, env = "KEEP_WARM_DURATION")]
    keep_warm_seconds: u64,

    #[arg(long, default_value = "info", env)]
    log_filter: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Text, env)]
    log_format: LogFormat,

    #[arg(long, env = "OPENTELEMETRY_ENDPOINT_URL")]
    tracing_url: Option<String>,

    #[arg(long, default_value_t = 0.1, env)]
    sample_ratio: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    telemetry::init(
        "litefunctions-scheduler",
        &args.log_filter,
        args.log_format,
        args.tracing_url.as_deref(),
        args.sample_ratio,
    )
    .await?;

    let mut registry = Registry::with_prefix("litefunctions_scheduler");
    let config = Config::infer().await?;
    let client = new_client_with_metrics(config, &mut registry).await?;

    let scheduler = Scheduler::new(client, std::time::Duration::from_secs(args.keep_warm_seconds));
    let grpc_service = FunctionServiceServer::new(FunctionServiceImpl::new(scheduler));

    let grpc_addr = format!("0.0.0.0:{}", args.grpc_port).parse()?;
    let grpc_server = Server::builder()
        .add_service(grpc_service)
        .serve(grpc_addr);

    let registry = Data::new(std::sync::Mutex::new(registry));
    let http_server = HttpServer::new(move || {
        App::new()
            .app_data(registry.clone())
            .wrap(middleware::Logger::default().exclude("/healthz"))
            .service(health)
            .service(metrics)
    })
    .bind(format!("0.0.0.0:{}", args.http_port))?
    .shutdown_timeout(5);

    tracing::info!(grpc_port = args.grpc_port, http_port = args.http_port, "scheduler listening");

    let (grpc_result, http_result) = tokio::join!(grpc_server, http_server.run());
    grpc_result?;
    http_result?;
    Ok(())
}
