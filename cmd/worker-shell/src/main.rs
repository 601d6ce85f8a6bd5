use actix_web::{get, middleware, web::Data, App, HttpRequest, HttpResponse, HttpServer, Responder};
use clap::{crate_authors, crate_description, crate_version, Parser, ValueEnum};
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use std::sync::Mutex;

use litefunctions_broker::Broker;
use litefunctions_common::telemetry::{self, LogFormat};
use litefunctions_worker::handler::{Handler, StreamingHandler as _, UnaryHandler as _};
use litefunctions_worker::shell::{EchoHandler, RandomWordHandler};
use litefunctions_worker::{consumer, WorkerConfig, WorkerMetrics};

#[get("/metrics")]
async fn metrics(registry: Data<Mutex<Registry>>) -> impl Responder {
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

/// Which worked-example handler shape this process binds, standing in for a
/// real per-language runtime picking its own.
#[derive(Copy, Clone, Debug, ValueEnum)]
enum Shape {
    Unary,
    Streaming,
}

#[derive(Parser, Debug)]
#[command(
    name = "litefunctions-worker-shell",
    about = crate_description!(),
    version = crate_version!(),
    author = crate_authors!("\n"),
)]
struct Args {
    #[arg(long, value_enum, default_value_t = Shape::Unary, env = "WORKER_SHAPE")]
    shape: Shape,

    /// Binds the shared dynamic-language subscription instead of a
    /// per-function one; when set, NAME is not required.
    #[arg(long, default_value_t = false, env = "WORKER_SHARED")]
    shared: bool,

    #[arg(long, default_value_t = 8080, env = "HTTP_PORT")]
    http_port: u16,

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
        "litefunctions-worker-shell",
        &args.log_filter,
        args.log_format,
        args.tracing_url.as_deref(),
        args.sample_ratio,
    )
    .await?;

    let config = if args.shared {
        WorkerConfig::from_env_shared()?
    } else {
        WorkerConfig::from_env_per_function()?
    };

    let handler = match args.shape {
        Shape::Unary => Handler::Unary(Box::new(EchoHandler)),
        Shape::Streaming => Handler::Streaming(Box::new(RandomWordHandler)),
    };

    let broker = Broker::connect(&config.nats_url).await?;

    let mut registry = Registry::with_prefix("litefunctions_worker_shell");
    let worker_metrics = WorkerMetrics::register(&mut registry);
    let registry = Data::new(Mutex::new(registry));

    tracing::info!(
        project = %config.project,
        name = ?config.name,
        language = %config.language,
        shape = ?args.shape,
        "worker-shell listening"
    );

    let http_server = HttpServer::new(move || {
        App::new()
            .app_data(registry.clone())
            .wrap(middleware::Logger::default().exclude("/healthz"))
            .service(health)
            .service(metrics)
    })
    .bind(format!("0.0.0.0:{}", args.http_port))?
    .shutdown_timeout(5)
    .run();

    let consumer = consumer::run(broker, config, handler, worker_metrics);

    tokio::select! {
        res = http_server => res?,
        res = consumer => res?,
    }

    Ok(())
}
