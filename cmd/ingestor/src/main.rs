use actix_web::{get, middleware, web::Data, App, HttpResponse, HttpServer, Responder};
use clap::{crate_authors, crate_description, crate_version, Parser};
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use std::sync::Mutex;
use std::time::Duration;

use litefunctions_broker::Broker;
use litefunctions_common::telemetry::{self, LogFormat};
use litefunctions_dispatcher::metrics::DispatcherMetrics;
use litefunctions_dispatcher::{AppState, SchedulerClient};

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

#[derive(Parser, Debug)]
#[command(
    name = "litefunctions-ingestor",
    about = crate_description!(),
    version = crate_version!(),
    author = crate_authors!("\n"),
)]
struct Args {
    #[arg(long, default_value_t = 8080, env = "HTTP_PORT")]
    http_port: u16,

    #[arg(long, default_value = "nats://127.0.0.1:4222", env = "NATS_URL")]
    nats_url: String,

    #[arg(long, default_value = "http://127.0.0.1:50051", env = "OPERATOR_URL")]
    scheduler_url: String,

    #[arg(long, default_value = "default", env)]
    namespace: String,

    /// Bounds the sync-unary wait on the first res message, in milliseconds.
    #[arg(long, default_value_t = 500, env = "REPLY_TIMEOUT")]
    reply_timeout_ms: u64,

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
        "litefunctions-ingestor",
        &args.log_filter,
        args.log_format,
        args.tracing_url.as_deref(),
        args.sample_ratio,
    )
    .await?;

    let mut registry = Registry::with_prefix("litefunctions_ingestor");
    let metrics = DispatcherMetrics::register(&mut registry);

    let broker = Broker::connect(&args.nats_url).await?;
    let scheduler = SchedulerClient::connect(args.scheduler_url.clone()).await?;

    let state = Data::new(AppState {
        scheduler,
        broker,
        http_client: reqwest::Client::new(),
        namespace: args.namespace,
        reply_timeout: Duration::from_millis(args.reply_timeout_ms),
        metrics,
    });
    let registry = Data::new(Mutex::new(registry));

    tracing::info!(port = args.http_port, "ingestor listening");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(registry.clone())
            .wrap(middleware::Logger::default().exclude("/healthz"))
            .service(metrics)
            .configure(litefunctions_dispatcher::configure)
    })
    .bind(format!("0.0.0.0:{}", args.http_port))?
    .shutdown_timeout(10)
    .run()
    .await?;

    Ok(())
}
