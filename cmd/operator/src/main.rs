use actix_web::{get, middleware, web::Data, App, HttpRequest, HttpResponse, HttpServer, Responder};
use clap::{crate_authors, crate_description, crate_version, Parser};
use kube::Config;
use prometheus_client::registry::Registry;

use litefunctions_common::telemetry::{self, LogFormat};
use litefunctions_k8s_util::client::new_client_with_metrics;
use litefunctions_operator::controller::{self, State};
use litefunctions_operator::metrics::Metrics;
use litefunctions_operator::sweeper;

#[get("/metrics")]
async fn metrics(state: Data<State>) -> impl Responder {
    HttpResponse::Ok()
        .content_type("application/openmetrics-text; version=1.0.0; charset=utf-8")
        .body(state.metrics())
}

#[get("/healthz")]
async fn health(_: HttpRequest) -> impl Responder {
    HttpResponse::Ok().body("ok")
}

#[derive(Parser, Debug)]
#[command(
    name = "litefunctions-operator",
    about = crate_description!(),
    version = crate_version!(),
    author = crate_authors!("\n"),
)]
struct Args {
    /// Port the health/metrics HTTP listener binds on.
    #[arg(long, default_value_t = 8080, env = "HTTP_PORT")]
    http_port: u16,

    /// Interval between cluster-wide cleanup sweeps.
    #[arg(long, default_value_t = 60, env = "SWEEP_INTERVAL_SECONDS")]
    sweep_interval_seconds: u64,

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
        "litefunctions-operator",
        &args.log_filter,
        args.log_format,
        args.tracing_url.as_deref(),
        args.sample_ratio,
    )
    .await?;

    let mut registry = Registry::with_prefix("litefunctions_operator");
    let config = Config::infer().await?;
    let client = new_client_with_metrics(config, &mut registry).await?;

    let state = State::new(Metrics::new(registry));

    let reconciler = controller::run(state.clone(), client.clone());
    let sweep = sweeper::run(
        client,
        std::time::Duration::from_secs(args.sweep_interval_seconds),
    );

    let server = HttpServer::new(move || {
        App::new()
            .app_data(Data::new(state.clone()))
            .wrap(middleware::Logger::default().exclude("/healthz"))
            .service(health)
            .service(metrics)
    })
    .bind(format!("0.0.0.0:{}", args.http_port))?
    .shutdown_timeout(5);

    tracing::info!(http_port = args.http_port, "operator listening");

    tokio::select! {
        _ = reconciler => {},
        _ = sweep => {},
        res = server.run() => { res?; },
    }
    Ok(())
}
