use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use machconform::compliance::{
    assessment_router, CaseAssessmentService, CaseDossier, InMemoryAssessmentRepository,
    RiskEngine, ScoreResult, ScoringConfig, TracingAlertPublisher,
};
use machconform::config::AppConfig;
use machconform::error::AppError;
use machconform::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Machinery Compliance Desk",
    about = "Manage CE and customs compliance dossiers for imported industrial machinery",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Assess a dossier JSON file and print the risk report
    Assess(AssessArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct AssessArgs {
    /// Path to a case dossier JSON file
    #[arg(long)]
    dossier: PathBuf,
    /// Emit the raw assessment JSON instead of the text report
    #[arg(long)]
    json: bool,
    /// Include the full anomaly listing in the text report
    #[arg(long)]
    list_anomalies: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Assess(args) => run_assess(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let repository = Arc::new(InMemoryAssessmentRepository::default());
    let alerts = Arc::new(TracingAlertPublisher);
    let service = Arc::new(CaseAssessmentService::new(
        repository,
        alerts,
        ScoringConfig::default(),
    ));

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(assessment_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "compliance desk ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.dossier)?;
    let dossier: CaseDossier = serde_json::from_str(&raw)?;

    let engine = RiskEngine::default();
    let result = engine.assess(&dossier)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        render_assessment(&dossier, &result, args.list_anomalies);
    }

    Ok(())
}

fn render_assessment(dossier: &CaseDossier, result: &ScoreResult, list_anomalies: bool) {
    println!("Compliance risk assessment");
    println!(
        "Machine: {} {} (serial {})",
        dossier.machine.name, dossier.machine.make_model, dossier.machine.serial_number
    );

    println!("\nScores");
    println!("- CE conformity:  {}/100", result.score_ce);
    println!("- Customs:        {}/100", result.score_customs);
    println!("- Coherence:      {}/100", result.score_coherence);
    println!(
        "- Global:         {}/100 (risk tier: {})",
        result.score_global,
        result.risk_tier.label()
    );

    if result.anomalies.is_empty() {
        println!("\nAnomalies: none");
    } else {
        println!("\nAnomalies: {}", result.anomalies.len());
        if list_anomalies {
            for anomaly in &result.anomalies {
                println!(
                    "- [{}/{}] {}: {} (-{})",
                    anomaly.category.label(),
                    anomaly.severity.label(),
                    anomaly.code,
                    anomaly.message,
                    anomaly.penalty
                );
            }
        }
    }

    if result.recommendations.is_empty() {
        println!("\nRecommendations: none");
    } else {
        println!("\nRecommendations");
        for recommendation in &result.recommendations {
            println!("- {recommendation}");
        }
    }
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
