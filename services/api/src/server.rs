use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemorySessionStore};
use crate::routes::with_assessment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use maturity_assessment::assessment::report::PdfRenderer;
use maturity_assessment::assessment::session::AssessmentService;
use maturity_assessment::config::AppConfig;
use maturity_assessment::error::AppError;
use maturity_assessment::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let sessions = Arc::new(InMemorySessionStore::with_idle_timeout(
        config.sessions.idle_timeout(),
    ));
    let renderer = Arc::new(PdfRenderer);
    let assessment_service = Arc::new(AssessmentService::new(
        sessions,
        renderer,
        config.report.clone(),
    ));

    let app = with_assessment_routes(assessment_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        organization = %config.report.organization,
        session_idle_minutes = config.sessions.idle_minutes,
        "maturity assessment service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
