use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_enrolment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use learner_portal::config::AppConfig;
use learner_portal::error::AppError;
use learner_portal::telemetry;
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

    let app = with_enrolment_routes(&config.enrolment)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        closes_at = %config.enrolment.closes_at,
        "learner portal enrolment service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
