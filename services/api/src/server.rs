use crate::cli::ServeArgs;
use crate::infra::{in_memory_service, AppState};
use crate::routes::with_payroll_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};
use tutor_payroll::config::AppConfig;
use tutor_payroll::error::AppError;
use tutor_payroll::payroll::SharedSecretVerifier;
use tutor_payroll::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    if config.admin.is_development_default {
        warn!("APP_ADMIN_SECRET is not set; using the development admin secret");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let payroll_service = Arc::new(in_memory_service(config.payroll));
    let verifier = Arc::new(SharedSecretVerifier::from_config(&config.admin));

    let app = with_payroll_routes(payroll_service, verifier)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        reference_offset = %config.payroll.reference_offset(),
        "tutor payroll service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
