use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryFollowUpPublisher, InMemoryRegistrationSink, InMemorySessionRepository,
};
use crate::routes::with_onboarding_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use patient_intake::config::AppConfig;
use patient_intake::error::AppError;
use patient_intake::telemetry;
use patient_intake::workflows::onboarding::OnboardingService;
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

    let sessions = Arc::new(InMemorySessionRepository::with_capacity(
        config.onboarding.session_capacity,
    ));
    let sink = Arc::new(InMemoryRegistrationSink::default());
    let follow_ups = Arc::new(InMemoryFollowUpPublisher::default());
    let onboarding_service = Arc::new(OnboardingService::new(sessions, sink, follow_ups));

    let app = with_onboarding_routes(onboarding_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        session_capacity = config.onboarding.session_capacity,
        "patient intake service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
