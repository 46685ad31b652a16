use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryResumeStore};
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use vendor_portal::config::AppConfig;
use vendor_portal::error::AppError;
use vendor_portal::portal::server::{InMemoryPortalRepository, VendorPortalService};
use vendor_portal::telemetry;

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
        resumes: InMemoryResumeStore::default(),
        storage_base_url: config.portal.storage_base_url.clone(),
    };

    let repository = Arc::new(InMemoryPortalRepository::new());
    let portal_service = Arc::new(VendorPortalService::with_session_ttl(
        repository,
        config.portal.session_ttl,
    ));

    let app = with_portal_routes(portal_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "vendor portal ready");

    axum::serve(listener, app).await?;
    Ok(())
}
