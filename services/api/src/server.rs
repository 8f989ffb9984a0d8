use crate::cli::ServeArgs;
use crate::infra::{AppState, MemoryConnector};
use crate::routes::build_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use casavista::auth::AccessGate;
use casavista::config::AppConfig;
use casavista::content::router::ContentState;
use casavista::content::MediaResolver;
use casavista::error::AppError;
use casavista::storage::ConnectionPool;
use casavista::telemetry;
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

    let gate = Arc::new(AccessGate::new(&config.admin));
    let content_state = Arc::new(ContentState {
        pool: ConnectionPool::new(MemoryConnector::new(&config.storage.url)),
        media: MediaResolver::new(&config.site.base_url),
    });

    let app = build_router(content_state, gate)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "casavista admin backend ready");

    axum::serve(listener, app).await?;
    Ok(())
}
