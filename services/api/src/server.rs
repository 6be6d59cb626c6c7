use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_duty_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use import_duty::config::AppConfig;
use import_duty::error::AppError;
use import_duty::service::{load_calculator, DutyService};
use import_duty::telemetry;
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

    let calculator = load_calculator(&config.tariff)?;
    let rules = calculator.rules().summary();
    info!(
        source = %rules.source.describe(),
        rows = rules.rows,
        overlaps = rules.overlaps.len(),
        "tariff rules loaded"
    );
    let service = Arc::new(DutyService::new(calculator));

    let app = with_duty_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "import duty calculator ready");

    axum::serve(listener, app).await?;
    Ok(())
}
