use crate::cli::ServeArgs;
use crate::infra::{AppState, OutboundMailer};
use crate::routes::with_screening_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use candidate_screening::config::AppConfig;
use candidate_screening::error::AppError;
use candidate_screening::telemetry;
use candidate_screening::workflows::screening::{JsonFileStore, ScreeningService};
use candidate_screening::workflows::sheets::CsvSheetSource;
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
    if let Some(data_dir) = args.data_dir.take() {
        config.storage.data_dir = data_dir;
    }
    if let Some(sheets_dir) = args.sheets_dir.take() {
        config.sheets.export_dir = sheets_dir;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(JsonFileStore::open(&config.storage.data_dir)?);
    let source = Arc::new(CsvSheetSource::new(config.sheets.export_dir.clone()));
    let transport = Arc::new(OutboundMailer::from_settings(config.smtp.as_ref())?);
    let screening_service = Arc::new(ScreeningService::new(
        store,
        source,
        transport,
        config.sheets.position_defaults(),
        config.outreach.settings(),
    ));
    screening_service.ensure_defaults()?;

    let app = with_screening_routes(screening_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        data_dir = %config.storage.data_dir.display(),
        "candidate screening service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
