//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here; authentication is delegated to AuthService.

use dotenv::dotenv;
use quote_intake::adapters::http::{HttpBackendGateway, MockBackendGateway};
use quote_intake::adapters::persistence::{HistoryJson, SessionJson};
use quote_intake::adapters::ui::tui::IntakeTui;
use quote_intake::ports::{BackendGateway, HistoryPort, InputPort, SessionStore};
use quote_intake::usecases::{AuthService, ReportService, ResultPoller, UploadService};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    quote_intake::adapters::ui::init_ui();

    let cfg = quote_intake::shared::config::AppConfig::load().unwrap_or_default();

    let data_dir = cfg.data_dir_or_default();
    let data_path = PathBuf::from(&data_dir);
    tokio::fs::create_dir_all(&data_path)
        .await
        .map_err(|e| anyhow::anyhow!("create data dir: {}", e))?;
    info!(path = %data_path.display(), "data directory");

    // --- Backend gateway: real endpoint or mock when unconfigured ---
    let gateway: Arc<dyn BackendGateway> = if cfg.is_backend_configured() {
        info!(url = %cfg.api_base_url_or_default(), "backend gateway enabled");
        Arc::new(HttpBackendGateway::new(
            cfg.api_base_url_or_default(),
            Duration::from_secs(cfg.http_timeout_secs_or_default()),
        ))
    } else {
        warn!("INTAKE_API_BASE_URL not set, using mock backend gateway");
        Arc::new(MockBackendGateway::new())
    };

    // --- Session (one file per profile) ---
    let session_store: Arc<dyn SessionStore> =
        Arc::new(SessionJson::new(cfg.session_path_or_default()));

    // --- Services ---
    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&gateway),
        Arc::clone(&session_store),
    ));
    auth_service
        .restore()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let history: Arc<dyn HistoryPort> = Arc::new(HistoryJson::new(data_path.join("history.jsonl")));
    let upload_service = Arc::new(UploadService::new(Arc::clone(&gateway), history));

    let poll_interval = Duration::from_millis(cfg.poll_interval_ms_or_default());
    info!(
        poll_interval_ms = cfg.poll_interval_ms_or_default(),
        poll_attempts = cfg.poll_attempts_or_default(),
        "poll pacing"
    );
    let poller = Arc::new(ResultPoller::new(
        Arc::clone(&gateway),
        poll_interval,
        cfg.poll_attempts_or_default(),
        cfg.comparison_poll_attempts_or_default(),
    ));

    let report_service = Arc::new(ReportService::new(data_path.join("reports")));

    let input_port: Arc<dyn InputPort> = Arc::new(IntakeTui::new(
        auth_service,
        upload_service,
        poller,
        report_service,
    ));

    // --- Run (auth menu -> upload / QC / history) ---
    input_port.run().await.map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
