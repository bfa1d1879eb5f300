use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    response::IntoResponse,
};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use super::api::{self, AppState};
use super::db::{DbHandle, PortalDb};
use crate::config::Theme;
use crate::export::JsonlSink;
use crate::steps::StepCatalog;
use crate::validator::Validator;

/// Configuration for the portal server.
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub sheet_log: PathBuf,
    pub theme: Theme,
    pub dev_mode: bool,
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            db_path: PathBuf::from(".onboard/onboard.db"),
            sheet_log: PathBuf::from(".onboard/exports/sheet-rows.jsonl"),
            theme: Theme::System,
            dev_mode: false,
            open_browser: false,
        }
    }
}

/// Build the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::api_router().fallback(not_found).with_state(state)
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": format!("No route for {}", uri.path())})),
    )
}

/// Start the portal server and run until Ctrl+C.
pub async fn start_server(config: ServerConfig, catalog: StepCatalog, validator: Validator) -> Result<()> {
    let db = PortalDb::new(&config.db_path).context("Failed to initialize portal database")?;

    let state = Arc::new(AppState {
        db: DbHandle::new(db),
        catalog,
        validator,
        theme: config.theme,
        row_sink: Arc::new(JsonlSink::new(&config.sheet_log)),
    });

    let mut app = build_router(state);
    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    let url = format!("http://{}", local_addr);
    info!(%url, db = %config.db_path.display(), "Onboarding portal listening");
    println!("Onboarding portal running at {}", url);

    if config.open_browser
        && let Err(e) = open::that(&url)
    {
        warn!(error = %e, "Could not open browser");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
