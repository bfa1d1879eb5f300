//! Portal HTTP server command — `onboard serve`.

use anyhow::Result;
use tracing::warn;

use onboard::config::PortalConfig;
use onboard::portal::{ServerConfig, start_server};
use onboard::validator::Validator;

pub async fn cmd_serve(
    project_dir: &std::path::Path,
    port: Option<u16>,
    dev: bool,
    open: bool,
) -> Result<()> {
    let config = PortalConfig::with_cli_args(project_dir.to_path_buf(), port)?;
    for warning in config.validate() {
        warn!("{}", warning);
    }

    let catalog = config.catalog()?;
    let validator = Validator::new(config.validation_policy());

    // No browser inside dev containers
    let open_browser = open && !dev;
    let host = if dev { "0.0.0.0".to_string() } else { config.host() };

    start_server(
        ServerConfig {
            host,
            port: config.port(),
            db_path: config.db_path(),
            sheet_log: config.sheet_log(),
            theme: config.theme(),
            dev_mode: dev,
            open_browser,
        },
        catalog,
        validator,
    )
    .await
}
