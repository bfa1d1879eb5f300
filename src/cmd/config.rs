//! Configuration view and validation commands — `onboard config`.

use anyhow::Result;

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use onboard::config::{PortalConfig, PortalToml};
    use onboard::init::get_onboard_dir;

    let onboard_dir = get_onboard_dir(project_dir);
    let config_path = onboard_dir.join("onboard.toml");

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Onboarding Portal Configuration");
            println!("==============================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                println!();
                PortalToml::load(&config_path)?
            } else {
                println!("No onboard.toml found at {}", config_path.display());
                println!();
                println!("Using default configuration:");
                PortalToml::default()
            };

            println!("[server]");
            println!("  host = \"{}\"", toml.server.host);
            println!("  port = {}", toml.server.port);
            println!("  db_path = \"{}\"", toml.server.db_path);
            println!();

            println!("[validation]");
            println!("  share_tolerance = {}", toml.validation.share_tolerance);
            println!(
                "  enforce_minor_guardian = {}",
                toml.validation.enforce_minor_guardian
            );
            println!();

            println!("[ui]");
            println!("  theme = \"{}\"", toml.ui.theme);
            println!();

            println!("[export]");
            println!("  sheet_log = \"{}\"", toml.export.sheet_log);
            println!();

            if !toml.steps.overrides.is_empty() {
                println!("[steps.overrides]");
                let mut patterns: Vec<_> = toml.steps.overrides.iter().collect();
                patterns.sort_by(|a, b| a.0.cmp(b.0));
                for (pattern, override_cfg) in patterns {
                    println!("  \"{}\":", pattern);
                    println!("    required = {:?}", override_cfg.required);
                }
                println!();
            }

            if config_path.exists() {
                // Show effective values (including env overrides)
                println!("Effective values (with env overrides):");
                let config = PortalConfig::new(project_dir.to_path_buf())?;
                println!("  address = {}:{}", config.host(), config.port());
                println!("  db_path = {}", config.db_path().display());
                println!("  theme = {}", config.theme());
                println!();
            } else {
                println!("Run 'onboard config init' to create an onboard.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No onboard.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = PortalToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("onboard.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if !onboard_dir.exists() {
                std::fs::create_dir_all(&onboard_dir)?;
            }

            let toml = PortalToml::default();
            toml.save(&config_path)?;

            println!("Created onboard.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [server] host, port, db_path");
            println!("  - [validation] share_tolerance, enforce_minor_guardian");
            println!("  - [steps.overrides.\"form*\"] for step-specific required fields");
            println!();
        }
    }

    Ok(())
}
