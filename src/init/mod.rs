//! Initialization of the `.onboard/` project directory.
//!
//! ```text
//! .onboard/
//! ├── onboard.toml     # Portal configuration
//! ├── steps.json       # Optional custom step catalog
//! ├── onboard.db       # Applicant records (created by `onboard serve`)
//! ├── exports/         # Spreadsheet row log
//! └── logs/            # JSON log files
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::PortalToml;

/// The name of the portal configuration directory.
pub const ONBOARD_DIR: &str = ".onboard";

/// Result of initializing a portal project.
#[derive(Debug)]
pub struct InitResult {
    /// Path to the .onboard directory
    pub onboard_dir: PathBuf,
    /// Whether the directory was newly created (false if it already existed)
    pub created: bool,
}

/// Initialize a portal project in the given directory.
///
/// Re-running on an initialized project fills in anything missing and
/// leaves an existing `onboard.toml` untouched.
pub fn init_project(project_dir: &Path) -> Result<InitResult> {
    let onboard_dir = project_dir.join(ONBOARD_DIR);
    let created = !onboard_dir.exists();

    std::fs::create_dir_all(&onboard_dir)
        .with_context(|| format!("Failed to create directory: {}", onboard_dir.display()))?;
    ensure_directory_structure(&onboard_dir)?;

    Ok(InitResult {
        onboard_dir,
        created,
    })
}

fn ensure_directory_structure(onboard_dir: &Path) -> Result<()> {
    for sub in ["exports", "logs"] {
        let path = onboard_dir.join(sub);
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {} directory: {}", sub, path.display()))?;
    }

    let config_file = onboard_dir.join("onboard.toml");
    if !config_file.exists() {
        PortalToml::default().save(&config_file)?;
    }

    Ok(())
}

/// Check if a project is already initialized.
pub fn is_initialized(project_dir: &Path) -> bool {
    project_dir.join(ONBOARD_DIR).exists()
}

/// Get the path to the .onboard directory for a project.
pub fn get_onboard_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(ONBOARD_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_project_creates_onboard_directory() {
        let dir = tempdir().unwrap();
        let result = init_project(dir.path()).unwrap();

        assert!(result.created);
        assert_eq!(result.onboard_dir, dir.path().join(".onboard"));
        assert!(result.onboard_dir.join("exports").is_dir());
        assert!(result.onboard_dir.join("logs").is_dir());
        assert!(result.onboard_dir.join("onboard.toml").is_file());
        assert!(is_initialized(dir.path()));
    }

    #[test]
    fn test_init_project_is_idempotent_and_keeps_config() {
        let dir = tempdir().unwrap();
        init_project(dir.path()).unwrap();

        let config_file = dir.path().join(".onboard/onboard.toml");
        std::fs::write(&config_file, "[server]\nport = 9999\n").unwrap();

        let second = init_project(dir.path()).unwrap();
        assert!(!second.created);
        let toml = PortalToml::load(&config_file).unwrap();
        assert_eq!(toml.server.port, 9999);
    }

    #[test]
    fn test_is_initialized_false_for_empty_dir() {
        let dir = tempdir().unwrap();
        assert!(!is_initialized(dir.path()));
        assert_eq!(get_onboard_dir(dir.path()), dir.path().join(".onboard"));
    }
}
