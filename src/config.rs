//! Unified configuration for the onboarding portal.
//!
//! Settings are read from `.onboard/onboard.toml` and layered
//! file → environment → CLI.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! db_path = ".onboard/onboard.db"
//!
//! [validation]
//! share_tolerance = 0.01
//! enforce_minor_guardian = false
//!
//! [ui]
//! theme = "system"
//!
//! [export]
//! sheet_log = ".onboard/exports/sheet-rows.jsonl"
//!
//! [steps.overrides."form*"]
//! required = ["department"]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::init::ONBOARD_DIR;
use crate::steps::{StepCatalog, StepId, load_catalog_or_default};
use crate::validator::ValidationPolicy;

/// Colour scheme handed to the front end.
///
/// `System` defers to the browser's `prefers-color-scheme`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Theme::System => write!(f, "system"),
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(Theme::System),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => anyhow::bail!("Invalid theme '{}'. Valid values: system, light, dark", s),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// SQLite database path, relative to the project directory
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    format!("{}/onboard.db", ONBOARD_DIR)
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
        }
    }
}

/// Validation tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSection {
    /// Allowed deviation of the nominee share total from 100
    #[serde(default = "default_share_tolerance")]
    pub share_tolerance: f64,
    /// Block advancing when a minor nominee has no guardian details
    #[serde(default)]
    pub enforce_minor_guardian: bool,
}

fn default_share_tolerance() -> f64 {
    0.01
}

impl Default for ValidationSection {
    fn default() -> Self {
        Self {
            share_tolerance: default_share_tolerance(),
            enforce_minor_guardian: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiSection {
    #[serde(default)]
    pub theme: Theme,
}

/// Export collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSection {
    /// JSON-lines file that receives one spreadsheet row per completed applicant
    #[serde(default = "default_sheet_log")]
    pub sheet_log: String,
}

fn default_sheet_log() -> String {
    format!("{}/exports/sheet-rows.jsonl", ONBOARD_DIR)
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            sheet_log: default_sheet_log(),
        }
    }
}

/// Step-specific override settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepOverride {
    /// Extra required fields for matching steps
    #[serde(default)]
    pub required: Vec<String>,
}

/// Step override configuration section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepsSection {
    /// Pattern-based overrides (e.g., "form*" -> StepOverride)
    #[serde(default)]
    pub overrides: HashMap<String, StepOverride>,
}

/// Parsed contents of `onboard.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortalToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub validation: ValidationSection,
    #[serde(default)]
    pub ui: UiSection,
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub steps: StepsSection,
}

impl PortalToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse onboard.toml")
    }

    /// Load configuration from `.onboard/onboard.toml`, or defaults if absent.
    pub fn load_or_default(onboard_dir: &Path) -> Result<Self> {
        let config_path = onboard_dir.join("onboard.toml");
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize onboard.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Theme, with `ONBOARD_THEME` taking precedence over the file.
    pub fn theme(&self) -> Theme {
        std::env::var("ONBOARD_THEME")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.ui.theme)
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            share_tolerance: self.validation.share_tolerance,
            enforce_minor_guardian: self.validation.enforce_minor_guardian,
        }
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("Invalid port 0: choose a port between 1 and 65535".to_string());
        }

        let tolerance = self.validation.share_tolerance;
        if !tolerance.is_finite() || !(0.0..1.0).contains(&tolerance) {
            warnings.push(format!(
                "Invalid share_tolerance {}: should be at least 0 and below 1",
                tolerance
            ));
        }

        for pattern in self.steps.overrides.keys() {
            let matches_any = StepId::ALL
                .iter()
                .any(|id| pattern_matches(pattern, id.as_str()));
            if !matches_any {
                warnings.push(format!(
                    "Step override pattern '{}' does not match any step",
                    pattern
                ));
            }
        }

        warnings
    }
}

/// Check if a pattern matches a step id.
/// Supports simple glob patterns:
/// - `*` matches any sequence of characters
/// - `?` matches any single character
pub fn pattern_matches(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let name: Vec<char> = name.to_lowercase().chars().collect();

    glob_match(&pattern, &name)
}

fn glob_match(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => {
            let rest = {
                let skip = rest.iter().take_while(|c| **c == '*').count();
                &rest[skip..]
            };
            if rest.is_empty() {
                return true;
            }
            (0..=text.len()).any(|i| glob_match(rest, &text[i..]))
        }
        Some(('?', rest)) => !text.is_empty() && glob_match(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && glob_match(rest, &text[1..]),
    }
}

/// Effective configuration: `onboard.toml` merged with environment and CLI.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Path to the project directory
    pub project_dir: PathBuf,
    /// Path to the .onboard directory
    pub onboard_dir: PathBuf,
    /// Parsed onboard.toml configuration
    pub toml: PortalToml,
    /// CLI override for the listening port
    pub cli_port: Option<u16>,
}

impl PortalConfig {
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let onboard_dir = project_dir.join(ONBOARD_DIR);
        let toml = PortalToml::load_or_default(&onboard_dir)?;

        Ok(Self {
            project_dir,
            onboard_dir,
            toml,
            cli_port: None,
        })
    }

    pub fn with_cli_args(project_dir: PathBuf, port: Option<u16>) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.cli_port = port;
        Ok(config)
    }

    /// Listening host (env → file).
    pub fn host(&self) -> String {
        std::env::var("ONBOARD_HOST").unwrap_or_else(|_| self.toml.server.host.clone())
    }

    /// Listening port (CLI → env → file).
    pub fn port(&self) -> u16 {
        self.cli_port
            .or_else(|| {
                std::env::var("ONBOARD_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .unwrap_or(self.toml.server.port)
    }

    /// Database path (env → file), resolved against the project directory.
    pub fn db_path(&self) -> PathBuf {
        let raw = std::env::var("ONBOARD_DB_PATH").unwrap_or_else(|_| self.toml.server.db_path.clone());
        self.project_dir.join(raw)
    }

    pub fn sheet_log(&self) -> PathBuf {
        self.project_dir.join(&self.toml.export.sheet_log)
    }

    pub fn steps_file(&self) -> PathBuf {
        self.onboard_dir.join("steps.json")
    }

    pub fn theme(&self) -> Theme {
        self.toml.theme()
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        self.toml.validation_policy()
    }

    /// Step catalog from `.onboard/steps.json` (or the built-in one) with
    /// the configured required-field overrides applied.
    pub fn catalog(&self) -> Result<StepCatalog> {
        let catalog = load_catalog_or_default(Some(&self.steps_file()))?;
        Ok(catalog.with_overrides(&self.toml.steps))
    }

    /// Validate configuration and return warnings.
    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}
