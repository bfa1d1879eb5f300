use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "onboard")]
#[command(version, about = "Employee onboarding portal")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the .onboard directory in a project
    Init,
    /// Start the onboarding portal HTTP server
    Serve {
        /// Port to serve on (overrides onboard.toml and ONBOARD_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Enable dev mode (bind all interfaces, CORS permissive)
        #[arg(long)]
        dev: bool,

        /// Open the portal in a browser after the server starts
        #[arg(long)]
        open: bool,
    },
    /// List the onboarding steps in order
    Steps,
    /// Validate a step record stored as a JSON file
    Validate {
        /// Step id or record key (e.g. "form11" or "pf_nomination")
        #[arg(short, long)]
        step: String,

        /// Path to a JSON object holding the step's fields
        record: PathBuf,
    },
    /// Export a stored applicant as a spreadsheet row or a PDF fill plan
    Export {
        applicant_id: String,

        /// Produce the fill plan for this step's form instead of the sheet row
        #[arg(long)]
        form: Option<String>,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default onboard.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let log_dir = onboard::init::is_initialized(&project_dir)
        .then(|| onboard::init::get_onboard_dir(&project_dir).join("logs"));
    let default_filter = if cli.verbose { "debug" } else { "info" };
    onboard::logging::init_logging(log_dir.as_deref(), default_filter);

    match &cli.command {
        Commands::Init => cmd::cmd_init(&project_dir)?,
        Commands::Serve { port, dev, open } => {
            cmd::cmd_serve(&project_dir, *port, *dev, *open).await?
        }
        Commands::Steps => cmd::cmd_steps(&project_dir)?,
        Commands::Validate { step, record } => cmd::cmd_validate(&project_dir, step, record)?,
        Commands::Export { applicant_id, form } => {
            cmd::cmd_export(&project_dir, applicant_id, form.as_deref())?
        }
        Commands::Config { command } => cmd::cmd_config(&project_dir, command.clone())?,
    }

    Ok(())
}
