//! Project initialization command.

use anyhow::Result;

pub fn cmd_init(project_dir: &std::path::Path) -> Result<()> {
    use onboard::init::{init_project, is_initialized};

    let was_initialized = is_initialized(project_dir);

    let result = init_project(project_dir)?;

    if result.created {
        println!(
            "Initialized onboarding portal at {}",
            result.onboard_dir.display()
        );
        println!();
        println!("Created directory structure:");
        println!("  .onboard/");
        println!("  ├── onboard.toml  # Portal configuration");
        println!("  ├── exports/      # Spreadsheet rows of completed applicants");
        println!("  └── logs/         # JSON log files");
        println!();
        println!("Next steps:");
        println!("  1. Review .onboard/onboard.toml (`onboard config show`)");
        println!("  2. Run `onboard steps` to see the onboarding forms");
        println!("  3. Run `onboard serve` to start the portal");
    } else if was_initialized {
        println!(
            "Onboarding portal already initialized at {}",
            result.onboard_dir.display()
        );
        println!("Directory structure verified.");
    }

    Ok(())
}
