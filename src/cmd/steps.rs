//! Step catalog listing and offline validation — `onboard steps`, `onboard validate`.

use anyhow::{Context, Result, bail};
use chrono::Local;

use onboard::config::PortalConfig;
use onboard::flow::find_step;
use onboard::record::FieldMap;
use onboard::validator::{Advisory, Validator};

pub fn cmd_steps(project_dir: &std::path::Path) -> Result<()> {
    let config = PortalConfig::new(project_dir.to_path_buf())?;
    let catalog = config.catalog()?;

    println!();
    println!("{}", console::style("Onboarding Steps").bold().cyan());
    println!();

    for (i, step) in catalog.steps.iter().enumerate() {
        println!(
            "  {}. {} {}",
            i + 1,
            console::style(&step.title).bold(),
            console::style(format!("({})", step.id)).dim()
        );
        println!("     required: {}", step.required.join(", "));
        if let Some(rule) = &step.nominees {
            let shares = if rule.shares_must_total {
                "shares must total 100%"
            } else {
                "no share check"
            };
            println!("     entries:  {} ({})", rule.field, shares);
        }
        if !step.shared_fields.is_empty() {
            println!("     shares:   {}", step.shared_fields.join(", "));
        }
    }
    println!();

    Ok(())
}

pub fn cmd_validate(
    project_dir: &std::path::Path,
    step: &str,
    record_path: &std::path::Path,
) -> Result<()> {
    let config = PortalConfig::new(project_dir.to_path_buf())?;
    let catalog = config.catalog()?;
    let validator = Validator::new(config.validation_policy());
    let step = find_step(&catalog, step)?;

    let content = std::fs::read_to_string(record_path)
        .with_context(|| format!("Failed to read record file: {}", record_path.display()))?;
    let fields: FieldMap = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse record JSON: {}", record_path.display()))?;

    let today = Local::now().date_naive();
    for advisory in validator.advisories(step, &fields, today) {
        match advisory {
            Advisory::MinorWithoutGuardian { field, index, name } => println!(
                "{} {}[{}] {} is a minor without guardian details",
                console::style("⚠").yellow(),
                field,
                index,
                name
            ),
        }
    }

    match validator.validate_as_of(step, &fields, today) {
        Ok(()) => {
            println!(
                "{} {} passes validation",
                console::style("✓").green(),
                step.title
            );
            Ok(())
        }
        Err(err) => {
            println!(
                "{} {}: {}",
                console::style("✗").red().bold(),
                console::style(err.field()).bold(),
                err
            );
            bail!("Step '{}' failed validation on field '{}'", step.id, err.field())
        }
    }
}
