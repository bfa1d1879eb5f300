//! Export a stored applicant — `onboard export`.

use anyhow::Result;

use onboard::config::PortalConfig;
use onboard::errors::PortalError;
use onboard::export::{fill_plan, sheet_row};
use onboard::flow::find_step;
use onboard::portal::PortalDb;

pub fn cmd_export(project_dir: &std::path::Path, applicant_id: &str, form: Option<&str>) -> Result<()> {
    let config = PortalConfig::new(project_dir.to_path_buf())?;
    let catalog = config.catalog()?;
    let db = PortalDb::new(&config.db_path())?;

    let applicant = db
        .get_applicant(applicant_id)?
        .ok_or_else(|| PortalError::ApplicantNotFound {
            id: applicant_id.to_string(),
        })?;

    let output = match form {
        Some(name) => {
            let step = find_step(&catalog, name)?;
            serde_json::to_string_pretty(&fill_plan(&catalog, &applicant.record, step))?
        }
        None => serde_json::to_string_pretty(&sheet_row(&catalog, &applicant.record))?,
    };
    println!("{}", output);

    Ok(())
}
