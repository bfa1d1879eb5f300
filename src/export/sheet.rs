//! Spreadsheet row export.
//!
//! A completed applicant becomes one row with a fixed column layout. Each
//! cell is resolved across the whole record, so a value entered on any step
//! lands in its column.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;

use crate::nominee::nominees_from;
use crate::record::{ApplicantRecord, display_value};
use crate::resolver::FieldResolver;
use crate::steps::StepCatalog;

/// (header, key, fallback keys)
const COLUMNS: &[(&str, &str, &[&str])] = &[
    ("Full Name", "fullName", &["name"]),
    ("Father/Spouse Name", "fatherName", &["fatherOrSpouseName"]),
    ("Date of Birth", "dateOfBirth", &["dob"]),
    ("Gender", "gender", &[]),
    ("Marital Status", "maritalStatus", &[]),
    ("Mobile", "mobileNumber", &["phone"]),
    ("Email", "email", &[]),
    ("Permanent Address", "permanentAddress", &[]),
    ("Present Address", "presentAddress", &["permanentAddress"]),
    ("Aadhaar", "aadhaarNumber", &["aadhaar"]),
    ("PAN", "panNumber", &["pan"]),
    ("Bank", "bankName", &[]),
    ("Account Number", "bankAccountNumber", &[]),
    ("IFSC", "ifscCode", &[]),
    ("Date of Joining", "dateOfJoining", &[]),
    ("Designation", "designation", &[]),
    ("Department", "department", &["designation"]),
    ("UAN", "uan", &[]),
    ("Previous PF Account", "previousPfAccountNumber", &[]),
    ("Religion", "religion", &[]),
    ("Blood Group", "bloodGroup", &[]),
];

const NOMINEES_HEADER: &str = "Nominees";

/// One spreadsheet row with its headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetRow {
    pub headers: Vec<String>,
    pub cells: Vec<String>,
}

impl SheetRow {
    pub fn cell(&self, header: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|h| h == header)
            .and_then(|i| self.cells.get(i))
            .map(String::as_str)
    }
}

/// Build the row for a record.
pub fn sheet_row(catalog: &StepCatalog, record: &ApplicantRecord) -> SheetRow {
    let resolver = FieldResolver::over_all(record, catalog);
    let mut headers = Vec::with_capacity(COLUMNS.len() + 1);
    let mut cells = Vec::with_capacity(COLUMNS.len() + 1);

    for (header, key, fallbacks) in COLUMNS {
        let fallbacks: Vec<String> = fallbacks.iter().map(|s| s.to_string()).collect();
        headers.push(header.to_string());
        cells.push(display_value(&resolver.resolve(key, &fallbacks)));
    }

    let nominees = nominees_from(resolver.lookup("nominees", &[]));
    let summary = nominees
        .iter()
        .map(|n| format!("{} ({}) {}%", n.name, n.relationship, n.share_percent))
        .collect::<Vec<_>>()
        .join("; ");
    headers.push(NOMINEES_HEADER.to_string());
    cells.push(summary);

    SheetRow { headers, cells }
}

/// Destination for completed applicant rows.
pub trait RowSink: Send + Sync {
    fn append(&self, applicant_id: &str, row: &SheetRow) -> Result<()>;
}

/// Appends one JSON object per row to a file.
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RowSink for JsonlSink {
    fn append(&self, applicant_id: &str, row: &SheetRow) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let columns: serde_json::Map<String, serde_json::Value> = row
            .headers
            .iter()
            .cloned()
            .zip(row.cells.iter().map(|c| json!(c)))
            .collect();
        let line = json!({
            "applicantId": applicant_id,
            "appendedAt": Utc::now().to_rfc3339(),
            "row": columns,
        });

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open sheet log: {}", self.path.display()))?;
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to write sheet log: {}", self.path.display()))?;
        Ok(())
    }
}

/// Keeps rows in memory.
#[derive(Default)]
pub struct MemorySink {
    rows: Mutex<Vec<(String, SheetRow)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<(String, SheetRow)> {
        self.rows
            .lock()
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }
}

impl RowSink for MemorySink {
    fn append(&self, applicant_id: &str, row: &SheetRow) -> Result<()> {
        self.rows
            .lock()
            .map_err(|_| anyhow::anyhow!("row sink lock poisoned"))?
            .push((applicant_id.to_string(), row.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::default_catalog;
    use serde_json::Value;
    use tempfile::tempdir;

    fn record() -> ApplicantRecord {
        serde_json::from_value(json!({
            "fullName": "A. Kumar",
            "email": "a@example.com",
            "form11": {"uan": "100200300400"},
            "pfNomination": {
                "nominees": [
                    {"name": "Meera", "relationship": "Spouse", "sharePercent": "60"},
                    {"name": "Ravi", "relationship": "Son", "sharePercent": 40}
                ]
            },
            "insurance": {"bloodGroup": "O+"}
        }))
        .unwrap()
    }

    #[test]
    fn test_row_resolves_across_steps() {
        let catalog = default_catalog();
        let row = sheet_row(&catalog, &record());

        assert_eq!(row.headers.len(), row.cells.len());
        assert_eq!(row.cell("Full Name"), Some("A. Kumar"));
        assert_eq!(row.cell("UAN"), Some("100200300400"));
        assert_eq!(row.cell("Blood Group"), Some("O+"));
        assert_eq!(row.cell("PAN"), Some(""));
        assert_eq!(
            row.cell("Nominees"),
            Some("Meera (Spouse) 60%; Ravi (Son) 40%")
        );
    }

    #[test]
    fn test_row_layout_is_fixed() {
        let catalog = default_catalog();
        let empty = sheet_row(&catalog, &ApplicantRecord::new());
        let full = sheet_row(&catalog, &record());
        assert_eq!(empty.headers, full.headers);
        assert!(empty.cells.iter().all(String::is_empty));
    }

    #[test]
    fn test_jsonl_sink_appends_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exports").join("rows.jsonl");
        let sink = JsonlSink::new(&path);
        let row = sheet_row(&default_catalog(), &record());

        sink.append("a-1", &row).unwrap();
        sink.append("a-2", &row).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["applicantId"], "a-1");
        assert_eq!(lines[1]["row"]["Full Name"], "A. Kumar");
    }

    #[test]
    fn test_memory_sink_collects_rows() {
        let sink = MemorySink::new();
        let row = sheet_row(&default_catalog(), &record());
        sink.append("a-1", &row).unwrap();
        let rows = sink.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "a-1");
    }
}
