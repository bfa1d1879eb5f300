use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::models::*;
use crate::record::ApplicantRecord;

/// Async-safe handle to the portal database.
///
/// Wraps `PortalDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<PortalDb>>,
}

impl DbHandle {
    pub fn new(db: PortalDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&PortalDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }

    /// Acquire the database mutex synchronously. For CLI commands and tests.
    pub fn lock_sync(&self) -> Result<std::sync::MutexGuard<'_, PortalDb>> {
        self.inner
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))
    }
}

pub struct PortalDb {
    conn: Connection,
}

const APPLICANT_COLUMNS: &str = "id, status, step_index, record, created_at, updated_at";

impl PortalDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.run_migrations().context("Failed to run migrations")?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.run_migrations().context("Failed to run migrations")?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS applicants (
                    id TEXT PRIMARY KEY,
                    status TEXT NOT NULL DEFAULT 'in_progress',
                    step_index INTEGER NOT NULL DEFAULT 0,
                    record TEXT NOT NULL DEFAULT '{}',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_applicants_status ON applicants(status);
                ",
            )
            .context("Failed to create applicants table")?;
        Ok(())
    }

    // ── Applicants ────────────────────────────────────────────────────

    pub fn create_applicant(&self, id: &str, record: &ApplicantRecord) -> Result<Applicant> {
        let now = Utc::now().to_rfc3339();
        let record_json =
            serde_json::to_string(record).context("Failed to serialize applicant record")?;
        self.conn
            .execute(
                "INSERT INTO applicants (id, status, step_index, record, created_at, updated_at)
                 VALUES (?1, ?2, 0, ?3, ?4, ?4)",
                params![id, ApplicantStatus::InProgress.as_str(), record_json, now],
            )
            .context("Failed to insert applicant")?;
        self.get_applicant(id)?
            .context("Applicant not found after insert")
    }

    pub fn get_applicant(&self, id: &str) -> Result<Option<Applicant>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM applicants WHERE id = ?1", APPLICANT_COLUMNS),
                params![id],
                ApplicantRow::from_row,
            )
            .optional()
            .context("Failed to query applicant")?;
        row.map(ApplicantRow::into_applicant).transpose()
    }

    pub fn list_applicants(&self) -> Result<Vec<Applicant>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM applicants ORDER BY created_at, id",
                APPLICANT_COLUMNS
            ))
            .context("Failed to prepare list_applicants")?;
        let rows = stmt
            .query_map([], ApplicantRow::from_row)
            .context("Failed to query applicants")?;
        let mut applicants = Vec::new();
        for row in rows {
            let row = row.context("Failed to read applicant row")?;
            applicants.push(row.into_applicant()?);
        }
        Ok(applicants)
    }

    /// Persist the flow position and record. Returns `None` for an unknown id.
    pub fn save_progress(
        &self,
        id: &str,
        step_index: usize,
        status: ApplicantStatus,
        record: &ApplicantRecord,
    ) -> Result<Option<Applicant>> {
        let record_json =
            serde_json::to_string(record).context("Failed to serialize applicant record")?;
        let updated = self
            .conn
            .execute(
                "UPDATE applicants SET step_index = ?1, status = ?2, record = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    step_index as i64,
                    status.as_str(),
                    record_json,
                    Utc::now().to_rfc3339(),
                    id
                ],
            )
            .context("Failed to update applicant progress")?;
        if updated == 0 {
            return Ok(None);
        }
        self.get_applicant(id)
    }
}

/// Intermediate row struct for applicants.
struct ApplicantRow {
    id: String,
    status: String,
    step_index: i64,
    record: String,
    created_at: String,
    updated_at: String,
}

impl ApplicantRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            status: row.get(1)?,
            step_index: row.get(2)?,
            record: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_applicant(self) -> Result<Applicant> {
        let status = ApplicantStatus::from_str(&self.status)
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to parse applicant status")?;
        let record: ApplicantRecord =
            serde_json::from_str(&self.record).context("Failed to parse applicant record JSON")?;
        Ok(Applicant {
            id: self.id,
            status,
            step_index: usize::try_from(self.step_index).unwrap_or(0),
            record,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Failed to parse timestamp: {}", raw))
}

// ── Tests ─────────────────────────────────────────────────────────────
