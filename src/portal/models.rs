use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::flow::FlowPosition;
use crate::record::{ApplicantRecord, FieldMap};
use crate::steps::StepDefinition;
use crate::validator::Advisory;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantStatus {
    InProgress,
    Complete,
}

impl ApplicantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
        }
    }
}

impl FromStr for ApplicantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "complete" => Ok(Self::Complete),
            _ => Err(format!("Invalid applicant status: {}", s)),
        }
    }
}

/// A stored applicant with their saved progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Applicant {
    pub id: String,
    pub status: ApplicantStatus,
    pub step_index: usize,
    pub record: ApplicantRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing entry.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicantSummary {
    pub id: String,
    pub full_name: String,
    pub status: ApplicantStatus,
    pub step_index: usize,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicantSession {
    pub id: String,
    pub position: FlowPosition,
    pub step_index: usize,
    pub total_steps: usize,
    pub record: ApplicantRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the current screen needs to render.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentStepView {
    pub position: FlowPosition,
    pub step: Option<StepDefinition>,
    pub prefill: Option<FieldMap>,
    pub advisories: Vec<Advisory>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub error: Option<FieldIssue>,
    pub advisories: Vec<Advisory>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateApplicantRequest {
    /// Seed fields known before the first step (name, email from the invite)
    #[serde(default)]
    pub fields: FieldMap,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepFieldsRequest {
    pub fields: FieldMap,
}
