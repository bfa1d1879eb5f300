//! Typed error hierarchy for the onboarding portal.
//!
//! Three top-level enums cover the three subsystems:
//! - `ValidationError`: a step's record failed one of its checks
//! - `FlowError`: a transition request the step controller refused
//! - `PortalError`: applicant storage and HTTP layer failures

use thiserror::Error;

/// A single failed check on a step record.
///
/// Every variant names the field the applicant has to fix, so callers can
/// render the error next to that input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Required field '{field}' is missing")]
    MissingField { field: String },

    #[error("Declaration '{field}' must be accepted")]
    DeclarationNotAccepted { field: String },

    #[error("Signature '{field}' is required")]
    SignatureMissing { field: String },

    #[error("Nominee shares in '{field}' total {total:.2}%, expected {expected:.2}%")]
    ShareTotalMismatch {
        field: String,
        total: f64,
        expected: f64,
    },

    #[error("Nominee {index} in '{field}' is a minor and needs guardian details")]
    GuardianMissing { field: String, index: usize },
}

impl ValidationError {
    /// Name of the field that failed.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::DeclarationNotAccepted { field }
            | ValidationError::SignatureMissing { field }
            | ValidationError::ShareTotalMismatch { field, .. }
            | ValidationError::GuardianMissing { field, .. } => field,
        }
    }

    /// Stable machine-readable code for the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingField { .. } => "missing_field",
            ValidationError::DeclarationNotAccepted { .. } => "declaration_not_accepted",
            ValidationError::SignatureMissing { .. } => "signature_missing",
            ValidationError::ShareTotalMismatch { .. } => "share_total_mismatch",
            ValidationError::GuardianMissing { .. } => "guardian_missing",
        }
    }
}

/// Errors from the step transition controller.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Onboarding is already complete")]
    AlreadyComplete,

    #[error("Unknown step '{0}'")]
    UnknownStep(String),
}

/// Errors from applicant storage and the HTTP layer.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Applicant {id} not found")]
    ApplicantNotFound { id: String },

    #[error("Database error: {0}")]
    Database(#[source] anyhow::Error),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
