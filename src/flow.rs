//! Step transition controller.
//!
//! A linear index into the step catalog. `advance` validates the current
//! step's local record, commits it and moves forward; `retreat` moves back
//! without touching anything already committed. One index past the last step
//! is the terminal `Complete` state.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::FlowError;
use crate::record::{ApplicantRecord, FieldMap};
use crate::resolver;
use crate::steps::{StepCatalog, StepDefinition, StepId};
use crate::validator::Validator;

/// Where an applicant currently is in the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "step", rename_all = "snake_case")]
pub enum FlowPosition {
    Step(StepId),
    Complete,
}

impl FlowPosition {
    pub fn is_complete(&self) -> bool {
        matches!(self, FlowPosition::Complete)
    }
}

impl std::fmt::Display for FlowPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowPosition::Step(id) => write!(f, "{}", id),
            FlowPosition::Complete => f.write_str("complete"),
        }
    }
}

/// One applicant's pass through the step catalog.
pub struct OnboardingFlow<'c> {
    catalog: &'c StepCatalog,
    validator: &'c Validator,
    index: usize,
    record: ApplicantRecord,
}

impl<'c> OnboardingFlow<'c> {
    /// A fresh flow positioned on the first step.
    pub fn new(catalog: &'c StepCatalog, validator: &'c Validator, record: ApplicantRecord) -> Self {
        Self::resume(catalog, validator, 0, record)
    }

    /// Restore a saved flow. An index past the end is clamped to `Complete`.
    pub fn resume(
        catalog: &'c StepCatalog,
        validator: &'c Validator,
        index: usize,
        record: ApplicantRecord,
    ) -> Self {
        Self {
            catalog,
            validator,
            index: index.min(catalog.len()),
            record,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn record(&self) -> &ApplicantRecord {
        &self.record
    }

    pub fn into_parts(self) -> (usize, ApplicantRecord) {
        (self.index, self.record)
    }

    pub fn position(&self) -> FlowPosition {
        match self.current_step() {
            Some(step) => FlowPosition::Step(step.id),
            None => FlowPosition::Complete,
        }
    }

    pub fn current_step(&self) -> Option<&'c StepDefinition> {
        self.catalog.at(self.index)
    }

    /// Initial local state for the current step; `None` once complete.
    pub fn prefill(&self) -> Option<FieldMap> {
        self.current_step()
            .map(|step| resolver::prefill(self.catalog, step, &self.record))
    }

    /// Check `fields` against the current step without committing.
    pub fn validate(&self, fields: &FieldMap) -> Result<(), FlowError> {
        let step = self.current_step().ok_or(FlowError::AlreadyComplete)?;
        self.validator.validate(step, fields)?;
        Ok(())
    }

    /// Validate, commit and move to the next step.
    ///
    /// On failure nothing changes: the record and index stay as they were.
    pub fn advance(&mut self, fields: FieldMap) -> Result<FlowPosition, FlowError> {
        let step = self.current_step().ok_or(FlowError::AlreadyComplete)?;

        if let Err(err) = self.validator.validate(step, &fields) {
            debug!(step = %step.id, field = err.field(), "Advance blocked");
            return Err(err.into());
        }

        self.record.commit(step, fields);
        self.index += 1;

        let position = self.position();
        info!(from = %step.id, to = %position, "Advanced");
        Ok(position)
    }

    /// Move back one step. Saturates at the first step.
    pub fn retreat(&mut self) -> FlowPosition {
        let from = self.position();
        self.index = self.index.saturating_sub(1);
        let position = self.position();
        debug!(from = %from, to = %position, "Retreated");
        position
    }
}

/// Look a step up by id or sub-record key.
pub fn find_step<'c>(catalog: &'c StepCatalog, name: &str) -> Result<&'c StepDefinition, FlowError> {
    name.parse::<StepId>()
        .ok()
        .and_then(|id| catalog.get(id))
        .ok_or_else(|| FlowError::UnknownStep(name.to_string()))
}
