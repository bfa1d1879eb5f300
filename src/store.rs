//! Step record store: commit and read back per-step sub-records.
//!
//! A commit replaces the step's whole sub-record and promotes the step's
//! shared fields to the top level. Sub-records are never removed; a step can
//! only be committed again.

use tracing::debug;

use crate::record::{ApplicantRecord, FieldMap};
use crate::steps::{StepDefinition, StepId};

impl ApplicantRecord {
    /// Save `fields` as the sub-record of `step`.
    pub fn commit(&mut self, step: &StepDefinition, fields: FieldMap) {
        let mut promoted = 0usize;
        for key in &step.shared_fields {
            if let Some(value) = fields.get(key) {
                self.shared.insert(key.clone(), value.clone());
                promoted += 1;
            }
        }
        debug!(
            step = %step.id,
            fields = fields.len(),
            promoted,
            "Committed step record"
        );
        self.steps.insert(step.id, fields);
    }

    /// The saved sub-record of `step`, if it was ever committed.
    pub fn get(&self, step: StepId) -> Option<&FieldMap> {
        self.steps.get(&step)
    }
}
