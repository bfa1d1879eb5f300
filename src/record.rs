//! The applicant record: shared fields plus one sub-record per step.
//!
//! On the wire the record is a single JSON object. Keys that match a step's
//! sub-record key (`joiningForm`, `form11`, ...) hold that step's saved
//! fields; every other key is a shared top-level field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::steps::StepId;

/// A flat map of form field names to values.
pub type FieldMap = serde_json::Map<String, Value>;

/// Whether a value counts as filled in.
///
/// `null`, `false`, zero, blank strings and empty lists/objects are all
/// treated as absent.
pub fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Render a value as plain text for exports and prefilled inputs.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// One candidate's accumulated onboarding answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Value", try_from = "Value")]
pub struct ApplicantRecord {
    pub(crate) shared: FieldMap,
    pub(crate) steps: BTreeMap<StepId, FieldMap>,
}

impl ApplicantRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a record from seed fields (e.g. name and email captured at invite time).
    pub fn with_shared(shared: FieldMap) -> Self {
        Self {
            shared,
            steps: BTreeMap::new(),
        }
    }

    pub fn shared(&self) -> &FieldMap {
        &self.shared
    }

    pub fn shared_value(&self, key: &str) -> Option<&Value> {
        self.shared.get(key)
    }

    /// Steps that have a saved sub-record, in step order.
    pub fn committed_steps(&self) -> impl Iterator<Item = StepId> + '_ {
        self.steps.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.is_empty() && self.steps.is_empty()
    }

    /// The combined JSON object view consumed by exporters.
    pub fn to_value(&self) -> Value {
        let mut out = self.shared.clone();
        for (step, fields) in &self.steps {
            out.insert(step.record_key().to_string(), Value::Object(fields.clone()));
        }
        Value::Object(out)
    }
}

impl From<ApplicantRecord> for Value {
    fn from(record: ApplicantRecord) -> Self {
        record.to_value()
    }
}

impl TryFrom<Value> for ApplicantRecord {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(map) = value else {
            return Err("applicant record must be a JSON object".to_string());
        };

        let mut record = ApplicantRecord::new();
        for (key, value) in map {
            match (StepId::from_record_key(&key), value) {
                (Some(step), Value::Object(fields)) => {
                    record.steps.insert(step, fields);
                }
                (_, value) => {
                    record.shared.insert(key, value);
                }
            }
        }
        Ok(record)
    }
}
