//! Per-step validation.
//!
//! Checks run in a fixed order and stop at the first failure: required
//! fields in declaration order, then the declaration flag, the signature,
//! the nominee share total and, when enabled, guardian details for minors.

use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::Value;

use crate::errors::ValidationError;
use crate::nominee::{Nominee, nominees_from, share_total};
use crate::record::{FieldMap, is_filled};
use crate::steps::StepDefinition;

/// Expected nominee share total.
pub const FULL_SHARE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationPolicy {
    /// Allowed deviation of the share total from 100
    pub share_tolerance: f64,
    /// Turn the minor-without-guardian advisory into a blocking error
    pub enforce_minor_guardian: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            share_tolerance: 0.01,
            enforce_minor_guardian: false,
        }
    }
}

/// Non-blocking notice shown next to a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    MinorWithoutGuardian {
        field: String,
        index: usize,
        name: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Validator {
    policy: ValidationPolicy,
}

impl Validator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    /// Validate a step's local record against today's date.
    pub fn validate(&self, step: &StepDefinition, record: &FieldMap) -> Result<(), ValidationError> {
        self.validate_as_of(step, record, Local::now().date_naive())
    }

    pub fn validate_as_of(
        &self,
        step: &StepDefinition,
        record: &FieldMap,
        today: NaiveDate,
    ) -> Result<(), ValidationError> {
        if let Some(field) = step
            .required
            .iter()
            .find(|field| !record.get(field.as_str()).is_some_and(is_filled))
        {
            return Err(ValidationError::MissingField {
                field: field.clone(),
            });
        }

        if let Some(field) = &step.declaration_field
            && !record.get(field).is_some_and(is_accepted)
        {
            return Err(ValidationError::DeclarationNotAccepted {
                field: field.clone(),
            });
        }

        if let Some(field) = &step.signature_field
            && !record.get(field).is_some_and(is_filled)
        {
            return Err(ValidationError::SignatureMissing {
                field: field.clone(),
            });
        }

        let Some(rule) = &step.nominees else {
            return Ok(());
        };
        let nominees = nominees_from(record.get(&rule.field));

        if rule.shares_must_total {
            let total = share_total(&nominees);
            if (total - FULL_SHARE).abs() > self.policy.share_tolerance {
                return Err(ValidationError::ShareTotalMismatch {
                    field: rule.field.clone(),
                    total,
                    expected: FULL_SHARE,
                });
            }
        }

        if self.policy.enforce_minor_guardian
            && let Some(index) = first_unguarded_minor(&nominees, today)
        {
            return Err(ValidationError::GuardianMissing {
                field: rule.field.clone(),
                index,
            });
        }

        Ok(())
    }

    /// Notices that do not block advancing.
    pub fn advisories(&self, step: &StepDefinition, record: &FieldMap, today: NaiveDate) -> Vec<Advisory> {
        let Some(rule) = &step.nominees else {
            return Vec::new();
        };
        nominees_from(record.get(&rule.field))
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_minor(today) && !n.has_guardian())
            .map(|(index, n)| Advisory::MinorWithoutGuardian {
                field: rule.field.clone(),
                index,
                name: n.name.clone(),
            })
            .collect()
    }
}

fn first_unguarded_minor(nominees: &[Nominee], today: NaiveDate) -> Option<usize> {
    nominees
        .iter()
        .position(|n| n.is_minor(today) && !n.has_guardian())
}

fn is_accepted(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "on"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::{StepId, default_catalog};
    use serde_json::json;

    const SIGNATURE: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn step(id: StepId) -> StepDefinition {
        default_catalog().get(id).unwrap().clone()
    }

    fn pf_record(nominees: Value) -> FieldMap {
        json!({
            "fullName": "A. Kumar",
            "fatherName": "R. Kumar",
            "dateOfBirth": "1990-01-01",
            "gender": "male",
            "maritalStatus": "married",
            "permanentAddress": "1 Main St",
            "nominees": nominees,
            "declarationAccepted": true,
            "signature": SIGNATURE,
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn test_first_missing_required_field_is_reported() {
        let validator = Validator::default();
        let mut record = pf_record(json!([{"sharePercent": 100}]));
        record.remove("gender");
        record.insert("fatherName".into(), json!(""));

        let err = validator
            .validate_as_of(&step(StepId::PfNomination), &record, today())
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                field: "fatherName".into()
            }
        );
    }

    #[test]
    fn test_declaration_checked_after_required_fields() {
        let validator = Validator::default();
        let mut record = pf_record(json!([{"sharePercent": 100}]));
        record.insert("declarationAccepted".into(), json!(false));
        record.remove("signature");

        let err = validator
            .validate_as_of(&step(StepId::PfNomination), &record, today())
            .unwrap_err();
        assert!(matches!(err, ValidationError::DeclarationNotAccepted { .. }));
        assert_eq!(err.field(), "declarationAccepted");
    }

    #[test]
    fn test_declaration_accepts_checkbox_strings() {
        let validator = Validator::default();
        let mut record = pf_record(json!([{"sharePercent": 100}]));
        record.insert("declarationAccepted".into(), json!("on"));
        assert!(validator
            .validate_as_of(&step(StepId::PfNomination), &record, today())
            .is_ok());
    }

    #[test]
    fn test_signature_required() {
        let validator = Validator::default();
        let mut record = pf_record(json!([{"sharePercent": 100}]));
        record.insert("signature".into(), json!(""));

        let err = validator
            .validate_as_of(&step(StepId::PfNomination), &record, today())
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::SignatureMissing {
                field: "signature".into()
            }
        );
    }

    #[test]
    fn test_shares_totalling_99_fail() {
        let validator = Validator::default();
        let record = pf_record(json!([{"sharePercent": "60"}, {"sharePercent": "39"}]));

        let err = validator
            .validate_as_of(&step(StepId::PfNomination), &record, today())
            .unwrap_err();
        match err {
            ValidationError::ShareTotalMismatch { field, total, expected } => {
                assert_eq!(field, "nominees");
                assert_eq!(total, 99.0);
                assert_eq!(expected, 100.0);
            }
            other => panic!("Expected ShareTotalMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_shares_totalling_100_pass() {
        let validator = Validator::default();
        let record = pf_record(json!([{"sharePercent": 60}, {"sharePercent": 40}]));
        assert!(validator
            .validate_as_of(&step(StepId::PfNomination), &record, today())
            .is_ok());

        let thirds = pf_record(json!([
            {"sharePercent": "33.33"},
            {"sharePercent": "33.33"},
            {"sharePercent": "33.34"}
        ]));
        assert!(validator
            .validate_as_of(&step(StepId::PfNomination), &thirds, today())
            .is_ok());
    }

    #[test]
    fn test_shares_off_by_more_than_tolerance_fail() {
        let validator = Validator::default();
        let record = pf_record(json!([{"sharePercent": "99.98"}]));
        assert!(validator
            .validate_as_of(&step(StepId::PfNomination), &record, today())
            .is_err());

        let over = pf_record(json!([{"sharePercent": 50}, {"sharePercent": 50.5}]));
        assert!(validator
            .validate_as_of(&step(StepId::PfNomination), &over, today())
            .is_err());
    }

    #[test]
    fn test_share_total_within_tolerance_boundary() {
        let validator = Validator::default();
        let near = pf_record(json!([{"sharePercent": 60}, {"sharePercent": "39.995"}]));
        assert!(validator
            .validate_as_of(&step(StepId::PfNomination), &near, today())
            .is_ok());

        let just_over = pf_record(json!([{"sharePercent": "100.011"}]));
        let err = validator
            .validate_as_of(&step(StepId::PfNomination), &just_over, today())
            .unwrap_err();
        assert!(matches!(err, ValidationError::ShareTotalMismatch { .. }));
        assert_eq!(err.field(), "nominees");
    }

    #[test]
    fn test_dependents_without_shares_are_not_totalled() {
        let validator = Validator::default();
        let record = json!({
            "fullName": "A. Kumar",
            "dateOfBirth": "1990-01-01",
            "gender": "male",
            "mobileNumber": "9876543210",
            "email": "a@example.com",
            "dependents": [{"name": "Child", "sharePercent": "10"}],
            "declarationAccepted": true,
            "signature": SIGNATURE,
        });
        assert!(validator
            .validate_as_of(&step(StepId::Insurance), record.as_object().unwrap(), today())
            .is_ok());
    }

    #[test]
    fn test_minor_without_guardian_is_advisory_by_default() {
        let validator = Validator::default();
        let record = pf_record(json!([
            {"name": "Adult", "dateOfBirth": "1980-01-01", "sharePercent": 50},
            {"name": "Kid", "dateOfBirth": "2015-06-01", "sharePercent": 50}
        ]));
        let pf = step(StepId::PfNomination);

        assert!(validator.validate_as_of(&pf, &record, today()).is_ok());
        let advisories = validator.advisories(&pf, &record, today());
        assert_eq!(
            advisories,
            vec![Advisory::MinorWithoutGuardian {
                field: "nominees".into(),
                index: 1,
                name: "Kid".into(),
            }]
        );
    }

    #[test]
    fn test_minor_guardian_enforced_when_enabled() {
        let validator = Validator::new(ValidationPolicy {
            enforce_minor_guardian: true,
            ..ValidationPolicy::default()
        });
        let pf = step(StepId::PfNomination);
        let record = pf_record(json!([
            {"name": "Kid", "dateOfBirth": "2015-06-01", "sharePercent": 100}
        ]));
        let err = validator.validate_as_of(&pf, &record, today()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::GuardianMissing {
                field: "nominees".into(),
                index: 0
            }
        );

        let guarded = pf_record(json!([{
            "name": "Kid",
            "dateOfBirth": "2015-06-01",
            "sharePercent": 100,
            "guardianName": "Meera",
            "guardianAddress": "1 Main St"
        }]));
        assert!(validator.validate_as_of(&pf, &guarded, today()).is_ok());
        assert!(validator.advisories(&pf, &guarded, today()).is_empty());
    }

    #[test]
    fn test_every_default_step_passes_with_complete_record() {
        let validator = Validator::default();
        for step in &default_catalog().steps {
            let mut record = FieldMap::new();
            for field in &step.required {
                record.insert(field.clone(), json!("filled"));
            }
            if let Some(rule) = &step.nominees {
                record.insert(rule.field.clone(), json!([{"sharePercent": 100}]));
            }
            record.insert("declarationAccepted".into(), json!(true));
            record.insert("signature".into(), json!(SIGNATURE));
            assert!(
                validator.validate_as_of(step, &record, today()).is_ok(),
                "step {} should pass",
                step.id
            );
        }
    }
}
