//! Step definitions and JSON loading for the onboarding flow.
//!
//! This module provides:
//! - `StepId`, the fixed set of onboarding screens
//! - `StepDefinition`, the static descriptor of one step
//! - `StepCatalog`, the ordered step list (loadable from `steps.json`)
//! - `default_catalog()`, the built-in six-form sequence

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::StepsSection;
use crate::config::pattern_matches;

/// One screen of the onboarding flow, tied to one physical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    JoiningForm,
    Form11,
    FormF,
    PfNomination,
    Insurance,
    SelfDeclaration,
}

impl StepId {
    pub const ALL: [StepId; 6] = [
        StepId::JoiningForm,
        StepId::Form11,
        StepId::FormF,
        StepId::PfNomination,
        StepId::Insurance,
        StepId::SelfDeclaration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JoiningForm => "joining_form",
            Self::Form11 => "form11",
            Self::FormF => "form_f",
            Self::PfNomination => "pf_nomination",
            Self::Insurance => "insurance",
            Self::SelfDeclaration => "self_declaration",
        }
    }

    /// Key of this step's sub-record inside the applicant record.
    pub fn record_key(&self) -> &'static str {
        match self {
            Self::JoiningForm => "joiningForm",
            Self::Form11 => "form11",
            Self::FormF => "formF",
            Self::PfNomination => "pfNomination",
            Self::Insurance => "insurance",
            Self::SelfDeclaration => "selfDeclaration",
        }
    }

    pub fn from_record_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.record_key() == key)
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s || id.record_key() == s)
            .ok_or_else(|| format!("Invalid step: {}", s))
    }
}

/// Where a step keeps its repeated nominee/dependent entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NomineeRule {
    /// Field holding the list of entries
    pub field: String,
    /// Whether `sharePercent` across entries must total 100
    #[serde(default)]
    pub shares_must_total: bool,
}

/// A pre-population rule: fill `target` from the first non-empty value
/// found under `target`, then under each fallback key in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrefillRule {
    pub target: String,
    #[serde(default)]
    pub fallbacks: Vec<String>,
}

impl PrefillRule {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            fallbacks: Vec::new(),
        }
    }

    pub fn with_fallbacks(target: &str, fallbacks: &[&str]) -> Self {
        Self {
            target: target.to_string(),
            fallbacks: fallbacks.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Static descriptor of a single onboarding step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepDefinition {
    pub id: StepId,
    /// Human-readable form title
    pub title: String,
    /// Required fields, checked in declaration order
    #[serde(default)]
    pub required: Vec<String>,
    /// Boolean field that must be `true` before the step can be left
    #[serde(default)]
    pub declaration_field: Option<String>,
    /// Field holding the step's signature data URI
    #[serde(default)]
    pub signature_field: Option<String>,
    #[serde(default)]
    pub nominees: Option<NomineeRule>,
    /// Fields promoted to the top level of the applicant record on commit
    #[serde(default)]
    pub shared_fields: Vec<String>,
    #[serde(default)]
    pub prefill: Vec<PrefillRule>,
}

impl StepDefinition {
    pub fn new(id: StepId, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            required: Vec::new(),
            declaration_field: None,
            signature_field: None,
            nominees: None,
            shared_fields: Vec::new(),
            prefill: Vec::new(),
        }
    }

    pub fn required(mut self, fields: &[&str]) -> Self {
        self.required = fields.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Require the standard `declarationAccepted` flag and `signature` blob.
    pub fn signed(mut self) -> Self {
        self.declaration_field = Some("declarationAccepted".to_string());
        self.signature_field = Some("signature".to_string());
        self
    }

    pub fn nominees(mut self, field: &str, shares_must_total: bool) -> Self {
        self.nominees = Some(NomineeRule {
            field: field.to_string(),
            shares_must_total,
        });
        self
    }

    pub fn shared(mut self, fields: &[&str]) -> Self {
        self.shared_fields = fields.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn prefill(mut self, rules: Vec<PrefillRule>) -> Self {
        self.prefill = rules;
        self
    }

    /// Whether this step carries nominee shares that must total 100.
    pub fn is_nomination_bearing(&self) -> bool {
        self.nominees
            .as_ref()
            .map(|rule| rule.shares_must_total)
            .unwrap_or(false)
    }
}

/// The ordered list of steps, as stored in `steps.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepCatalog {
    pub steps: Vec<StepDefinition>,
}

impl StepCatalog {
    pub fn new(steps: Vec<StepDefinition>) -> Self {
        Self { steps }
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read steps file: {}", path.display()))?;

        let catalog: StepCatalog = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse steps JSON: {}", path.display()))?;

        Ok(catalog)
    }

    /// Save the catalog to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize steps to JSON")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write steps file: {}", path.display()))?;

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, id: StepId) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn at(&self, index: usize) -> Option<&StepDefinition> {
        self.steps.get(index)
    }

    pub fn position(&self, id: StepId) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    /// Step ids in flow order.
    pub fn order(&self) -> Vec<StepId> {
        self.steps.iter().map(|s| s.id).collect()
    }

    /// Step ids that come before `id` in flow order.
    pub fn preceding(&self, id: StepId) -> Vec<StepId> {
        self.steps
            .iter()
            .map(|s| s.id)
            .take_while(|s| *s != id)
            .collect()
    }

    /// Append configured extra required fields to every matching step.
    pub fn with_overrides(mut self, section: &StepsSection) -> Self {
        for step in &mut self.steps {
            for (pattern, override_cfg) in &section.overrides {
                if !pattern_matches(pattern, step.id.as_str()) {
                    continue;
                }
                for field in &override_cfg.required {
                    if !step.required.contains(field) {
                        step.required.push(field.clone());
                    }
                }
            }
        }
        self
    }
}

impl Default for StepCatalog {
    fn default() -> Self {
        default_catalog()
    }
}

/// The built-in onboarding sequence.
pub fn default_catalog() -> StepCatalog {
    StepCatalog::new(vec![
        StepDefinition::new(StepId::JoiningForm, "Joining Form")
            .required(&[
                "fullName",
                "fatherName",
                "dateOfBirth",
                "gender",
                "maritalStatus",
                "mobileNumber",
                "email",
                "permanentAddress",
                "presentAddress",
                "aadhaarNumber",
                "panNumber",
                "bankAccountNumber",
                "ifscCode",
                "dateOfJoining",
                "designation",
            ])
            .signed()
            .shared(&[
                "fullName",
                "fatherName",
                "dateOfBirth",
                "gender",
                "maritalStatus",
                "mobileNumber",
                "email",
                "permanentAddress",
                "presentAddress",
                "aadhaarNumber",
                "panNumber",
                "bankName",
                "bankAccountNumber",
                "ifscCode",
                "dateOfJoining",
                "designation",
                "department",
            ])
            .prefill(vec![
                PrefillRule::with_fallbacks("fullName", &["name"]),
                PrefillRule::new("email"),
                PrefillRule::with_fallbacks("mobileNumber", &["phone"]),
            ]),
        StepDefinition::new(StepId::Form11, "EPF Form 11 (Declaration)")
            .required(&[
                "fullName",
                "fatherName",
                "dateOfBirth",
                "gender",
                "mobileNumber",
                "email",
                "aadhaarNumber",
                "panNumber",
                "previousEpfMember",
                "dateOfJoining",
            ])
            .signed()
            .shared(&["uan", "previousPfAccountNumber", "previousEpfMember"])
            .prefill(vec![
                PrefillRule::with_fallbacks("fullName", &["name"]),
                PrefillRule::with_fallbacks("fatherName", &["fatherOrSpouseName"]),
                PrefillRule::with_fallbacks("dateOfBirth", &["dob"]),
                PrefillRule::new("gender"),
                PrefillRule::with_fallbacks("mobileNumber", &["phone"]),
                PrefillRule::new("email"),
                PrefillRule::with_fallbacks("aadhaarNumber", &["aadhaar"]),
                PrefillRule::with_fallbacks("panNumber", &["pan"]),
                PrefillRule::new("dateOfJoining"),
                PrefillRule::new("bankAccountNumber"),
                PrefillRule::new("ifscCode"),
            ]),
        StepDefinition::new(StepId::FormF, "Gratuity Form F")
            .required(&[
                "fullName",
                "gender",
                "religion",
                "maritalStatus",
                "department",
                "dateOfJoining",
                "permanentAddress",
                "nominees",
            ])
            .signed()
            .nominees("nominees", true)
            .shared(&["religion", "department"])
            .prefill(vec![
                PrefillRule::with_fallbacks("fullName", &["name"]),
                PrefillRule::new("gender"),
                PrefillRule::new("maritalStatus"),
                PrefillRule::with_fallbacks("department", &["designation"]),
                PrefillRule::new("dateOfJoining"),
                PrefillRule::with_fallbacks("permanentAddress", &["presentAddress"]),
            ]),
        StepDefinition::new(StepId::PfNomination, "PF Nomination (Form 2)")
            .required(&[
                "fullName",
                "fatherName",
                "dateOfBirth",
                "gender",
                "maritalStatus",
                "permanentAddress",
                "nominees",
            ])
            .signed()
            .nominees("nominees", true)
            .prefill(vec![
                PrefillRule::with_fallbacks("fullName", &["name"]),
                PrefillRule::with_fallbacks("fatherName", &["fatherOrSpouseName"]),
                PrefillRule::with_fallbacks("dateOfBirth", &["dob"]),
                PrefillRule::new("gender"),
                PrefillRule::new("maritalStatus"),
                PrefillRule::with_fallbacks("permanentAddress", &["presentAddress"]),
                PrefillRule::new("uan"),
                PrefillRule::new("nominees"),
            ]),
        StepDefinition::new(StepId::Insurance, "Medical Insurance")
            .required(&["fullName", "dateOfBirth", "gender", "mobileNumber", "email"])
            .signed()
            .nominees("dependents", false)
            .shared(&["bloodGroup"])
            .prefill(vec![
                PrefillRule::with_fallbacks("fullName", &["name"]),
                PrefillRule::with_fallbacks("dateOfBirth", &["dob"]),
                PrefillRule::new("gender"),
                PrefillRule::with_fallbacks("mobileNumber", &["phone"]),
                PrefillRule::new("email"),
                PrefillRule::with_fallbacks("dependents", &["nominees"]),
            ]),
        StepDefinition::new(StepId::SelfDeclaration, "Self Declaration")
            .required(&[
                "fullName",
                "permanentAddress",
                "presentAddress",
                "place",
                "declarationDate",
            ])
            .signed()
            .prefill(vec![
                PrefillRule::with_fallbacks("fullName", &["name"]),
                PrefillRule::new("permanentAddress"),
                PrefillRule::with_fallbacks("presentAddress", &["permanentAddress"]),
                PrefillRule::with_fallbacks("place", &["city"]),
            ]),
    ])
}

/// Try to load a catalog from a file, falling back to the built-in steps.
pub fn load_catalog_or_default(steps_file: Option<&Path>) -> Result<StepCatalog> {
    match steps_file {
        Some(path) if path.exists() => StepCatalog::load(path),
        _ => Ok(default_catalog()),
    }
}
