//! PDF form fill plans.
//!
//! Each printable form has a template mapping its AcroForm field names to a
//! field kind and the record key that feeds it. Filling a template against an
//! applicant record yields the values a PDF writer sets, field by field.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::nominee::{Nominee, nominees_from};
use crate::record::{ApplicantRecord, display_value, is_filled};
use crate::resolver::FieldResolver;
use crate::signature::SignatureBlob;
use crate::steps::{StepCatalog, StepDefinition, StepId};

/// Number of nominee rows printed on the nomination forms.
const NOMINEE_ROWS: usize = 3;

/// Kind of an AcroForm field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfFieldKind {
    Text,
    Checkbox,
    /// Push button used as an image anchor (signatures)
    Button,
}

/// Where a template field takes its value from.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSource {
    /// A record key resolved with fallbacks
    Key { key: String, fallbacks: Vec<String> },
    /// A key read only from the step's own sub-record
    StepLocal(String),
    /// One column of a nominee row (1-based)
    Nominee { row: usize, column: &'static str },
}

/// One field of a form template.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfFieldSpec {
    pub name: String,
    pub kind: PdfFieldKind,
    pub source: FieldSource,
    /// For checkboxes: the value that ticks the box. `None` ticks on any filled value.
    pub checked_when: Option<String>,
}

impl PdfFieldSpec {
    fn new(name: &str, kind: PdfFieldKind, source: FieldSource) -> Self {
        Self {
            name: name.to_string(),
            kind,
            source,
            checked_when: None,
        }
    }

    fn text(name: &str, key: &str, fallbacks: &[&str]) -> Self {
        let source = FieldSource::Key {
            key: key.to_string(),
            fallbacks: fallbacks.iter().map(|s| s.to_string()).collect(),
        };
        Self::new(name, PdfFieldKind::Text, source)
    }

    fn checkbox(name: &str, key: &str, when: &str) -> Self {
        let source = FieldSource::Key {
            key: key.to_string(),
            fallbacks: Vec::new(),
        };
        Self {
            checked_when: Some(when.to_string()),
            ..Self::new(name, PdfFieldKind::Checkbox, source)
        }
    }

    fn declaration(name: &str, key: &str) -> Self {
        Self::new(name, PdfFieldKind::Checkbox, FieldSource::StepLocal(key.to_string()))
    }

    fn signature(name: &str, key: &str) -> Self {
        Self::new(name, PdfFieldKind::Button, FieldSource::StepLocal(key.to_string()))
    }
}

/// Value to write into one PDF field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PdfFieldValue {
    Text { value: String },
    Checked { value: bool },
    Image {
        mime: String,
        #[serde(serialize_with = "as_base64")]
        data: Vec<u8>,
    },
}

fn as_base64<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64.encode(data))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfFieldFill {
    pub name: String,
    pub kind: PdfFieldKind,
    #[serde(flatten)]
    pub value: PdfFieldValue,
}

fn personal_fields() -> Vec<PdfFieldSpec> {
    vec![
        PdfFieldSpec::text("name", "fullName", &["name"]),
        PdfFieldSpec::text("father_name", "fatherName", &["fatherOrSpouseName"]),
        PdfFieldSpec::text("dob", "dateOfBirth", &["dob"]),
        PdfFieldSpec::checkbox("gender_male", "gender", "male"),
        PdfFieldSpec::checkbox("gender_female", "gender", "female"),
    ]
}

fn nominee_fields() -> Vec<PdfFieldSpec> {
    const COLUMNS: [&str; 5] = ["name", "relationship", "dob", "address", "share"];
    (1..=NOMINEE_ROWS)
        .flat_map(|row| {
            COLUMNS.into_iter().map(move |column| {
                PdfFieldSpec::new(
                    &format!("nominee{}_{}", row, column),
                    PdfFieldKind::Text,
                    FieldSource::Nominee { row, column },
                )
            })
        })
        .collect()
}

/// Field template for a step's printable form.
pub fn template_for(step: StepId) -> Vec<PdfFieldSpec> {
    let mut fields = personal_fields();
    match step {
        StepId::JoiningForm => fields.extend([
            PdfFieldSpec::text("mobile", "mobileNumber", &["phone"]),
            PdfFieldSpec::text("email", "email", &[]),
            PdfFieldSpec::text("permanent_address", "permanentAddress", &[]),
            PdfFieldSpec::text("present_address", "presentAddress", &["permanentAddress"]),
            PdfFieldSpec::text("aadhaar", "aadhaarNumber", &["aadhaar"]),
            PdfFieldSpec::text("pan", "panNumber", &["pan"]),
            PdfFieldSpec::text("bank_account", "bankAccountNumber", &[]),
            PdfFieldSpec::text("ifsc", "ifscCode", &[]),
            PdfFieldSpec::text("date_of_joining", "dateOfJoining", &[]),
            PdfFieldSpec::text("designation", "designation", &[]),
            PdfFieldSpec::checkbox("married", "maritalStatus", "married"),
        ]),
        StepId::Form11 => fields.extend([
            PdfFieldSpec::text("mobile", "mobileNumber", &["phone"]),
            PdfFieldSpec::text("email", "email", &[]),
            PdfFieldSpec::checkbox("prev_epf_yes", "previousEpfMember", "yes"),
            PdfFieldSpec::checkbox("prev_epf_no", "previousEpfMember", "no"),
            PdfFieldSpec::text("uan", "uan", &[]),
            PdfFieldSpec::text("prev_pf_account", "previousPfAccountNumber", &[]),
            PdfFieldSpec::text("aadhaar", "aadhaarNumber", &["aadhaar"]),
            PdfFieldSpec::text("pan", "panNumber", &["pan"]),
            PdfFieldSpec::text("date_of_joining", "dateOfJoining", &[]),
        ]),
        StepId::FormF => {
            fields.extend([
                PdfFieldSpec::text("religion", "religion", &[]),
                PdfFieldSpec::text("department", "department", &["designation"]),
                PdfFieldSpec::text("date_of_joining", "dateOfJoining", &[]),
                PdfFieldSpec::text("permanent_address", "permanentAddress", &[]),
                PdfFieldSpec::checkbox("married", "maritalStatus", "married"),
            ]);
            fields.extend(nominee_fields());
        }
        StepId::PfNomination => {
            fields.extend([
                PdfFieldSpec::text("uan", "uan", &[]),
                PdfFieldSpec::text("permanent_address", "permanentAddress", &[]),
                PdfFieldSpec::checkbox("married", "maritalStatus", "married"),
            ]);
            fields.extend(nominee_fields());
        }
        StepId::Insurance => fields.extend([
            PdfFieldSpec::text("mobile", "mobileNumber", &["phone"]),
            PdfFieldSpec::text("email", "email", &[]),
            PdfFieldSpec::text("blood_group", "bloodGroup", &[]),
        ]),
        StepId::SelfDeclaration => fields.extend([
            PdfFieldSpec::text("permanent_address", "permanentAddress", &[]),
            PdfFieldSpec::text("present_address", "presentAddress", &["permanentAddress"]),
            PdfFieldSpec::text("place", "place", &["city"]),
            PdfFieldSpec::text("declaration_date", "declarationDate", &[]),
        ]),
    }
    fields.push(PdfFieldSpec::declaration("declaration", "declarationAccepted"));
    fields.push(PdfFieldSpec::signature("signature", "signature"));
    fields
}

/// Values for every field of `step`'s form.
///
/// Keys resolve from shared fields, then the step's own sub-record, then the
/// other steps in flow order. Declarations and signatures are read from the
/// step itself; a signature that cannot be decoded is left out of the plan.
pub fn fill_plan(catalog: &StepCatalog, record: &ApplicantRecord, step: &StepDefinition) -> Vec<PdfFieldFill> {
    let precedence = std::iter::once(step.id)
        .chain(catalog.order().into_iter().filter(|id| *id != step.id));
    let resolver = FieldResolver::new(record, precedence);
    let own = record.get(step.id);

    let list_field = step
        .nominees
        .as_ref()
        .map(|rule| rule.field.as_str())
        .unwrap_or("nominees");
    let nominees = nominees_from(resolver.lookup(list_field, &[]));

    let mut plan = Vec::new();
    for spec in template_for(step.id) {
        let source_value = match &spec.source {
            FieldSource::Key { key, fallbacks } => resolver.resolve(key, fallbacks),
            FieldSource::StepLocal(key) => own
                .and_then(|fields| fields.get(key))
                .cloned()
                .unwrap_or(Value::Null),
            FieldSource::Nominee { row, column } => {
                Value::String(nominee_cell(&nominees, *row, column))
            }
        };

        let value = match spec.kind {
            PdfFieldKind::Text => PdfFieldValue::Text {
                value: display_value(&source_value),
            },
            PdfFieldKind::Checkbox => PdfFieldValue::Checked {
                value: is_checked(&source_value, spec.checked_when.as_deref()),
            },
            PdfFieldKind::Button => {
                let Some(blob) = SignatureBlob::from_value(&source_value) else {
                    continue;
                };
                match blob.decode() {
                    Ok(image) => PdfFieldValue::Image {
                        mime: image.mime,
                        data: image.bytes,
                    },
                    Err(err) => {
                        warn!(step = %step.id, field = %spec.name, error = %err, "Skipping undecodable signature");
                        continue;
                    }
                }
            }
        };

        plan.push(PdfFieldFill {
            name: spec.name,
            kind: spec.kind,
            value,
        });
    }
    plan
}

fn is_checked(value: &Value, when: Option<&str>) -> bool {
    match when {
        Some(expected) => display_value(value).trim().eq_ignore_ascii_case(expected),
        None => is_filled(value),
    }
}

fn nominee_cell(nominees: &[Nominee], row: usize, column: &str) -> String {
    let Some(nominee) = row.checked_sub(1).and_then(|i| nominees.get(i)) else {
        return String::new();
    };
    match column {
        "name" => nominee.name.clone(),
        "relationship" => nominee.relationship.clone(),
        "dob" => nominee.date_of_birth.clone(),
        "address" => nominee.address.clone(),
        "share" => nominee.share_percent.to_string(),
        _ => String::new(),
    }
}
