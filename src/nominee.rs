//! Nominee and dependent entries shared by the nomination and insurance forms.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::record::display_value;

/// Age below which a nominee needs a guardian.
pub const MAJORITY_AGE: u32 = 18;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// One beneficiary row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Nominee {
    pub name: String,
    pub relationship: String,
    pub date_of_birth: String,
    pub address: String,
    /// Parsed share; unparseable input counts as 0
    pub share_percent: f64,
    pub guardian_name: String,
    pub guardian_relationship: String,
    pub guardian_address: String,
}

impl Nominee {
    /// Read one entry leniently: missing keys are blank, shares may be
    /// numbers or numeric strings.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).map(display_value).unwrap_or_default();
        Self {
            name: text("name"),
            relationship: text("relationship"),
            date_of_birth: text("dateOfBirth"),
            address: text("address"),
            share_percent: value.get("sharePercent").map(parse_share).unwrap_or(0.0),
            guardian_name: text("guardianName"),
            guardian_relationship: text("guardianRelationship"),
            guardian_address: text("guardianAddress"),
        }
    }

    pub fn birth_date(&self) -> Option<NaiveDate> {
        let raw = self.date_of_birth.trim();
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    }

    /// Completed years on `today`; `None` without a parseable birth date.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        today.years_since(self.birth_date()?)
    }

    pub fn is_minor(&self, today: NaiveDate) -> bool {
        self.age_on(today).is_some_and(|age| age < MAJORITY_AGE)
    }

    pub fn has_guardian(&self) -> bool {
        !self.guardian_name.trim().is_empty() && !self.guardian_address.trim().is_empty()
    }
}

fn parse_share(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).unwrap_or(0.0)
}

/// Entries stored under a list field; a non-list value yields no entries.
pub fn nominees_from(value: Option<&Value>) -> Vec<Nominee> {
    match value {
        Some(Value::Array(items)) => items.iter().map(Nominee::from_value).collect(),
        _ => Vec::new(),
    }
}

pub fn share_total(nominees: &[Nominee]) -> f64 {
    nominees.iter().map(|n| n.share_percent).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_from_value_reads_camel_case_keys() {
        let nominee = Nominee::from_value(&json!({
            "name": "Meera",
            "relationship": "Spouse",
            "dateOfBirth": "1992-04-10",
            "address": "12 Park Road",
            "sharePercent": "60",
            "guardianName": null
        }));
        assert_eq!(nominee.name, "Meera");
        assert_eq!(nominee.relationship, "Spouse");
        assert_eq!(nominee.share_percent, 60.0);
        assert_eq!(nominee.guardian_name, "");
    }

    #[test]
    fn test_share_parsing() {
        assert_eq!(parse_share(&json!(40)), 40.0);
        assert_eq!(parse_share(&json!("33.5")), 33.5);
        assert_eq!(parse_share(&json!(" 25 % ")), 25.0);
        assert_eq!(parse_share(&json!("abc")), 0.0);
        assert_eq!(parse_share(&json!(null)), 0.0);
        assert_eq!(parse_share(&json!("NaN")), 0.0);
    }

    #[test]
    fn test_share_total() {
        let list = nominees_from(Some(&json!([{"sharePercent": "60"}, {"sharePercent": 39}])));
        assert_eq!(list.len(), 2);
        assert_eq!(share_total(&list), 99.0);
        assert!(nominees_from(Some(&json!("not a list"))).is_empty());
        assert!(nominees_from(None).is_empty());
    }

    #[test]
    fn test_age_and_minor_detection() {
        let today = date("2026-10-16");
        let child = Nominee {
            date_of_birth: "2010-10-17".into(),
            ..Default::default()
        };
        assert_eq!(child.age_on(today), Some(15));
        assert!(child.is_minor(today));

        let turned_eighteen_today = Nominee {
            date_of_birth: "16/10/2008".into(),
            ..Default::default()
        };
        assert_eq!(turned_eighteen_today.age_on(today), Some(18));
        assert!(!turned_eighteen_today.is_minor(today));

        let unknown = Nominee::default();
        assert_eq!(unknown.age_on(today), None);
        assert!(!unknown.is_minor(today));
    }

    #[test]
    fn test_has_guardian_requires_name_and_address() {
        let mut nominee = Nominee {
            guardian_name: "R. Rao".into(),
            ..Default::default()
        };
        assert!(!nominee.has_guardian());
        nominee.guardian_address = "4 Lake View".into();
        assert!(nominee.has_guardian());
    }
}
