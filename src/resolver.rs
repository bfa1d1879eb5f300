//! Cross-step field resolution.
//!
//! A later step pre-fills its inputs from answers given on earlier steps.
//! `FieldResolver` looks a key up in the shared top-level fields first, then
//! in each visible step sub-record in precedence order, and only then moves
//! on to the next fallback key.

use serde_json::Value;

use crate::record::{ApplicantRecord, FieldMap, is_filled};
use crate::steps::{StepCatalog, StepDefinition, StepId};

/// Read-only view over an applicant record with a fixed bucket precedence.
pub struct FieldResolver<'a> {
    record: &'a ApplicantRecord,
    precedence: Vec<StepId>,
}

impl<'a> FieldResolver<'a> {
    /// Resolver over the given sub-records, searched in the given order.
    pub fn new(record: &'a ApplicantRecord, precedence: impl IntoIterator<Item = StepId>) -> Self {
        Self {
            record,
            precedence: precedence.into_iter().collect(),
        }
    }

    /// Resolver over every step's sub-record, in flow order.
    pub fn over_all(record: &'a ApplicantRecord, catalog: &StepCatalog) -> Self {
        Self::new(record, catalog.order())
    }

    /// Resolver for a step's initializer: only earlier steps' sub-records are visible.
    pub fn for_step(record: &'a ApplicantRecord, catalog: &StepCatalog, step: StepId) -> Self {
        Self::new(record, catalog.preceding(step))
    }

    pub fn precedence(&self) -> &[StepId] {
        &self.precedence
    }

    /// First filled value for `key`, then for each fallback in turn.
    pub fn lookup(&self, key: &str, fallbacks: &[String]) -> Option<&'a Value> {
        std::iter::once(key)
            .chain(fallbacks.iter().map(String::as_str))
            .find_map(|k| self.lookup_key(k))
    }

    fn lookup_key(&self, key: &str) -> Option<&'a Value> {
        let record = self.record;
        let shared = record.shared_value(key).filter(|v| is_filled(v));
        shared.or_else(|| {
            self.precedence
                .iter()
                .filter_map(|step| record.get(*step))
                .filter_map(|fields| fields.get(key))
                .find(|v| is_filled(v))
        })
    }

    /// Resolved value, or an empty string when nothing is filled.
    pub fn resolve(&self, key: &str, fallbacks: &[String]) -> Value {
        self.lookup(key, fallbacks)
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()))
    }
}

/// Initial local state for `step`.
///
/// When the step was committed before, its own saved value for a prefill
/// target wins; otherwise the target is resolved from shared fields and
/// earlier steps.
pub fn prefill(catalog: &StepCatalog, step: &StepDefinition, record: &ApplicantRecord) -> FieldMap {
    let resolver = FieldResolver::for_step(record, catalog, step.id);
    let own = record.get(step.id);

    let mut out = own.cloned().unwrap_or_default();
    for rule in &step.prefill {
        let saved = own
            .and_then(|fields| fields.get(&rule.target))
            .filter(|v| is_filled(v));
        if saved.is_some() {
            continue;
        }
        out.insert(
            rule.target.clone(),
            resolver.resolve(&rule.target, &rule.fallbacks),
        );
    }
    out
}
