//! Edit forms for cities and countries, plus the per-field state tracked
//! while a user works on them.

use std::collections::BTreeMap;

use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::types::TypeConstraintError;
use crate::domain::validation::Verdict;

pub mod city;
pub mod country;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid country id")]
    InvalidCountryId,

    #[error(transparent)]
    Constraint(#[from] TypeConstraintError),
}

/// Aggregate state of a form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormStatus {
    Valid,
    Invalid,
    /// At least one uniqueness check is outstanding.
    Pending,
}

#[derive(Clone, Debug, Default)]
struct FieldState {
    touched: bool,
    dirty: bool,
    invalid: bool,
    verdict: Option<Verdict>,
}

impl FieldState {
    fn is_invalid(&self) -> bool {
        self.invalid || self.verdict.as_ref().is_some_and(Verdict::is_duplicate)
    }

    fn is_pending(&self) -> bool {
        self.verdict.as_ref().is_some_and(Verdict::is_pending)
    }
}

/// Tracks user interaction and validity per field.
///
/// Local rule violations and `Duplicate` verdicts make a field invalid. A
/// `Pending` verdict makes it neither valid nor invalid. `Failed` verdicts
/// are inconclusive and ignored.
#[derive(Clone, Debug, Default)]
pub struct FormState {
    fields: BTreeMap<String, FieldState>,
}

impl FormState {
    pub fn new<'a>(fields: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|name| (name.to_string(), FieldState::default()))
                .collect(),
        }
    }

    fn field_mut(&mut self, name: &str) -> &mut FieldState {
        self.fields.entry(name.to_string()).or_default()
    }

    pub fn touch(&mut self, name: &str) {
        self.field_mut(name).touched = true;
    }

    pub fn mark_dirty(&mut self, name: &str) {
        self.field_mut(name).dirty = true;
    }

    /// Replaces the local validation outcome of every field with `errors`.
    pub fn apply_local(&mut self, errors: Option<&ValidationErrors>) {
        let failing = errors.map(ValidationErrors::field_errors).unwrap_or_default();
        for (name, field) in &mut self.fields {
            field.invalid = failing.contains_key(name.as_str());
        }
        for name in failing.keys() {
            self.field_mut(name).invalid = true;
        }
    }

    pub fn set_verdict(&mut self, name: &str, verdict: Verdict) {
        self.field_mut(name).verdict = Some(verdict);
    }

    pub fn verdict(&self, name: &str) -> Option<&Verdict> {
        self.fields.get(name).and_then(|field| field.verdict.as_ref())
    }

    pub fn is_valid(&self, name: &str) -> bool {
        self.fields
            .get(name)
            .is_some_and(|field| !field.is_invalid() && !field.is_pending())
    }

    /// Whether the user has edited or visited the field.
    pub fn is_changed(&self, name: &str) -> bool {
        self.fields
            .get(name)
            .is_some_and(|field| field.touched || field.dirty)
    }

    /// Whether the field should display an error.
    pub fn has_error(&self, name: &str) -> bool {
        self.is_changed(name) && self.fields.get(name).is_some_and(FieldState::is_invalid)
    }

    pub fn status(&self) -> FormStatus {
        if self.fields.values().any(FieldState::is_invalid) {
            FormStatus::Invalid
        } else if self.fields.values().any(FieldState::is_pending) {
            FormStatus::Pending
        } else {
            FormStatus::Valid
        }
    }

    pub fn is_submittable(&self) -> bool {
        self.status() == FormStatus::Valid
    }
}
