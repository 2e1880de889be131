mod config;
pub(crate) mod rules;
mod summary;

pub use config::MarkThresholds;
pub use summary::{summarize, MarkSummary};

use super::domain::ApplicationDraft;
use super::subjects::subjects_in_scope;
use serde::{Deserialize, Serialize};

/// One field-scoped problem shown next to the input it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Field errors in the order they were first raised. Re-inserting a field replaces its
/// message without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    entries: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        let message = message.into();
        match self.entries.iter_mut().find(|entry| entry.field == field) {
            Some(entry) => entry.message = message,
            None => self.entries.push(FieldError { field, message }),
        }
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        let index = self.entries.iter().position(|entry| entry.field == field)?;
        Some(self.entries.remove(index).message)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| entry.message.as_str())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.entries.iter()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.field.as_str())
    }
}

/// Stateless checker that turns a draft into the errors blocking its submission.
#[derive(Debug, Clone, Default)]
pub struct MarkValidator {
    thresholds: MarkThresholds,
}

impl MarkValidator {
    pub fn new(thresholds: MarkThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &MarkThresholds {
        &self.thresholds
    }

    pub fn validate(&self, draft: &ApplicationDraft) -> ValidationErrors {
        let mut errors = ValidationErrors::default();

        rules::check_language_fields(draft, &mut errors);

        for subject in subjects_in_scope(draft) {
            rules::check_subject_marks(
                &subject,
                draft.form_data.marks.get(&subject),
                &self.thresholds,
                &mut errors,
            );
        }

        rules::check_electives(draft, &mut errors);
        rules::check_aggregates(&summarize(draft), &self.thresholds, &mut errors);

        tracing::debug!(
            grade = %draft.grade,
            errors = errors.len(),
            "application draft validated"
        );
        errors
    }

    pub fn is_submittable(&self, draft: &ApplicationDraft) -> bool {
        self.validate(draft).is_empty()
    }
}
