use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{FieldMap, FieldValue, SectionData, SectionInput, SectionKey};
use super::rules::{FieldRule, RuleOutcome};

/// Display hint for a field; rendering only, the rule decides validity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Date,
    Phone,
    Email,
    Flag,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub rule: FieldRule,
}

impl FieldSpec {
    pub fn new(
        name: &'static str,
        label: &'static str,
        kind: FieldKind,
        required: bool,
        rule: FieldRule,
    ) -> Self {
        Self {
            name,
            label,
            kind,
            required,
            rule,
        }
    }

    fn normalize(&self, value: Option<&FieldValue>) -> FieldValue {
        match (self.kind, value) {
            (_, Some(FieldValue::Text(text))) => FieldValue::text(text.trim()),
            (_, Some(FieldValue::Flag(flag))) => FieldValue::Flag(*flag),
            (FieldKind::Flag, _) => FieldValue::Flag(false),
            _ => FieldValue::text(""),
        }
    }

    pub fn descriptor(&self) -> FieldDescriptor {
        FieldDescriptor {
            name: self.name,
            label: self.label,
            kind: self.kind,
            required: self.required,
        }
    }
}

/// Read-only description of a field used to drive rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

/// Rejection produced when candidate step data fails its schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("step data rejected ({} invalid field(s))", .errors.len())]
pub struct ValidationError {
    errors: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new(errors: BTreeMap<String, String>) -> Self {
        Self { errors }
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), message.into());
        Self { errors }
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn into_errors(self) -> BTreeMap<String, String> {
        self.errors
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Accepted(SectionData),
    Rejected(ValidationError),
}

impl ValidationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResult::Accepted(_))
    }

    pub fn into_result(self) -> Result<SectionData, ValidationError> {
        match self {
            ValidationResult::Accepted(data) => Ok(data),
            ValidationResult::Rejected(error) => Err(error),
        }
    }
}

/// Schema for one record section: the ordered field specs and their rules.
#[derive(Debug, Clone)]
pub struct SectionSchema {
    section: SectionKey,
    fields: Vec<FieldSpec>,
}

impl SectionSchema {
    pub fn new(section: SectionKey, fields: Vec<FieldSpec>) -> Self {
        Self { section, fields }
    }

    pub fn section(&self) -> SectionKey {
        self.section
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn descriptors(&self) -> Vec<FieldDescriptor> {
        self.fields.iter().map(FieldSpec::descriptor).collect()
    }

    /// Check every field and either accept the normalized section or report every failure.
    /// Keys the schema does not declare are ignored.
    pub fn validate(&self, input: &SectionInput) -> ValidationResult {
        let mut errors = BTreeMap::new();
        let mut normalized = FieldMap::new();

        for field in &self.fields {
            let value = input.get(field.name);
            match field.rule.check(value) {
                RuleOutcome::Valid => {
                    normalized.insert(field.name.to_string(), field.normalize(value));
                }
                RuleOutcome::Invalid(message) => {
                    errors.insert(field.name.to_string(), message);
                }
            }
        }

        if errors.is_empty() {
            ValidationResult::Accepted(SectionData::from_fields(self.section, &normalized))
        } else {
            ValidationResult::Rejected(ValidationError::new(errors))
        }
    }
}
