//! Pure shape and bound checks for catalog inputs.
//!
//! Validation never touches the database. The one documented side effect is
//! rule `texts` normalization: entries are trimmed, empties dropped, and the
//! result re-serialized into the stored JSON-array form.

use crate::ids;
use crate::types::{Project, Rule, RuleKind};
use serde::Serialize;
use std::fmt;

pub const MIN_PROJECT_NAME_LENGTH: usize = 1;
pub const MAX_PROJECT_NAME_LENGTH: usize = 25;
pub const MAX_PROJECT_DESCRIPTION_LENGTH: usize = 200;

pub const MIN_RULE_NAME_LENGTH: usize = 1;
pub const MAX_RULE_NAME_LENGTH: usize = 25;
pub const MAX_RULE_TEXT_LENGTH: usize = 64;
pub const MAX_RULE_TEXTS_ITEMS: usize = 20;

/// Characters rejected in names: TAB, LF, CR, FF, VT.
const NAME_CONTROL_CHARS: &[char] = &['\t', '\n', '\r', '\u{000C}', '\u{000B}'];

/// Characters rejected in descriptions: FF, VT.
const DESCRIPTION_CONTROL_CHARS: &[char] = &['\u{000C}', '\u{000B}'];

/// A single field-level validation failure.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(
                f,
                "validation failed for field '{}': {} (value: {})",
                self.field, self.message, value
            ),
            None => write!(
                f,
                "validation failed for field '{}': {}",
                self.field, self.message
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Aggregate of field-level failures, surfaced as one error value.
#[derive(Debug, Clone, Default)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    fn add(&mut self, field: &str, message: impl Into<String>, value: Option<&str>) {
        self.0.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
            value: value.map(str::to_string),
        });
    }

    /// The structured per-field list, for callers that want more than the
    /// collapsed message.
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "no validation errors"),
            [only] => write!(f, "{only}"),
            [first, ..] => write!(
                f,
                "validation failed with {} errors: {}",
                self.0.len(),
                first.message
            ),
        }
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate a project. Inputs are expected pre-trimmed by the repository.
pub fn validate_project(project: &Project) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    check_name(&mut errors, &project.name, "project", MAX_PROJECT_NAME_LENGTH);
    check_description(&mut errors, &project.description);

    if !project.id.is_empty() && !ids::is_valid_id(&project.id) {
        errors.add("id", "ID must be a valid UUID format", Some(&project.id));
    }

    errors.into_result()
}

/// Validate a rule, normalizing its `texts` in place.
pub fn validate_rule(rule: &mut Rule) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    check_name(&mut errors, &rule.name, "rule", MAX_RULE_NAME_LENGTH);

    if !ids::is_valid_id(&rule.project_id) {
        errors.add(
            "project_id",
            "invalid project ID format",
            Some(&rule.project_id),
        );
    }

    match serde_json::from_str::<Vec<String>>(&rule.texts) {
        Err(_) => {
            errors.add(
                "texts",
                "invalid texts format: must be a JSON array of strings",
                Some(&rule.texts),
            );
        }
        Ok(texts) => {
            let trimmed: Vec<&str> = texts
                .iter()
                .map(|text| text.trim())
                .filter(|text| !text.is_empty())
                .collect();

            if trimmed.is_empty() {
                errors.add("texts", "rule must have at least one text", None);
            }
            if trimmed.len() > MAX_RULE_TEXTS_ITEMS {
                errors.add(
                    "texts",
                    format!("rule texts exceed max items of {MAX_RULE_TEXTS_ITEMS}"),
                    None,
                );
            }
            for &text in &trimmed {
                if text.chars().count() > MAX_RULE_TEXT_LENGTH {
                    errors.add(
                        "texts",
                        format!("rule text '{text}' exceeds max length of {MAX_RULE_TEXT_LENGTH}"),
                        Some(text),
                    );
                }
            }

            if rule.kind == RuleKind::Regex {
                if trimmed.len() != 1 {
                    errors.add("texts", "regex rule must have exactly one pattern", None);
                } else if let Err(err) = regex::Regex::new(trimmed[0]) {
                    errors.add(
                        "texts",
                        format!("invalid regex pattern: {err}"),
                        Some(trimmed[0]),
                    );
                }
            }

            if errors.is_empty() {
                // The documented normalization: trimmed, non-empty, re-serialized.
                rule.texts = serde_json::to_string(&trimmed)
                    .unwrap_or_else(|_| rule.texts.clone());
            }
        }
    }

    if !rule.id.is_empty() && !ids::is_valid_id(&rule.id) {
        errors.add("id", "ID must be a valid UUID format", Some(&rule.id));
    }

    errors.into_result()
}

fn check_name(errors: &mut ValidationErrors, name: &str, entity: &str, max_length: usize) {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        errors.add("name", format!("{entity} name is required"), None);
        return;
    }

    if trimmed.chars().count() > max_length {
        errors.add(
            "name",
            format!("{entity} name must not exceed {max_length} characters"),
            Some(name),
        );
    }

    if trimmed.contains(NAME_CONTROL_CHARS) {
        errors.add(
            "name",
            format!("{entity} name cannot contain control characters"),
            Some(name),
        );
    }

    if trimmed.contains("  ") {
        errors.add(
            "name",
            format!("{entity} name cannot contain consecutive spaces"),
            Some(name),
        );
    }
}

fn check_description(errors: &mut ValidationErrors, description: &str) {
    if description.is_empty() {
        return;
    }

    let trimmed = description.trim();
    if trimmed.chars().count() > MAX_PROJECT_DESCRIPTION_LENGTH {
        errors.add(
            "description",
            format!(
                "project description must not exceed {MAX_PROJECT_DESCRIPTION_LENGTH} characters"
            ),
            Some(description),
        );
    }

    if trimmed.contains(DESCRIPTION_CONTROL_CHARS) {
        errors.add(
            "description",
            "project description cannot contain form feed or vertical tab characters",
            Some(description),
        );
    }
}
