//! Explicit validation of item fields.
//!
//! Rules:
//! - name: not blank, 2 to 124 characters
//! - description: not blank, 8 to 1024 characters
//! - email: not blank, well-formed address
//!
//! Every broken rule is reported, so one field can carry more than one error.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::{Item, ItemInput};

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 124;
const DESCRIPTION_MIN: usize = 8;
const DESCRIPTION_MAX: usize = 1024;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)*$",
    )
    .expect("email pattern is valid")
});

/// A single broken rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All rules broken by one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(transparent)]
#[error("{}", join_errors(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// True if at least one error concerns `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validates client input before it is persisted.
pub fn validate_item_input(input: &ItemInput) -> Result<(), ValidationErrors> {
    validate_fields(&input.name, &input.description, &input.email)
}

/// Validates a stored item before it is written back.
pub fn validate_item(item: &Item) -> Result<(), ValidationErrors> {
    validate_fields(&item.name, &item.description, &item.email)
}

fn validate_fields(name: &str, description: &str, email: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    check_text(
        &mut errors,
        "name",
        name,
        NAME_MIN,
        NAME_MAX,
        "You must insert a name",
    );
    check_text(
        &mut errors,
        "description",
        description,
        DESCRIPTION_MIN,
        DESCRIPTION_MAX,
        "You must insert a description",
    );

    if email.trim().is_empty() {
        errors.add("email", "You must insert an email address");
    } else if !EMAIL_PATTERN.is_match(email) {
        errors.add("email", "You must insert a valid email address");
    }

    errors.into_result()
}

fn check_text(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    min: usize,
    max: usize,
    blank_message: &str,
) {
    if value.trim().is_empty() {
        errors.add(field, blank_message);
    }

    let length = value.chars().count();
    if length < min || length > max {
        errors.add(field, format!("size must be between {} and {}", min, max));
    }
}
