//! Typed request bodies and their field-level validation.
//!
//! Each form turns into a payload of domain types or into [`FieldErrors`],
//! the `field -> messages` mapping returned to clients with status 400.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::Serialize;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

pub mod categories;
pub mod products;

/// Validation messages keyed by field path (`name`, `images.0.priority`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mapping holding one message for one field.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Append `message` to the messages of `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Merge validator output, prefixing every field path with `prefix`.
    pub fn extend_from(&mut self, prefix: &str, errors: &ValidationErrors) {
        for (field, kind) in errors.errors() {
            let path = if prefix.is_empty() {
                field.to_string()
            } else {
                format!("{prefix}.{field}")
            };
            match kind {
                ValidationErrorsKind::Field(list) => {
                    for error in list {
                        self.add(path.clone(), message_for(&path, error));
                    }
                }
                ValidationErrorsKind::Struct(inner) => self.extend_from(&path, inner),
                ValidationErrorsKind::List(items) => {
                    for (index, inner) in items {
                        self.extend_from(&format!("{path}.{index}"), inner);
                    }
                }
            }
        }
    }
}

fn message_for(path: &str, error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.replace(":attribute", path),
        None => format!("The {path} field is invalid."),
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(value: ValidationErrors) -> Self {
        let mut errors = Self::new();
        errors.extend_from("", &value);
        errors
    }
}

impl Display for FieldErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let fields = self.0.keys().map(String::as_str).collect::<Vec<_>>();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

/// Trim `value`, treating blank strings like missing ones.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(required(message = "The :attribute field is required."))]
        name: Option<String>,
        #[validate(range(min = 0))]
        priority: i32,
    }

    #[test]
    fn flattens_validator_errors_by_field() {
        let sample = Sample {
            name: None,
            priority: -1,
        };
        let errors = FieldErrors::from(sample.validate().unwrap_err());

        assert_eq!(
            errors.get("name").unwrap(),
            ["The name field is required.".to_string()]
        );
        assert!(errors.contains("priority"));
    }

    #[test]
    fn prefixes_nested_paths() {
        let sample = Sample {
            name: Some("x".into()),
            priority: -5,
        };
        let mut errors = FieldErrors::new();
        errors.extend_from("images.2", &sample.validate().unwrap_err());

        assert!(errors.contains("images.2.priority"));
    }

    #[test]
    fn serializes_as_plain_mapping() {
        let errors = FieldErrors::single("name", "taken");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({ "name": ["taken"] })
        );
    }

    #[test]
    fn blank_strings_count_as_missing() {
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(Some(" a ".into())), Some("a".into()));
    }
}
