//! Validation System - Input Bundle Rules
//!
//! Rules produce structured violations. Errors reject the bundle, warnings
//! are recorded and the session proceeds with fallbacks.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::catalog::{BodyPart, TattooStyle};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid input bundle: {0}")]
    Rejected(ValidationResult),

    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f32 },

    #[error("Unknown {kind}: {value}")]
    UnknownName { kind: &'static str, value: String },
}

/// Guard for control values arriving from outside the core.
pub fn require_finite(field: &'static str, value: f32) -> Result<f32, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NonFinite { field, value })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub actual: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
}

impl ValidationResult {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations.iter().filter(|v| v.severity == ViolationSeverity::Warning)
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<_> = self.violations.iter()
            .map(|v| format!("{}: {}", v.rule, v.message))
            .collect();
        f.write_str(&messages.join("; "))
    }
}

/// What the navigation shell hands the core to open an editing session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputBundle {
    pub user_image: String,
    #[serde(default, alias = "tattooImage")]
    pub overlay_image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub body_part: Option<String>,
}

impl InputBundle {
    pub fn new(
        user_image: impl Into<String>,
        overlay_image: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_image: user_image.into(),
            overlay_image: overlay_image.into(),
            description: description.into(),
            style: None,
            body_part: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn with_body_part(mut self, body_part: impl Into<String>) -> Self {
        self.body_part = Some(body_part.into());
        self
    }

    pub fn resolved_style(&self) -> TattooStyle {
        TattooStyle::parse_or_default(self.style.as_deref())
    }

    pub fn resolved_body_part(&self) -> BodyPart {
        BodyPart::parse_or_default(self.body_part.as_deref())
    }
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, input: &InputBundle) -> Vec<ValidationViolation>;
}

// --- Concrete Rules ---

pub struct UserImageRule;

impl ValidationRule for UserImageRule {
    fn name(&self) -> &'static str { "user_image" }

    fn validate(&self, input: &InputBundle) -> Vec<ValidationViolation> {
        if input.user_image.trim().is_empty() {
            vec![ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Error,
                message: "User photo reference is required".to_string(),
                actual: None,
            }]
        } else {
            vec![]
        }
    }
}

/// A session may open before the overlay has been generated.
pub struct OverlayImageRule;

impl ValidationRule for OverlayImageRule {
    fn name(&self) -> &'static str { "overlay_image" }

    fn validate(&self, input: &InputBundle) -> Vec<ValidationViolation> {
        if input.overlay_image.trim().is_empty() {
            vec![ValidationViolation {
                rule: self.name().to_string(),
                severity: ViolationSeverity::Warning,
                message: "No overlay yet; scene will contain the photo only".to_string(),
                actual: None,
            }]
        } else {
            vec![]
        }
    }
}

pub struct VocabularyRule;

impl ValidationRule for VocabularyRule {
    fn name(&self) -> &'static str { "vocabulary" }

    fn validate(&self, input: &InputBundle) -> Vec<ValidationViolation> {
        let mut violations = vec![];

        if let Some(style) = &input.style {
            if style.parse::<TattooStyle>().is_err() {
                violations.push(ValidationViolation {
                    rule: self.name().to_string(),
                    severity: ViolationSeverity::Warning,
                    message: format!("Unknown style, using {}", TattooStyle::default()),
                    actual: Some(style.clone()),
                });
            }
        }

        if let Some(part) = &input.body_part {
            if part.parse::<BodyPart>().is_err() {
                violations.push(ValidationViolation {
                    rule: self.name().to_string(),
                    severity: ViolationSeverity::Warning,
                    message: format!("Unknown body part, using {}", BodyPart::default()),
                    actual: Some(part.clone()),
                });
            }
        }

        violations
    }
}

/// Validator orchestrates rules and applies policy
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(UserImageRule),
                Box::new(OverlayImageRule),
                Box::new(VocabularyRule),
            ],
        }
    }

    pub fn validate(&self, input: &InputBundle) -> ValidationResult {
        let violations: Vec<_> = self.rules.iter()
            .flat_map(|rule| rule.validate(input))
            .collect();

        let valid = !violations.iter().any(|v| v.severity == ViolationSeverity::Error);
        ValidationResult { valid, violations }
    }

    /// Validate and turn a failing result into an error.
    pub fn check(&self, input: &InputBundle) -> Result<ValidationResult, ValidationError> {
        let result = self.validate(input);
        if result.valid {
            Ok(result)
        } else {
            Err(ValidationError::Rejected(result))
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
