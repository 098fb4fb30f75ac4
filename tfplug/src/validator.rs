//! Built-in attribute validators and config-level validation helpers

use crate::schema::{Validator, ValidatorRequest, ValidatorResponse};
use crate::types::{AttributePath, Diagnostic, DynamicValue};

pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl StringLengthValidator {
    pub fn between(min: usize, max: usize) -> Box<dyn Validator> {
        Box::new(Self {
            min: Some(min),
            max: Some(max),
        })
    }

    pub fn at_least(min: usize) -> Box<dyn Validator> {
        Box::new(Self {
            min: Some(min),
            max: None,
        })
    }
}

impl Validator for StringLengthValidator {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("string length must be between {} and {}", min, max),
            (Some(min), None) => format!("string length must be at least {}", min),
            (None, Some(max)) => format!("string length must be at most {}", max),
            (None, None) => "any string length".to_string(),
        }
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];
        if let Some(s) = request.value.as_str() {
            let len = s.chars().count();
            if self.min.is_some_and(|min| len < min) || self.max.is_some_and(|max| len > max) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Invalid length for {}", request.path),
                        format!("{}, got length {}", self.description(), len),
                    )
                    .with_attribute(request.path),
                );
            }
        }
        ValidatorResponse { diagnostics }
    }
}

pub struct StringPatternValidator {
    pub pattern: regex::Regex,
    pub message: String,
}

impl StringPatternValidator {
    /// Fails with the regex error when the pattern itself is invalid
    pub fn create(pattern: &str, message: &str) -> Result<Box<dyn Validator>, regex::Error> {
        Ok(Box::new(Self {
            pattern: regex::Regex::new(pattern)?,
            message: message.to_string(),
        }))
    }
}

impl Validator for StringPatternValidator {
    fn description(&self) -> String {
        self.message.clone()
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];
        if let Some(s) = request.value.as_str() {
            if !self.pattern.is_match(s) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Invalid value for {}", request.path),
                        format!("{}: got {:?}", self.message, s),
                    )
                    .with_attribute(request.path),
                );
            }
        }
        ValidatorResponse { diagnostics }
    }
}

/// Accepts only one of a fixed set of strings
pub struct OneOfValidator {
    pub allowed: Vec<String>,
}

impl OneOfValidator {
    pub fn create(allowed: &[&str]) -> Box<dyn Validator> {
        Box::new(Self {
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl Validator for OneOfValidator {
    fn description(&self) -> String {
        format!("value must be one of: {}", self.allowed.join(", "))
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];
        if let Some(s) = request.value.as_str() {
            if !self.allowed.iter().any(|a| a == s) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Invalid value for {}", request.path),
                        format!("{}, got {:?}", self.description(), s),
                    )
                    .with_attribute(request.path),
                );
            }
        }
        ValidatorResponse { diagnostics }
    }
}

pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberRangeValidator {
    pub fn between(min: f64, max: f64) -> Box<dyn Validator> {
        Box::new(Self {
            min: Some(min),
            max: Some(max),
        })
    }
}

impl Validator for NumberRangeValidator {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("value must be between {} and {}", min, max),
            (Some(min), None) => format!("value must be at least {}", min),
            (None, Some(max)) => format!("value must be at most {}", max),
            (None, None) => "any number".to_string(),
        }
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];
        if let Some(n) = request.value.as_number() {
            if self.min.is_some_and(|min| n < min) || self.max.is_some_and(|max| n > max) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Invalid value for {}", request.path),
                        format!("{}, got {}", self.description(), n),
                    )
                    .with_attribute(request.path),
                );
            }
        }
        ValidatorResponse { diagnostics }
    }
}

/// A configured attribute counts as set when it is neither null nor absent.
/// Unknown values count as set: they will hold something at apply time.
fn is_set(config: &DynamicValue, name: &str) -> bool {
    config
        .get_value(&AttributePath::new(name))
        .is_some_and(|v| !v.is_null())
}

/// Exactly one of the named attributes must be configured
pub fn exactly_one_of(config: &DynamicValue, names: &[&str]) -> Vec<Diagnostic> {
    let set: Vec<&str> = names.iter().copied().filter(|n| is_set(config, n)).collect();
    if set.len() == 1 {
        return vec![];
    }

    let detail = if set.is_empty() {
        format!("One of {} must be specified", names.join(", "))
    } else {
        format!(
            "Only one of {} can be specified, got {}",
            names.join(", "),
            set.join(", ")
        )
    };
    vec![Diagnostic::error("Invalid attribute combination", detail)]
}

/// `attribute` cannot be configured together with any of `others`
pub fn conflicts_with(config: &DynamicValue, attribute: &str, others: &[&str]) -> Vec<Diagnostic> {
    if !is_set(config, attribute) {
        return vec![];
    }
    others
        .iter()
        .filter(|other| is_set(config, other))
        .map(|other| {
            Diagnostic::error(
                "Conflicting configuration arguments",
                format!("\"{}\" cannot be specified when \"{}\" is specified", attribute, other),
            )
            .with_attribute(AttributePath::new(attribute))
        })
        .collect()
}
