//! Field validators.
//!
//! Validators run in declaration order against a field's processed value.
//! A validator either passes, fails with a message, or stops the chain
//! ([`Validator::Optional`] on empty input, the presence validators on a
//! missing value). Each validator may also set
//! rendering flags on the widget (`required`, `maxlength`, `min`, `max`).

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::value::{FieldValue, FileData};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~\-]+@[a-zA-Z0-9](?:[a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?)+$")
        .expect("valid regex")
});

/// The result of running one validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// The value is acceptable.
    Pass,
    /// The value is rejected with a message.
    Fail(String),
    /// Stop running further validators and drop errors collected so far.
    StopChain,
    /// Replace the errors collected so far with this message and stop.
    Halt(String),
}

/// A validator attached to a materialized field.
#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    /// A non-empty value is required.
    DataRequired,
    /// Empty input is accepted and skips the remaining validators.
    Optional,
    /// Text may not exceed `max` characters.
    Length {
        /// Maximum number of characters.
        max: usize,
    },
    /// Numbers must lie within the bounds.
    NumberRange {
        /// Inclusive lower bound.
        min: Option<f64>,
        /// Inclusive upper bound.
        max: Option<f64>,
    },
    /// Text must look like an email address.
    Email,
    /// A file must be present.
    FileRequired,
    /// Uploaded files may not exceed `max` bytes.
    FileSize {
        /// Maximum size in bytes.
        max: usize,
    },
    /// Uploaded files must carry one of the listed extensions.
    FileAllowed {
        /// Lower-cased extensions without the dot.
        extensions: Vec<String>,
        /// Message shown when the extension is rejected.
        message: String,
    },
}

impl Validator {
    /// Returns a short name for this validator.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DataRequired => "data_required",
            Self::Optional => "optional",
            Self::Length { .. } => "length",
            Self::NumberRange { .. } => "number_range",
            Self::Email => "email",
            Self::FileRequired => "file_required",
            Self::FileSize { .. } => "file_size",
            Self::FileAllowed { .. } => "file_allowed",
        }
    }

    /// Runs the validator against a processed value.
    pub fn check(&self, value: &FieldValue) -> Check {
        match self {
            Self::DataRequired => {
                if value.is_empty() {
                    Check::Halt("This field is required.".to_string())
                } else {
                    Check::Pass
                }
            }
            Self::Optional => {
                if value.is_empty() {
                    Check::StopChain
                } else {
                    Check::Pass
                }
            }
            Self::Length { max } => match value.as_text() {
                Some(text) if text.chars().count() > *max => Check::Fail(format!(
                    "Field cannot be longer than {max} character{}.",
                    if *max == 1 { "" } else { "s" }
                )),
                _ => Check::Pass,
            },
            Self::NumberRange { min, max } => {
                let Some(number) = value.as_f64() else {
                    return Check::Pass;
                };
                let below = min.is_some_and(|m| number < m);
                let above = max.is_some_and(|m| number > m);
                if number.is_nan() || below || above {
                    Check::Fail(range_message(*min, *max))
                } else {
                    Check::Pass
                }
            }
            Self::Email => match value.as_text() {
                Some(text) if !text.is_empty() && !EMAIL_RE.is_match(text) => {
                    Check::Fail("Invalid email address.".to_string())
                }
                _ => Check::Pass,
            },
            Self::FileRequired => {
                if matches!(value, FieldValue::File(_)) {
                    Check::Pass
                } else {
                    Check::Halt("This field is required.".to_string())
                }
            }
            Self::FileSize { max } => match value {
                FieldValue::File(FileData::Upload(file)) if file.size() > *max => {
                    Check::Fail(format!("File must be between 0 and {max} bytes."))
                }
                _ => Check::Pass,
            },
            Self::FileAllowed {
                extensions,
                message,
            } => match value {
                FieldValue::File(FileData::Upload(file)) => {
                    let allowed = file
                        .extension()
                        .is_some_and(|ext| extensions.iter().any(|e| *e == ext));
                    if allowed {
                        Check::Pass
                    } else {
                        Check::Fail(message.clone())
                    }
                }
                _ => Check::Pass,
            },
        }
    }

    /// Adds this validator's rendering flags to a widget attribute map.
    pub fn apply_flags(&self, attrs: &mut BTreeMap<String, Option<String>>) {
        match self {
            Self::DataRequired | Self::FileRequired => {
                attrs.insert("required".to_string(), None);
            }
            Self::Length { max } => {
                attrs.insert("maxlength".to_string(), Some(max.to_string()));
            }
            Self::NumberRange { min, max } => {
                if let Some(min) = min {
                    attrs.insert("min".to_string(), Some(min.to_string()));
                }
                if let Some(max) = max {
                    attrs.insert("max".to_string(), Some(max.to_string()));
                }
            }
            Self::FileAllowed { extensions, .. } => {
                let accept: Vec<String> = extensions.iter().map(|e| format!(".{e}")).collect();
                attrs.insert("accept".to_string(), Some(accept.join(",")));
            }
            Self::Optional | Self::Email | Self::FileSize { .. } => {}
        }
    }
}

fn range_message(min: Option<f64>, max: Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("Number must be between {min} and {max}."),
        (Some(min), None) => format!("Number must be at least {min}."),
        (None, Some(max)) => format!("Number must be at most {max}."),
        (None, None) => "Not a valid number.".to_string(),
    }
}

/// Runs a validator chain, returning the accumulated messages.
pub fn run_chain(validators: &[Validator], value: &FieldValue, mut errors: Vec<String>) -> Vec<String> {
    for validator in validators {
        match validator.check(value) {
            Check::Pass => {}
            Check::Fail(message) => errors.push(message),
            Check::StopChain => return Vec::new(),
            Check::Halt(message) => return vec![message],
        }
    }
    errors
}
