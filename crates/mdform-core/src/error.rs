//! Core error types for mdform-rs.
//!
//! This module provides the error enum [`MdFormError`] covering every failure the
//! materializer, the plain-dict codec, and the request-cycle orchestrator can
//! report. Per-field validation failures are absent: they accumulate
//! on the form instance and are shown to the end user instead of being raised.

use thiserror::Error;

/// The primary error type for mdform-rs.
///
/// Each variant maps to an HTTP status code via [`MdFormError::status_code`].
#[derive(Error, Debug)]
pub enum MdFormError {
    // ── Materializer ─────────────────────────────────────────────────

    /// A field descriptor carries a type tag the materializer does not know.
    #[error("Unsupported field type '{type_tag}' for field '{field}'")]
    UnsupportedFieldType {
        /// The offending field name.
        field: String,
        /// The unrecognized type tag.
        type_tag: String,
    },

    // ── Codec ────────────────────────────────────────────────────────

    /// A plain-dict key has no matching form field.
    #[error("No field found named '{0}'")]
    UnknownField(String),

    /// A decimal, date, or time value could not be parsed.
    #[error("Malformed value {value} for field '{field}': {reason}")]
    MalformedValue {
        /// The field being deserialized.
        field: String,
        /// The raw value, rendered as JSON.
        value: String,
        /// Why parsing failed.
        reason: String,
    },

    /// A form field kind has no serialization rule.
    #[error("Cannot serialize form field '{field}' of kind {kind}")]
    UnserializableField {
        /// The field name.
        field: String,
        /// The field kind.
        kind: String,
    },

    /// A freshly uploaded file reached serialization without an uploader.
    #[error("No upload handler available for file field '{0}'")]
    MissingUploadHandler(String),

    /// An option string outside its allowed set.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    // ── Orchestrator ─────────────────────────────────────────────────

    /// A caller-supplied template context key collides with a reserved one.
    #[error("'{0}' cannot be a key in the template context as it is reserved")]
    ReservedContextKey(String),

    /// Page rendering was requested for a source that declares form fields.
    #[error("Cannot render '{0}' as a page: the source contains a form")]
    PageContainsForm(String),

    /// The requested markdown source was not found.
    #[error("Markdown source does not exist: {0}")]
    SourceDoesNotExist(String),

    /// The template engine rejected or failed to render a template.
    #[error("Template error: {0}")]
    TemplateError(String),

    /// Malformed request data.
    #[error("Bad request: {0}")]
    BadRequest(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MdFormError {
    /// Builds a [`MdFormError::MalformedValue`] from a JSON value.
    pub fn malformed(
        field: impl Into<String>,
        value: &serde_json::Value,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::MalformedValue {
            field: field.into(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Returns the HTTP status code associated with this error.
    ///
    /// - `UnknownField`, `MalformedValue`, `BadRequest` -> 400
    /// - `SourceDoesNotExist` -> 404
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::UnknownField(_) | Self::MalformedValue { .. } | Self::BadRequest(_) => 400,
            Self::SourceDoesNotExist(_) => 404,
            Self::UnsupportedFieldType { .. }
            | Self::UnserializableField { .. }
            | Self::MissingUploadHandler(_)
            | Self::InvalidOption(_)
            | Self::ReservedContextKey(_)
            | Self::PageContainsForm(_)
            | Self::TemplateError(_)
            | Self::ConfigurationError(_)
            | Self::Io(_) => 500,
        }
    }
}

/// A convenience type alias for `Result<T, MdFormError>`.
pub type MdFormResult<T> = Result<T, MdFormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(MdFormError::UnknownField("x".into()).status_code(), 400);
        assert_eq!(
            MdFormError::malformed("d", &serde_json::json!("abc"), "bad").status_code(),
            400
        );
        assert_eq!(MdFormError::SourceDoesNotExist("x".into()).status_code(), 404);
        assert_eq!(
            MdFormError::UnsupportedFieldType {
                field: "f".into(),
                type_tag: "Foo".into()
            }
            .status_code(),
            500
        );
        assert_eq!(MdFormError::TemplateError("x".into()).status_code(), 500);
    }

    #[test]
    fn test_display() {
        let err = MdFormError::UnknownField("not_a_field".into());
        assert_eq!(err.to_string(), "No field found named 'not_a_field'");

        let err = MdFormError::malformed("decimal_field", &serde_json::json!("1.x"), "invalid digit");
        assert_eq!(
            err.to_string(),
            "Malformed value \"1.x\" for field 'decimal_field': invalid digit"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: MdFormError = io_err.into();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("file missing"));
    }
}
