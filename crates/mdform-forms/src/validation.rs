//! Validation pipeline for form processing.
//!
//! Processing happens in two steps:
//! 1. [`coerce`] turns the raw submitted strings into a typed [`FieldValue`],
//!    recording a processing error when the input does not parse
//! 2. [`validate_field`] checks choice membership and runs the validator
//!    chain, starting from the processing errors
//!
//! Errors accumulate per field rather than short-circuiting across fields,
//! so all validation issues are reported at once.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use mdform_http::UploadedFile;
use rust_decimal::Decimal;

use crate::descriptor::FieldKind;
use crate::fields::FieldSpec;
use crate::validators::run_chain;
use crate::value::{FieldValue, FileData, DATE_FORMAT, TIME_ISO_FORMAT, TIME_WIDGET_FORMAT};

/// Parses a time in widget (`HH:MM`) or ISO (`HH:MM:SS[.f]`) form.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, TIME_WIDGET_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, TIME_ISO_FORMAT))
        .ok()
}

/// Parses an ISO date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

/// Converts submitted strings into the field's typed value.
///
/// Returns the value and any processing errors. Unparseable input leaves
/// the value empty. Blank numeric, date and time input is empty, not an error.
pub fn coerce(
    spec: &FieldSpec,
    raw: &[String],
    upload: Option<&UploadedFile>,
) -> (FieldValue, Vec<String>) {
    let first = raw.first().map(String::as_str);
    let parsed = |message: &str, parse: &dyn Fn(&str) -> Option<FieldValue>| match first
        .map(str::trim)
    {
        None | Some("") => (FieldValue::Empty, Vec::new()),
        Some(text) => parse(text).map_or_else(
            || (FieldValue::Empty, vec![message.to_string()]),
            |value| (value, Vec::new()),
        ),
    };

    match spec.kind() {
        FieldKind::String
        | FieldKind::TextArea
        | FieldKind::Email
        | FieldKind::Select
        | FieldKind::Radio
        | FieldKind::Link
        | FieldKind::Submit => (
            first.map_or(FieldValue::Empty, FieldValue::from),
            Vec::new(),
        ),
        FieldKind::Integer => parsed("Not a valid integer value.", &|s| {
            s.parse::<i64>().ok().map(FieldValue::Integer)
        }),
        FieldKind::Float => parsed("Not a valid float value.", &|s| {
            s.parse::<f64>().ok().filter(|f| f.is_finite()).map(FieldValue::Float)
        }),
        FieldKind::Decimal => parsed("Not a valid decimal value.", &|s| {
            Decimal::from_str(s).ok().map(FieldValue::Decimal)
        }),
        FieldKind::Date => parsed("Not a valid date value.", &|s| parse_date(s).map(FieldValue::Date)),
        FieldKind::Time => parsed("Not a valid time value.", &|s| parse_time(s).map(FieldValue::Time)),
        FieldKind::Checkbox => (FieldValue::Choices(raw.to_vec()), Vec::new()),
        FieldKind::File => (
            upload.map_or(FieldValue::Empty, |file| {
                FieldValue::File(FileData::Upload(file.clone()))
            }),
            Vec::new(),
        ),
    }
}

/// Validates a processed value, returning the field's error messages.
///
/// Choice fields reject values outside their choice list before the
/// validator chain runs. Empty values skip the choice check.
pub fn validate_field(spec: &FieldSpec, value: &FieldValue, process_errors: Vec<String>) -> Vec<String> {
    let mut errors = process_errors;
    let is_choice = |v: &String| spec.choices().iter().any(|(choice, _)| choice == v);

    match (spec.kind(), value) {
        (FieldKind::Select | FieldKind::Radio, FieldValue::Text(v)) if !v.is_empty() && !is_choice(v) => {
            errors.push("Not a valid choice.".to_string());
        }
        (FieldKind::Checkbox, FieldValue::Choices(values)) => {
            let invalid: Vec<&str> = values
                .iter()
                .filter(|v| !is_choice(v))
                .map(String::as_str)
                .collect();
            if !invalid.is_empty() {
                errors.push(format!(
                    "'{}' is not a valid choice for this field.",
                    invalid.join(", ")
                ));
            }
        }
        _ => {}
    }

    run_chain(&spec.validators, value, errors)
}
