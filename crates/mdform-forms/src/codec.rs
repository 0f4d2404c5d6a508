//! The dict codec: populated forms to and from JSON-safe plain mappings.
//!
//! [`to_plain_dict`] serializes a [`FormInstance`] for persistence;
//! [`generate_form_kwargs`] parses a stored mapping back into typed values
//! for a [`FormType`]. Serializing, deserializing and serializing again
//! yields the same mapping as long as the uploader returns stored
//! references unchanged.
//!
//! | kind | serialized as |
//! |---|---|
//! | string, text area, email, select, radio | the value verbatim |
//! | integer, float | a JSON number |
//! | decimal | its exact string (`"1.10"`) |
//! | date, time | ISO-8601 strings |
//! | checkbox | a list of strings, always |
//! | file | the uploader's reference, `null` when no file |
//! | link, submit | not serializable |

use std::str::FromStr;

use indexmap::IndexMap;
use mdform_core::{MdFormError, MdFormResult};
use rust_decimal::Decimal;
use serde_json::{Number, Value};

use crate::descriptor::FieldKind;
use crate::fields::{unserializable, FieldSpec};
use crate::form::{FormInstance, FormType};
use crate::validation::{parse_date, parse_time};
use crate::value::{FieldValue, FileData, DATE_FORMAT, TIME_ISO_FORMAT};

/// A mapping from field name to a JSON-safe value.
pub type PlainDict = IndexMap<String, Value>;

/// Stores uploaded files and returns a reference to them.
///
/// Called for every non-empty file field during serialization. Must return
/// an existing [`FileData::Reference`] unchanged for round trips to be stable.
pub trait Uploader {
    /// Stores the file held by `field` and returns its reference.
    fn upload(&self, field: &str, file: &FileData) -> MdFormResult<String>;
}

impl<F> Uploader for F
where
    F: Fn(&FileData) -> MdFormResult<String>,
{
    fn upload(&self, _field: &str, file: &FileData) -> MdFormResult<String> {
        self(file)
    }
}

/// Passes stored references through and refuses fresh uploads.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepReferences;

impl Uploader for KeepReferences {
    fn upload(&self, field: &str, file: &FileData) -> MdFormResult<String> {
        match file {
            FileData::Reference(reference) => Ok(reference.clone()),
            FileData::Upload(_) => Err(MdFormError::MissingUploadHandler(field.to_string())),
        }
    }
}

/// Records the client filename of uploads without storing them.
///
/// Useful for echoing a submission back as a read-only form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadFilenames;

impl Uploader for UploadFilenames {
    fn upload(&self, _field: &str, file: &FileData) -> MdFormResult<String> {
        Ok(file.display_name().to_string())
    }
}

/// Which fields [`to_plain_dict`] leaves out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Field names to omit.
    pub skip: Vec<String>,
    /// Field kinds to omit.
    pub skip_types: Vec<FieldKind>,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            skip: vec!["csrf_token".to_string(), "submit".to_string()],
            skip_types: vec![FieldKind::Submit],
        }
    }
}

impl SerializeOptions {
    /// Options with the given skip list and the default kind skip list.
    pub fn skipping<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            skip: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    fn skips(&self, spec: &FieldSpec) -> bool {
        self.skip.iter().any(|s| *s == spec.name) || self.skip_types.contains(&spec.kind())
    }
}

/// What [`generate_form_kwargs`] does with keys that match no field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnMissingField {
    /// Fail with [`MdFormError::UnknownField`].
    #[default]
    Raise,
    /// Keep the raw value as an extra.
    Add,
    /// Drop the key.
    Ignore,
}

impl FromStr for OnMissingField {
    type Err = MdFormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raise" => Ok(Self::Raise),
            "add" => Ok(Self::Add),
            "ignore" => Ok(Self::Ignore),
            other => Err(MdFormError::InvalidOption(format!(
                "on_missing_field must be 'raise', 'add' or 'ignore' not '{other}'"
            ))),
        }
    }
}

/// Typed constructor arguments for a form instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormKwargs {
    /// Values for known fields.
    pub fields: IndexMap<String, FieldValue>,
    /// Raw values kept under [`OnMissingField::Add`].
    pub extra: PlainDict,
}

/// Serializes a populated form into a plain mapping, in field order.
pub fn to_plain_dict(
    form: &FormInstance,
    uploader: &dyn Uploader,
    options: &SerializeOptions,
) -> MdFormResult<PlainDict> {
    let mut out = PlainDict::new();
    for spec in form.form_type().fields().values() {
        if options.skips(spec) {
            continue;
        }
        let value = form.value(&spec.name).unwrap_or(&FieldValue::Empty);
        out.insert(spec.name.clone(), serialize_value(spec, value, uploader)?);
    }
    Ok(out)
}

fn serialize_value(spec: &FieldSpec, value: &FieldValue, uploader: &dyn Uploader) -> MdFormResult<Value> {
    let json = match (spec.kind(), value) {
        (FieldKind::Link | FieldKind::Submit, _) => return Err(unserializable(spec)),
        (FieldKind::Checkbox, FieldValue::Empty) => Value::Array(Vec::new()),
        (FieldKind::Checkbox, FieldValue::Text(s)) => Value::Array(vec![Value::String(s.clone())]),
        (_, FieldValue::Empty) => Value::Null,
        (FieldKind::File, FieldValue::File(file)) => Value::String(uploader.upload(&spec.name, file)?),
        (_, other) => scalar(&spec.name, other)?,
    };
    Ok(json)
}

fn scalar(name: &str, value: &FieldValue) -> MdFormResult<Value> {
    let json = match value {
        FieldValue::Empty => Value::Null,
        FieldValue::Text(s) => Value::String(s.clone()),
        FieldValue::Integer(i) => Value::from(*i),
        FieldValue::Float(f) => Number::from_f64(*f).map(Value::Number).ok_or_else(|| {
            MdFormError::malformed(name, &Value::String(f.to_string()), "not a finite float")
        })?,
        FieldValue::Decimal(d) => Value::String(d.to_string()),
        FieldValue::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
        FieldValue::Time(t) => Value::String(t.format(TIME_ISO_FORMAT).to_string()),
        FieldValue::Choices(values) => Value::from(values.clone()),
        FieldValue::File(file) => Value::String(file.display_name().to_string()),
    };
    Ok(json)
}

/// Parses a plain mapping into constructor arguments for `form_type`.
///
/// Keys listed in `skip` are ignored. Keys matching no field follow
/// `on_missing`.
pub fn generate_form_kwargs(
    form_type: &FormType,
    data: &PlainDict,
    on_missing: OnMissingField,
    skip: &[&str],
) -> MdFormResult<FormKwargs> {
    let mut kwargs = FormKwargs::default();
    for (name, raw) in data {
        if skip.contains(&name.as_str()) {
            continue;
        }
        let Some(spec) = form_type.field(name) else {
            match on_missing {
                OnMissingField::Raise => return Err(MdFormError::UnknownField(name.clone())),
                OnMissingField::Add => {
                    kwargs.extra.insert(name.clone(), raw.clone());
                }
                OnMissingField::Ignore => {
                    tracing::debug!(field = %name, "ignoring key with no matching field");
                }
            }
            continue;
        };
        kwargs.fields.insert(name.clone(), deserialize_value(spec, raw)?);
    }
    Ok(kwargs)
}

fn deserialize_value(spec: &FieldSpec, raw: &Value) -> MdFormResult<FieldValue> {
    let name = spec.name.as_str();
    let value = match (spec.kind(), raw) {
        (FieldKind::Link | FieldKind::Submit, _) => return Err(unserializable(spec)),
        (_, Value::Null) => FieldValue::Empty,

        (
            FieldKind::String
            | FieldKind::TextArea
            | FieldKind::Email
            | FieldKind::Select
            | FieldKind::Radio,
            _,
        ) => FieldValue::Text(text(name, raw)?),

        (FieldKind::Integer, Value::Number(n)) => n
            .as_i64()
            .map(FieldValue::Integer)
            .ok_or_else(|| MdFormError::malformed(name, raw, "not an integer"))?,
        (FieldKind::Integer, Value::String(s)) => s
            .trim()
            .parse()
            .map(FieldValue::Integer)
            .map_err(|_| MdFormError::malformed(name, raw, "not an integer"))?,

        (FieldKind::Float, Value::Number(n)) => n
            .as_f64()
            .map(FieldValue::Float)
            .ok_or_else(|| MdFormError::malformed(name, raw, "not a float"))?,
        (FieldKind::Float, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(FieldValue::Float)
            .ok_or_else(|| MdFormError::malformed(name, raw, "not a float"))?,

        (FieldKind::Decimal, Value::String(_) | Value::Number(_)) => {
            let text = text(name, raw)?;
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map(FieldValue::Decimal)
                .map_err(|e| MdFormError::malformed(name, raw, e))?
        }

        (FieldKind::Date, Value::String(s)) => parse_date(s)
            .map(FieldValue::Date)
            .ok_or_else(|| MdFormError::malformed(name, raw, "not an ISO-8601 date"))?,
        (FieldKind::Time, Value::String(s)) => parse_time(s)
            .map(FieldValue::Time)
            .ok_or_else(|| MdFormError::malformed(name, raw, "not an ISO-8601 time"))?,

        (FieldKind::Checkbox, Value::Array(items)) => FieldValue::Choices(
            items
                .iter()
                .map(|item| text(name, item))
                .collect::<MdFormResult<_>>()?,
        ),
        (FieldKind::Checkbox, Value::String(s)) => FieldValue::Choices(vec![s.clone()]),

        (FieldKind::File, Value::String(s)) => FieldValue::File(FileData::Reference(s.clone())),

        (kind, _) => {
            return Err(MdFormError::malformed(
                name,
                raw,
                format!("unexpected JSON type for {kind}"),
            ))
        }
    };
    Ok(value)
}

fn text(field: &str, raw: &Value) -> MdFormResult<String> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(MdFormError::malformed(field, raw, "expected a scalar value")),
    }
}
