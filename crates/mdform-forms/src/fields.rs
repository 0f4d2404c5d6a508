//! The field materializer.
//!
//! [`materialize`] turns a [`FieldDescriptor`] into a [`FieldSpec`]: the
//! widget, validator chain and choice list the form engine needs to render,
//! bind, validate and serialize the field. The mapping is a total function
//! over [`FieldKind`].

use mdform_core::{MdFormError, MdFormResult};
use serde_json::Value;

use crate::descriptor::{FieldDescriptor, FieldKind};
use crate::validators::Validator;
use crate::value::FieldValue;
use crate::widgets::WidgetType;

/// Upload size ceiling for file fields, in bytes.
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Display precision for decimal fields that declare no `places`.
pub const DEFAULT_PLACES: u32 = 2;

/// A materialized form field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// The field name, also used as HTML `name` and `id`.
    pub name: String,
    /// The human-readable label.
    pub label: String,
    /// Whether a value must be supplied.
    pub required: bool,
    /// Whether the label is hidden when rendering.
    pub is_label_hidden: bool,
    /// The widget used to render the field.
    pub widget: WidgetType,
    /// Validators in the order they run.
    pub validators: Vec<Validator>,
    /// The initial value of a fresh instance.
    pub default: FieldValue,
    /// `true` when an unsupported type tag was degraded to a text field.
    pub degraded: bool,
    kind: FieldKind,
    choices: Vec<(String, String)>,
    places: Option<u32>,
}

impl FieldSpec {
    /// Returns the field kind.
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// The maximum length, if a length validator is attached.
    pub fn max_length(&self) -> Option<usize> {
        self.validators.iter().find_map(|v| match v {
            Validator::Length { max } => Some(*max),
            _ => None,
        })
    }

    /// The numeric bounds, if a range validator is attached.
    pub fn number_range(&self) -> Option<(Option<f64>, Option<f64>)> {
        self.validators.iter().find_map(|v| match v {
            Validator::NumberRange { min, max } => Some((*min, *max)),
            _ => None,
        })
    }

    /// The `(value, label)` choices, in display order.
    pub fn choices(&self) -> &[(String, String)] {
        &self.choices
    }

    /// Display precision for decimal fields; `None` for other kinds.
    pub fn places(&self) -> Option<u32> {
        (self.kind == FieldKind::Decimal).then(|| self.places.unwrap_or(DEFAULT_PLACES))
    }

    /// The allowed file extensions; empty when unrestricted.
    pub fn allowed_extensions(&self) -> &[String] {
        self.validators
            .iter()
            .find_map(|v| match v {
                Validator::FileAllowed { extensions, .. } => Some(extensions.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Returns `true` for fields holding a list of values.
    pub const fn is_multi_valued(&self) -> bool {
        self.kind.is_multi_valued()
    }

    /// Returns `true` if a validator with the given name is attached.
    pub fn has_validator(&self, name: &str) -> bool {
        self.validators.iter().any(|v| v.name() == name)
    }

    /// Returns a copy rendered with a different widget.
    #[must_use]
    pub fn with_widget(mut self, widget: WidgetType) -> Self {
        self.widget = widget;
        self
    }

    /// The submit control appended to every form type.
    pub fn submit() -> Self {
        Self {
            name: "submit".to_string(),
            label: "Submit".to_string(),
            required: false,
            is_label_hidden: false,
            widget: WidgetType::SubmitInput,
            validators: Vec::new(),
            default: FieldValue::Empty,
            degraded: false,
            kind: FieldKind::Submit,
            choices: Vec::new(),
            places: None,
        }
    }
}

/// Materializes a descriptor, failing on unknown type tags.
pub fn materialize(descriptor: &FieldDescriptor) -> MdFormResult<FieldSpec> {
    let kind = descriptor.try_kind()?;
    Ok(build(descriptor, kind))
}

/// Materializes a descriptor, degrading unknown type tags to plain text fields.
pub fn materialize_lenient(descriptor: &FieldDescriptor) -> FieldSpec {
    match descriptor.try_kind() {
        Ok(kind) => build(descriptor, kind),
        Err(e) => {
            tracing::warn!(
                field = %descriptor.name,
                type_tag = %descriptor.type_tag,
                error = %e,
                "degrading unsupported field to a text field"
            );
            let mut spec = build(descriptor, FieldKind::String);
            spec.degraded = true;
            spec
        }
    }
}

fn build(descriptor: &FieldDescriptor, kind: FieldKind) -> FieldSpec {
    let c = &descriptor.constraints;
    let mut validators = Vec::new();

    if descriptor.required && kind != FieldKind::File {
        validators.push(Validator::DataRequired);
    }
    if let Some(max) = c.length {
        validators.push(Validator::Length { max });
    }

    let widget = match kind {
        FieldKind::String => WidgetType::TextInput,
        FieldKind::TextArea => WidgetType::Textarea,
        FieldKind::Integer | FieldKind::Float | FieldKind::Decimal => {
            validators.push(Validator::NumberRange {
                min: c.min.as_ref().and_then(serde_json::Number::as_f64),
                max: c.max.as_ref().and_then(serde_json::Number::as_f64),
            });
            WidgetType::NumberInput
        }
        FieldKind::Date => WidgetType::DateInput,
        FieldKind::Time => WidgetType::TimeInput,
        FieldKind::Email => {
            validators.push(Validator::Email);
            if !descriptor.required {
                validators.push(Validator::Optional);
            }
            WidgetType::EmailInput
        }
        FieldKind::Select => WidgetType::Select,
        FieldKind::Radio => WidgetType::RadioList,
        FieldKind::Checkbox => WidgetType::CheckboxList,
        FieldKind::File => {
            validators.push(Validator::FileSize { max: MAX_FILE_SIZE });
            if descriptor.required {
                validators.push(Validator::FileRequired);
            }
            if !c.allowed.is_empty() {
                let extensions: Vec<String> = c
                    .allowed
                    .iter()
                    .map(|e| e.trim_start_matches('.').to_lowercase())
                    .collect();
                let message = c.description.clone().unwrap_or_else(|| {
                    format!(
                        "File does not have an approved extension: {}",
                        extensions.join(", ")
                    )
                });
                validators.push(Validator::FileAllowed {
                    extensions,
                    message,
                });
            }
            WidgetType::FileInput
        }
        FieldKind::Link => WidgetType::UrlLink,
        FieldKind::Submit => WidgetType::SubmitInput,
    };

    let choices = if kind.has_choices() {
        c.choices.clone()
    } else {
        Vec::new()
    };

    FieldSpec {
        name: descriptor.name.clone(),
        label: descriptor.label.clone(),
        required: descriptor.required,
        is_label_hidden: descriptor.is_label_hidden,
        widget,
        validators,
        default: default_value(kind, c.default.as_ref()),
        degraded: false,
        kind,
        choices,
        places: c.places,
    }
}

fn default_value(kind: FieldKind, default: Option<&Value>) -> FieldValue {
    match (kind, default) {
        (FieldKind::Checkbox, Some(Value::Array(items))) => FieldValue::Choices(
            items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
        ),
        (FieldKind::Checkbox, Some(Value::String(s))) => FieldValue::Choices(vec![s.clone()]),
        (FieldKind::Select | FieldKind::Radio, Some(Value::String(s))) => FieldValue::Text(s.clone()),
        _ => FieldValue::Empty,
    }
}

/// Returns an error naming the field if its kind has no serialization rule.
pub(crate) fn unserializable(spec: &FieldSpec) -> MdFormError {
    MdFormError::UnserializableField {
        field: spec.name.clone(),
        kind: spec.kind.type_tag().to_string(),
    }
}
