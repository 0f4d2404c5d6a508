//! Field descriptors: the declarative description of a form.
//!
//! A [`FieldDescriptor`] is what the markdown-forms parser produces for each
//! field it finds. It is independent of widgets and validation. A
//! [`FormSpecification`] is the ordered collection of descriptors for one
//! markdown source.
//!
//! Descriptors deserialize from the parser's JSON-shaped output:
//!
//! ```
//! use mdform_forms::descriptor::{FieldDescriptor, FieldKind};
//!
//! let d: FieldDescriptor = serde_json::from_value(serde_json::json!({
//!     "name": "name",
//!     "label": "name",
//!     "type": "StringField",
//!     "required": true,
//!     "length": 30
//! })).unwrap();
//!
//! assert_eq!(d.kind(), Some(FieldKind::String));
//! assert_eq!(d.constraints.length, Some(30));
//! ```

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use mdform_core::{MdFormError, MdFormResult};
use serde::{Deserialize, Serialize};

/// The closed set of field kinds a descriptor can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    /// Single-line text.
    String,
    /// Multi-line text.
    TextArea,
    /// Whole number.
    Integer,
    /// Floating-point number.
    Float,
    /// Exact decimal number.
    Decimal,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Email address.
    Email,
    /// Single choice from a drop-down.
    Select,
    /// Single choice from a list of radio buttons.
    Radio,
    /// Multiple choices from a list of checkboxes.
    Checkbox,
    /// File upload.
    File,
    /// Display-only link.
    Link,
    /// Submit control.
    Submit,
}

impl FieldKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::String,
        Self::TextArea,
        Self::Integer,
        Self::Float,
        Self::Decimal,
        Self::Date,
        Self::Time,
        Self::Email,
        Self::Select,
        Self::Radio,
        Self::Checkbox,
        Self::File,
        Self::Link,
        Self::Submit,
    ];

    /// The type tag the markdown parser emits for this kind.
    pub const fn type_tag(self) -> &'static str {
        match self {
            Self::String => "StringField",
            Self::TextArea => "TextAreaField",
            Self::Integer => "IntegerField",
            Self::Float => "FloatField",
            Self::Decimal => "DecimalField",
            Self::Date => "DateField",
            Self::Time => "TimeField",
            Self::Email => "EmailField",
            Self::Select => "SelectField",
            Self::Radio => "RadioField",
            Self::Checkbox => "CheckboxField",
            Self::File => "FileField",
            Self::Link => "LinkField",
            Self::Submit => "SubmitField",
        }
    }

    /// The short glossary name (`string`, `text-area`, ...).
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::TextArea => "text-area",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::Time => "time",
            Self::Email => "email",
            Self::Select => "select",
            Self::Radio => "radio",
            Self::Checkbox => "checkbox",
            Self::File => "file",
            Self::Link => "link",
            Self::Submit => "submit",
        }
    }

    /// Returns `true` for kinds holding a list of values.
    pub const fn is_multi_valued(self) -> bool {
        matches!(self, Self::Checkbox)
    }

    /// Returns `true` for kinds offering a fixed list of choices.
    pub const fn has_choices(self) -> bool {
        matches!(self, Self::Select | Self::Radio | Self::Checkbox)
    }

    /// Returns `true` for numeric kinds.
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float | Self::Decimal)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_tag())
    }
}

impl FromStr for FieldKind {
    type Err = MdFormError;

    /// Parses either the parser's type tag (`StringField`) or the short name (`string`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_tag() == s || kind.short_name() == s)
            .ok_or_else(|| MdFormError::UnsupportedFieldType {
                field: String::new(),
                type_tag: s.to_string(),
            })
    }
}

/// Type-specific constraints attached to a descriptor.
///
/// Every entry is optional; which ones are meaningful depends on the kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConstraints {
    /// Maximum length in characters (text kinds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    /// Lower numeric bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<serde_json::Number>,
    /// Upper numeric bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<serde_json::Number>,
    /// Decimal places shown for decimal fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub places: Option<u32>,
    /// `(value, label)` pairs for choice kinds, in display order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<(String, String)>,
    /// Pre-selected value(s) for choice kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    /// Sibling value that toggles the collapsible section named after this field.
    /// A leading `~` inverts the comparison.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapse_on: Option<String>,
    /// Allowed file extensions (file kind).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
    /// Human description of the allowed files, used as the rejection message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The declarative description of one form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// The field name; unique within a form.
    #[serde(default)]
    pub name: String,
    /// The human-readable label.
    #[serde(default)]
    pub label: String,
    /// The declared type tag, e.g. `"StringField"`.
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Whether a value must be supplied.
    #[serde(default)]
    pub required: bool,
    /// Whether the label should be hidden when rendering.
    #[serde(default)]
    pub is_label_hidden: bool,
    /// Type-specific constraints.
    #[serde(flatten)]
    pub constraints: FieldConstraints,
}

impl FieldDescriptor {
    /// Creates a descriptor for a known kind, with the label equal to the name.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            type_tag: kind.type_tag().to_string(),
            required: false,
            is_label_hidden: false,
            constraints: FieldConstraints::default(),
        }
    }

    /// Creates a descriptor with an arbitrary type tag.
    pub fn with_type_tag(name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            type_tag: type_tag.into(),
            required: false,
            is_label_hidden: false,
            constraints: FieldConstraints::default(),
        }
    }

    /// Returns the parsed kind, or `None` for an unknown type tag.
    pub fn kind(&self) -> Option<FieldKind> {
        self.type_tag.parse().ok()
    }

    /// Returns the parsed kind, failing with [`MdFormError::UnsupportedFieldType`].
    pub fn try_kind(&self) -> MdFormResult<FieldKind> {
        self.type_tag
            .parse()
            .map_err(|_| MdFormError::UnsupportedFieldType {
                field: self.name.clone(),
                type_tag: self.type_tag.clone(),
            })
    }

    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets whether the field is required.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets whether the label is hidden.
    #[must_use]
    pub fn label_hidden(mut self, hidden: bool) -> Self {
        self.is_label_hidden = hidden;
        self
    }

    /// Sets the maximum length.
    #[must_use]
    pub fn length(mut self, length: usize) -> Self {
        self.constraints.length = Some(length);
        self
    }

    /// Sets the numeric bounds.
    #[must_use]
    pub fn range(mut self, min: Option<serde_json::Number>, max: Option<serde_json::Number>) -> Self {
        self.constraints.min = min;
        self.constraints.max = max;
        self
    }

    /// Sets the decimal places.
    #[must_use]
    pub fn places(mut self, places: u32) -> Self {
        self.constraints.places = Some(places);
        self
    }

    /// Sets the choices; each value doubles as its label.
    #[must_use]
    pub fn choices<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints.choices = values
            .into_iter()
            .map(|v| {
                let v = v.into();
                (v.clone(), v)
            })
            .collect();
        self
    }

    /// Sets the collapse trigger.
    #[must_use]
    pub fn collapse_on(mut self, value: impl Into<String>) -> Self {
        self.constraints.collapse_on = Some(value.into());
        self
    }

    /// Sets the allowed file extensions and their description.
    #[must_use]
    pub fn allowed<I, S>(mut self, extensions: I, description: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constraints.allowed = extensions.into_iter().map(Into::into).collect();
        self.constraints.description = description.map(String::from);
        self
    }
}

/// The ordered collection of field descriptors describing one form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSpecification {
    /// The form type name.
    pub name: String,
    /// Whether every field renders non-interactive.
    #[serde(default)]
    pub read_only: bool,
    /// Field descriptors in declaration order.
    #[serde(default)]
    pub fields: IndexMap<String, FieldDescriptor>,
}

impl FormSpecification {
    /// Creates an empty specification.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            read_only: false,
            fields: IndexMap::new(),
        }
    }

    /// Builds a specification from descriptors, rejecting duplicate names.
    pub fn from_descriptors(
        name: impl Into<String>,
        descriptors: impl IntoIterator<Item = FieldDescriptor>,
    ) -> MdFormResult<Self> {
        let mut spec = Self::new(name);
        for descriptor in descriptors {
            spec.insert(descriptor)?;
        }
        Ok(spec)
    }

    /// Appends a descriptor. Fails with a configuration error when the name is taken.
    pub fn insert(&mut self, descriptor: FieldDescriptor) -> MdFormResult<()> {
        if self.fields.contains_key(&descriptor.name) {
            return Err(MdFormError::ConfigurationError(format!(
                "Duplicate field name '{}' in form '{}'",
                descriptor.name, self.name
            )));
        }
        self.fields.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Returns `true` if the source declares no fields (a plain page).
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Fills in descriptor names from their map keys where the parser left them out.
pub fn normalize_names(fields: &mut IndexMap<String, FieldDescriptor>) {
    for (key, descriptor) in fields.iter_mut() {
        if descriptor.name.is_empty() {
            descriptor.name.clone_from(key);
        }
        if descriptor.label.is_empty() {
            descriptor.label.clone_from(key);
        }
    }
}
