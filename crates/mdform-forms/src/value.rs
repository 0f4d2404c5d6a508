//! Typed field values held by a form instance.

use chrono::{NaiveDate, NaiveTime};
use mdform_http::UploadedFile;
use rust_decimal::Decimal;

/// Display format for dates in widgets and ISO serialization.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Display format for times in widgets.
pub const TIME_WIDGET_FORMAT: &str = "%H:%M";
/// ISO-8601 serialization format for times (fraction only when non-zero).
pub const TIME_ISO_FORMAT: &str = "%H:%M:%S%.f";

/// A file held by a file field: either a fresh upload or a stored reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileData {
    /// A file received with the current request.
    Upload(UploadedFile),
    /// An opaque reference (URL or storage id) returned by an earlier upload.
    Reference(String),
}

impl FileData {
    /// A short human label: the client filename or the reference.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Upload(file) => &file.name,
            Self::Reference(reference) => reference,
        }
    }
}

/// The value of one form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// No value.
    Empty,
    /// Text kinds, email, single choices and links.
    Text(String),
    /// Integer kind.
    Integer(i64),
    /// Float kind.
    Float(f64),
    /// Decimal kind, kept exact.
    Decimal(Decimal),
    /// Date kind.
    Date(NaiveDate),
    /// Time kind.
    Time(NaiveTime),
    /// Checkbox kind: the selected values in submission order.
    Choices(Vec<String>),
    /// File kind.
    File(FileData),
}

impl FieldValue {
    /// Returns `true` when the value counts as "nothing entered".
    ///
    /// Whitespace-only text and an empty selection are empty; numbers never are.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Choices(values) => values.is_empty(),
            _ => false,
        }
    }

    /// Returns the text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric value as `f64`, for range checks.
    pub fn as_f64(&self) -> Option<f64> {
        use rust_decimal::prelude::ToPrimitive;

        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    /// The strings a widget displays for this value.
    ///
    /// `places` rounds and pads decimals for display only.
    pub fn display_values(&self, places: Option<u32>) -> Vec<String> {
        match self {
            Self::Empty => Vec::new(),
            Self::Text(s) => vec![s.clone()],
            Self::Integer(i) => vec![i.to_string()],
            Self::Float(f) => vec![f.to_string()],
            Self::Decimal(d) => {
                let shown = places.map_or(*d, |p| {
                    let mut rounded = d.round_dp(p);
                    rounded.rescale(p);
                    rounded
                });
                vec![shown.to_string()]
            }
            Self::Date(d) => vec![d.format(DATE_FORMAT).to_string()],
            Self::Time(t) => vec![t.format(TIME_WIDGET_FORMAT).to_string()],
            Self::Choices(values) => values.clone(),
            Self::File(file) => vec![file.display_name().to_string()],
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<NaiveTime> for FieldValue {
    fn from(value: NaiveTime) -> Self {
        Self::Time(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::Choices(value)
    }
}

impl From<UploadedFile> for FieldValue {
    fn from(value: UploadedFile) -> Self {
        Self::File(FileData::Upload(value))
    }
}
