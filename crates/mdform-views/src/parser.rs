//! The markdown parser seam.
//!
//! Parsing the markdown form syntax is the job of an external collaborator.
//! It receives the source and a [`Formatter`], and returns the document
//! metadata, an HTML fragment with formatter markup in place of each field, and
//! the field descriptors in declaration order.

use indexmap::IndexMap;
use mdform_core::{MdFormError, MdFormResult};
use mdform_forms::FieldDescriptor;
use mdform_template::Formatter;
use serde::{Deserialize, Serialize};

/// Document metadata (the `key: value` header of a markdown source).
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// The result of parsing one markdown source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedSource {
    /// Metadata from the source header.
    #[serde(default)]
    pub meta: Meta,
    /// The HTML fragment with formatter markup in place of fields.
    pub html: String,
    /// Field descriptors keyed by variable name, in declaration order.
    #[serde(default)]
    pub fields: IndexMap<String, FieldDescriptor>,
}

impl ParsedSource {
    /// Returns `true` if the source declares no fields.
    pub fn is_page(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Parses markdown form sources.
pub trait FormParser: Send + Sync {
    /// Parses `source`, formatting every field with `formatter`.
    fn parse(&self, source: &str, formatter: &dyn Formatter) -> MdFormResult<ParsedSource>;
}

impl<F> FormParser for F
where
    F: Fn(&str, &dyn Formatter) -> MdFormResult<ParsedSource> + Send + Sync,
{
    fn parse(&self, source: &str, formatter: &dyn Formatter) -> MdFormResult<ParsedSource> {
        self(source, formatter)
    }
}

/// Reads sources that were parsed ahead of time and stored as JSON.
///
/// The stored document has the shape of [`ParsedSource`]; its `html` marks each
/// field as `[[name]]`, which is replaced by the formatter's markup.
///
/// ```
/// use mdform_template::PlainFormatter;
/// use mdform_views::parser::{FormParser, JsonSourceParser};
///
/// let source = r#"{
///     "meta": {"title": ["Contact"]},
///     "html": "<p>[[name]]</p>",
///     "fields": {"name": {"name": "name", "label": "Name", "type": "StringField"}}
/// }"#;
/// let parsed = JsonSourceParser.parse(source, &PlainFormatter).unwrap();
/// assert_eq!(
///     parsed.html,
///     "<p>{{ form.name.label_tag | safe }} {{ form.name.html | safe }}</p>"
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSourceParser;

impl FormParser for JsonSourceParser {
    fn parse(&self, source: &str, formatter: &dyn Formatter) -> MdFormResult<ParsedSource> {
        let mut parsed: ParsedSource = serde_json::from_str(source).map_err(|e| {
            MdFormError::ConfigurationError(format!("Invalid stored form source: {e}"))
        })?;
        for (name, field) in &parsed.fields {
            let marker = format!("[[{name}]]");
            if parsed.html.contains(&marker) {
                parsed.html = parsed.html.replace(&marker, &formatter.format(name, field));
            }
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdform_template::BootstrapFormatter;

    #[test]
    fn test_json_source_parser() {
        let source = r#"{"html": "<p>[[age]]</p><p>[[missing]]</p>", "fields": {
            "age": {"name": "age", "label": "Age", "type": "IntegerField", "required": true}
        }}"#;
        let parsed = JsonSourceParser.parse(source, &BootstrapFormatter::default()).unwrap();
        assert_eq!(
            parsed.html,
            r#"<p>{{ form_field(field=form.age, form_type="horizontal", class="form-control") }}</p><p>[[missing]]</p>"#
        );
        assert!(parsed.meta.is_empty());
        assert!(!parsed.is_page());
        assert!(parsed.fields["age"].required);
    }

    #[test]
    fn test_page_source() {
        let parsed = JsonSourceParser.parse(r#"{"html": "<h1>Hi</h1>"}"#, &BootstrapFormatter::default()).unwrap();
        assert!(parsed.is_page());
    }

    #[test]
    fn test_invalid_json() {
        assert!(JsonSourceParser.parse("name* = ___", &BootstrapFormatter::default()).is_err());
    }

    #[test]
    fn test_closure_parser() {
        let parser = |_: &str, _: &dyn Formatter| -> MdFormResult<ParsedSource> { Ok(ParsedSource::default()) };
        assert!(parser.parse("anything", &BootstrapFormatter::default()).unwrap().is_page());
    }
}
