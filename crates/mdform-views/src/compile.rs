//! Compiling markdown sources.
//!
//! A source compiles into its metadata, a template that extends the site
//! layout, and the form type built from its field descriptors.

use std::path::Path;
use std::sync::Arc;

use mdform_core::{MdFormError, MdFormResult};
use mdform_forms::{FormBuilder, FormType};
use mdform_template::{wrap_template, Formatter};

use crate::parser::{FormParser, Meta};

/// Class name used when none is given.
pub const DEFAULT_CLASS_NAME: &str = "MDForm";

/// Options controlling compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Name of the generated form type.
    pub class_name: Option<String>,
    /// Build the read-only variant.
    pub read_only: bool,
    /// Parent template to extend.
    pub extends: Option<String>,
    /// Block of the parent template to fill.
    pub block: Option<String>,
    /// Degrade unknown field types to text fields instead of failing.
    pub best_effort: bool,
}

/// A compiled markdown source.
#[derive(Debug, Clone)]
pub struct CompiledForm {
    /// Metadata from the source header.
    pub meta: Meta,
    /// The composed template.
    pub template: String,
    /// The generated form type.
    pub form_type: Arc<FormType>,
    /// Whether the source declares any field.
    pub has_fields: bool,
}

/// Compiles a markdown string.
pub fn compile_source(
    parser: &dyn FormParser,
    source: &str,
    formatter: &dyn Formatter,
    options: &CompileOptions,
) -> MdFormResult<CompiledForm> {
    let parsed = parser.parse(source, formatter)?;
    let class_name = options.class_name.as_deref().unwrap_or(DEFAULT_CLASS_NAME);

    let form_type = FormBuilder::new(class_name)
        .read_only(options.read_only)
        .best_effort(options.best_effort)
        .build(&parsed.fields)?;

    let template = wrap_template(
        &parsed.html,
        options.extends.as_deref(),
        options.block.as_deref(),
    );

    Ok(CompiledForm {
        has_fields: !parsed.is_page(),
        meta: parsed.meta,
        template,
        form_type,
    })
}

/// Compiles a markdown file. The class name defaults to the file stem.
pub fn compile_file(
    parser: &dyn FormParser,
    path: &Path,
    formatter: &dyn Formatter,
    options: &CompileOptions,
) -> MdFormResult<CompiledForm> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MdFormError::SourceDoesNotExist(path.display().to_string())
        } else {
            MdFormError::Io(e)
        }
    })?;

    let mut options = options.clone();
    if options.class_name.is_none() {
        options.class_name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(String::from);
    }
    compile_source(parser, &source, formatter, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::JsonSourceParser;
    use mdform_template::PlainFormatter;

    const CONTACT: &str = r#"{
        "meta": {"title": ["Contact"]},
        "html": "<p>[[name]]</p>",
        "fields": {"name": {"name": "name", "label": "Name", "type": "StringField", "required": true}}
    }"#;

    #[test]
    fn test_compile_source() {
        let options = CompileOptions {
            extends: Some("form.html".into()),
            block: Some("innerform".into()),
            ..CompileOptions::default()
        };
        let compiled = compile_source(&JsonSourceParser, CONTACT, &PlainFormatter, &options).unwrap();
        assert_eq!(
            compiled.template,
            "{%- extends \"form.html\" %}\n{% block innerform %}{{ super() }}<p>{{ form.name.label_tag | safe }} {{ form.name.html | safe }}</p>{% endblock %}"
        );
        assert_eq!(compiled.form_type.name(), "MDForm");
        assert!(compiled.has_fields);
        assert_eq!(compiled.meta["title"], serde_json::json!(["Contact"]));
    }

    #[test]
    fn test_compile_without_layout() {
        let compiled =
            compile_source(&JsonSourceParser, CONTACT, &PlainFormatter, &CompileOptions::default()).unwrap();
        assert!(compiled.template.starts_with("<p>"));
    }

    #[test]
    fn test_unknown_field_type() {
        let source = r#"{"html": "", "fields": {"x": {"name": "x", "type": "ColorField"}}}"#;
        assert!(matches!(
            compile_source(&JsonSourceParser, source, &PlainFormatter, &CompileOptions::default()),
            Err(MdFormError::UnsupportedFieldType { .. })
        ));
        let lenient = CompileOptions {
            best_effort: true,
            ..CompileOptions::default()
        };
        assert!(compile_source(&JsonSourceParser, source, &PlainFormatter, &lenient).is_ok());
    }

    #[test]
    fn test_compile_file_class_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contact.md");
        std::fs::write(&path, CONTACT).unwrap();

        let compiled = compile_file(&JsonSourceParser, &path, &PlainFormatter, &CompileOptions::default()).unwrap();
        assert_eq!(compiled.form_type.name(), "contact");

        let named = CompileOptions {
            class_name: Some("ContactForm".into()),
            ..CompileOptions::default()
        };
        let compiled = compile_file(&JsonSourceParser, &path, &PlainFormatter, &named).unwrap();
        assert_eq!(compiled.form_type.name(), "ContactForm");

        assert!(matches!(
            compile_file(&JsonSourceParser, &dir.path().join("nope.md"), &PlainFormatter, &named),
            Err(MdFormError::SourceDoesNotExist(_))
        ));
    }
}
