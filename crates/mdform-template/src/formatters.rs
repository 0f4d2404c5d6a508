//! Presentation formatters.
//!
//! The markdown parser hands every field it finds to a [`Formatter`], which
//! returns the template markup standing in for that field. The markup refers to
//! the field as `form.<variable_name>` in the template context built from a
//! [`FormInstance`](mdform_forms::FormInstance).
//!
//! Any `Fn(&str, &FieldDescriptor) -> String` becomes a formatter through
//! [`FnFormatter`], which pairs it with the identity used for caching:
//!
//! ```
//! use mdform_forms::{FieldDescriptor, FieldKind};
//! use mdform_template::{FnFormatter, Formatter};
//!
//! let upper = FnFormatter::new("upper", |name: &str, _: &FieldDescriptor| {
//!     format!("{{{{ form.{name}.html | upper }}}}")
//! });
//! let field = FieldDescriptor::new("name", FieldKind::String);
//! assert_eq!(upper.format("name", &field), "{{ form.name.html | upper }}");
//! assert_eq!(upper.id(), "fn:upper");
//! ```

use mdform_core::FormatterChoice;
use mdform_forms::FieldDescriptor;

/// Turns one field declaration into template markup.
pub trait Formatter: Send + Sync {
    /// Returns the markup for the field bound to `variable_name`.
    fn format(&self, variable_name: &str, field: &FieldDescriptor) -> String;

    /// A stable identity, part of the compiled-form cache key.
    fn id(&self) -> String;
}

/// A formatter backed by a function.
///
/// Functions carry no identity of their own: two closures from the same factory
/// share a type but may produce different markup, so the caller names each one.
/// Formatters with equal ids must produce equal markup.
pub struct FnFormatter<F> {
    id: String,
    format: F,
}

impl<F> FnFormatter<F>
where
    F: Fn(&str, &FieldDescriptor) -> String + Send + Sync,
{
    /// Wraps `format` under the identity `id`.
    pub fn new(id: impl Into<String>, format: F) -> Self {
        Self {
            id: id.into(),
            format,
        }
    }
}

impl<F> Formatter for FnFormatter<F>
where
    F: Fn(&str, &FieldDescriptor) -> String + Send + Sync,
{
    fn format(&self, variable_name: &str, field: &FieldDescriptor) -> String {
        (self.format)(variable_name, field)
    }

    fn id(&self) -> String {
        format!("fn:{}", self.id)
    }
}

impl<F> std::fmt::Debug for FnFormatter<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnFormatter").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Label followed by the bare control.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn format(&self, variable_name: &str, _field: &FieldDescriptor) -> String {
        format!("{{{{ form.{variable_name}.label_tag | safe }}}} {{{{ form.{variable_name}.html | safe }}}}")
    }

    fn id(&self) -> String {
        "plain".to_string()
    }
}

/// Bootstrap horizontal rows, rendered by the `form_field` template function.
///
/// Fields with a `collapse_on` trigger get the `collapser` class and, unless
/// `jquery_var` is `None`, an `onchange` handler toggling `#accordion-<name>`.
/// A leading `~` on the trigger shows the section when the value matches;
/// otherwise it is shown when the value differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapFormatter {
    /// Name of the jQuery variable used in collapse handlers.
    pub jquery_var: Option<String>,
    /// Prefix of the template function, e.g. `wtf_` for `wtf_form_field`.
    pub prefix: String,
}

impl Default for BootstrapFormatter {
    fn default() -> Self {
        Self {
            jquery_var: Some("jQuery".to_string()),
            prefix: String::new(),
        }
    }
}

impl BootstrapFormatter {
    /// Creates a formatter with the given jQuery variable and no prefix.
    pub fn new(jquery_var: Option<&str>) -> Self {
        Self {
            jquery_var: jquery_var.map(String::from),
            prefix: String::new(),
        }
    }

    /// The template function name this formatter emits.
    pub fn function_name(&self) -> String {
        format!("{}form_field", self.prefix)
    }
}

impl Formatter for BootstrapFormatter {
    fn format(&self, variable_name: &str, field: &FieldDescriptor) -> String {
        let mut args = vec![
            format!("field=form.{variable_name}"),
            r#"form_type="horizontal""#.to_string(),
        ];

        let mut classes = vec!["form-control"];
        if field.is_label_hidden {
            classes.push("nolabel");
        }

        if let Some(trigger) = field.constraints.collapse_on.as_deref().filter(|t| !t.is_empty()) {
            let (value, comparator) = match trigger.strip_prefix('~') {
                Some(rest) => (rest, "==="),
                None => (trigger, "!=="),
            };
            classes.push("collapser");

            if let Some(jq) = &self.jquery_var {
                args.push(format!(
                    r#"onchange="{jq}('#accordion-{variable_name}').toggle({jq}(this).val() {comparator} '{value}');" "#
                ));
            }
        }

        args.push(format!(r#"class="{}""#, classes.join(" ")));

        if let Some(length) = field.constraints.length.filter(|l| *l > 0) {
            args.push(format!("maxlength={length}"));
        }

        format!("{{{{ {}({}) }}}}", self.function_name(), args.join(", "))
    }

    fn id(&self) -> String {
        format!(
            "bootstrap:{}:{}",
            self.jquery_var.as_deref().unwrap_or(""),
            self.prefix
        )
    }
}

/// Resolves a configured formatter choice.
pub fn formatter_for(choice: &FormatterChoice) -> Box<dyn Formatter> {
    match choice {
        FormatterChoice::Plain => Box::new(PlainFormatter),
        FormatterChoice::Bootstrap { jquery_var, prefix } => Box::new(BootstrapFormatter {
            jquery_var: jquery_var.clone(),
            prefix: prefix.clone(),
        }),
    }
}
