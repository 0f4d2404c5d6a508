//! Template engine: loading parent templates and rendering with Tera.
//!
//! The [`Engine`] renders one composed template at a time. Before rendering it
//! follows every `extends`, `include` and `import` reference through its
//! loaders, so the Tera instance it builds holds exactly the templates the
//! render needs.

use std::collections::HashSet;
use std::error::Error as _;

use mdform_core::{FormatterChoice, MdFormError, MdFormResult, Settings};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tera::{Context, Tera};

use crate::functions::FormField;
use crate::loaders::{FileSystemLoader, StringLoader, TemplateLoader};

/// Name under which the rendered source is registered.
const ROOT_TEMPLATE: &str = "__mdform__.html";

static TEMPLATE_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{%-?\s*(?:extends|include|import)\s+(?:"([^"]+)"|'([^']+)')"#)
        .expect("valid regex")
});

/// The template engine.
///
/// # Examples
///
/// ```
/// use mdform_template::Engine;
///
/// let engine = Engine::new();
/// engine.add_string_template("form.html", "<form>{% block innerform %}{% endblock %}</form>");
///
/// let mut ctx = serde_json::Map::new();
/// ctx.insert("who".into(), "World".into());
/// let html = engine
///     .render_string(
///         "{% extends \"form.html\" %}{% block innerform %}Hello {{ who }}{% endblock %}",
///         &ctx,
///     )
///     .unwrap();
/// assert_eq!(html, "<form>Hello World</form>");
/// ```
pub struct Engine {
    loaders: Vec<Box<dyn TemplateLoader>>,
    string_loader: StringLoader,
    auto_escape: bool,
    field_functions: Vec<String>,
}

impl Engine {
    /// Creates an engine with no loaders and the `form_field` function.
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
            string_loader: StringLoader::new(),
            auto_escape: true,
            field_functions: vec!["form_field".to_string()],
        }
    }

    /// Creates an engine searching `settings.template_dirs`.
    ///
    /// A Bootstrap formatter with a prefix also registers `<prefix>form_field`.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut engine = Self::new();
        if !settings.template_dirs.is_empty() {
            engine.add_loader(Box::new(FileSystemLoader::new(settings.template_dirs.clone())));
        }
        if let FormatterChoice::Bootstrap { prefix, .. } = &settings.formatter {
            engine.register_field_function(prefix);
        }
        engine
    }

    /// Adds a template loader, searched after the ones already added.
    pub fn add_loader(&mut self, loader: Box<dyn TemplateLoader>) {
        self.loaders.push(loader);
    }

    /// Sets whether `.html` templates escape their output.
    pub fn set_auto_escape(&mut self, enabled: bool) {
        self.auto_escape = enabled;
    }

    /// Also exposes `form_field` as `<prefix>form_field`.
    pub fn register_field_function(&mut self, prefix: &str) {
        let name = format!("{prefix}form_field");
        if !self.field_functions.contains(&name) {
            self.field_functions.push(name);
        }
    }

    /// Adds an in-memory template; it shadows templates of the same name.
    pub fn add_string_template(&self, name: &str, source: &str) {
        self.string_loader.add(name, source);
    }

    /// Loads the source of a template by name.
    pub fn load_source(&self, name: &str) -> MdFormResult<String> {
        if let Ok(source) = self.string_loader.load(name) {
            return Ok(source);
        }

        for loader in &self.loaders {
            if let Ok(source) = loader.load(name) {
                return Ok(source);
            }
        }

        Err(MdFormError::TemplateError(format!(
            "Template '{name}' could not be found"
        )))
    }

    /// Renders a template source with the given context.
    pub fn render_string(&self, source: &str, context: &Map<String, Value>) -> MdFormResult<String> {
        let tera = self.build(ROOT_TEMPLATE, source.to_string())?;
        render(&tera, ROOT_TEMPLATE, context)
    }

    /// Renders a template found by the loaders.
    pub fn render_to_string(&self, name: &str, context: &Map<String, Value>) -> MdFormResult<String> {
        let source = self.load_source(name)?;
        let tera = self.build(name, source)?;
        render(&tera, name, context)
    }

    /// Builds a Tera instance holding `root` and everything it references.
    fn build(&self, root_name: &str, root_source: String) -> MdFormResult<Tera> {
        let mut templates = vec![(root_name.to_string(), root_source)];
        let mut seen: HashSet<String> = HashSet::from([root_name.to_string()]);
        let mut next = 0;

        while next < templates.len() {
            let refs = referenced_templates(&templates[next].1);
            next += 1;
            for name in refs {
                if seen.insert(name.clone()) {
                    let source = self.load_source(&name)?;
                    templates.push((name, source));
                }
            }
        }

        let mut tera = Tera::default();
        if !self.auto_escape {
            tera.autoescape_on(Vec::new());
        }
        for name in &self.field_functions {
            tera.register_function(name, FormField::default());
        }
        tracing::debug!(templates = templates.len(), root = root_name, "Building template set");
        tera.add_raw_templates(templates).map_err(template_error)?;
        Ok(tera)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn render(tera: &Tera, name: &str, context: &Map<String, Value>) -> MdFormResult<String> {
    let context = Context::from_serialize(context).map_err(template_error)?;
    tera.render(name, &context).map_err(template_error)
}

/// Names of the templates `source` extends, includes or imports.
fn referenced_templates(source: &str) -> Vec<String> {
    TEMPLATE_REF
        .captures_iter(source)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Flattens a Tera error and its causes into one message.
fn template_error(err: tera::Error) -> MdFormError {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    MdFormError::TemplateError(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_render_plain_string() {
        let engine = Engine::new();
        let out = engine
            .render_string("Hello {{ name }}!", &ctx(json!({"name": "mdform"})))
            .unwrap();
        assert_eq!(out, "Hello mdform!");
    }

    #[test]
    fn test_extends_and_super() {
        let engine = Engine::new();
        engine.add_string_template("form.html", "<form>{% block innerform %}<h1>{{ title }}</h1>{% endblock %}</form>");
        let out = engine
            .render_string(
                "{%- extends \"form.html\" %}\n{% block innerform %}{{ super() }}<p>body</p>{% endblock %}",
                &ctx(json!({"title": "Contact"})),
            )
            .unwrap();
        assert_eq!(out, "<form><h1>Contact</h1><p>body</p></form>");
    }

    #[test]
    fn test_multi_level_inheritance() {
        let engine = Engine::new();
        engine.add_string_template("base.html", "[{% block content %}{% endblock %}]");
        engine.add_string_template(
            "form.html",
            "{% extends 'base.html' %}{% block content %}<form>{% block innerform %}{% endblock %}</form>{% endblock %}",
        );
        let out = engine
            .render_string(
                "{% extends \"form.html\" %}{% block innerform %}x{% endblock %}",
                &Map::new(),
            )
            .unwrap();
        assert_eq!(out, "[<form>x</form>]");
    }

    #[test]
    fn test_missing_parent() {
        let engine = Engine::new();
        let result = engine.render_string("{% extends \"nope.html\" %}", &Map::new());
        assert!(matches!(result, Err(MdFormError::TemplateError(msg)) if msg.contains("nope.html")));
    }

    #[test]
    fn test_syntax_error() {
        let engine = Engine::new();
        assert!(matches!(
            engine.render_string("{% if %}", &Map::new()),
            Err(MdFormError::TemplateError(_))
        ));
    }

    #[test]
    fn test_referenced_templates() {
        assert_eq!(
            referenced_templates(
                "{%- extends \"a.html\" %}{% include 'b.html' %}{% import \"m.html\" as m %}"
            ),
            vec!["a.html", "b.html", "m.html"]
        );
    }

    #[test]
    fn test_prefixed_field_function() {
        let mut engine = Engine::new();
        engine.register_field_function("wtf_");
        let field = json!({
            "id": "name",
            "label": "name",
            "widget": {
                "widget_type": "TextInput",
                "name": "name",
                "value": [],
                "attrs": {"id": "name"}
            }
        });
        let out = engine
            .render_string(
                "{{ wtf_form_field(field=field, form_type=\"basic\") }}",
                &ctx(json!({"field": field})),
            )
            .unwrap();
        assert_eq!(
            out,
            r#"<div class="form-group"><label class="form-control-label" for="name">name</label><input id="name" name="name" type="text" value=""></div>"#
        );
    }

    #[test]
    fn test_filesystem_templates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("simple.html"), "<main>{% block inner_simple %}{% endblock %}</main>").unwrap();
        let settings = Settings {
            template_dirs: vec![dir.path().to_path_buf()],
            ..Settings::default()
        };
        let engine = Engine::from_settings(&settings);
        let out = engine
            .render_string(
                "{% extends \"simple.html\" %}{% block inner_simple %}page{% endblock %}",
                &Map::new(),
            )
            .unwrap();
        assert_eq!(out, "<main>page</main>");
    }
}
