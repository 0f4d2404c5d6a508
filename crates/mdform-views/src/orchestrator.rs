//! The request cycle.
//!
//! [`MdForms`] ties the pieces together for one application: it resolves which
//! markdown source a request wants, compiles it through the cache, populates a
//! form from the request or caller data, hands valid submissions to a callback,
//! and renders the template otherwise.
//!
//! Sources live next to the layout templates, under `<source_subdir>/<name>.md`
//! of any template directory.
//!
//! ```
//! use mdform_core::Settings;
//! use mdform_http::FormRequest;
//! use mdform_views::{JsonSourceParser, MdForms, RenderOptions};
//!
//! let forms = MdForms::new(Settings::default(), JsonSourceParser);
//! forms.engine().add_string_template("simple.html", "<main>{% block inner_simple %}{% endblock %}</main>");
//! forms.engine().add_string_template("md/about.md", r#"{"html": "<h1>{{ meta.title }}</h1>", "meta": {"title": "About"}}"#);
//!
//! let request = FormRequest::builder().endpoint("about").build();
//! let html = forms.render_mdpage(&request, &RenderOptions::default()).unwrap();
//! assert_eq!(html, "<main><h1>About</h1></main>");
//! ```

use std::fmt;
use std::sync::Arc;

use mdform_core::logging::render_span;
use mdform_core::{MdFormError, MdFormResult, Settings};
use mdform_forms::{FieldKind, FormInstance, OnMissingField, PlainDict, SerializeOptions, UploadFilenames};
use mdform_http::FormRequest;
use mdform_template::{formatter_for, Engine, Formatter};
use serde_json::{Map, Value};

use crate::cache::{CacheKey, FormCache};
use crate::compile::{compile_source, CompileOptions, CompiledForm};
use crate::flash::FlashPolicy;
use crate::parser::FormParser;

/// Context keys the orchestrator fills itself.
const RESERVED_KEYS: [&str; 2] = ["form", "meta"];

/// What a submission callback did with a valid form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome<R> {
    /// The submission was handled; this is the response.
    Done(R),
    /// The callback declined; the submitted values are shown read-only.
    NotHandled,
}

/// The result of rendering a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormResponse<R> {
    /// A rendered page.
    Rendered(String),
    /// The response returned by a submission callback.
    Submitted(R),
}

impl<R> FormResponse<R> {
    /// Returns the rendered HTML, if any.
    pub fn html(&self) -> Option<&str> {
        match self {
            Self::Rendered(html) => Some(html),
            Self::Submitted(_) => None,
        }
    }
}

impl FormResponse<http::Response<String>> {
    /// Converts into an HTTP response; rendered pages get a `text/html` body.
    pub fn into_response(self) -> http::Response<String> {
        match self {
            Self::Rendered(html) => {
                let mut response = http::Response::new(html);
                response.headers_mut().insert(
                    http::header::CONTENT_TYPE,
                    http::HeaderValue::from_static("text/html; charset=utf-8"),
                );
                response
            }
            Self::Submitted(response) => response,
        }
    }
}

/// How generated form types are named.
#[derive(Clone)]
pub enum ClassName {
    /// The same name for every source.
    Fixed(String),
    /// A name derived from the source name.
    Derived(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl ClassName {
    /// Resolves the class name for the source `name`.
    pub fn resolve(&self, name: &str) -> String {
        match self {
            Self::Fixed(class_name) => class_name.clone(),
            Self::Derived(derive) => derive(name),
        }
    }
}

impl fmt::Debug for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(name) => f.debug_tuple("Fixed").field(name).finish(),
            Self::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// Per-call options. Unset values fall back to the settings.
#[derive(Clone, Default)]
pub struct RenderOptions {
    /// Source name, without the `.md` extension.
    pub source: Option<String>,
    /// Render the read-only variant.
    pub read_only: bool,
    /// Parent template to extend.
    pub extends: Option<String>,
    /// Block of the parent template to fill.
    pub block: Option<String>,
    /// Field formatter.
    pub formatter: Option<Arc<dyn Formatter>>,
    /// Form type naming.
    pub class_name: Option<ClassName>,
    /// Error reporting on re-render.
    pub flash: Option<FlashPolicy>,
    /// Extra template variables; they win over the configured ones.
    pub context: Map<String, Value>,
}

impl RenderOptions {
    /// Options rendering the source `name`.
    pub fn source(name: impl Into<String>) -> Self {
        Self {
            source: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the read-only flag.
    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Sets the parent template.
    #[must_use]
    pub fn extends(mut self, extends: impl Into<String>) -> Self {
        self.extends = Some(extends.into());
        self
    }

    /// Sets the block to fill.
    #[must_use]
    pub fn block(mut self, block: impl Into<String>) -> Self {
        self.block = Some(block.into());
        self
    }

    /// Sets the formatter.
    #[must_use]
    pub fn formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Sets the flash policy.
    #[must_use]
    pub fn flash(mut self, flash: impl Into<FlashPolicy>) -> Self {
        self.flash = Some(flash.into());
        self
    }

    /// Adds a template variable.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("source", &self.source)
            .field("read_only", &self.read_only)
            .field("extends", &self.extends)
            .field("block", &self.block)
            .field("formatter", &self.formatter.as_ref().map(|fmt| fmt.id()))
            .field("class_name", &self.class_name)
            .field("flash", &self.flash)
            .field("context", &self.context)
            .finish()
    }
}

/// What a `get_form` handler supplies: initial data and template variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prefill {
    /// Values shown in the form; `None` shows the defaults.
    pub data: Option<PlainDict>,
    /// Extra template variables.
    pub context: Map<String, Value>,
}

impl From<PlainDict> for Prefill {
    fn from(data: PlainDict) -> Self {
        Self {
            data: Some(data),
            context: Map::new(),
        }
    }
}

/// Submission callback signature.
pub type SubmitFn<'a, R> =
    &'a mut dyn FnMut(&FormInstance, &FormRequest) -> MdFormResult<SubmitOutcome<R>>;

/// Renders markdown pages and forms for one application.
pub struct MdForms {
    settings: Settings,
    parser: Box<dyn FormParser>,
    engine: Engine,
    cache: FormCache,
    formatter: Arc<dyn Formatter>,
    class_name: ClassName,
}

impl MdForms {
    /// Creates an orchestrator from settings and a parser.
    pub fn new(settings: Settings, parser: impl FormParser + 'static) -> Self {
        Self {
            engine: Engine::from_settings(&settings),
            formatter: Arc::from(formatter_for(&settings.formatter)),
            class_name: ClassName::Fixed(settings.class_name.clone()),
            parser: Box::new(parser),
            cache: FormCache::new(),
            settings,
        }
    }

    /// Replaces the default class naming.
    #[must_use]
    pub fn with_class_name(mut self, class_name: ClassName) -> Self {
        self.class_name = class_name;
        self
    }

    /// Replaces the default formatter.
    #[must_use]
    pub fn with_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// The settings in use.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The template engine, for adding in-memory templates.
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The template engine, for adding loaders and functions.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// The compiled-form cache.
    pub const fn cache(&self) -> &FormCache {
        &self.cache
    }

    /// The source a request refers to: the explicit name, the `mdfile` view
    /// argument, or the endpoint with dots turned into slashes.
    pub fn source_name(&self, request: &FormRequest, options: &RenderOptions) -> MdFormResult<String> {
        if let Some(name) = &options.source {
            return Ok(name.clone());
        }
        if let Some(name) = request.view_arg("mdfile") {
            return Ok(name.to_string());
        }
        if request.endpoint().is_empty() {
            return Err(MdFormError::BadRequest(
                "Cannot tell which markdown source to render: no mdfile and no endpoint".to_string(),
            ));
        }
        Ok(request.endpoint().replace('.', "/"))
    }

    /// Loads and compiles a source through the cache.
    pub fn compiled(
        &self,
        name: &str,
        read_only: bool,
        extends: &str,
        block: &str,
        options: &RenderOptions,
    ) -> MdFormResult<Arc<CompiledForm>> {
        let path = format!("{}/{name}.md", self.settings.source_subdir);
        let source = self
            .engine
            .load_source(&path)
            .map_err(|_| MdFormError::SourceDoesNotExist(path))?;

        let formatter = options.formatter.as_ref().unwrap_or(&self.formatter);
        let class_name = options
            .class_name
            .as_ref()
            .unwrap_or(&self.class_name)
            .resolve(name);

        let key = CacheKey::new(
            &source,
            read_only,
            &formatter.id(),
            &class_name,
            Some(extends),
            Some(block),
        );
        self.cache.get_or_compile(key, || {
            let compile_options = CompileOptions {
                class_name: Some(class_name.clone()),
                read_only,
                extends: Some(extends.to_string()),
                block: Some(block.to_string()),
                best_effort: false,
            };
            compile_source(self.parser.as_ref(), &source, formatter.as_ref(), &compile_options)
        })
    }

    /// Renders a source without fields inside the page layout.
    pub fn render_mdpage(&self, request: &FormRequest, options: &RenderOptions) -> MdFormResult<String> {
        check_reserved(&options.context)?;
        let name = self.source_name(request, options)?;
        let span = render_span(&name, false);
        let _guard = span.enter();

        let extends = options.extends.as_deref().unwrap_or(&self.settings.extends_page);
        let block = options.block.as_deref().unwrap_or(&self.settings.block_page);
        let compiled = self.compiled(&name, false, extends, block, options)?;

        if compiled.has_fields {
            return Err(MdFormError::PageContainsForm(name));
        }

        let mut context = self.context(&options.context);
        context.insert("meta".to_string(), Value::Object(compiled.meta.clone()));
        self.engine.render_string(&compiled.template, &context)
    }

    /// Renders a form, handing a valid submission to `on_submit`.
    ///
    /// `data` pre-fills the form. On a submission that validates, `on_submit`
    /// decides the response; if it returns [`SubmitOutcome::NotHandled`] the
    /// submitted values are rendered read-only. Without a callback, or when
    /// validation fails, the editable form is rendered and its errors reported
    /// through the flash policy.
    pub fn render_mdform<R>(
        &self,
        request: &mut FormRequest,
        data: Option<&PlainDict>,
        on_submit: Option<SubmitFn<'_, R>>,
        options: &RenderOptions,
    ) -> MdFormResult<FormResponse<R>> {
        check_reserved(&options.context)?;
        let name = self.source_name(request, options)?;
        let span = render_span(&name, options.read_only);
        let _guard = span.enter();

        self.check_uploads(request)?;

        let extends = options.extends.as_deref().unwrap_or(&self.settings.extends);
        let block = options.block.as_deref().unwrap_or(&self.settings.block);
        let compiled = self.compiled(&name, options.read_only, extends, block, options)?;

        let mut form = match data {
            Some(data) => compiled
                .form_type
                .from_plain_dict(data, OnMissingField::Raise, &[])?,
            None => compiled.form_type.instance(),
        };

        if form.validate_on_submit(request) {
            if let Some(on_submit) = on_submit {
                match on_submit(&form, request)? {
                    SubmitOutcome::Done(response) => return Ok(FormResponse::Submitted(response)),
                    SubmitOutcome::NotHandled => {
                        tracing::debug!("Submission not handled, rendering read-only");
                        let read_only = self.compiled(&name, true, extends, block, options)?;
                        let serialize = SerializeOptions {
                            skip_types: vec![FieldKind::Submit, FieldKind::Link],
                            ..SerializeOptions::default()
                        };
                        let values = form.to_plain_dict(&UploadFilenames, &serialize)?;
                        let mut shown = read_only
                            .form_type
                            .from_plain_dict(&values, OnMissingField::Raise, &[])?;
                        // Links are display-only and bypass the codec.
                        for spec in form.form_type().fields().values() {
                            if spec.kind() == FieldKind::Link {
                                if let Some(value) = form.value(&spec.name) {
                                    shown.set_value(&spec.name, value.clone())?;
                                }
                            }
                        }
                        let mut context = Map::new();
                        context.insert("form".to_string(), shown.as_context());
                        context.insert("meta".to_string(), Value::Object(read_only.meta.clone()));
                        return self
                            .engine
                            .render_string(&read_only.template, &context)
                            .map(FormResponse::Rendered);
                    }
                }
            }
        }

        let flash = options
            .flash
            .clone()
            .unwrap_or_else(|| FlashPolicy::from(self.settings.flash_form_errors));
        flash.apply(&form, request);

        let mut context = self.context(&options.context);
        context.insert("form".to_string(), form.as_context());
        context.insert("meta".to_string(), Value::Object(compiled.meta.clone()));
        self.engine
            .render_string(&compiled.template, &context)
            .map(FormResponse::Rendered)
    }

    /// Renders a page whose extra template variables come from `handler`.
    pub fn get_page<F>(&self, request: &FormRequest, options: &RenderOptions, handler: F) -> MdFormResult<String>
    where
        F: FnOnce(&FormRequest) -> MdFormResult<Map<String, Value>>,
    {
        let mut options = options.clone();
        options.context.extend(handler(request)?);
        self.render_mdpage(request, &options)
    }

    /// Renders a form pre-filled by `handler`.
    pub fn get_form<F>(&self, request: &mut FormRequest, options: &RenderOptions, handler: F) -> MdFormResult<String>
    where
        F: FnOnce(&FormRequest) -> MdFormResult<Prefill>,
    {
        let prefill = handler(request)?;
        let mut options = options.clone();
        options.context.extend(prefill.context);
        match self.render_mdform::<()>(request, prefill.data.as_ref(), None, &options)? {
            FormResponse::Rendered(html) => Ok(html),
            FormResponse::Submitted(()) => Ok(String::new()),
        }
    }

    /// Renders an empty form and hands valid submissions to `handler`.
    pub fn submit_form<R, F>(
        &self,
        request: &mut FormRequest,
        options: &RenderOptions,
        mut handler: F,
    ) -> MdFormResult<FormResponse<R>>
    where
        F: FnMut(&FormInstance, &FormRequest) -> MdFormResult<SubmitOutcome<R>>,
    {
        self.render_mdform(request, None, Some(&mut handler), options)
    }

    /// Configured template variables overlaid with the per-call ones.
    fn context(&self, call: &Map<String, Value>) -> Map<String, Value> {
        let mut context = self.settings.tmpl_context.clone();
        context.extend(call.iter().map(|(k, v)| (k.clone(), v.clone())));
        context
    }

    fn check_uploads(&self, request: &FormRequest) -> MdFormResult<()> {
        let limit = self.settings.max_upload_size;
        for (field, files) in request.files() {
            if let Some(file) = files.iter().find(|file| file.size() > limit) {
                return Err(MdFormError::BadRequest(format!(
                    "Upload '{}' for field '{field}' exceeds {limit} bytes",
                    file.name
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for MdForms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MdForms")
            .field("settings", &self.settings)
            .field("formatter", &self.formatter.id())
            .field("class_name", &self.class_name)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn check_reserved(context: &Map<String, Value>) -> MdFormResult<()> {
    match RESERVED_KEYS.iter().find(|key| context.contains_key(**key)) {
        Some(key) => Err(MdFormError::ReservedContextKey((*key).to_string())),
        None => Ok(()),
    }
}
