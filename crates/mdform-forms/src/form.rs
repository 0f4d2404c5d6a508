//! Form types and form instances.
//!
//! A [`FormType`] is the value-type schema built once per markdown source:
//! the ordered, materialized fields plus a trailing submit control. A
//! [`FormInstance`] is the per-request state over that schema: values,
//! errors, and extra pass-through data.
//!
//! ```
//! use indexmap::IndexMap;
//! use mdform_forms::descriptor::{FieldDescriptor, FieldKind};
//! use mdform_forms::form::build_form_type;
//! use mdform_http::QueryDict;
//!
//! let mut fields = IndexMap::new();
//! fields.insert(
//!     "name".to_string(),
//!     FieldDescriptor::new("name", FieldKind::String).required(true),
//! );
//! let form_type = build_form_type("MDForm", &fields, false).unwrap();
//!
//! let mut form = form_type.instance();
//! form.bind(&QueryDict::parse("name="), &IndexMap::new());
//! assert!(!form.validate());
//! assert_eq!(form.errors()["name"], vec!["This field is required."]);
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use mdform_core::{MdFormError, MdFormResult};
use mdform_http::{FormRequest, QueryDict, UploadedFile};
use serde_json::Value;

use crate::bound_field::BoundField;
use crate::codec::{self, FormKwargs, OnMissingField, PlainDict};
use crate::descriptor::{normalize_names, FieldDescriptor, FieldKind};
use crate::fields::{materialize, materialize_lenient, FieldSpec};
use crate::validation::{coerce, validate_field};
use crate::value::{FieldValue, FileData};
use crate::widgets::{create_widget, WidgetType};

/// Widgets swapped in for field kinds when a form is read-only.
///
/// Only the presentation changes; validation stays the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOnlySubstitutions {
    table: IndexMap<FieldKind, WidgetType>,
}

impl Default for ReadOnlySubstitutions {
    fn default() -> Self {
        Self::empty().with(FieldKind::Email, WidgetType::MailtoLink)
    }
}

impl ReadOnlySubstitutions {
    /// A table with no substitutions.
    pub fn empty() -> Self {
        Self {
            table: IndexMap::new(),
        }
    }

    /// Adds or replaces the substitution for `kind`.
    #[must_use]
    pub fn with(mut self, kind: FieldKind, widget: WidgetType) -> Self {
        self.table.insert(kind, widget);
        self
    }

    /// Returns the substitute widget for `kind`.
    pub fn get(&self, kind: FieldKind) -> Option<WidgetType> {
        self.table.get(&kind).copied()
    }
}

/// Builds [`FormType`]s from field descriptors.
#[derive(Debug, Clone)]
pub struct FormBuilder {
    name: String,
    read_only: bool,
    best_effort: bool,
    substitutions: ReadOnlySubstitutions,
}

impl FormBuilder {
    /// Creates a builder for an editable, strict form type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            read_only: false,
            best_effort: false,
            substitutions: ReadOnlySubstitutions::default(),
        }
    }

    /// Renders every field non-interactive.
    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Degrades unsupported field types to text fields instead of failing.
    #[must_use]
    pub fn best_effort(mut self, best_effort: bool) -> Self {
        self.best_effort = best_effort;
        self
    }

    /// Sets the read-only widget substitutions.
    #[must_use]
    pub fn substitutions(mut self, substitutions: ReadOnlySubstitutions) -> Self {
        self.substitutions = substitutions;
        self
    }

    /// Materializes the descriptors, in order, and appends the submit control.
    pub fn build(&self, descriptors: &IndexMap<String, FieldDescriptor>) -> MdFormResult<Arc<FormType>> {
        let mut descriptors = descriptors.clone();
        normalize_names(&mut descriptors);

        let mut fields = IndexMap::with_capacity(descriptors.len() + 1);
        for (key, descriptor) in &descriptors {
            let mut spec = if self.best_effort {
                materialize_lenient(descriptor)
            } else {
                materialize(descriptor)?
            };
            if self.read_only {
                if let Some(widget) = self.substitutions.get(spec.kind()) {
                    spec = spec.with_widget(widget);
                }
            }
            fields.insert(key.clone(), spec);
        }
        if fields.contains_key("submit") {
            return Err(MdFormError::ConfigurationError(format!(
                "Field name 'submit' is reserved in form '{}'",
                self.name
            )));
        }
        fields.insert("submit".to_string(), FieldSpec::submit());

        tracing::debug!(
            form = %self.name,
            fields = fields.len(),
            read_only = self.read_only,
            "built form type"
        );

        Ok(Arc::new(FormType {
            name: self.name.clone(),
            read_only: self.read_only,
            fields,
        }))
    }
}

/// Builds a form type with the default substitutions, failing on unknown types.
pub fn build_form_type(
    name: &str,
    descriptors: &IndexMap<String, FieldDescriptor>,
    read_only: bool,
) -> MdFormResult<Arc<FormType>> {
    FormBuilder::new(name).read_only(read_only).build(descriptors)
}

/// The schema of a form: ordered fields with a trailing submit control.
#[derive(Debug, Clone, PartialEq)]
pub struct FormType {
    name: String,
    read_only: bool,
    fields: IndexMap<String, FieldSpec>,
}

impl FormType {
    /// The form type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` for the read-only variant.
    pub const fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// All fields in declaration order, submit last.
    pub const fn fields(&self) -> &IndexMap<String, FieldSpec> {
        &self.fields
    }

    /// Names of the fields rendered non-interactive. The submit control is never one.
    pub fn read_only_fields(&self) -> Vec<&str> {
        if !self.read_only {
            return Vec::new();
        }
        self.fields
            .iter()
            .filter(|(_, spec)| spec.kind() != FieldKind::Submit)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Creates an instance holding each field's default value.
    pub fn instance(self: &Arc<Self>) -> FormInstance {
        FormInstance {
            values: self
                .fields
                .iter()
                .map(|(name, spec)| (name.clone(), spec.default.clone()))
                .collect(),
            form_type: Arc::clone(self),
            extra: PlainDict::new(),
            process_errors: IndexMap::new(),
            errors: IndexMap::new(),
            bound: false,
        }
    }

    /// Creates an instance populated from typed constructor arguments.
    pub fn with_kwargs(self: &Arc<Self>, kwargs: FormKwargs) -> FormInstance {
        let mut form = self.instance();
        for (name, value) in kwargs.fields {
            if let Some(slot) = form.values.get_mut(&name) {
                *slot = value;
            }
        }
        form.extra = kwargs.extra;
        form
    }

    /// Creates an instance from a plain mapping.
    pub fn from_plain_dict(
        self: &Arc<Self>,
        data: &PlainDict,
        on_missing: OnMissingField,
        skip: &[&str],
    ) -> MdFormResult<FormInstance> {
        let kwargs = codec::generate_form_kwargs(self, data, on_missing, skip)?;
        Ok(self.with_kwargs(kwargs))
    }
}

/// Per-request state of a form: values, errors and extras.
#[derive(Debug, Clone)]
pub struct FormInstance {
    form_type: Arc<FormType>,
    values: IndexMap<String, FieldValue>,
    extra: PlainDict,
    process_errors: IndexMap<String, Vec<String>>,
    errors: IndexMap<String, Vec<String>>,
    bound: bool,
}

impl FormInstance {
    /// The schema this instance populates.
    pub fn form_type(&self) -> &Arc<FormType> {
        &self.form_type
    }

    /// Returns `true` once submitted data has been bound.
    pub const fn is_bound(&self) -> bool {
        self.bound
    }

    /// Binds submitted data and files.
    ///
    /// Absent keys leave the current value in place, except for checkbox
    /// fields whose absence means nothing was ticked. A file field without a
    /// new upload keeps its stored reference.
    pub fn bind(&mut self, data: &QueryDict, files: &IndexMap<String, Vec<UploadedFile>>) {
        self.bound = true;
        self.process_errors.clear();
        self.errors.clear();

        for (name, spec) in &self.form_type.fields {
            let upload = files.get(name).and_then(|f| f.first());
            let raw = create_widget(spec.widget, spec.choices()).value_from_data(data, name);
            let present = match spec.kind() {
                FieldKind::File => upload.is_some(),
                FieldKind::Checkbox => true,
                _ => data.contains_key(name),
            };
            if !present {
                continue;
            }
            let (value, errors) = coerce(spec, &raw, upload);
            self.values.insert(name.clone(), value);
            if !errors.is_empty() {
                self.process_errors.insert(name.clone(), errors);
            }
        }
    }

    /// Runs validation on every field. Returns `true` when no field has errors.
    pub fn validate(&mut self) -> bool {
        self.errors.clear();
        for (name, spec) in &self.form_type.fields {
            let value = self.values.get(name).unwrap_or(&FieldValue::Empty);
            let process = self.process_errors.get(name).cloned().unwrap_or_default();
            let errors = validate_field(spec, value, process);
            if !errors.is_empty() {
                self.errors.insert(name.clone(), errors);
            }
        }
        if !self.errors.is_empty() {
            tracing::info!(
                form = %self.form_type.name,
                invalid_fields = self.errors.len(),
                "form failed validation"
            );
        }
        self.errors.is_empty()
    }

    /// Binds and validates the request data when the request is a submission.
    ///
    /// Returns `false` without touching the instance for other methods.
    pub fn validate_on_submit(&mut self, request: &FormRequest) -> bool {
        if !request.is_submission() {
            return false;
        }
        self.bind(request.post(), request.files());
        self.validate()
    }

    /// Per-field errors, in declaration order.
    pub const fn errors(&self) -> &IndexMap<String, Vec<String>> {
        &self.errors
    }

    /// The current value of a field.
    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Replaces the value of a field.
    pub fn set_value(&mut self, name: &str, value: impl Into<FieldValue>) -> MdFormResult<()> {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(MdFormError::UnknownField(name.to_string())),
        }
    }

    /// Stores a file reference on a file field.
    pub fn set_file_reference(&mut self, name: &str, reference: impl Into<String>) -> MdFormResult<()> {
        self.set_value(name, FieldValue::File(FileData::Reference(reference.into())))
    }

    /// Values passed through for keys with no matching field.
    pub const fn extras(&self) -> &PlainDict {
        &self.extra
    }

    /// Serializes this instance with [`codec::to_plain_dict`].
    pub fn to_plain_dict(
        &self,
        uploader: &dyn codec::Uploader,
        options: &codec::SerializeOptions,
    ) -> MdFormResult<PlainDict> {
        codec::to_plain_dict(self, uploader, options)
    }

    /// Bound fields for rendering, in declaration order.
    pub fn bound_fields(&self) -> Vec<BoundField> {
        self.form_type
            .fields
            .iter()
            .map(|(name, spec)| {
                let value = match spec.kind() {
                    FieldKind::Submit => vec![spec.label.clone()],
                    _ => self
                        .values
                        .get(name)
                        .map(|v| v.display_values(spec.places()))
                        .unwrap_or_default(),
                };
                let errors = self.errors.get(name).cloned().unwrap_or_default();
                let read_only = self.form_type.read_only && spec.kind() != FieldKind::Submit;
                BoundField::new(spec, value, errors, read_only)
            })
            .collect()
    }

    /// The template context object: one entry per field, keyed by name.
    pub fn as_context(&self) -> Value {
        Value::Object(
            self.bound_fields()
                .into_iter()
                .map(|bf| (bf.name.clone(), bf.to_context()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_fields() -> IndexMap<String, FieldDescriptor> {
        [
            FieldDescriptor::new("name", FieldKind::String).required(true).length(30),
            FieldDescriptor::new("email", FieldKind::Email).required(true),
        ]
        .into_iter()
        .map(|d| (d.name.clone(), d))
        .collect()
    }

    #[test]
    fn test_submit_appended_last() {
        let form_type = build_form_type("MDForm", &contact_fields(), false).unwrap();
        let names: Vec<_> = form_type.fields().keys().cloned().collect();
        assert_eq!(names, vec!["name", "email", "submit"]);
        assert_eq!(form_type.name(), "MDForm");
        assert!(form_type.read_only_fields().is_empty());
    }

    #[test]
    fn test_reserved_submit_name() {
        let mut fields = contact_fields();
        fields.insert("submit".into(), FieldDescriptor::new("submit", FieldKind::String));
        assert!(matches!(
            build_form_type("MDForm", &fields, false),
            Err(MdFormError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_strict_and_best_effort() {
        let mut fields = contact_fields();
        fields.insert(
            "when".into(),
            FieldDescriptor::with_type_tag("when", "DateTimeLocalField"),
        );
        assert!(matches!(
            build_form_type("MDForm", &fields, false),
            Err(MdFormError::UnsupportedFieldType { .. })
        ));
        let form_type = FormBuilder::new("MDForm").best_effort(true).build(&fields).unwrap();
        assert!(form_type.field("when").unwrap().degraded);
    }

    #[test]
    fn test_read_only_substitution() {
        let form_type = build_form_type("MDForm", &contact_fields(), true).unwrap();
        assert_eq!(form_type.field("email").unwrap().widget, WidgetType::MailtoLink);
        assert_eq!(form_type.field("name").unwrap().widget, WidgetType::TextInput);
        assert_eq!(form_type.read_only_fields(), vec!["name", "email"]);

        let plain = FormBuilder::new("MDForm")
            .read_only(true)
            .substitutions(ReadOnlySubstitutions::empty())
            .build(&contact_fields())
            .unwrap();
        assert_eq!(plain.field("email").unwrap().widget, WidgetType::EmailInput);
    }

    #[test]
    fn test_bind_and_validate() {
        let form_type = build_form_type("MDForm", &contact_fields(), false).unwrap();
        let mut form = form_type.instance();
        form.bind(&QueryDict::parse("name=John+Smith&email=bad"), &IndexMap::new());
        assert!(form.is_bound());
        assert!(!form.validate());
        assert_eq!(form.errors().len(), 1);
        assert_eq!(form.errors()["email"], vec!["Invalid email address."]);

        form.bind(&QueryDict::parse("email=john%40smith.com"), &IndexMap::new());
        assert!(form.validate());
        assert_eq!(form.value("name"), Some(&FieldValue::from("John Smith")));
    }

    #[test]
    fn test_errors_in_declaration_order() {
        let form_type = build_form_type("MDForm", &contact_fields(), false).unwrap();
        let mut form = form_type.instance();
        form.bind(&QueryDict::parse("email=&name="), &IndexMap::new());
        assert!(!form.validate());
        let names: Vec<_> = form.errors().keys().cloned().collect();
        assert_eq!(names, vec!["name", "email"]);
    }

    #[test]
    fn test_validate_on_submit_ignores_get() {
        let form_type = build_form_type("MDForm", &contact_fields(), false).unwrap();
        let mut form = form_type.instance();
        let get = FormRequest::builder().build();
        assert!(!form.validate_on_submit(&get));
        assert!(!form.is_bound());

        let post = FormRequest::builder()
            .method(http::Method::POST)
            .post_value("name", "John")
            .post_value("email", "john@smith.com")
            .build();
        assert!(form.validate_on_submit(&post));
    }

    #[test]
    fn test_set_value_unknown_field() {
        let form_type = build_form_type("MDForm", &contact_fields(), false).unwrap();
        let mut form = form_type.instance();
        assert!(form.set_value("name", "Peter").is_ok());
        assert!(matches!(
            form.set_value("nope", "x"),
            Err(MdFormError::UnknownField(_))
        ));
    }

    #[test]
    fn test_context_and_submit_rendering() {
        let form_type = build_form_type("MDForm", &contact_fields(), false).unwrap();
        let form = form_type.instance();
        let ctx = form.as_context();
        assert_eq!(
            ctx["submit"]["html"],
            r#"<input id="submit" name="submit" type="submit" value="Submit">"#
        );
        assert_eq!(
            ctx["email"]["html"],
            r#"<input id="email" name="email" required type="email" value="">"#
        );
    }
}
