//! Bound fields: form fields populated with data and errors.
//!
//! A [`BoundField`] represents the combination of a field spec, its current
//! display value, any validation errors, and the widget used for rendering.
//! It is the primary type used when iterating over a form's fields in a
//! template.

use serde_json::{json, Value};

use crate::descriptor::FieldKind;
use crate::fields::FieldSpec;
use crate::widgets::{create_widget, escape_html, Attrs, WidgetState};

/// A form field bound to data and validation state.
#[derive(Debug, Clone)]
pub struct BoundField {
    /// The field's HTML name attribute.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Whether the field is required.
    pub required: bool,
    /// Whether the label is hidden when rendering.
    pub is_label_hidden: bool,
    /// Validation error messages for this field.
    pub errors: Vec<String>,
    widget: WidgetState,
}

impl BoundField {
    /// Creates a new `BoundField` from a field spec and current state.
    ///
    /// `read_only` marks the control `readonly` and `disabled`.
    pub fn new(spec: &FieldSpec, value: Vec<String>, errors: Vec<String>, read_only: bool) -> Self {
        let mut attrs = Attrs::new();
        attrs.insert("id".to_string(), Some(spec.name.clone()));
        for validator in &spec.validators {
            validator.apply_flags(&mut attrs);
        }
        if spec.places().is_some() || spec.kind() == FieldKind::Float {
            attrs.insert("step".to_string(), Some("any".to_string()));
        }
        if read_only {
            attrs.insert("readonly".to_string(), None);
            attrs.insert("disabled".to_string(), None);
        }

        Self {
            name: spec.name.clone(),
            label: spec.label.clone(),
            required: spec.required,
            is_label_hidden: spec.is_label_hidden,
            errors,
            widget: WidgetState {
                widget_type: spec.widget,
                name: spec.name.clone(),
                value,
                attrs,
                choices: spec.choices().to_vec(),
            },
        }
    }

    /// Renders the widget HTML, layering `extra_attrs` over the computed ones.
    pub fn render(&self, extra_attrs: &Attrs) -> String {
        self.widget.render(extra_attrs)
    }

    /// Renders a `<label>` element for this field.
    pub fn label_tag(&self) -> String {
        let widget = create_widget(self.widget.widget_type, &[]);
        let label_id = widget.id_for_label(&self.auto_id());
        format!(
            r#"<label for="{}">{}</label>"#,
            escape_html(&label_id),
            escape_html(&self.label)
        )
    }

    /// Returns the HTML `id` for this field, which is its name.
    pub fn auto_id(&self) -> String {
        self.name.clone()
    }

    /// Returns the widget state for re-rendering outside the form.
    pub const fn widget_state(&self) -> &WidgetState {
        &self.widget
    }

    /// Returns `true` if this field has any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Renders the error list as an HTML `<ul>` element.
    pub fn errors_as_ul(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        let items: String = self
            .errors
            .iter()
            .map(|e| format!("<li>{}</li>", escape_html(e)))
            .collect();
        format!(r#"<ul class="errors">{items}</ul>"#)
    }

    /// The template context entry for this field.
    pub fn to_context(&self) -> Value {
        json!({
            "name": self.name,
            "id": self.auto_id(),
            "label": self.label,
            "label_tag": self.label_tag(),
            "html": self.render(&Attrs::new()),
            "errors": self.errors,
            "required": self.required,
            "is_label_hidden": self.is_label_hidden,
            "value": self.widget.value,
            "widget": self.widget,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldDescriptor;
    use crate::fields::materialize;

    fn name_field() -> FieldSpec {
        materialize(&FieldDescriptor::new("name", FieldKind::String).required(true).length(30)).unwrap()
    }

    #[test]
    fn test_bound_field_render() {
        let bf = BoundField::new(&name_field(), vec!["John Smith".into()], vec![], false);
        assert_eq!(
            bf.render(&Attrs::new()),
            r#"<input id="name" maxlength="30" name="name" required type="text" value="John Smith">"#
        );
    }

    #[test]
    fn test_bound_field_label_tag() {
        let spec = materialize(&FieldDescriptor::new("e_mail", FieldKind::Email).label("E-mail & co")).unwrap();
        let bf = BoundField::new(&spec, vec![], vec![], false);
        assert_eq!(bf.label_tag(), r#"<label for="e_mail">E-mail &amp; co</label>"#);
    }

    #[test]
    fn test_bound_field_read_only() {
        let bf = BoundField::new(&name_field(), vec!["John".into()], vec![], true);
        let html = bf.render(&Attrs::new());
        assert!(html.contains(" disabled "));
        assert!(html.contains(" readonly "));
    }

    #[test]
    fn test_decimal_step() {
        let spec = materialize(&FieldDescriptor::new("price", FieldKind::Decimal)).unwrap();
        let bf = BoundField::new(&spec, vec!["1.10".into()], vec![], false);
        assert_eq!(
            bf.render(&Attrs::new()),
            r#"<input id="price" name="price" step="any" type="number" value="1.10">"#
        );
    }

    #[test]
    fn test_bound_field_errors() {
        let bf = BoundField::new(
            &name_field(),
            vec![],
            vec!["This field is required.".to_string()],
            false,
        );
        assert!(bf.has_errors());
        assert_eq!(
            bf.errors_as_ul(),
            r#"<ul class="errors"><li>This field is required.</li></ul>"#
        );
        let clean = BoundField::new(&name_field(), vec![], vec![], false);
        assert_eq!(clean.errors_as_ul(), "");
    }

    #[test]
    fn test_context_entry() {
        let bf = BoundField::new(&name_field(), vec!["John".into()], vec![], false);
        let ctx = bf.to_context();
        assert_eq!(ctx["label_tag"], r#"<label for="name">name</label>"#);
        assert_eq!(ctx["required"], true);
        assert_eq!(ctx["widget"]["widget_type"], "TextInput");
        let state: WidgetState = serde_json::from_value(ctx["widget"].clone()).unwrap();
        assert_eq!(&state, bf.widget_state());
    }
}
