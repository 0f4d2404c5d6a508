//! Template functions registered on every [`Engine`](crate::Engine).
//!
//! `form_field(field=form.x, form_type="horizontal", ...)` renders one field as a
//! Bootstrap 4 form group. Arguments other than `field` and `form_type` become
//! attributes of the control, replacing any computed attribute of the same name.

use std::collections::HashMap;
use std::fmt::Write;
use std::str::FromStr;

use mdform_forms::widgets::{escape_html, Attrs, WidgetState, WidgetType};
use serde::Deserialize;
use tera::{Function, Value};

/// Layout of a rendered form group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormLayout {
    /// Label stacked over the control.
    #[default]
    Basic,
    /// Label and control side by side on a grid row.
    Horizontal,
    /// Visually hidden label, control only.
    Inline,
}

impl FromStr for FormLayout {
    type Err = tera::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "horizontal" => Ok(Self::Horizontal),
            "inline" => Ok(Self::Inline),
            other => Err(tera::Error::msg(format!(
                "form_field: unknown form_type '{other}'"
            ))),
        }
    }
}

/// The subset of a field's template context that `form_field` reads.
#[derive(Debug, Deserialize)]
struct FieldContext {
    id: String,
    label: String,
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    required: bool,
    widget: WidgetState,
}

/// The `form_field` template function.
#[derive(Debug, Clone)]
pub struct FormField {
    /// Grid breakpoint used by horizontal rows.
    pub breakpoint: String,
    /// Columns taken by the label in horizontal rows; the control takes the rest.
    pub label_columns: u8,
}

impl Default for FormField {
    fn default() -> Self {
        Self {
            breakpoint: "lg".to_string(),
            label_columns: 2,
        }
    }
}

impl FormField {
    fn render(&self, field: &FieldContext, layout: FormLayout, extra: &Attrs) -> String {
        let mut extra = extra.clone();
        if !field.errors.is_empty() {
            let class = extra
                .get("class")
                .cloned()
                .flatten()
                .map_or_else(|| "is-invalid".to_string(), |c| format!("{c} is-invalid"));
            extra.insert("class".to_string(), Some(class));
        }
        let mut control = field.widget.render(&extra);
        for error in &field.errors {
            let _ = write!(
                control,
                r#"<div class="invalid-feedback" style="display:block;">{}</div>"#,
                escape_html(error)
            );
        }

        let bp = &self.breakpoint;
        let label_cols = self.label_columns;
        let control_cols = 12_u8.saturating_sub(label_cols);

        if field.widget.widget_type == WidgetType::SubmitInput {
            return match layout {
                FormLayout::Horizontal => format!(
                    r#"<div class="form-group row"><div class="offset-{bp}-{label_cols} col-{bp}-{control_cols}">{control}</div></div>"#
                ),
                FormLayout::Basic | FormLayout::Inline => {
                    format!(r#"<div class="form-group">{control}</div>"#)
                }
            };
        }

        let mut group = String::from("form-group");
        if layout == FormLayout::Horizontal {
            group.push_str(" row");
        }
        if field.required {
            group.push_str(" required");
        }
        if !field.errors.is_empty() {
            group.push_str(" has-error");
        }

        let id = escape_html(&field.id);
        let label = escape_html(&field.label);
        match layout {
            FormLayout::Horizontal => format!(
                r#"<div class="{group}"><label class="col-form-label col-{bp}-{label_cols}" for="{id}">{label}</label><div class="col-{bp}-{control_cols}">{control}</div></div>"#
            ),
            FormLayout::Basic => format!(
                r#"<div class="{group}"><label class="form-control-label" for="{id}">{label}</label>{control}</div>"#
            ),
            FormLayout::Inline => format!(
                r#"<div class="{group}"><label class="sr-only" for="{id}">{label}</label>{control}</div>"#
            ),
        }
    }
}

impl Function for FormField {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let field = args
            .get("field")
            .ok_or_else(|| tera::Error::msg("form_field: missing `field` argument"))?;
        let field: FieldContext = serde_json::from_value(field.clone()).map_err(|e| {
            tera::Error::msg(format!("form_field: `field` is not a form field: {e}"))
        })?;

        let layout = match args.get("form_type") {
            None => FormLayout::default(),
            Some(Value::String(s)) => s.parse()?,
            Some(other) => {
                return Err(tera::Error::msg(format!(
                    "form_field: form_type must be a string, got {other}"
                )))
            }
        };

        let mut extra = Attrs::new();
        for (key, value) in args {
            if key == "field" || key == "form_type" {
                continue;
            }
            let value = match value {
                Value::Null | Value::Bool(false) => continue,
                Value::Bool(true) => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            };
            extra.insert(key.clone(), value);
        }

        Ok(Value::String(self.render(&field, layout, &extra)))
    }

    fn is_safe(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn name_field(errors: &[&str]) -> Value {
        json!({
            "name": "name",
            "id": "name",
            "label": "Name",
            "errors": errors,
            "required": true,
            "widget": {
                "widget_type": "TextInput",
                "name": "name",
                "value": ["John"],
                "attrs": {"id": "name", "required": null},
                "choices": []
            }
        })
    }

    fn call(args: Value) -> tera::Result<Value> {
        let args: HashMap<String, Value> = serde_json::from_value(args).unwrap();
        FormField::default().call(&args)
    }

    #[test]
    fn test_horizontal_row() {
        let out = call(json!({
            "field": name_field(&[]),
            "form_type": "horizontal",
            "class": "form-control",
            "maxlength": 30
        }))
        .unwrap();
        assert_eq!(
            out,
            r#"<div class="form-group row required"><label class="col-form-label col-lg-2" for="name">Name</label><div class="col-lg-10"><input class="form-control" id="name" maxlength="30" name="name" required type="text" value="John"></div></div>"#
        );
    }

    #[test]
    fn test_errors_are_shown() {
        let out = call(json!({
            "field": name_field(&["Too <long>"]),
            "class": "form-control"
        }))
        .unwrap();
        let out = out.as_str().unwrap();
        assert!(out.starts_with(r#"<div class="form-group required has-error">"#));
        assert!(out.contains(r#"class="form-control is-invalid""#));
        assert!(out.contains("Too &lt;long&gt;"));
    }

    #[test]
    fn test_bad_arguments() {
        assert!(call(json!({"form_type": "horizontal"})).is_err());
        assert!(call(json!({"field": "name"})).is_err());
        assert!(call(json!({"field": name_field(&[]), "form_type": "diagonal"})).is_err());
    }
}
