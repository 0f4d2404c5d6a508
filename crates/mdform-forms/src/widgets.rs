//! Widget system for rendering HTML form elements.
//!
//! Widgets are the bridge between form fields and their HTML representation.
//! Each widget knows how to render itself as HTML, extract a value from
//! submitted form data, and generate an appropriate `id` attribute for
//! its `<label>` element.
//!
//! Attributes are rendered in sorted order. A `None` attribute value renders
//! as a bare boolean attribute (`required`, `readonly`, `disabled`).

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

use mdform_http::QueryDict;
use serde::{Deserialize, Serialize};

/// HTML attributes: name to value, `None` for boolean attributes.
pub type Attrs = BTreeMap<String, Option<String>>;

/// Enumerates all built-in widget types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WidgetType {
    /// `<input type="text">`.
    TextInput,
    /// `<textarea>`.
    Textarea,
    /// `<input type="number">`.
    NumberInput,
    /// `<input type="email">`.
    EmailInput,
    /// `<input type="date">`.
    DateInput,
    /// `<input type="time">`.
    TimeInput,
    /// `<select>`.
    Select,
    /// A list of `<input type="radio">` elements.
    RadioList,
    /// A list of `<input type="checkbox">` elements.
    CheckboxList,
    /// `<input type="file">`.
    FileInput,
    /// `<input type="submit">`.
    SubmitInput,
    /// A `mailto:` link showing the address.
    MailtoLink,
    /// A link opening the URL in a new tab.
    UrlLink,
}

impl fmt::Display for WidgetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TextInput => "TextInput",
            Self::Textarea => "Textarea",
            Self::NumberInput => "NumberInput",
            Self::EmailInput => "EmailInput",
            Self::DateInput => "DateInput",
            Self::TimeInput => "TimeInput",
            Self::Select => "Select",
            Self::RadioList => "RadioList",
            Self::CheckboxList => "CheckboxList",
            Self::FileInput => "FileInput",
            Self::SubmitInput => "SubmitInput",
            Self::MailtoLink => "MailtoLink",
            Self::UrlLink => "UrlLink",
        };
        write!(f, "{name}")
    }
}

/// A trait for HTML form widgets.
///
/// Widgets are responsible for:
/// - Rendering an HTML element for a given field name and value
/// - Extracting the raw values from submitted `QueryDict` data
/// - Generating the `id` attribute for an associated `<label>` element
pub trait Widget: Send + Sync + fmt::Debug {
    /// Returns the widget type enum variant.
    fn widget_type(&self) -> WidgetType;

    /// Renders the widget as an HTML string.
    ///
    /// `value` holds the display strings (several for multi-valued widgets).
    fn render(&self, name: &str, value: &[String], attrs: &Attrs) -> String;

    /// Extracts the raw submitted values for this widget.
    fn value_from_data(&self, data: &QueryDict, name: &str) -> Vec<String> {
        data.get(name).map(|v| vec![v.to_string()]).unwrap_or_default()
    }

    /// Returns the HTML `id` attribute value for a label targeting this widget.
    fn id_for_label(&self, id: &str) -> String {
        id.to_string()
    }
}

/// Escapes text for use in HTML content and double-quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Formats attributes as ` key="value" flag`, sorted by key.
pub fn render_attrs(attrs: &Attrs) -> String {
    let mut out = String::new();
    for (key, value) in attrs {
        match value {
            Some(v) => {
                let _ = write!(out, r#" {key}="{}""#, escape_html(v));
            }
            None => {
                let _ = write!(out, " {key}");
            }
        }
    }
    out
}

fn first(value: &[String]) -> &str {
    value.first().map_or("", String::as_str)
}

fn render_input(input_type: &str, name: &str, value: Option<&str>, attrs: &Attrs) -> String {
    let mut all = attrs.clone();
    all.insert("name".to_string(), Some(name.to_string()));
    all.insert("type".to_string(), Some(input_type.to_string()));
    if let Some(value) = value {
        all.insert("value".to_string(), Some(value.to_string()));
    }
    format!("<input{}>", render_attrs(&all))
}

// ---------------------------------------------------------------------------
// Built-in widgets
// ---------------------------------------------------------------------------

/// A plain `<input>` widget; the type attribute comes from the widget type.
#[derive(Debug, Clone)]
pub struct Input {
    widget_type: WidgetType,
    input_type: &'static str,
}

impl Input {
    /// Creates an input widget of the given HTML type.
    pub const fn new(widget_type: WidgetType, input_type: &'static str) -> Self {
        Self {
            widget_type,
            input_type,
        }
    }
}

impl Widget for Input {
    fn widget_type(&self) -> WidgetType {
        self.widget_type
    }

    fn render(&self, name: &str, value: &[String], attrs: &Attrs) -> String {
        render_input(self.input_type, name, Some(first(value)), attrs)
    }
}

/// A `<textarea>` widget.
#[derive(Debug, Clone)]
pub struct Textarea;

impl Widget for Textarea {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Textarea
    }

    fn render(&self, name: &str, value: &[String], attrs: &Attrs) -> String {
        let mut all = attrs.clone();
        all.insert("name".to_string(), Some(name.to_string()));
        format!(
            "<textarea{}>\r\n{}</textarea>",
            render_attrs(&all),
            escape_html(first(value))
        )
    }
}

/// A `<select>` widget.
#[derive(Debug, Clone)]
pub struct Select {
    /// The available choices as `(value, display_label)` pairs.
    pub choices: Vec<(String, String)>,
}

impl Widget for Select {
    fn widget_type(&self) -> WidgetType {
        WidgetType::Select
    }

    fn render(&self, name: &str, value: &[String], attrs: &Attrs) -> String {
        let mut all = attrs.clone();
        all.insert("name".to_string(), Some(name.to_string()));
        let mut html = format!("<select{}>", render_attrs(&all));
        for (val, label) in &self.choices {
            let selected = if value.contains(val) { " selected" } else { "" };
            let _ = write!(
                html,
                r#"<option{selected} value="{}">{}</option>"#,
                escape_html(val),
                escape_html(label)
            );
        }
        html.push_str("</select>");
        html
    }
}

/// A `<ul>` of radio buttons or checkboxes, label after each control.
///
/// Only `readonly` and `disabled` propagate from the list to its options.
#[derive(Debug, Clone)]
pub struct ChoiceList {
    /// The available choices as `(value, display_label)` pairs.
    pub choices: Vec<(String, String)>,
    multiple: bool,
}

impl ChoiceList {
    /// A list of radio buttons.
    pub fn radio(choices: Vec<(String, String)>) -> Self {
        Self {
            choices,
            multiple: false,
        }
    }

    /// A list of checkboxes.
    pub fn checkbox(choices: Vec<(String, String)>) -> Self {
        Self {
            choices,
            multiple: true,
        }
    }
}

impl Widget for ChoiceList {
    fn widget_type(&self) -> WidgetType {
        if self.multiple {
            WidgetType::CheckboxList
        } else {
            WidgetType::RadioList
        }
    }

    fn render(&self, name: &str, value: &[String], attrs: &Attrs) -> String {
        let input_type = if self.multiple { "checkbox" } else { "radio" };
        let id_base = attrs
            .get("id")
            .and_then(Option::as_deref)
            .unwrap_or(name)
            .to_string();

        let list_attrs: Attrs = attrs
            .iter()
            .filter(|(k, _)| matches!(k.as_str(), "id" | "class"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let option_flags: Attrs = attrs
            .iter()
            .filter(|(k, _)| matches!(k.as_str(), "readonly" | "disabled"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut html = format!("<ul{}>", render_attrs(&list_attrs));
        for (i, (val, label)) in self.choices.iter().enumerate() {
            let option_id = format!("{id_base}-{i}");
            let mut option_attrs = option_flags.clone();
            option_attrs.insert("id".to_string(), Some(option_id.clone()));
            if value.contains(val) {
                option_attrs.insert("checked".to_string(), None);
            }
            let _ = write!(
                html,
                r#"<li>{} <label for="{}">{}</label></li>"#,
                render_input(input_type, name, Some(val), &option_attrs),
                escape_html(&option_id),
                escape_html(label)
            );
        }
        html.push_str("</ul>");
        html
    }

    fn value_from_data(&self, data: &QueryDict, name: &str) -> Vec<String> {
        if self.multiple {
            data.get_list(name).map(<[String]>::to_vec).unwrap_or_default()
        } else {
            data.get(name).map(|v| vec![v.to_string()]).unwrap_or_default()
        }
    }
}

/// A `<input type="file">` widget. The current value is never echoed back.
#[derive(Debug, Clone)]
pub struct FileInput;

impl Widget for FileInput {
    fn widget_type(&self) -> WidgetType {
        WidgetType::FileInput
    }

    fn render(&self, name: &str, _value: &[String], attrs: &Attrs) -> String {
        render_input("file", name, None, attrs)
    }

    fn value_from_data(&self, _data: &QueryDict, _name: &str) -> Vec<String> {
        Vec::new()
    }
}

/// A `mailto:` link; attributes are ignored.
#[derive(Debug, Clone)]
pub struct MailtoLink;

impl Widget for MailtoLink {
    fn widget_type(&self) -> WidgetType {
        WidgetType::MailtoLink
    }

    fn render(&self, _name: &str, value: &[String], _attrs: &Attrs) -> String {
        let address = escape_html(first(value));
        format!("<a href='mailto:{address}'>{address}</a>")
    }
}

/// A link opening its URL in a new tab; attributes are ignored.
#[derive(Debug, Clone)]
pub struct UrlLink;

impl Widget for UrlLink {
    fn widget_type(&self) -> WidgetType {
        WidgetType::UrlLink
    }

    fn render(&self, _name: &str, value: &[String], _attrs: &Attrs) -> String {
        let url = escape_html(first(value));
        format!("<a href='{url}' target='_blank'> {url} </a>")
    }
}

/// Creates a boxed widget from a `WidgetType`, populating choices if applicable.
pub fn create_widget(widget_type: WidgetType, choices: &[(String, String)]) -> Box<dyn Widget> {
    match widget_type {
        WidgetType::TextInput => Box::new(Input::new(widget_type, "text")),
        WidgetType::NumberInput => Box::new(Input::new(widget_type, "number")),
        WidgetType::EmailInput => Box::new(Input::new(widget_type, "email")),
        WidgetType::DateInput => Box::new(Input::new(widget_type, "date")),
        WidgetType::TimeInput => Box::new(Input::new(widget_type, "time")),
        WidgetType::SubmitInput => Box::new(Input::new(widget_type, "submit")),
        WidgetType::Textarea => Box::new(Textarea),
        WidgetType::Select => Box::new(Select {
            choices: choices.to_vec(),
        }),
        WidgetType::RadioList => Box::new(ChoiceList::radio(choices.to_vec())),
        WidgetType::CheckboxList => Box::new(ChoiceList::checkbox(choices.to_vec())),
        WidgetType::FileInput => Box::new(FileInput),
        WidgetType::MailtoLink => Box::new(MailtoLink),
        WidgetType::UrlLink => Box::new(UrlLink),
    }
}

/// Everything needed to re-render a field's widget outside the form.
///
/// Template helpers receive this through the template context and render the
/// widget again with extra attributes (CSS classes, `onchange` handlers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetState {
    /// The widget type.
    pub widget_type: WidgetType,
    /// The HTML `name` attribute.
    pub name: String,
    /// The display values.
    pub value: Vec<String>,
    /// The attributes the form computed (id, flags, read-only markers).
    pub attrs: Attrs,
    /// Choices for select and list widgets.
    #[serde(default)]
    pub choices: Vec<(String, String)>,
}

impl WidgetState {
    /// Renders the widget with `extra` attributes layered over the computed ones.
    pub fn render(&self, extra: &Attrs) -> String {
        let mut attrs = self.attrs.clone();
        for (key, value) in extra {
            attrs.insert(key.clone(), value.clone());
        }
        create_widget(self.widget_type, &self.choices).render(&self.name, &self.value, &attrs)
    }
}
