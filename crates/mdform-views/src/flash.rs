//! Surfacing validation errors to the user.

use std::fmt;
use std::sync::Arc;

use mdform_forms::FormInstance;
use mdform_http::messages::{add_message_with_tags, MessageLevel};
use mdform_http::FormRequest;

/// Flashes one message per validation error:
/// `"Error in the <label> field - <message>"`, level error, tag `danger`.
pub fn flash_form_errors(form: &FormInstance, request: &mut FormRequest) {
    for (name, errors) in form.errors() {
        let label = form
            .form_type()
            .field(name)
            .map_or(name.as_str(), |spec| spec.label.as_str());
        for error in errors {
            add_message_with_tags(
                request,
                MessageLevel::Error,
                &format!("Error in the {label} field - {error}"),
                "danger",
            );
        }
    }
}

/// Custom error reporting hook.
pub type FlashFn = Arc<dyn Fn(&FormInstance, &mut FormRequest) + Send + Sync>;

/// How validation errors are reported when a form is re-rendered.
#[derive(Clone, Default)]
pub enum FlashPolicy {
    /// Errors are only shown inline by the template.
    Off,
    /// [`flash_form_errors`].
    #[default]
    Default,
    /// A caller-supplied hook.
    Custom(FlashFn),
}

impl FlashPolicy {
    /// Reports the errors of `form` according to this policy.
    pub fn apply(&self, form: &FormInstance, request: &mut FormRequest) {
        match self {
            Self::Off => {}
            Self::Default => flash_form_errors(form, request),
            Self::Custom(hook) => hook(form, request),
        }
    }
}

impl From<bool> for FlashPolicy {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Default
        } else {
            Self::Off
        }
    }
}

impl fmt::Debug for FlashPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("Off"),
            Self::Default => f.write_str("Default"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use mdform_forms::{build_form_type, FieldDescriptor, FieldKind};
    use mdform_http::QueryDict;

    fn invalid_form() -> FormInstance {
        let fields: IndexMap<String, FieldDescriptor> = [
            FieldDescriptor::new("name", FieldKind::String).label("Full name").required(true),
            FieldDescriptor::new("email", FieldKind::Email).required(true),
        ]
        .into_iter()
        .map(|d| (d.name.clone(), d))
        .collect();
        let form_type = build_form_type("MDForm", &fields, false).unwrap();
        let mut form = form_type.instance();
        form.bind(&QueryDict::parse("name=&email=nope"), &IndexMap::new());
        assert!(!form.validate());
        form
    }

    #[test]
    fn test_default_flash_messages() {
        let form = invalid_form();
        let mut request = FormRequest::builder().build();
        FlashPolicy::Default.apply(&form, &mut request);

        let messages = request.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].message, "Error in the Full name field - This field is required.");
        assert_eq!(messages[0].level, MessageLevel::Error);
        assert_eq!(messages[0].tags(), "danger");
        assert!(messages[1].message.starts_with("Error in the email field - "));
    }

    #[test]
    fn test_off_and_custom() {
        let form = invalid_form();
        let mut request = FormRequest::builder().build();
        FlashPolicy::from(false).apply(&form, &mut request);
        assert!(request.messages().is_empty());

        let custom = FlashPolicy::Custom(Arc::new(|form: &FormInstance, request: &mut FormRequest| {
            let count = form.errors().len().to_string();
            mdform_http::messages::error(request, &count);
        }));
        custom.apply(&form, &mut request);
        assert_eq!(request.messages()[0].message, "2");
    }
}
