//! # mdform-rs
//!
//! Forms described in markdown. A markdown source declares fields in a compact
//! syntax; mdform-rs turns the parsed declarations into typed, validated form
//! types, moves form data to and from JSON-safe mappings, and renders forms
//! and pages through Tera templates.
//!
//! This is the meta-crate that re-exports all sub-crates. Depend on the
//! individual crates for finer-grained control.

/// Errors, settings, settings loading and logging.
pub use mdform_core as core;

/// Request data: form parameters, uploads, flash messages.
#[cfg(feature = "http")]
pub use mdform_http as http;

/// Field descriptors, the form builder, validation and the plain-dict codec.
#[cfg(feature = "forms")]
pub use mdform_forms as forms;

/// Formatters, template composition and the Tera engine.
#[cfg(feature = "template")]
pub use mdform_template as template;

/// The request cycle: compiling, caching and rendering markdown forms.
#[cfg(feature = "views")]
pub use mdform_views as views;

/// Commonly used items.
pub mod prelude {
    pub use mdform_core::{MdFormError, MdFormResult, Settings};

    #[cfg(feature = "http")]
    pub use mdform_http::{FormRequest, QueryDict, UploadedFile};

    #[cfg(feature = "forms")]
    pub use mdform_forms::{
        build_form_type, FieldDescriptor, FieldKind, FieldValue, FormInstance, FormType,
        OnMissingField, PlainDict, SerializeOptions,
    };

    #[cfg(feature = "template")]
    pub use mdform_template::{BootstrapFormatter, Engine, FnFormatter, Formatter, PlainFormatter};

    #[cfg(feature = "views")]
    pub use mdform_views::{FormParser, FormResponse, MdForms, RenderOptions, SubmitOutcome};
}

// Third-party re-exports
pub use serde;
pub use serde_json;
pub use tracing;
pub use tracing_subscriber;
