//! # mdform-forms
//!
//! The form engine of mdform-rs. Field descriptors produced by the markdown
//! parser are materialized into typed fields with widgets and validators,
//! assembled into a [`FormType`], populated per request as a
//! [`FormInstance`], and serialized to and from JSON-safe plain mappings.
//!
//! ## Modules
//!
//! - [`descriptor`] - Field descriptors and form specifications
//! - [`fields`] - The field materializer
//! - [`validators`] - Field validators
//! - [`widgets`] - HTML widgets
//! - [`value`] - Typed field values
//! - [`validation`] - Input coercion and the validation pipeline
//! - [`bound_field`] - Fields bound to values and errors for rendering
//! - [`form`] - Form types, the builder, and form instances
//! - [`codec`] - `to_plain_dict` / `from_plain_dict`

pub mod bound_field;
pub mod codec;
pub mod descriptor;
pub mod fields;
pub mod form;
pub mod validation;
pub mod validators;
pub mod value;
pub mod widgets;

pub use bound_field::BoundField;
pub use codec::{
    generate_form_kwargs, to_plain_dict, FormKwargs, KeepReferences, OnMissingField, PlainDict,
    SerializeOptions, UploadFilenames, Uploader,
};
pub use descriptor::{FieldConstraints, FieldDescriptor, FieldKind, FormSpecification};
pub use fields::{materialize, materialize_lenient, FieldSpec};
pub use form::{build_form_type, FormBuilder, FormInstance, FormType, ReadOnlySubstitutions};
pub use validators::Validator;
pub use value::{FieldValue, FileData};
pub use widgets::{Widget, WidgetState, WidgetType};
