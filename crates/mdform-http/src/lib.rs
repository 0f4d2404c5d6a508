//! # mdform-http
//!
//! Request data for mdform-rs. Provides [`QueryDict`] for form-encoded
//! parameters, [`UploadedFile`] and multipart parsing for file uploads, the
//! [`FormRequest`] handed to the orchestrator, and the flash message store.

pub mod messages;
pub mod querydict;
pub mod request;
pub mod upload;

pub use messages::{Message, MessageLevel};
pub use querydict::QueryDict;
pub use request::{FormRequest, FormRequestBuilder};
pub use upload::{MultipartData, UploadedFile};
