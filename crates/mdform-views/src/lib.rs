//! # mdform-views
//!
//! The request cycle of mdform-rs. A markdown source is parsed by a
//! [`FormParser`], compiled into a template plus a form type, cached by
//! content, populated from the request, validated, and rendered.
//!
//! ## Modules
//!
//! - [`parser`] - The markdown parser seam
//! - [`compile`] - Compiling a source into a template and a form type
//! - [`cache`] - Content-keyed cache of compiled forms
//! - [`flash`] - Surfacing validation errors as flash messages
//! - [`orchestrator`] - [`MdForms`]: rendering pages and forms per request

pub mod cache;
pub mod compile;
pub mod flash;
pub mod orchestrator;
pub mod parser;

pub use cache::{CacheKey, FormCache};
pub use compile::{compile_file, compile_source, CompileOptions, CompiledForm};
pub use flash::{flash_form_errors, FlashPolicy};
pub use orchestrator::{ClassName, FormResponse, MdForms, Prefill, RenderOptions, SubmitOutcome};
pub use parser::{FormParser, JsonSourceParser, Meta, ParsedSource};
