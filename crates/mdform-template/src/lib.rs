//! # mdform-template
//!
//! Presentation layer of mdform-rs. Formatters turn field descriptors into
//! template markup, [`compose`] wraps that markup so it extends a parent
//! template, and the [`Engine`] renders the result with Tera.
//!
//! ## Modules
//!
//! - [`formatters`] - Plain and Bootstrap field formatters
//! - [`compose`] - `extends` / `block` composition
//! - [`loaders`] - Parent template loaders
//! - [`functions`] - Template functions (`form_field`)
//! - [`engine`] - The Tera-backed rendering engine

pub mod compose;
pub mod engine;
pub mod formatters;
pub mod functions;
pub mod loaders;

pub use compose::wrap_template;
pub use engine::Engine;
pub use formatters::{formatter_for, BootstrapFormatter, FnFormatter, Formatter, PlainFormatter};
pub use loaders::{FileSystemLoader, StringLoader, TemplateLoader};
