//! Parent template loaders.
//!
//! Rendered forms extend layout templates (`form.html`, `simple.html`, ...).
//! The [`Engine`](crate::Engine) asks its loaders for every template named by an
//! `extends`, `include` or `import` tag before handing the set to Tera.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use mdform_core::{MdFormError, MdFormResult};

/// Loads template source text by name.
pub trait TemplateLoader: Send + Sync {
    /// Loads the template source with the given name.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError` if the template cannot be found or read.
    fn load(&self, name: &str) -> MdFormResult<String>;
}

/// Loads templates from one or more directories, first match wins.
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    dirs: Vec<PathBuf>,
}

impl FileSystemLoader {
    /// Creates a loader searching `dirs` in order.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }
}

impl TemplateLoader for FileSystemLoader {
    fn load(&self, name: &str) -> MdFormResult<String> {
        for dir in &self.dirs {
            let path = dir.join(name);
            if path.is_file() {
                return std::fs::read_to_string(&path).map_err(|e| {
                    MdFormError::TemplateError(format!(
                        "Error reading template '{}': {e}",
                        path.display()
                    ))
                });
            }
        }

        Err(MdFormError::TemplateError(format!(
            "Template '{name}' not found in directories: {:?}",
            self.dirs
        )))
    }
}

/// Loads templates from an in-memory map of names to sources.
#[derive(Debug, Default)]
pub struct StringLoader {
    templates: RwLock<HashMap<String, String>>,
}

impl StringLoader {
    /// Creates an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader from a map of template names to sources.
    pub fn from_map(templates: HashMap<String, String>) -> Self {
        Self {
            templates: RwLock::new(templates),
        }
    }

    /// Adds or replaces a template.
    pub fn add(&self, name: impl Into<String>, source: impl Into<String>) {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), source.into());
    }
}

impl TemplateLoader for StringLoader {
    fn load(&self, name: &str) -> MdFormResult<String> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| MdFormError::TemplateError(format!("Template '{name}' not found")))
    }
}
