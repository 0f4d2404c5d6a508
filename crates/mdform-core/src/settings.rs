//! Settings for mdform-rs.
//!
//! [`Settings`] holds every process-wide default the orchestrator consults. It is
//! passed explicitly to whoever needs it; per-call options override individual
//! values.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default ceiling for uploaded files, in bytes (5 MiB).
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

/// Which presentation formatter turns field declarations into template markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormatterChoice {
    /// Label followed by the bare field markup.
    #[default]
    Plain,
    /// Bootstrap rows with CSS classes, `maxlength`, and collapse toggles.
    Bootstrap {
        /// Name of the jQuery variable used by collapse toggles. `None` disables them.
        #[serde(default = "default_jquery_var")]
        jquery_var: Option<String>,
        /// Prefix prepended to the `form_field` template function.
        #[serde(default)]
        prefix: String,
    },
}

#[allow(clippy::unnecessary_wraps)]
fn default_jquery_var() -> Option<String> {
    Some("jQuery".to_string())
}

/// The complete set of mdform settings.
///
/// # Examples
///
/// ```
/// use mdform_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert_eq!(settings.class_name, "MDForm");
/// assert_eq!(settings.extends, "form.html");
/// assert_eq!(settings.block, "innerform");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// The log level filter (e.g. "info", "debug", "mdform_forms=trace").
    pub log_level: String,

    // ── Forms ────────────────────────────────────────────────────────

    /// Name given to generated form types.
    pub class_name: String,
    /// Formatter used when the caller does not pick one.
    pub formatter: FormatterChoice,
    /// Ceiling for uploaded files, in bytes.
    pub max_upload_size: usize,
    /// Whether validation errors are flashed to the user.
    pub flash_form_errors: bool,

    // ── Templates ────────────────────────────────────────────────────

    /// Parent template extended by rendered forms.
    pub extends: String,
    /// Block of the parent template replaced by rendered forms.
    pub block: String,
    /// Parent template extended by rendered pages (sources without fields).
    pub extends_page: String,
    /// Block replaced by rendered pages.
    pub block_page: String,
    /// Directories searched for parent templates and markdown sources.
    pub template_dirs: Vec<PathBuf>,
    /// Sub-directory of each template directory holding markdown sources.
    pub source_subdir: String,
    /// Extra variables made available to every rendered template.
    pub tmpl_context: serde_json::Map<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),

            class_name: "MDForm".to_string(),
            formatter: FormatterChoice::Plain,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            flash_form_errors: true,

            extends: "form.html".to_string(),
            block: "innerform".to_string(),
            extends_page: "simple.html".to_string(),
            block_page: "inner_simple".to_string(),
            template_dirs: Vec::new(),
            source_subdir: "md".to_string(),
            tmpl_context: serde_json::Map::new(),
        }
    }
}
