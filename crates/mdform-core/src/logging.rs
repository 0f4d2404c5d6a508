//! Logging integration for mdform-rs.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-request spans.

use crate::settings::Settings;

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level`. In debug mode a pretty,
/// human-readable format is used; otherwise a structured JSON format.
/// Calling this more than once is harmless: later calls are ignored.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for rendering one markdown source.
///
/// # Examples
///
/// ```
/// use mdform_core::logging::render_span;
///
/// let span = render_span("contact", false);
/// let _guard = span.enter();
/// tracing::info!("rendering form");
/// ```
pub fn render_span(source: &str, read_only: bool) -> tracing::Span {
    tracing::info_span!("mdform", source = source, read_only = read_only)
}
