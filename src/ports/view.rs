use color_eyre::eyre::{Context, Result};
use serde::Serialize;

/// Port trait for turning a named view and its context into a response body.
///
/// The HTTP layer only hands over the view identifier (`albums/list`,
/// `artists/detail`, ...) and the variables it computed; how they become
/// markup is up to the implementation.
#[cfg_attr(test, mockall::automock)]
pub trait ViewRenderer: Send + Sync {
    fn render(&self, view: &str, context: &serde_json::Value) -> Result<String>;

    /// Media type of what `render` produces.
    fn content_type(&self) -> &'static str;
}

#[derive(Serialize)]
struct RenderedView<'a> {
    view: &'a str,
    context: &'a serde_json::Value,
}

/// Emits `{"view": ..., "context": ...}` so any front end can take over the
/// presentation.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonViewRenderer;

impl ViewRenderer for JsonViewRenderer {
    fn render(&self, view: &str, context: &serde_json::Value) -> Result<String> {
        serde_json::to_string(&RenderedView { view, context })
            .wrap_err_with(|| format!("Failed to render view {view}"))
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}
