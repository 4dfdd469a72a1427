//! Tera-backed template rendering.
//!
//! [`Templates`] owns a [`tera::Tera`] instance loaded from template
//! directories (or raw strings) and implements [`TemplateRenderer`], so it can
//! be attached to a [`TemplateResponse`] or installed as the scope's app.

use std::path::PathBuf;
use std::sync::Arc;

use tera::Tera;

use starling_core::{Settings, StarlingError, StarlingResult};
use starling_http::{TemplateRenderer, TemplateResponse};

/// Extensions auto-escaped when escaping is on.
const ESCAPED_EXTENSIONS: [&str; 4] = [".html", ".htm", ".xml", ".svg"];

/// A set of named templates.
///
/// # Examples
///
/// ```
/// use starling_template::Templates;
///
/// let mut templates = Templates::new();
/// templates.add_raw_template("hello.html", "Hello {{ name }}!").unwrap();
///
/// let output = templates
///     .render("hello.html", &serde_json::json!({"name": "World"}))
///     .unwrap();
/// assert_eq!(output, "Hello World!");
/// ```
pub struct Templates {
    tera: Tera,
    dirs: Vec<PathBuf>,
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Templates")
            .field("dirs", &self.dirs)
            .field("templates", &self.names())
            .finish()
    }
}

impl Default for Templates {
    fn default() -> Self {
        Self::new()
    }
}

impl Templates {
    /// Creates an empty set with auto-escaping on.
    pub fn new() -> Self {
        let mut tera = Tera::default();
        tera.autoescape_on(ESCAPED_EXTENSIONS.to_vec());
        Self {
            tera,
            dirs: Vec::new(),
        }
    }

    /// Loads every template under `dir`, named by their path relative to it.
    pub fn from_dir(dir: impl Into<PathBuf>) -> StarlingResult<Self> {
        Self::from_dirs(vec![dir.into()])
    }

    /// Loads every template under each directory.
    ///
    /// When two directories hold the same name, the earlier directory wins.
    pub fn from_dirs(dirs: Vec<PathBuf>) -> StarlingResult<Self> {
        let mut templates = Self::new();
        for dir in &dirs {
            let glob = format!("{}/**/*", dir.display());
            let loaded = Tera::parse(&glob).map_err(template_error)?;
            templates.tera.extend(&loaded).map_err(template_error)?;
        }
        templates.tera.build_inheritance_chains().map_err(template_error)?;
        tracing::debug!(dirs = ?dirs, count = templates.tera.get_template_names().count(), "loaded templates");
        templates.dirs = dirs;
        Ok(templates)
    }

    /// Loads the directories and escaping mode named in the settings.
    pub fn from_settings(settings: &Settings) -> StarlingResult<Self> {
        let mut templates = Self::from_dirs(settings.template_dirs.clone())?;
        templates.set_auto_escape(settings.template_autoescape);
        Ok(templates)
    }

    /// Adds a template from source.
    pub fn add_raw_template(&mut self, name: &str, source: &str) -> StarlingResult<()> {
        self.tera
            .add_raw_template(name, source)
            .map_err(template_error)
    }

    /// Turns HTML auto-escaping on or off.
    pub fn set_auto_escape(&mut self, enabled: bool) {
        if enabled {
            self.tera.autoescape_on(ESCAPED_EXTENSIONS.to_vec());
        } else {
            self.tera.autoescape_on(Vec::new());
        }
    }

    /// Returns the loaded template names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.tera.get_template_names().collect();
        names.sort_unstable();
        names
    }

    /// Returns the directories templates were loaded from.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Renders `name` with a JSON object as context.
    pub fn render(&self, name: &str, context: &serde_json::Value) -> StarlingResult<String> {
        let context = tera::Context::from_value(context.clone())
            .map_err(|e| StarlingError::InvalidContext(e.to_string()))?;
        self.tera.render(name, &context).map_err(template_error)
    }

    /// Builds a response that renders `name` with these templates.
    ///
    /// The context must be a JSON object.
    pub fn response(
        self: &Arc<Self>,
        name: impl Into<String>,
        context: serde_json::Value,
    ) -> StarlingResult<TemplateResponse> {
        if !context.is_object() {
            return Err(StarlingError::InvalidContext(format!(
                "template context must be an object, got {}",
                json_kind(&context)
            )));
        }
        let renderer: Arc<dyn TemplateRenderer> = self.clone();
        Ok(TemplateResponse::new(name, context).with_renderer(renderer))
    }
}

impl TemplateRenderer for Templates {
    fn render_template(&self, name: &str, context: &serde_json::Value) -> StarlingResult<String> {
        self.render(name, context)
    }
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Flattens a tera error and its causes into one message.
fn template_error(err: tera::Error) -> StarlingError {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    StarlingError::TemplateError(message)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_render_raw_template() {
        let mut templates = Templates::new();
        templates
            .add_raw_template("list.html", "{% for i in items %}{{ i }},{% endfor %}")
            .unwrap();
        let out = templates.render("list.html", &json!({"items": [1, 2, 3]})).unwrap();
        assert_eq!(out, "1,2,3,");
    }

    #[test]
    fn test_html_is_escaped() {
        let mut templates = Templates::new();
        templates.add_raw_template("x.html", "{{ v }}").unwrap();
        let out = templates.render("x.html", &json!({"v": "<b>"})).unwrap();
        assert_eq!(out, "&lt;b&gt;");
    }

    #[test]
    fn test_auto_escape_off() {
        let mut templates = Templates::new();
        templates.set_auto_escape(false);
        templates.add_raw_template("x.html", "{{ v }}").unwrap();
        let out = templates.render("x.html", &json!({"v": "<b>"})).unwrap();
        assert_eq!(out, "<b>");
    }

    #[test]
    fn test_unknown_template() {
        let templates = Templates::new();
        let err = templates.render("missing.html", &json!({})).unwrap_err();
        assert!(matches!(err, StarlingError::TemplateError(_)));
        assert!(err.to_string().contains("missing.html"));
    }

    #[test]
    fn test_syntax_error() {
        let mut templates = Templates::new();
        let err = templates
            .add_raw_template("bad.html", "{% if %}")
            .unwrap_err();
        assert!(matches!(err, StarlingError::TemplateError(_)));
    }

    #[test]
    fn test_non_object_context_rejected() {
        let templates = Arc::new(Templates::new());
        let err = templates.response("a.html", json!([1, 2])).unwrap_err();
        assert!(matches!(err, StarlingError::InvalidContext(_)));
        assert!(err.to_string().contains("an array"));

        let err = templates.render("a.html", &json!("text")).unwrap_err();
        assert!(matches!(err, StarlingError::InvalidContext(_)));
    }

    #[test]
    fn test_response_carries_name_and_context() {
        let templates = Arc::new(Templates::new());
        let resp = templates.response("page.html", json!({"title": "Home"})).unwrap();
        assert_eq!(resp.template(), "page.html");
        assert_eq!(resp.context()["title"], "Home");
    }
}
