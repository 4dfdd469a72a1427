//! The read-only request scope a response is emitted under.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::template::TemplateRenderer;

/// Extension a host advertises when it wants `http.response.template` events.
pub const TEMPLATE_EXTENSION: &str = "http.response.template";

/// Request-scoped information available while a response is emitted.
///
/// # Examples
///
/// ```
/// use starling_http::scope::{Scope, TEMPLATE_EXTENSION};
///
/// let scope = Scope::new(http::Method::HEAD, "/report.csv")
///     .with_extension(TEMPLATE_EXTENSION);
/// assert!(scope.is_head());
/// assert!(scope.supports_extension(TEMPLATE_EXTENSION));
/// ```
#[derive(Clone, Default)]
pub struct Scope {
    method: Method,
    path: String,
    extensions: HashSet<String>,
    app: Option<Arc<dyn TemplateRenderer>>,
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("extensions", &self.extensions)
            .field("app", &self.app.is_some())
            .finish()
    }
}

impl Scope {
    /// Creates a scope for a request.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            extensions: HashSet::new(),
            app: None,
        }
    }

    /// Advertises a host extension.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extensions.insert(extension.into());
        self
    }

    /// Attaches the application's template renderer.
    #[must_use]
    pub fn with_app(mut self, app: Arc<dyn TemplateRenderer>) -> Self {
        self.app = Some(app);
        self
    }

    /// Returns the request method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns `true` for HEAD requests.
    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    /// Returns `true` if the host advertised `extension`.
    pub fn supports_extension(&self, extension: &str) -> bool {
        self.extensions.contains(extension)
    }

    /// Returns the application's template renderer, if any.
    pub const fn app(&self) -> Option<&Arc<dyn TemplateRenderer>> {
        self.app.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scope() {
        let scope = Scope::default();
        assert_eq!(*scope.method(), Method::GET);
        assert_eq!(scope.path(), "");
        assert!(!scope.is_head());
        assert!(!scope.supports_extension(TEMPLATE_EXTENSION));
        assert!(scope.app().is_none());
    }

    #[test]
    fn test_debug_hides_renderer() {
        let scope = Scope::new(Method::POST, "/submit");
        let debug = format!("{scope:?}");
        assert!(debug.contains("POST"));
        assert!(debug.contains("app: false"));
    }
}
