//! Template-rendered responses and the renderer seam.

use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;

use starling_core::{StarlingError, StarlingResult};

use crate::background::{run_background, BackgroundTask};
use crate::encoding::encode_text;
use crate::headers::{HeaderBuilder, Headers};
use crate::protocol::{Message, Sender};
use crate::response::{default_charset, ResponseHeaders};
use crate::scope::{Scope, TEMPLATE_EXTENSION};

/// Renders a named template with a JSON context.
///
/// Implemented by the template engine integration; a response never picks an
/// engine on its own.
pub trait TemplateRenderer: Send + Sync {
    /// Renders `name` to a string.
    fn render_template(&self, name: &str, context: &serde_json::Value) -> StarlingResult<String>;
}

/// A response whose body is a rendered template.
///
/// The renderer is either attached up front with
/// [`TemplateResponse::with_renderer`] or taken from the scope's app when the
/// response is sent.
pub struct TemplateResponse {
    template: String,
    context: serde_json::Value,
    status: StatusCode,
    headers: Headers,
    media_type: String,
    charset: String,
    renderer: Option<Arc<dyn TemplateRenderer>>,
    background: Option<BackgroundTask>,
}

impl std::fmt::Debug for TemplateResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateResponse")
            .field("template", &self.template)
            .field("status", &self.status)
            .field("media_type", &self.media_type)
            .field("has_renderer", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}

impl TemplateResponse {
    /// Creates a 200 OK `text/html` response for `template`.
    pub fn new(template: impl Into<String>, context: serde_json::Value) -> Self {
        Self {
            template: template.into(),
            context,
            status: StatusCode::OK,
            headers: Headers::new(),
            media_type: "text/html".to_string(),
            charset: default_charset(),
            renderer: None,
            background: None,
        }
    }

    /// Attaches the renderer used at send time.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Sets the status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets the media type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    /// Sets the charset.
    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Appends a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the background task.
    #[must_use]
    pub fn with_background(mut self, task: BackgroundTask) -> Self {
        self.background = Some(task);
        self
    }

    /// Returns the template name.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the render context.
    pub const fn context(&self) -> &serde_json::Value {
        &self.context
    }

    /// Returns the status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Renders and encodes the body with `renderer`.
    pub fn render(&self, renderer: &dyn TemplateRenderer) -> StarlingResult<Bytes> {
        let text = renderer.render_template(&self.template, &self.context)?;
        encode_text(&text, &self.charset)
    }

    /// Emits the response.
    ///
    /// When the scope advertises [`TEMPLATE_EXTENSION`] a template event
    /// precedes the start event.
    pub async fn send_to(self, scope: &Scope, send: &mut dyn Sender) -> StarlingResult<()> {
        let renderer = self
            .renderer
            .clone()
            .or_else(|| scope.app().cloned())
            .ok_or_else(|| {
                StarlingError::ConfigurationError(format!(
                    "no template renderer available for {:?}",
                    self.template
                ))
            })?;

        let body = self.render(renderer.as_ref())?;
        let raw = HeaderBuilder::new(&self.headers)
            .content_length(body.len())
            .media_type(Some(&self.media_type), &self.charset)
            .build()?;

        if scope.supports_extension(TEMPLATE_EXTENSION) {
            send.send(Message::Template {
                template: self.template.clone(),
                context: self.context.clone(),
            })
            .await?;
        }

        tracing::debug!(template = %self.template, bytes = body.len(), "sending rendered template");
        send.send(Message::start(self.status, raw)).await?;
        send.send(Message::body(body, false)).await?;

        run_background(self.background).await
    }
}

impl ResponseHeaders for TemplateResponse {
    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }
}
