//! Dispatch over every response variant.

use async_trait::async_trait;
use http::StatusCode;
use tracing::Instrument;

use starling_core::logging::response_span;
use starling_core::StarlingResult;

use crate::file::FileResponse;
use crate::headers::Headers;
use crate::protocol::Sender;
use crate::response::{HttpResponse, ResponseHeaders};
use crate::scope::Scope;
use crate::streaming::StreamingResponse;
use crate::template::TemplateResponse;

/// Emits a response through the send protocol.
///
/// A response is consumed by the call; it can be sent once.
#[async_trait]
pub trait Respond: Send {
    /// Sends every event of this response, then runs its background task.
    async fn respond(self, scope: &Scope, send: &mut dyn Sender) -> StarlingResult<()>;
}

/// Any response a handler can return.
///
/// Plain-text, HTML, JSON and redirect responses are all [`HttpResponse`]s;
/// they differ only in how their body was rendered at construction.
#[derive(Debug)]
pub enum Response {
    /// A fully buffered body.
    Http(HttpResponse),
    /// A body produced chunk by chunk.
    Streaming(StreamingResponse),
    /// A file read from disk.
    File(FileResponse),
    /// A rendered template.
    Template(TemplateResponse),
}

impl Response {
    /// Returns the status code.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Http(r) => r.status(),
            Self::Streaming(r) => r.status(),
            Self::File(r) => r.status(),
            Self::Template(r) => r.status(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Streaming(_) => "streaming",
            Self::File(_) => "file",
            Self::Template(_) => "template",
        }
    }
}

impl From<HttpResponse> for Response {
    fn from(response: HttpResponse) -> Self {
        Self::Http(response)
    }
}

impl From<StreamingResponse> for Response {
    fn from(response: StreamingResponse) -> Self {
        Self::Streaming(response)
    }
}

impl From<FileResponse> for Response {
    fn from(response: FileResponse) -> Self {
        Self::File(response)
    }
}

impl From<TemplateResponse> for Response {
    fn from(response: TemplateResponse) -> Self {
        Self::Template(response)
    }
}

impl ResponseHeaders for Response {
    fn headers(&self) -> &Headers {
        match self {
            Self::Http(r) => r.headers(),
            Self::Streaming(r) => r.headers(),
            Self::File(r) => r.headers(),
            Self::Template(r) => r.headers(),
        }
    }

    fn headers_mut(&mut self) -> &mut Headers {
        match self {
            Self::Http(r) => r.headers_mut(),
            Self::Streaming(r) => r.headers_mut(),
            Self::File(r) => r.headers_mut(),
            Self::Template(r) => r.headers_mut(),
        }
    }
}

#[async_trait]
impl Respond for Response {
    async fn respond(self, scope: &Scope, send: &mut dyn Sender) -> StarlingResult<()> {
        let span = response_span(scope.method().as_str(), scope.path());
        let kind = self.kind();
        let status = self.status();

        let result = async {
            match self {
                Self::Http(r) => r.send_to(send).await,
                Self::Streaming(r) => r.send_to(send).await,
                Self::File(r) => r.send_to(scope, send).await,
                Self::Template(r) => r.send_to(scope, send).await,
            }
        }
        .instrument(span)
        .await;

        if let Err(e) = &result {
            tracing::warn!(kind, status = status.as_u16(), error = %e, "response emission failed");
        }
        result
    }
}

#[async_trait]
impl Respond for HttpResponse {
    async fn respond(self, scope: &Scope, send: &mut dyn Sender) -> StarlingResult<()> {
        Response::from(self).respond(scope, send).await
    }
}

#[async_trait]
impl Respond for StreamingResponse {
    async fn respond(self, scope: &Scope, send: &mut dyn Sender) -> StarlingResult<()> {
        Response::from(self).respond(scope, send).await
    }
}

#[async_trait]
impl Respond for FileResponse {
    async fn respond(self, scope: &Scope, send: &mut dyn Sender) -> StarlingResult<()> {
        Response::from(self).respond(scope, send).await
    }
}

#[async_trait]
impl Respond for TemplateResponse {
    async fn respond(self, scope: &Scope, send: &mut dyn Sender) -> StarlingResult<()> {
        Response::from(self).respond(scope, send).await
    }
}
