//! The base response and the header/cookie surface shared by every variant.
//!
//! [`HttpResponse`] holds its whole body in memory and emits exactly two
//! events: `http.response.start`, then one `http.response.body` with
//! `more_body == false`. [`PlainTextResponse`] and [`HtmlResponse`] only fix
//! the media type; JSON and redirect responses (see [`crate::json`] and
//! [`crate::redirect`]) are base responses whose body was rendered at
//! construction.

use bytes::Bytes;
use http::StatusCode;

use starling_core::{StarlingError, StarlingResult, SETTINGS};

use crate::background::{run_background, BackgroundTask};
use crate::cookies::Cookie;
use crate::encoding::encode_text;
use crate::headers::{HeaderBuilder, Headers, RawHeaders};
use crate::protocol::{Message, Sender};

/// The charset used when neither the response nor the settings set one.
pub const DEFAULT_CHARSET: &str = "utf-8";

/// The configured default charset.
pub(crate) fn default_charset() -> String {
    SETTINGS
        .try_get()
        .map_or(DEFAULT_CHARSET, |settings| settings.default_charset.as_str())
        .to_string()
}

/// The body content of a base response.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Content {
    /// No content; renders as an empty body.
    #[default]
    Empty,
    /// Raw bytes, passed through unchanged.
    Bytes(Bytes),
    /// Text, encoded with the response charset.
    Text(String),
}

impl std::fmt::Debug for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Text(t) => f
                .debug_tuple("Text")
                .field(&t.chars().take(100).collect::<String>())
                .finish(),
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for Content {
    fn from(bytes: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(bytes))
    }
}

impl From<Bytes> for Content {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl<T: Into<Self>> From<Option<T>> for Content {
    fn from(content: Option<T>) -> Self {
        content.map_or(Self::Empty, Into::into)
    }
}

/// Builds a status code from a raw integer, accepting 100 through 599.
pub fn status_from_u16(code: u16) -> StarlingResult<StatusCode> {
    if !(100..=599).contains(&code) {
        return Err(StarlingError::ConfigurationError(format!(
            "invalid status code: {code}"
        )));
    }
    StatusCode::from_u16(code)
        .map_err(|e| StarlingError::ConfigurationError(format!("invalid status code {code}: {e}")))
}

/// Header and cookie access shared by every response variant.
pub trait ResponseHeaders {
    /// Returns the caller-supplied headers.
    fn headers(&self) -> &Headers;

    /// Returns the caller-supplied headers for modification.
    fn headers_mut(&mut self) -> &mut Headers;

    /// Appends a `Set-Cookie` header; earlier cookies are kept.
    fn set_cookie(&mut self, cookie: &Cookie) {
        self.headers_mut()
            .append("set-cookie", cookie.to_set_cookie_header());
    }

    /// Appends the `Set-Cookie` header that deletes `key`.
    fn delete_cookie(&mut self, key: &str, path: &str, domain: Option<&str>) {
        let mut cookie = Cookie::removal(key).path(path);
        if let Some(domain) = domain {
            cookie = cookie.domain(domain);
        }
        self.set_cookie(&cookie);
    }
}

/// An in-memory HTTP response.
///
/// # Examples
///
/// ```
/// use starling_http::{HttpResponse, ResponseHeaders};
/// use starling_http::cookies::Cookie;
///
/// let mut response = HttpResponse::ok("Hello, World!").with_media_type("text/plain");
/// response.set_cookie(&Cookie::new("theme", "dark"));
/// assert_eq!(response.status(), http::StatusCode::OK);
/// assert_eq!(response.render().unwrap().len(), 13);
/// ```
pub struct HttpResponse {
    status: StatusCode,
    headers: Headers,
    content: Content,
    media_type: Option<String>,
    charset: String,
    background: Option<BackgroundTask>,
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("media_type", &self.media_type)
            .field("charset", &self.charset)
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}

impl HttpResponse {
    /// Creates a response with the given status and content, and no media type.
    pub fn new(status: StatusCode, content: impl Into<Content>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            content: content.into(),
            media_type: None,
            charset: default_charset(),
            background: None,
        }
    }

    /// Creates a 200 OK response.
    pub fn ok(content: impl Into<Content>) -> Self {
        Self::new(StatusCode::OK, content)
    }

    /// Creates a response with no content.
    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, Content::Empty)
    }

    /// Sets the media type.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Sets the charset used for text content and the `content-type` suffix.
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

    /// Appends every header in `headers`.
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        for (name, value) in headers.iter() {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the background task.
    #[must_use]
    pub fn with_background(mut self, task: BackgroundTask) -> Self {
        self.background = Some(task);
        self
    }

    /// Returns the status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns the media type.
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// Sets the media type.
    pub fn set_media_type(&mut self, media_type: impl Into<String>) {
        self.media_type = Some(media_type.into());
    }

    /// Returns the charset.
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Returns the content.
    pub const fn content(&self) -> &Content {
        &self.content
    }

    /// Returns `true` if a background task is attached.
    pub const fn has_background(&self) -> bool {
        self.background.is_some()
    }

    /// Renders the content to the exact bytes that will be sent.
    pub fn render(&self) -> StarlingResult<Bytes> {
        match &self.content {
            Content::Empty => Ok(Bytes::new()),
            Content::Bytes(bytes) => Ok(bytes.clone()),
            Content::Text(text) => encode_text(text, &self.charset),
        }
    }

    /// Computes the header list for a rendered body.
    pub fn build_headers(&self, body: &Bytes) -> StarlingResult<RawHeaders> {
        HeaderBuilder::new(&self.headers)
            .content_length(body.len())
            .media_type(self.media_type.as_deref(), &self.charset)
            .build()
    }

    /// Emits the response: start, the whole body, then the background task.
    pub async fn send_to(self, send: &mut dyn Sender) -> StarlingResult<()> {
        let body = self.render()?;
        let headers = self.build_headers(&body)?;

        tracing::debug!(status = %self.status, bytes = body.len(), "sending response");
        send.send(Message::start(self.status, headers)).await?;
        send.send(Message::body(body, false)).await?;

        run_background(self.background).await
    }
}

impl ResponseHeaders for HttpResponse {
    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }
}

/// A `text/plain` response.
pub struct PlainTextResponse;

impl PlainTextResponse {
    /// Creates a 200 OK plain-text response.
    pub fn new(content: impl Into<Content>) -> HttpResponse {
        HttpResponse::ok(content).with_media_type("text/plain")
    }

    /// Creates a plain-text response with a custom status code.
    pub fn with_status(status: StatusCode, content: impl Into<Content>) -> HttpResponse {
        HttpResponse::new(status, content).with_media_type("text/plain")
    }
}

/// A `text/html` response.
pub struct HtmlResponse;

impl HtmlResponse {
    /// Creates a 200 OK HTML response.
    pub fn new(content: impl Into<Content>) -> HttpResponse {
        HttpResponse::ok(content).with_media_type("text/html")
    }

    /// Creates an HTML response with a custom status code.
    pub fn with_status(status: StatusCode, content: impl Into<Content>) -> HttpResponse {
        HttpResponse::new(status, content).with_media_type("text/html")
    }
}
