//! Streaming responses.
//!
//! The body is produced chunk by chunk and never buffered. A response is sent
//! as a start event without `content-length`, one body event per chunk with
//! `more_body == true`, and a final empty body event.
//!
//! Synchronous iterators run on tokio's blocking pool and hand their chunks
//! over a bounded channel, so a slow producer never stalls the runtime.

use std::future::{poll_fn, Future};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use futures_core::Stream;
use http::StatusCode;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use starling_core::{StarlingError, StarlingResult, SETTINGS};

use crate::background::{run_background, BackgroundTask};
use crate::encoding::encode_text;
use crate::headers::{HeaderBuilder, Headers};
use crate::protocol::{Message, Sender};
use crate::response::{default_charset, ResponseHeaders};

const DEFAULT_STREAM_BUFFER: usize = 16;

/// One piece of a streamed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Raw bytes, sent unchanged.
    Bytes(Bytes),
    /// Text, encoded with the response charset.
    Text(String),
}

impl From<Bytes> for Chunk {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for Chunk {
    fn from(bytes: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(bytes))
    }
}

impl From<String> for Chunk {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Chunk {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// A boxed stream of body chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = StarlingResult<Chunk>> + Send>>;

type BoxIter = Box<dyn Iterator<Item = StarlingResult<Chunk>> + Send>;

/// A response whose body is produced incrementally.
///
/// # Examples
///
/// ```
/// use starling_http::StreamingResponse;
///
/// let resp = StreamingResponse::from_iter(vec!["id,name\n", "1,ada\n"])
///     .with_media_type("text/csv");
/// assert_eq!(resp.status(), http::StatusCode::OK);
/// ```
pub struct StreamingResponse {
    status: StatusCode,
    headers: Headers,
    media_type: Option<String>,
    charset: String,
    body: ChunkStream,
    background: Option<BackgroundTask>,
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("media_type", &self.media_type)
            .field("charset", &self.charset)
            .finish_non_exhaustive()
    }
}

impl StreamingResponse {
    /// Streams an async producer.
    pub fn new<S, C>(stream: S) -> Self
    where
        S: Stream<Item = StarlingResult<C>> + Send + 'static,
        C: Into<Chunk>,
    {
        Self::from_body(Box::pin(IntoChunks {
            inner: Box::pin(stream),
        }))
    }

    /// Streams a synchronous iterator of chunks.
    ///
    /// The iterator runs on the blocking pool once the response is sent.
    #[allow(clippy::should_implement_trait)]
    pub fn from_iter<I, C>(iter: I) -> Self
    where
        I: IntoIterator<Item = C>,
        I::IntoIter: Send + 'static,
        C: Into<Chunk> + 'static,
    {
        Self::try_from_iter(iter.into_iter().map(Ok::<C, StarlingError>))
    }

    /// Streams a synchronous iterator whose items may fail.
    ///
    /// The first error ends the stream; chunks sent before it stay sent.
    pub fn try_from_iter<I, C>(iter: I) -> Self
    where
        I: IntoIterator<Item = StarlingResult<C>>,
        I::IntoIter: Send + 'static,
        C: Into<Chunk> + 'static,
    {
        let iter: BoxIter = Box::new(iter.into_iter().map(|item| item.map(Into::into)));
        Self::from_body(Box::pin(BlockingIter::new(iter, stream_buffer())))
    }

    fn from_body(body: ChunkStream) -> Self {
        Self {
            status: StatusCode::OK,
            headers: Headers::new(),
            media_type: None,
            charset: default_charset(),
            body,
            background: None,
        }
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
        self.media_type = Some(media_type.into());
        self
    }

    /// Sets the charset used for text chunks.
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

    /// Returns the status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the media type.
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// Emits the response: start, one event per chunk, the final empty event,
    /// then the background task.
    pub async fn send_to(self, send: &mut dyn Sender) -> StarlingResult<()> {
        let Self {
            status,
            headers,
            media_type,
            charset,
            mut body,
            background,
        } = self;

        let raw = HeaderBuilder::new(&headers)
            .media_type(media_type.as_deref(), &charset)
            .build()?;
        send.send(Message::start(status, raw)).await?;

        let mut chunks = 0usize;
        while let Some(chunk) = poll_fn(|cx| body.as_mut().poll_next(cx)).await {
            let bytes = match chunk? {
                Chunk::Bytes(bytes) => bytes,
                Chunk::Text(text) => encode_text(&text, &charset)?,
            };
            send.send(Message::body(bytes, true)).await?;
            chunks += 1;
        }
        send.send(Message::end()).await?;
        tracing::debug!(status = %status, chunks, "streamed response");

        run_background(background).await
    }
}

impl ResponseHeaders for StreamingResponse {
    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }
}

fn stream_buffer() -> usize {
    SETTINGS
        .try_get()
        .map_or(DEFAULT_STREAM_BUFFER, |settings| settings.stream_buffer)
        .max(1)
}

struct IntoChunks<S> {
    inner: Pin<Box<S>>,
}

impl<S, C> Stream for IntoChunks<S>
where
    S: Stream<Item = StarlingResult<C>>,
    C: Into<Chunk>,
{
    type Item = StarlingResult<Chunk>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner
            .as_mut()
            .poll_next(cx)
            .map(|item| item.map(|chunk| chunk.map(Into::into)))
    }
}

/// Drives a synchronous iterator on the blocking pool.
///
/// Nothing runs until the first poll. The producer stops after yielding an
/// error or when the receiving side is dropped.
struct BlockingIter {
    pending: Option<(BoxIter, usize)>,
    rx: Option<mpsc::Receiver<StarlingResult<Chunk>>>,
    handle: Option<JoinHandle<()>>,
}

impl BlockingIter {
    fn new(iter: BoxIter, buffer: usize) -> Self {
        Self {
            pending: Some((iter, buffer)),
            rx: None,
            handle: None,
        }
    }
}

fn produce(iter: BoxIter, tx: &mpsc::Sender<StarlingResult<Chunk>>) {
    for item in iter {
        let failed = item.is_err();
        if tx.blocking_send(item).is_err() || failed {
            break;
        }
    }
}

impl Stream for BlockingIter {
    type Item = StarlingResult<Chunk>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some((iter, buffer)) = this.pending.take() {
            let (tx, rx) = mpsc::channel(buffer);
            this.handle = Some(tokio::task::spawn_blocking(move || produce(iter, &tx)));
            this.rx = Some(rx);
        }

        if let Some(rx) = this.rx.as_mut() {
            match rx.poll_recv(cx) {
                Poll::Ready(Some(item)) => return Poll::Ready(Some(item)),
                Poll::Ready(None) => this.rx = None,
                Poll::Pending => return Poll::Pending,
            }
        }

        if let Some(handle) = this.handle.as_mut() {
            let joined = ready!(Pin::new(handle).poll(cx));
            this.handle = None;
            if let Err(e) = joined {
                tracing::warn!(error = %e, "stream producer failed");
                return Poll::Ready(Some(Err(StarlingError::ProducerFailed(e.to_string()))));
            }
        }

        Poll::Ready(None)
    }
}
