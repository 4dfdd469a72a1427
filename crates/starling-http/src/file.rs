//! File download responses.
//!
//! A [`FileResponse`] reads its file in fixed-size chunks at send time. The
//! stat-derived headers (`content-length`, `last-modified`, `etag`) come from
//! a precomputed [`FileStat`] or from an async stat right before the start
//! event. The ETag is a digest of modification time and size, not of the
//! content.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use http::{Method, StatusCode};
use md5::{Digest, Md5};
use tokio::io::{AsyncRead, AsyncReadExt};

use starling_core::{StarlingError, StarlingResult, SETTINGS};

use crate::background::{run_background, BackgroundTask};
use crate::capabilities::Capabilities;
use crate::date::http_date_from_system;
use crate::headers::{HeaderBuilder, Headers};
use crate::protocol::{Message, Sender};
use crate::response::{default_charset, ResponseHeaders};
use crate::scope::Scope;

/// Default number of bytes per body event.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// The subset of file metadata a response needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
    /// Whether the path names a regular file.
    pub is_file: bool,
}

impl FileStat {
    /// Describes a regular file.
    pub const fn new(size: u64, modified: SystemTime) -> Self {
        Self {
            size,
            modified,
            is_file: true,
        }
    }

    /// Extracts the fields from filesystem metadata.
    pub fn from_metadata(metadata: &std::fs::Metadata) -> StarlingResult<Self> {
        Ok(Self {
            size: metadata.len(),
            modified: metadata.modified()?,
            is_file: metadata.is_file(),
        })
    }

    /// Modification time as fractional seconds since the Unix epoch.
    fn mtime_secs(&self) -> f64 {
        match self.modified.duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_secs_f64(),
            Err(before) => -before.duration().as_secs_f64(),
        }
    }
}

/// Computes the weak validator for a file: the hex MD5 of
/// `"<mtime>-<size>"`, with mtime in fractional seconds.
pub fn etag(stat: &FileStat) -> String {
    let base = format!("{:?}-{}", stat.mtime_secs(), stat.size);
    hex::encode(Md5::digest(base.as_bytes()))
}

/// Guesses a media type from a file name's extension, defaulting to
/// `text/plain`.
pub fn guess_media_type(name: &Path) -> &'static str {
    let Some(ext) = name.extension().and_then(|ext| ext.to_str()) else {
        return "text/plain";
    };
    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/vnd.microsoft.icon",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "wasm" => "application/wasm",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "bin" => "application/octet-stream",
        _ => "text/plain",
    }
}

/// Reads up to `size` bytes, stopping early only at end of input.
pub async fn read_chunk<R>(reader: &mut R, size: usize) -> std::io::Result<Bytes>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = vec![0u8; size];
    let mut filled = 0;
    while filled < size {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(Bytes::from(buf))
}

fn apply_stat_headers(headers: &mut Headers, stat: &FileStat) {
    headers.set_if_absent("content-length", stat.size.to_string());
    headers.set_if_absent("last-modified", http_date_from_system(stat.modified));
    headers.set_if_absent("etag", etag(stat));
}

async fn stat_path(path: &Path) -> StarlingResult<FileStat> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => FileStat::from_metadata(&metadata),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(StarlingError::NotFound(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// A response that sends a file from disk.
///
/// # Examples
///
/// ```no_run
/// use starling_http::{Capabilities, FileResponse};
///
/// let resp = FileResponse::new(&Capabilities::detect(), "reports/q3.pdf")
///     .unwrap()
///     .with_filename("q3-report.pdf");
/// # drop(resp);
/// ```
pub struct FileResponse {
    path: PathBuf,
    status: StatusCode,
    headers: Headers,
    media_type: Option<String>,
    charset: String,
    filename: Option<String>,
    stat: Option<FileStat>,
    head_only: bool,
    chunk_size: usize,
    background: Option<BackgroundTask>,
}

impl std::fmt::Debug for FileResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileResponse")
            .field("path", &self.path)
            .field("status", &self.status)
            .field("filename", &self.filename)
            .field("stat", &self.stat)
            .field("head_only", &self.head_only)
            .finish_non_exhaustive()
    }
}

impl FileResponse {
    /// Creates a 200 OK response for `path`; the file is stat'ed when sent.
    pub fn new(caps: &Capabilities, path: impl Into<PathBuf>) -> StarlingResult<Self> {
        caps.require_file()?;
        let chunk_size = SETTINGS
            .try_get()
            .map_or(DEFAULT_CHUNK_SIZE, |settings| settings.file_chunk_size)
            .max(1);
        Ok(Self {
            path: path.into(),
            status: StatusCode::OK,
            headers: Headers::new(),
            media_type: None,
            charset: default_charset(),
            filename: None,
            stat: None,
            head_only: false,
            chunk_size,
            background: None,
        })
    }

    /// Uses a precomputed stat; the stat headers are set immediately.
    #[must_use]
    pub fn with_stat(mut self, stat: FileStat) -> Self {
        apply_stat_headers(&mut self.headers, &stat);
        self.stat = Some(stat);
        self
    }

    /// Sends the file as a download named `filename`.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Records the request method; `HEAD` sends headers only.
    #[must_use]
    pub fn with_method(mut self, method: &Method) -> Self {
        self.head_only = *method == Method::HEAD;
        self
    }

    /// Sets the status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Overrides the media type guessed from the file name.
    #[must_use]
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Sets the charset advertised for text media types.
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

    /// Sets the number of bytes read per body event.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Sets the background task.
    #[must_use]
    pub fn with_background(mut self, task: BackgroundTask) -> Self {
        self.background = Some(task);
        self
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the media type: the explicit one, or a guess from the download
    /// name or path.
    pub fn media_type(&self) -> &str {
        self.media_type.as_deref().unwrap_or_else(|| {
            let name = self.filename.as_deref().map_or(self.path.as_path(), Path::new);
            guess_media_type(name)
        })
    }

    /// Emits the response.
    ///
    /// Stat failures are reported before any event. Once the start event is
    /// out, a file that can no longer be opened or read surfaces as an I/O
    /// error.
    pub async fn send_to(mut self, scope: &Scope, send: &mut dyn Sender) -> StarlingResult<()> {
        let stat = match self.stat {
            Some(stat) => stat,
            None => {
                let stat = stat_path(&self.path).await?;
                apply_stat_headers(&mut self.headers, &stat);
                stat
            }
        };
        if !stat.is_file {
            return Err(StarlingError::InvalidTarget(self.path.display().to_string()));
        }

        if let Some(filename) = &self.filename {
            self.headers
                .set_if_absent("content-disposition", format!("attachment; filename=\"{filename}\""));
        }

        let raw = HeaderBuilder::new(&self.headers)
            .media_type(Some(self.media_type()), &self.charset)
            .build()?;
        send.send(Message::start(self.status, raw)).await?;

        if self.head_only || scope.is_head() {
            send.send(Message::end()).await?;
            tracing::debug!(path = %self.path.display(), "sent file headers only");
        } else {
            let mut file = tokio::fs::File::open(&self.path).await?;
            let mut chunks = 0usize;
            loop {
                let chunk = read_chunk(&mut file, self.chunk_size).await?;
                let more_body = chunk.len() == self.chunk_size;
                send.send(Message::body(chunk, more_body)).await?;
                chunks += 1;
                if !more_body {
                    break;
                }
            }
            tracing::debug!(path = %self.path.display(), chunks, "sent file");
        }

        run_background(self.background).await
    }
}

impl ResponseHeaders for FileResponse {
    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }
}
