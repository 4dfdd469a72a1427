//! # starling-http
//!
//! Outbound response layer. Every response variant translates its content
//! into the events of an ASGI-style send protocol: a start event with status
//! and headers, one or more body events, and optionally a template event.
//!
//! ## Modules
//!
//! - [`response`] - Base response, plain-text and HTML variants, header/cookie access
//! - [`json`] - Strict compact JSON responses
//! - [`redirect`] - Redirects with an encoded `Location`
//! - [`streaming`] - Chunked bodies from async streams or blocking iterators
//! - [`file`] - File downloads read in chunks
//! - [`template`] - Template-rendered responses and the renderer seam
//! - [`respond`] - The [`Response`] sum type and the [`Respond`] trait
//! - [`protocol`] - Send protocol events and sinks
//! - [`headers`] - Header multi-map and header assembly
//! - [`cookies`] - `Set-Cookie` formatting
//! - [`scope`] - Request scope seen by a response
//! - [`capabilities`] - Optional variants available in this process

pub mod background;
pub mod capabilities;
pub mod cookies;
pub mod date;
pub mod encoding;
pub mod file;
pub mod headers;
pub mod json;
pub mod protocol;
pub mod redirect;
pub mod respond;
pub mod response;
pub mod scope;
pub mod streaming;
pub mod template;

pub use background::BackgroundTask;
pub use capabilities::Capabilities;
pub use cookies::{Cookie, SameSite};
pub use file::{FileResponse, FileStat};
pub use headers::Headers;
pub use json::JsonResponse;
pub use protocol::{Message, Sender};
pub use redirect::RedirectResponse;
pub use respond::{Respond, Response};
pub use response::{Content, HtmlResponse, HttpResponse, PlainTextResponse, ResponseHeaders};
pub use scope::Scope;
pub use streaming::{Chunk, StreamingResponse};
pub use template::{TemplateRenderer, TemplateResponse};
