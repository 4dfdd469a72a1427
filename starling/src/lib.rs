//! # starling
//!
//! Outbound response layer for an ASGI-style async web framework.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `starling` to get every response variant, or depend on
//! individual crates for finer-grained control. The `json`, `file` and
//! `template` features switch the optional variants on and off.

/// Settings, logging setup, and error types.
pub use starling_core as core;

/// Response variants, headers, cookies, and the send protocol.
pub use starling_http as http;

/// Tera-backed template rendering.
#[cfg(feature = "template")]
pub use starling_template as template;

/// Third-party crates used in public signatures.
pub mod deps {
    pub use async_trait;
    pub use bytes;
    pub use http;
    pub use serde_json;
    pub use tokio;
    pub use tracing;
}

/// The types most handlers need.
pub mod prelude {
    pub use starling_core::{StarlingError, StarlingResult};
    pub use starling_http::{
        BackgroundTask, Capabilities, Cookie, FileResponse, HtmlResponse, HttpResponse,
        JsonResponse, PlainTextResponse, RedirectResponse, Respond, Response, ResponseHeaders,
        Scope, Sender, StreamingResponse, TemplateResponse,
    };

    #[cfg(feature = "template")]
    pub use starling_template::Templates;
}
