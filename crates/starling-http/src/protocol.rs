//! The send protocol between a response and its host server.
//!
//! A response talks to the host exclusively through [`Message`]s handed to a
//! [`Sender`]: one `http.response.start`, then `http.response.body` events
//! until one arrives with `more_body == false`. Hosts that advertise the
//! `http.response.template` extension also receive a template event first.

use async_trait::async_trait;
use bytes::Bytes;
use http::StatusCode;

use starling_core::{StarlingError, StarlingResult};

use crate::headers::RawHeaders;

/// One protocol event.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// `http.response.start`: status line and headers.
    Start {
        /// The response status.
        status: StatusCode,
        /// Encoded header pairs.
        headers: RawHeaders,
    },
    /// `http.response.body`: a chunk of the body.
    Body {
        /// The chunk payload.
        body: Bytes,
        /// Whether more body events follow.
        more_body: bool,
    },
    /// `http.response.template`: which template and context produced the body.
    Template {
        /// The template name.
        template: String,
        /// The context the template was rendered with.
        context: serde_json::Value,
    },
}

impl Message {
    /// Builds a start event.
    pub const fn start(status: StatusCode, headers: RawHeaders) -> Self {
        Self::Start { status, headers }
    }

    /// Builds a body event.
    pub const fn body(body: Bytes, more_body: bool) -> Self {
        Self::Body { body, more_body }
    }

    /// Builds the empty body event that ends a response.
    pub const fn end() -> Self {
        Self::Body {
            body: Bytes::new(),
            more_body: false,
        }
    }

    /// Returns the protocol `type` discriminator.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Start { .. } => "http.response.start",
            Self::Body { .. } => "http.response.body",
            Self::Template { .. } => "http.response.template",
        }
    }
}

/// The asynchronous sink a response emits its events into.
///
/// A failing send (for example after a client disconnect) aborts emission;
/// the error is returned unchanged to the caller.
#[async_trait]
pub trait Sender: Send {
    /// Hands one event to the host.
    async fn send(&mut self, message: Message) -> StarlingResult<()>;
}

/// Collects every event in memory. Mostly useful for tests and for hosts that
/// buffer whole responses.
#[async_trait]
impl Sender for Vec<Message> {
    async fn send(&mut self, message: Message) -> StarlingResult<()> {
        self.push(message);
        Ok(())
    }
}

/// Forwards events into a bounded channel drained by the host's connection task.
#[async_trait]
impl Sender for tokio::sync::mpsc::Sender<Message> {
    async fn send(&mut self, message: Message) -> StarlingResult<()> {
        let kind = message.kind();
        tokio::sync::mpsc::Sender::send(self, message)
            .await
            .map_err(|_| StarlingError::Disconnected(format!("receiver dropped before {kind}")))
    }
}
