//! Redirect responses.

use http::StatusCode;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::headers::Headers;
use crate::response::{Content, HttpResponse, ResponseHeaders};

/// Characters left as-is in a `Location` header.
///
/// Unreserved characters plus the URL delimiters, so an already-built URL
/// (including existing `%XX` escapes) passes through unchanged.
const LOCATION_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b':')
    .remove(b'/')
    .remove(b'%')
    .remove(b'#')
    .remove(b'?')
    .remove(b'&')
    .remove(b'=')
    .remove(b'@')
    .remove(b'[')
    .remove(b']')
    .remove(b'!')
    .remove(b'$')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';');

/// Percent-encodes a redirect target for the `Location` header.
pub fn encode_location(url: &str) -> String {
    utf8_percent_encode(url, LOCATION_SAFE).to_string()
}

/// A response with an empty body and a `Location` header.
pub struct RedirectResponse;

impl RedirectResponse {
    /// Creates a 307 Temporary Redirect.
    ///
    /// # Examples
    ///
    /// ```
    /// use starling_http::{RedirectResponse, ResponseHeaders};
    ///
    /// let resp = RedirectResponse::new("/search?q=a b");
    /// assert_eq!(resp.headers().get("location"), Some("/search?q=a%20b"));
    /// ```
    pub fn new(url: impl AsRef<str>) -> HttpResponse {
        Self::with_status(url, StatusCode::TEMPORARY_REDIRECT)
    }

    /// Creates a redirect with a custom status code.
    pub fn with_status(url: impl AsRef<str>, status: StatusCode) -> HttpResponse {
        Self::with_headers(url, status, Headers::new())
    }

    /// Creates a redirect with a custom status code and extra headers.
    ///
    /// `Location` always reflects `url`, replacing any value in `headers`.
    pub fn with_headers(url: impl AsRef<str>, status: StatusCode, headers: Headers) -> HttpResponse {
        let mut resp = HttpResponse::new(status, Content::Empty).with_headers(headers);
        resp.headers_mut()
            .insert("location", encode_location(url.as_ref()));
        resp
    }
}
