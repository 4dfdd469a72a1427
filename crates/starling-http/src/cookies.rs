//! Cookie directives for responses.
//!
//! A [`Cookie`] serializes to exactly one `Set-Cookie` header value. Setting
//! a cookie on a response always appends a new header line, so several
//! cookies coexist; deleting a cookie is the same directive with an empty
//! value that expired at the epoch.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::date::{epoch, http_date};

/// The `SameSite` attribute for cookies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// Cookies are only sent with same-site requests.
    Strict,
    /// Cookies are sent with top-level navigations.
    Lax,
    /// Cookies are sent with all requests (requires Secure).
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "Strict"),
            Self::Lax => write!(f, "Lax"),
            Self::None => write!(f, "None"),
        }
    }
}

/// A cookie to be set on an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// The cookie key.
    pub key: String,
    /// The cookie value.
    pub value: String,
    /// Maximum age in seconds. `None` means session cookie.
    pub max_age: Option<u64>,
    /// Absolute expiry.
    pub expires: Option<DateTime<Utc>>,
    /// The path for which the cookie is valid.
    pub path: String,
    /// The domain for which the cookie is valid.
    pub domain: Option<String>,
    /// Whether the cookie should only be sent over HTTPS.
    pub secure: bool,
    /// Whether the cookie is inaccessible to JavaScript.
    pub httponly: bool,
    /// The `SameSite` attribute.
    pub samesite: Option<SameSite>,
}

impl Cookie {
    /// Creates a new cookie with the given key and value, and path `/`.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            max_age: None,
            expires: None,
            path: "/".to_string(),
            domain: None,
            secure: false,
            httponly: false,
            samesite: None,
        }
    }

    /// Creates the directive that deletes `key`: empty value, `Max-Age=0`
    /// and an expiry at the epoch.
    pub fn removal(key: impl Into<String>) -> Self {
        Self::new(key, "").max_age(0).expires(epoch())
    }

    /// Sets the max age.
    #[must_use]
    pub const fn max_age(mut self, max_age: u64) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Sets the expiry.
    #[must_use]
    pub const fn expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Sets the path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the domain.
    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the secure flag.
    #[must_use]
    pub const fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the httponly flag.
    #[must_use]
    pub const fn httponly(mut self, httponly: bool) -> Self {
        self.httponly = httponly;
        self
    }

    /// Sets the `SameSite` attribute.
    #[must_use]
    pub const fn samesite(mut self, samesite: SameSite) -> Self {
        self.samesite = Some(samesite);
        self
    }

    /// Formats this cookie as a `Set-Cookie` header value.
    pub fn to_set_cookie_header(&self) -> String {
        let mut parts = vec![format!("{}={}", self.key, quote_value(&self.value))];

        if let Some(max_age) = self.max_age {
            parts.push(format!("Max-Age={max_age}"));
        }

        if let Some(expires) = self.expires {
            parts.push(format!("Expires={}", http_date(expires)));
        }

        parts.push(format!("Path={}", self.path));

        if let Some(ref domain) = self.domain {
            parts.push(format!("Domain={domain}"));
        }

        if self.secure {
            parts.push("Secure".to_string());
        }

        if self.httponly {
            parts.push("HttpOnly".to_string());
        }

        if let Some(samesite) = self.samesite {
            parts.push(format!("SameSite={samesite}"));
        }

        parts.join("; ")
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_set_cookie_header())
    }
}

const fn is_cookie_safe(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|'
                | '~' | ':'
        )
}

/// Quotes a cookie value that contains characters outside the cookie-safe set.
///
/// Quoted values escape `"` and `\` with a backslash, and control or
/// latin-1 range characters as three-digit octal escapes.
fn quote_value(value: &str) -> String {
    if value.chars().all(is_cookie_safe) {
        return value.to_string();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        let code = u32::from(c);
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            _ if code < 0x20 || (0x7f..=0xff).contains(&code) => {
                quoted.push_str(&format!("\\{code:03o}"));
            }
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
