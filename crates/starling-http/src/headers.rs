//! Response header multi-map and header assembly.
//!
//! [`Headers`] is an ordered association list with a case-folded index for
//! presence checks. Names are stored lowercased, duplicates keep insertion
//! order (repeated `set-cookie` lines, for example), and the three write
//! operations are distinct: [`Headers::append`] always adds,
//! [`Headers::insert`] replaces, [`Headers::set_if_absent`] never overwrites.
//!
//! [`HeaderBuilder`] computes `content-length` and `content-type` for a
//! response and places them ahead of the caller-supplied headers.

use std::collections::HashMap;

use bytes::Bytes;

use starling_core::{StarlingError, StarlingResult};

use crate::encoding::latin1;

/// Header list as handed to the send protocol: lowercased names and values,
/// both latin-1 encoded.
pub type RawHeaders = Vec<(Bytes, Bytes)>;

/// An ordered, case-insensitive header multi-map.
///
/// # Examples
///
/// ```
/// use starling_http::headers::Headers;
///
/// let mut headers = Headers::new();
/// headers.append("Set-Cookie", "a=1");
/// headers.append("set-cookie", "b=2");
/// assert!(!headers.set_if_absent("SET-COOKIE", "c=3"));
/// assert_eq!(headers.get_all("set-cookie"), vec!["a=1", "b=2"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
    /// Lowercased name -> number of entries with that name.
    index: HashMap<String, usize>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header map from name/value pairs, appending each in order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut headers = Self::new();
        for (name, value) in pairs {
            headers.append(name.as_ref(), value);
        }
        headers
    }

    /// Returns the number of entries, counting duplicates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if at least one entry has this name (case-insensitive).
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_ascii_lowercase())
    }

    /// Returns the first value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value stored under `name`, in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Adds an entry, keeping any existing entries with the same name.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let name = name.to_ascii_lowercase();
        *self.index.entry(name.clone()).or_insert(0) += 1;
        self.entries.push((name, value.into()));
    }

    /// Replaces all entries named `name` with a single entry.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.remove(name);
        self.append(name, value);
    }

    /// Adds an entry only if no entry named `name` exists yet.
    ///
    /// Returns `true` if the entry was added.
    pub fn set_if_absent(&mut self, name: &str, value: impl Into<String>) -> bool {
        if self.contains(name) {
            return false;
        }
        self.append(name, value);
        true
    }

    /// Removes every entry named `name`, returning how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let name = name.to_ascii_lowercase();
        let Some(count) = self.index.remove(&name) else {
            return 0;
        };
        self.entries.retain(|(k, _)| *k != name);
        count
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encodes the entries for the send protocol.
    pub fn raw(&self) -> StarlingResult<RawHeaders> {
        self.entries
            .iter()
            .map(|(name, value)| encode_pair(name, value))
            .collect()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Returns the `content-type` value for a media type: text types carry a
/// charset suffix, everything else is passed through.
pub fn content_type_for(media_type: &str, charset: &str) -> String {
    if media_type.starts_with("text/") {
        format!("{media_type}; charset={charset}")
    } else {
        media_type.to_string()
    }
}

/// Assembles the header list sent with `response.start`.
///
/// Computed headers come first and are skipped when the caller already set
/// the same name.
pub struct HeaderBuilder<'a> {
    headers: &'a Headers,
    content_length: Option<usize>,
    content_type: Option<String>,
}

impl<'a> HeaderBuilder<'a> {
    /// Starts from the caller-supplied headers.
    pub const fn new(headers: &'a Headers) -> Self {
        Self {
            headers,
            content_length: None,
            content_type: None,
        }
    }

    /// Computes `content-length` for a body of `len` bytes.
    #[must_use]
    pub const fn content_length(mut self, len: usize) -> Self {
        self.content_length = Some(len);
        self
    }

    /// Computes `content-type` from a media type and charset.
    #[must_use]
    pub fn media_type(mut self, media_type: Option<&str>, charset: &str) -> Self {
        self.content_type = media_type.map(|mt| content_type_for(mt, charset));
        self
    }

    /// Produces the encoded header list.
    pub fn build(self) -> StarlingResult<RawHeaders> {
        let mut raw = Vec::with_capacity(self.headers.len() + 2);

        if let Some(len) = self.content_length {
            if !self.headers.contains("content-length") {
                raw.push((
                    Bytes::from_static(b"content-length"),
                    Bytes::from(len.to_string()),
                ));
            }
        }

        if let Some(content_type) = self.content_type {
            if !self.headers.contains("content-type") {
                raw.push(encode_pair("content-type", &content_type)?);
            }
        }

        raw.extend(self.headers.raw()?);
        Ok(raw)
    }
}

fn encode_pair(name: &str, value: &str) -> StarlingResult<(Bytes, Bytes)> {
    let name = latin1(name)
        .ok_or_else(|| StarlingError::InvalidHeader(format!("header name {name:?} is not latin-1")))?;
    let value = latin1(value).ok_or_else(|| {
        StarlingError::InvalidHeader(format!("value of header {name:?} is not latin-1"))
    })?;
    Ok((name, value))
}
