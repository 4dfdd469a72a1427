//! Text encoding for bodies and header metadata.

use bytes::Bytes;

use starling_core::{StarlingError, StarlingResult};

/// Encodes `text` as latin-1, or returns `None` if a character is above U+00FF.
pub fn latin1(text: &str) -> Option<Bytes> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect::<Option<Vec<u8>>>()
        .map(Bytes::from)
}

/// Encodes a text body with the response charset.
///
/// Supports UTF-8, ISO-8859-1 and US-ASCII under their common aliases.
pub fn encode_text(text: &str, charset: &str) -> StarlingResult<Bytes> {
    match charset.to_ascii_lowercase().replace('_', "-").as_str() {
        "utf-8" | "utf8" => Ok(Bytes::copy_from_slice(text.as_bytes())),
        "iso-8859-1" | "latin-1" | "latin1" | "l1" => latin1(text).ok_or_else(|| {
            StarlingError::SerializationError(format!(
                "text cannot be encoded as {charset}"
            ))
        }),
        "us-ascii" | "ascii" => {
            if text.is_ascii() {
                Ok(Bytes::copy_from_slice(text.as_bytes()))
            } else {
                Err(StarlingError::SerializationError(format!(
                    "text cannot be encoded as {charset}"
                )))
            }
        }
        _ => Err(StarlingError::SerializationError(format!(
            "unsupported charset: {charset}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8() {
        assert_eq!(encode_text("h\u{e9}", "utf-8").unwrap().as_ref(), "h\u{e9}".as_bytes());
        assert_eq!(encode_text("x", "UTF8").unwrap().as_ref(), b"x");
    }

    #[test]
    fn test_latin1() {
        assert_eq!(encode_text("h\u{e9}", "latin-1").unwrap().as_ref(), b"h\xe9");
        assert!(encode_text("\u{20ac}", "iso-8859-1").is_err());
    }

    #[test]
    fn test_ascii() {
        assert_eq!(encode_text("abc", "us-ascii").unwrap().as_ref(), b"abc");
        assert!(encode_text("\u{e9}", "ascii").is_err());
    }

    #[test]
    fn test_unknown_charset() {
        assert!(matches!(
            encode_text("abc", "koi8-r"),
            Err(StarlingError::SerializationError(_))
        ));
    }
}
