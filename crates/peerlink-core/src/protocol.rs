//! Wire message types and codec.
//!
//! Five message kinds are multiplexed over the single transport channel.
//! The wire form is JSON, shaped for interoperability with the original
//! browser client:
//!
//! | kind | wire form |
//! |------|-----------|
//! | text | bare JSON string |
//! | username | `{"type":"username","name":"..."}` |
//! | typing | `{"type":"typing"}` |
//! | file-meta | `{"type":"file-meta","name":"...","size":N}` |
//! | file-chunk | `{"type":"file-chunk","chunk":"<base64>"}` |
//!
//! Chunk bytes are base64-encoded since JSON carries no binary. Decoding an
//! unknown tag is a protocol error; the transport guarantees ordered
//! reliable delivery, so no sequencing fields exist.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// A protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Announce the sender's display name
    Username {
        /// The sender's display name
        name: String,
    },
    /// The sender started typing
    Typing,
    /// A chat message
    Text(String),
    /// Announce an incoming file, opening the receive-side assembly buffer
    FileMeta {
        /// File name
        name: String,
        /// Total size in bytes
        size: u64,
    },
    /// One 64 KiB slice of the announced file
    FileChunk {
        /// Chunk bytes
        data: Vec<u8>,
    },
}

/// Tagged wire representation of the non-text messages.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum Tagged {
    Username {
        name: String,
    },
    Typing,
    FileMeta {
        name: String,
        size: u64,
    },
    FileChunk {
        #[serde(with = "chunk_bytes")]
        chunk: Vec<u8>,
    },
}

impl From<Tagged> for Message {
    fn from(tagged: Tagged) -> Self {
        match tagged {
            Tagged::Username { name } => Self::Username { name },
            Tagged::Typing => Self::Typing,
            Tagged::FileMeta { name, size } => Self::FileMeta { name, size },
            Tagged::FileChunk { chunk } => Self::FileChunk { data: chunk },
        }
    }
}

impl Message {
    /// Encode to the JSON wire form.
    pub fn encode(&self) -> Result<String> {
        let encoded = match self {
            Self::Text(text) => serde_json::to_string(text)?,
            Self::Username { name } => serde_json::to_string(&Tagged::Username {
                name: name.clone(),
            })?,
            Self::Typing => serde_json::to_string(&Tagged::Typing)?,
            Self::FileMeta { name, size } => serde_json::to_string(&Tagged::FileMeta {
                name: name.clone(),
                size: *size,
            })?,
            Self::FileChunk { data } => serde_json::to_string(&Tagged::FileChunk {
                chunk: data.clone(),
            })?,
        };
        Ok(encoded)
    }

    /// Decode from the JSON wire form.
    ///
    /// Bare strings are text messages; objects must carry a recognized
    /// `type` tag. Anything else is a protocol error.
    pub fn decode(raw: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| Error::Protocol(format!("malformed frame: {e}")))?;
        match value {
            Value::String(text) => Ok(Self::Text(text)),
            Value::Object(_) => {
                let tagged: Tagged = serde_json::from_value(value)
                    .map_err(|e| Error::Protocol(format!("unrecognized message: {e}")))?;
                Ok(tagged.into())
            }
            other => Err(Error::Protocol(format!(
                "expected string or tagged object, got {other}"
            ))),
        }
    }

    /// Short kind label, used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Username { .. } => "username",
            Self::Typing => "typing",
            Self::Text(_) => "text",
            Self::FileMeta { .. } => "file-meta",
            Self::FileChunk { .. } => "file-chunk",
        }
    }
}

mod chunk_bytes {
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::BASE64;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BASE64.decode(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_bare_string_on_the_wire() {
        let message = Message::Text("hello there".to_string());
        let wire = message.encode().unwrap();
        assert_eq!(wire, "\"hello there\"");
        assert_eq!(Message::decode(&wire).unwrap(), message);
    }

    #[test]
    fn test_username_wire_shape() {
        let message = Message::Username {
            name: "SwiftOtter42".to_string(),
        };
        let wire = message.encode().unwrap();
        let value: Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(value["type"], "username");
        assert_eq!(value["name"], "SwiftOtter42");
        assert_eq!(Message::decode(&wire).unwrap(), message);
    }

    #[test]
    fn test_typing_wire_shape() {
        let wire = Message::Typing.encode().unwrap();
        let value: Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(value["type"], "typing");
        assert_eq!(Message::decode(&wire).unwrap(), Message::Typing);
    }

    #[test]
    fn test_file_meta_wire_shape() {
        let message = Message::FileMeta {
            name: "photo.png".to_string(),
            size: 123_456,
        };
        let wire = message.encode().unwrap();
        let value: Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(value["type"], "file-meta");
        assert_eq!(value["size"], 123_456);
        assert_eq!(Message::decode(&wire).unwrap(), message);
    }

    #[test]
    fn test_chunk_bytes_are_base64() {
        let message = Message::FileChunk {
            data: vec![0, 1, 2, 250, 251, 252],
        };
        let wire = message.encode().unwrap();
        let value: Value = serde_json::from_str(&wire).unwrap();
        assert_eq!(value["chunk"], BASE64.encode([0, 1, 2, 250, 251, 252]));
        assert_eq!(Message::decode(&wire).unwrap(), message);
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let err = Message::decode(r#"{"type":"handshake","v":2}"#).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_non_string_non_object_is_rejected() {
        assert!(Message::decode("42").is_err());
        assert!(Message::decode("[1,2]").is_err());
        assert!(Message::decode("not json at all").is_err());
    }
}
