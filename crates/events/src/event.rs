use crate::{DecodeError, Subject};

use std::fmt::Debug;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A payload schema bound to exactly one subject.
pub trait Event
where
    Self: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// The subject this payload is published under.
    const SUBJECT: Subject;

    /// Decodes a raw payload as UTF-8 JSON matching this schema.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Utf8`] if the bytes are not UTF-8 and
    /// [`DecodeError::Json`] if the text does not match the schema.
    fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let text = std::str::from_utf8(payload)?;

        serde_json::from_str(text).map_err(|source| DecodeError::Json {
            subject: Self::SUBJECT,
            source,
        })
    }

    /// Encodes this payload as JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn encode(&self) -> Result<Bytes, serde_json::Error> {
        serde_json::to_vec(self).map(Bytes::from)
    }
}
