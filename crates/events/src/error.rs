use crate::Subject;

use thiserror::Error;

/// A subject string that names no known channel.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown subject: {0}")]
pub struct UnknownSubject(pub String);

/// Errors that can occur while decoding an inbound payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload bytes are not valid UTF-8 text.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The payload is not JSON matching the schema of its subject.
    #[error("payload does not match the {subject} schema: {source}")]
    Json {
        /// The subject whose schema was expected.
        subject: Subject,

        /// The underlying deserialization failure.
        #[source]
        source: serde_json::Error,
    },

    /// The channel name does not map to a known subject.
    #[error(transparent)]
    UnknownSubject(#[from] UnknownSubject),
}
