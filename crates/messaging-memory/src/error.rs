use thiserror::Error;
use ticketing_messaging::{ConnectionError, SubscriptionError};

/// Errors that can occur in the in-memory broker.
#[derive(Debug, Error)]
pub enum Error {
    /// The connection is down.
    #[error("connection {0} is disconnected")]
    Disconnected(String),

    /// An event could not be serialized for publishing.
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ConnectionError for Error {}
impl SubscriptionError for Error {}
