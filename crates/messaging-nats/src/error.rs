use async_nats::jetstream::context::{CreateStreamErrorKind, GetStreamErrorKind};
use async_nats::jetstream::stream::ConsumerErrorKind;
use thiserror::Error;
use ticketing_messaging::{ConnectionError, SubscriptionError};

/// Errors that can occur in the NATS connection.
#[derive(Debug, Error)]
pub enum Error {
    /// Consumer create error.
    #[error("Failed to create consumer: {0}")]
    CreateConsumer(ConsumerErrorKind),

    /// Stream create error.
    #[error("Failed to create stream: {0}")]
    CreateStream(CreateStreamErrorKind),

    /// Consumer delete error.
    #[error("Failed to delete consumer: {0}")]
    DeleteConsumer(ConsumerErrorKind),

    /// Stream lookup error.
    #[error("Failed to get stream: {0}")]
    GetStream(GetStreamErrorKind),
}

impl ConnectionError for Error {}
impl SubscriptionError for Error {}
