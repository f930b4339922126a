use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur while acknowledging a delivery.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AckError {
    /// The connection that received the message is down; the delivery stays
    /// unacknowledged and will be redelivered.
    #[error("connection is disconnected")]
    Disconnected,

    /// The broker rejected the acknowledgement.
    #[error("broker rejected acknowledgement: {0}")]
    Broker(String),
}

/// Settles a single delivery with the broker.
#[async_trait]
pub trait Acker: Debug + Send + Sync + 'static {
    /// Acknowledges the delivery.
    async fn ack(&self) -> Result<(), AckError>;
}

/// Acker for subscriptions without manual acknowledgement, where the broker has
/// already settled the delivery.
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoAcker;

#[async_trait]
impl Acker for AutoAcker {
    async fn ack(&self) -> Result<(), AckError> {
        Ok(())
    }
}

/// A delivered message.
///
/// The broker owns delivery and redelivery bookkeeping; the envelope only
/// exposes the payload and a handle to acknowledge it.
#[derive(Clone, Debug)]
pub struct Message {
    acker: Arc<dyn Acker>,
    payload: Bytes,
    redelivered: bool,
    sequence: u64,
    subject: String,
}

impl Message {
    /// Creates an envelope. Called by connection implementations.
    pub fn new(
        subject: impl Into<String>,
        payload: Bytes,
        sequence: u64,
        redelivered: bool,
        acker: Arc<dyn Acker>,
    ) -> Self {
        Self {
            acker,
            payload,
            redelivered,
            sequence,
            subject: subject.into(),
        }
    }

    /// Acknowledges the message. Until this succeeds the broker will redeliver
    /// the message once the subscription's ack-wait expires.
    ///
    /// # Errors
    ///
    /// Returns an [`AckError`] if the acknowledgement did not reach the broker.
    pub async fn ack(&self) -> Result<(), AckError> {
        self.acker.ack().await
    }

    /// The raw payload.
    #[must_use]
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Whether this is a redelivery after an expired ack-wait.
    #[must_use]
    pub const fn redelivered(&self) -> bool {
        self.redelivered
    }

    /// The broker's sequence number for the message on its channel.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The channel the message was published on.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
