use crate::message::Message;
use crate::options::SubscriptionOptions;
use crate::subscription::Subscription;

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;
use ticketing_events::Subject;

/// Marker trait for connection errors
pub trait ConnectionError: Error + Send + Sync + 'static {}

/// Receives every message delivered to a subscription.
///
/// Connections invoke the handler for one message at a time per subscription:
/// the next delivery is not handed over until the previous call returns.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    /// Handles a delivered message.
    async fn handle(&self, message: Message);
}

/// A long-lived, already authenticated broker connection shared by every
/// listener in a process.
#[async_trait]
pub trait Connection
where
    Self: Clone + Debug + Send + Sync + 'static,
{
    /// The error type for the connection.
    type Error: ConnectionError;

    /// The handle returned by [`subscribe`](Self::subscribe).
    type Subscription: Subscription;

    /// A fresh options builder holding the broker's defaults.
    fn subscription_options(&self) -> SubscriptionOptions {
        SubscriptionOptions::default()
    }

    /// Registers `handler` for `subject` as a member of `queue_group`.
    ///
    /// Reattaching under an existing durable name resumes that subscription
    /// instead of creating a second one.
    async fn subscribe<H>(
        &self,
        subject: Subject,
        queue_group: &str,
        options: SubscriptionOptions,
        handler: H,
    ) -> Result<Self::Subscription, Self::Error>
    where
        H: MessageHandler;
}
