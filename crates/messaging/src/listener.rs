use crate::message::Message;
use crate::options::DEFAULT_ACK_WAIT;

use std::error::Error;
use std::time::Duration;

use async_trait::async_trait;
use ticketing_events::Event;

/// A consumer of one event type within a named queue group.
///
/// The subject is fixed by [`Self::Event`]. Every replica of a service must use
/// the same queue group name: it selects the load-balancing group and is also
/// the durable name broker-side state is kept under.
///
/// Delivery is at-least-once. A message is redelivered whenever it is not
/// acknowledged within [`ack_wait`](Self::ack_wait), even if a previous
/// delivery was fully handled, so implementations must be idempotent.
#[async_trait]
pub trait Listener
where
    Self: Send + Sync + 'static,
{
    /// The event type, and through it the subject, this listener consumes.
    type Event: Event;

    /// The error type for the handler.
    type Error: Error + Send + Sync + 'static;

    /// Name of the queue group this listener joins.
    fn queue_group_name(&self) -> &str;

    /// How long the broker waits for an acknowledgement before redelivering.
    fn ack_wait(&self) -> Duration {
        DEFAULT_ACK_WAIT
    }

    /// Handles one delivery of a decoded event.
    ///
    /// Call [`Message::ack`] once the work is done. Returning an error, or
    /// returning without acknowledging, leaves the message to be redelivered.
    async fn on_message(&self, data: Self::Event, message: &Message) -> Result<(), Self::Error>;
}
