use crate::Error;
use crate::connection::{Connection, MessageHandler};
use crate::listener::Listener;
use crate::message::Message;
use crate::options::SubscriptionOptions;

use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ticketing_events::{DecodeError, Event, Subject};
use tracing::{error, info, instrument, warn};

/// Decodes a message's payload as the event type `E`.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the payload is not UTF-8 JSON matching `E`.
pub fn parse_message<E>(message: &Message) -> Result<E, DecodeError>
where
    E: Event,
{
    E::decode(message.payload())
}

/// A listener bound to the connection it subscribes through.
pub struct Subscriber<L, C>
where
    L: Listener,
    C: Connection,
{
    connection: C,
    listener: Arc<L>,
}

impl<L, C> Clone for Subscriber<L, C>
where
    L: Listener,
    C: Connection,
{
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
            listener: Arc::clone(&self.listener),
        }
    }
}

impl<L, C> Debug for Subscriber<L, C>
where
    L: Listener,
    C: Connection,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("subject", &self.subject())
            .field("queue_group", &self.queue_group_name())
            .field("ack_wait", &self.ack_wait())
            .field("connection", &self.connection)
            .finish()
    }
}

impl<L, C> Subscriber<L, C>
where
    L: Listener,
    C: Connection,
{
    /// Binds `listener` to `connection`.
    pub fn new(connection: C, listener: L) -> Self {
        Self {
            connection,
            listener: Arc::new(listener),
        }
    }

    /// The subject, fixed by the listener's event type.
    #[must_use]
    pub const fn subject(&self) -> Subject {
        <L::Event as Event>::SUBJECT
    }

    /// The listener's queue group, also used as durable name.
    #[must_use]
    pub fn queue_group_name(&self) -> &str {
        self.listener.queue_group_name()
    }

    /// The listener's ack-wait.
    #[must_use]
    pub fn ack_wait(&self) -> Duration {
        self.listener.ack_wait()
    }

    /// The bound listener.
    #[must_use]
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Options the subscription is registered with: manual acknowledgement,
    /// replay of everything available, the listener's ack-wait, and the queue
    /// group as durable name.
    #[must_use]
    pub fn subscription_options(&self) -> SubscriptionOptions {
        self.connection
            .subscription_options()
            .set_manual_ack_mode(true)
            .set_deliver_all_available()
            .set_ack_wait(self.ack_wait())
            .set_durable_name(self.queue_group_name())
    }

    /// Decodes a message as this listener's event type.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the payload does not match the schema.
    pub fn parse_message(&self, message: &Message) -> Result<L::Event, DecodeError> {
        parse_message(message)
    }

    /// Registers the subscription and starts dispatching messages to the
    /// listener.
    ///
    /// Each delivery is logged, decoded and handed to
    /// [`Listener::on_message`]. Messages that fail to decode, or whose handler
    /// fails, are logged and left unacknowledged for the broker to redeliver.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Subscribe`] if the broker rejects the registration.
    /// Callers should treat this as fatal to startup.
    #[instrument(skip(self), fields(subject = %self.subject(), queue_group = self.queue_group_name()))]
    pub async fn listen(&self) -> Result<C::Subscription, Error<C::Error>> {
        let handler = Dispatch {
            listener: Arc::clone(&self.listener),
        };

        let subscription = self
            .connection
            .subscribe(
                self.subject(),
                self.queue_group_name(),
                self.subscription_options(),
                handler,
            )
            .await
            .map_err(|source| Error::Subscribe {
                subject: self.subject(),
                queue_group: self.queue_group_name().to_string(),
                source,
            })?;

        info!(ack_wait = ?self.ack_wait(), "Listening");

        Ok(subscription)
    }
}

/// The callback installed by [`Subscriber::listen`].
struct Dispatch<L> {
    listener: Arc<L>,
}

#[async_trait]
impl<L> MessageHandler for Dispatch<L>
where
    L: Listener,
{
    async fn handle(&self, message: Message) {
        let subject = <L::Event as Event>::SUBJECT;
        let queue_group = self.listener.queue_group_name();
        let sequence = message.sequence();

        info!(
            %subject,
            queue_group,
            sequence,
            redelivered = message.redelivered(),
            "Message received"
        );

        let data = match parse_message::<L::Event>(&message) {
            Ok(data) => data,
            Err(error) => {
                error!(
                    %subject,
                    queue_group,
                    sequence,
                    %error,
                    "Failed to decode message, leaving it unacknowledged"
                );
                return;
            }
        };

        if let Err(error) = self.listener.on_message(data, &message).await {
            warn!(
                %subject,
                queue_group,
                sequence,
                %error,
                "Listener failed to handle message, awaiting redelivery"
            );
        }
    }
}
