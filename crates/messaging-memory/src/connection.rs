use crate::broker::{ConnectionId, GroupKey, MemoryBroker};
use crate::error::Error;
use crate::subscription::MemorySubscription;

use std::sync::Arc;

use async_trait::async_trait;
use ticketing_events::Subject;
use ticketing_messaging::{
    Connection, Message, MessageHandler, SubscriptionOptions, SubscriptionState,
};
use tokio::sync::{mpsc, watch};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, instrument};

/// A connection to a [`MemoryBroker`].
///
/// Clones share the connection. [`disconnect`](Self::disconnect) and
/// [`reconnect`](Self::reconnect) simulate losing and regaining the link,
/// which suspends and resumes every subscription made through it.
#[derive(Clone, Debug)]
pub struct MemoryConnection {
    broker: MemoryBroker,
    client_id: String,
    id: ConnectionId,
}

impl MemoryConnection {
    pub(crate) const fn new(broker: MemoryBroker, client_id: String, id: ConnectionId) -> Self {
        Self {
            broker,
            client_id,
            id,
        }
    }

    pub(crate) const fn id(&self) -> ConnectionId {
        self.id
    }

    /// The client id given at connect time.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// The broker behind this connection.
    #[must_use]
    pub const fn broker(&self) -> &MemoryBroker {
        &self.broker
    }

    /// Whether the link is up.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.broker.is_connected(self.id)
    }

    /// Drops the link. Subscriptions become suspended and acknowledgements
    /// fail until [`reconnect`](Self::reconnect).
    pub fn disconnect(&self) {
        info!(client_id = self.client_id, "Disconnected");
        self.broker.set_connected(self.id, false);
    }

    /// Restores the link and resumes delivery.
    pub fn reconnect(&self) {
        info!(client_id = self.client_id, "Reconnected");
        self.broker.set_connected(self.id, true);
    }
}

async fn process_messages<H>(
    receiver: mpsc::UnboundedReceiver<Message>,
    mut stop_receiver: watch::Receiver<()>,
    handler: H,
) where
    H: MessageHandler,
{
    let mut messages = UnboundedReceiverStream::new(receiver);

    loop {
        tokio::select! {
            biased;
            _ = stop_receiver.changed() => {
                break;
            }
            message = messages.next() => {
                match message {
                    Some(message) => handler.handle(message).await,
                    None => break,
                }
            }
        }
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    type Error = Error;

    type Subscription = MemorySubscription;

    #[instrument(skip(self, options, handler), fields(client_id = %self.client_id))]
    async fn subscribe<H>(
        &self,
        subject: Subject,
        queue_group: &str,
        options: SubscriptionOptions,
        handler: H,
    ) -> Result<Self::Subscription, Self::Error>
    where
        H: MessageHandler,
    {
        let key = GroupKey {
            subject,
            queue_group: queue_group.to_string(),
            durable_name: options.durable_name().map(ToString::to_string),
        };

        let (sender, receiver) = mpsc::unbounded_channel();
        let (stop_sender, stop_receiver) = watch::channel(());
        let state = Arc::new(watch::channel(SubscriptionState::Subscribing).0);

        let member = self
            .broker
            .attach(self.id, key.clone(), &options, sender, Arc::clone(&state))
            .ok_or_else(|| Error::Disconnected(self.client_id.clone()))?;

        tokio::spawn(process_messages(receiver, stop_receiver, handler));

        debug!(member, "Subscribed");

        Ok(MemorySubscription::new(
            self.broker.clone(),
            key,
            member,
            state,
            stop_sender,
        ))
    }
}
