use crate::error::Error;

use std::sync::Arc;
use std::time::Duration;

use async_nats::jetstream;
use async_nats::jetstream::consumer::PullConsumer;
use async_nats::jetstream::stream::Stream as NatsStream;
use async_trait::async_trait;
use futures::StreamExt;
use ticketing_events::Subject;
use ticketing_messaging::{
    AckError, Acker, AutoAcker, Message, MessageHandler, Subscription, SubscriptionState,
};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Acknowledges a JetStream delivery.
#[derive(Debug)]
struct NatsAcker {
    message: jetstream::Message,
}

#[async_trait]
impl Acker for NatsAcker {
    async fn ack(&self) -> Result<(), AckError> {
        self.message
            .ack()
            .await
            .map_err(|e| AckError::Broker(e.to_string()))
    }
}

fn into_message(message: jetstream::Message, manual_ack: bool) -> Message {
    let (sequence, redelivered) = match message.info() {
        Ok(info) => (info.stream_sequence, info.delivered > 1),
        Err(error) => {
            warn!(%error, "Delivery without JetStream metadata");
            (0, false)
        }
    };

    let subject = message.subject.to_string();
    let payload = message.payload.clone();

    let acker: Arc<dyn Acker> = if manual_ack {
        Arc::new(NatsAcker { message })
    } else {
        Arc::new(AutoAcker)
    };

    Message::new(subject, payload, sequence, redelivered, acker)
}

/// Pulls from `consumer` until stopped, handing messages to `handler` one at
/// a time. Stream failures suspend the subscription until the stream can be
/// reopened.
pub(crate) async fn process_messages<H>(
    consumer: PullConsumer,
    handler: H,
    manual_ack: bool,
    retry_delay: Duration,
    state: Arc<watch::Sender<SubscriptionState>>,
    mut stop_receiver: watch::Receiver<()>,
) where
    H: MessageHandler,
{
    'pull: loop {
        match consumer.messages().await {
            Ok(mut messages) => {
                state.send_replace(SubscriptionState::Active);

                loop {
                    tokio::select! {
                        biased;
                        _ = stop_receiver.changed() => {
                            break 'pull;
                        }
                        message = messages.next() => {
                            match message {
                                Some(Ok(message)) => {
                                    handler.handle(into_message(message, manual_ack)).await;
                                }
                                Some(Err(error)) => {
                                    warn!(%error, "Message stream failed");
                                    break;
                                }
                                None => break,
                            }
                        }
                    }
                }
            }
            Err(error) => {
                warn!(%error, "Failed to open message stream");
            }
        }

        state.send_replace(SubscriptionState::Suspended);
        debug!(?retry_delay, "Retrying message stream");

        tokio::select! {
            biased;
            _ = stop_receiver.changed() => {
                break;
            }
            () = tokio::time::sleep(retry_delay) => {}
        }
    }

    state.send_replace(SubscriptionState::Closed);
}

/// A subscription backed by a JetStream pull consumer.
///
/// Dropping it stops pulling; the consumer stays on the server.
#[derive(Debug)]
pub struct NatsSubscription {
    consumer_name: String,
    queue_group: String,
    state: Arc<watch::Sender<SubscriptionState>>,
    stop_sender: watch::Sender<()>,
    stream: NatsStream,
    subject: Subject,
}

impl NatsSubscription {
    pub(crate) const fn new(
        consumer_name: String,
        queue_group: String,
        state: Arc<watch::Sender<SubscriptionState>>,
        stop_sender: watch::Sender<()>,
        stream: NatsStream,
        subject: Subject,
    ) -> Self {
        Self {
            consumer_name,
            queue_group,
            state,
            stop_sender,
            stream,
            subject,
        }
    }

    /// Name of the JetStream consumer this subscription pulls from.
    #[must_use]
    pub fn consumer_name(&self) -> &str {
        &self.consumer_name
    }

    fn stop(&self) {
        let _ = self.stop_sender.send(());
        self.state.send_replace(SubscriptionState::Closed);
    }
}

#[async_trait]
impl Subscription for NatsSubscription {
    type Error = Error;

    fn subject(&self) -> Subject {
        self.subject
    }

    fn queue_group(&self) -> &str {
        &self.queue_group
    }

    fn state_changes(&self) -> watch::Receiver<SubscriptionState> {
        self.state.subscribe()
    }

    async fn close(self) -> Result<(), Self::Error> {
        self.stop();
        Ok(())
    }

    async fn unsubscribe(self) -> Result<(), Self::Error> {
        self.stop();

        self.stream
            .delete_consumer(&self.consumer_name)
            .await
            .map_err(|e| Error::DeleteConsumer(e.kind()))?;

        debug!(consumer = self.consumer_name, "Deleted consumer");

        Ok(())
    }
}
