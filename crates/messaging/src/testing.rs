//! Connection double recording registrations and delivering by hand.

use crate::connection::{Connection, ConnectionError, MessageHandler};
use crate::listener::Listener;
use crate::message::{AckError, Acker, Message};
use crate::options::SubscriptionOptions;
use crate::subscription::{Subscription, SubscriptionError, SubscriptionState};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use ticketing_events::{OrderCreatedEvent, Subject, TicketUpdatedEvent};
use tokio::sync::watch;

#[derive(Debug, Error)]
#[error("broker unreachable")]
pub struct Unreachable;

impl ConnectionError for Unreachable {}
impl SubscriptionError for Unreachable {}

pub struct Registration {
    pub subject: Subject,
    pub queue_group: String,
    pub options: SubscriptionOptions,
    handler: Arc<dyn MessageHandler>,
}

#[derive(Clone, Default)]
pub struct RecordingConnection {
    registrations: Arc<Mutex<Vec<Registration>>>,
    unreachable: Option<Subject>,
}

impl std::fmt::Debug for RecordingConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RecordingConnection")
    }
}

#[derive(Debug, Default)]
pub struct RecordingAcker(AtomicBool);

impl RecordingAcker {
    pub fn acked(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Acker for RecordingAcker {
    async fn ack(&self) -> Result<(), AckError> {
        self.0.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl RecordingConnection {
    pub fn failing_on(subject: Subject) -> Self {
        Self {
            unreachable: Some(subject),
            ..Self::default()
        }
    }

    pub fn registered(&self) -> Vec<(Subject, String, SubscriptionOptions)> {
        self.registrations
            .lock()
            .unwrap()
            .iter()
            .map(|r| (r.subject, r.queue_group.clone(), r.options.clone()))
            .collect()
    }

    /// Delivers `payload` to the registration at `index` and reports whether
    /// the handler acknowledged it.
    pub async fn deliver(&self, index: usize, payload: &[u8]) -> bool {
        let (subject, handler) = {
            let registrations = self.registrations.lock().unwrap();
            let registration = &registrations[index];
            (registration.subject, Arc::clone(&registration.handler))
        };

        let acker = Arc::new(RecordingAcker::default());
        let message = Message::new(
            subject,
            Bytes::copy_from_slice(payload),
            1,
            false,
            acker.clone(),
        );

        handler.handle(message).await;

        acker.acked()
    }
}

#[derive(Debug)]
pub struct RecordingSubscription {
    subject: Subject,
    queue_group: String,
    state: watch::Sender<SubscriptionState>,
}

#[async_trait]
impl Subscription for RecordingSubscription {
    type Error = Unreachable;

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
        self.state.send_replace(SubscriptionState::Closed);
        Ok(())
    }

    async fn unsubscribe(self) -> Result<(), Self::Error> {
        self.state.send_replace(SubscriptionState::Closed);
        Ok(())
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    type Error = Unreachable;

    type Subscription = RecordingSubscription;

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
        if self.unreachable == Some(subject) {
            return Err(Unreachable);
        }

        self.registrations.lock().unwrap().push(Registration {
            subject,
            queue_group: queue_group.to_string(),
            options,
            handler: Arc::new(handler),
        });

        Ok(RecordingSubscription {
            subject,
            queue_group: queue_group.to_string(),
            state: watch::channel(SubscriptionState::Active).0,
        })
    }
}

#[derive(Debug, Error)]
#[error("listener failed")]
pub struct ListenerFailed;

/// Records decoded tickets and acknowledges them unless told to fail.
#[derive(Clone, Default)]
pub struct TicketUpdatedListener {
    pub received: Arc<Mutex<Vec<TicketUpdatedEvent>>>,
    pub fail: bool,
}

#[async_trait]
impl Listener for TicketUpdatedListener {
    type Event = TicketUpdatedEvent;

    type Error = ListenerFailed;

    fn queue_group_name(&self) -> &str {
        "orders-service"
    }

    async fn on_message(&self, data: Self::Event, message: &Message) -> Result<(), Self::Error> {
        self.received.lock().unwrap().push(data);

        if self.fail {
            return Err(ListenerFailed);
        }

        message.ack().await.map_err(|_| ListenerFailed)
    }
}

/// Slow handler that needs longer than the default ack-wait.
pub struct OrderCreatedListener;

#[async_trait]
impl Listener for OrderCreatedListener {
    type Event = OrderCreatedEvent;

    type Error = ListenerFailed;

    fn queue_group_name(&self) -> &str {
        "expiration-service"
    }

    fn ack_wait(&self) -> Duration {
        Duration::from_secs(60)
    }

    async fn on_message(&self, _data: Self::Event, message: &Message) -> Result<(), Self::Error> {
        message.ack().await.map_err(|_| ListenerFailed)
    }
}
