#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use ticketing_events::TicketUpdatedEvent;
use ticketing_messaging::{DEFAULT_ACK_WAIT, Listener, Message};
use tokio::sync::mpsc;

/// How a [`Recorder`] settles its deliveries.
#[derive(Clone, Copy, Debug)]
pub enum Mode {
    Ack,
    Never,
    FailFirst(u32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Delivery {
    pub data: TicketUpdatedEvent,
    pub sequence: u64,
    pub redelivered: bool,
}

#[derive(Debug, Error)]
#[error("refused")]
pub struct Refused;

/// Listener on ticket updates that reports every call it gets.
pub struct Recorder {
    queue_group: String,
    ack_wait: Duration,
    mode: Mode,
    attempts: AtomicU32,
    deliveries: mpsc::UnboundedSender<Delivery>,
}

impl Recorder {
    pub fn new(queue_group: &str, mode: Mode) -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (deliveries, receiver) = mpsc::unbounded_channel();

        let recorder = Self {
            queue_group: queue_group.to_string(),
            ack_wait: DEFAULT_ACK_WAIT,
            mode,
            attempts: AtomicU32::new(0),
            deliveries,
        };

        (recorder, receiver)
    }

    pub fn with_ack_wait(mut self, ack_wait: Duration) -> Self {
        self.ack_wait = ack_wait;
        self
    }
}

#[async_trait]
impl Listener for Recorder {
    type Event = TicketUpdatedEvent;

    type Error = Refused;

    fn queue_group_name(&self) -> &str {
        &self.queue_group
    }

    fn ack_wait(&self) -> Duration {
        self.ack_wait
    }

    async fn on_message(&self, data: Self::Event, message: &Message) -> Result<(), Self::Error> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        let _ = self.deliveries.send(Delivery {
            data,
            sequence: message.sequence(),
            redelivered: message.redelivered(),
        });

        match self.mode {
            Mode::Ack => message.ack().await.map_err(|_| Refused),
            Mode::Never => Ok(()),
            Mode::FailFirst(failures) if attempt <= failures => Err(Refused),
            Mode::FailFirst(_) => message.ack().await.map_err(|_| Refused),
        }
    }
}

pub fn ticket(version: u64) -> TicketUpdatedEvent {
    TicketUpdatedEvent {
        id: "t1".to_string(),
        version,
        title: "concert".to_string(),
        price: 20.0,
        order_id: None,
    }
}

pub fn drain(receiver: &mut mpsc::UnboundedReceiver<Delivery>) -> Vec<Delivery> {
    let mut deliveries = Vec::new();
    while let Ok(delivery) = receiver.try_recv() {
        deliveries.push(delivery);
    }
    deliveries
}

/// Lets spawned subscription tasks catch up. Advances a paused clock by 1ms.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
