//! Consumer-side protocol for durable, at-least-once event channels.
//!
//! A [`Listener`] names a queue group and handles one event type. Binding it to
//! a [`Connection`] with a [`Subscriber`] registers a durable, manually
//! acknowledged subscription that replays everything published since the
//! subscription was first created.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

/// Connections register subscriptions with a broker.
pub mod connection;

/// Listeners handle the events of a single subject.
pub mod listener;

/// Registry starting every listener of a service.
pub mod listeners;

/// Broker-delivered envelopes and their acknowledgement handles.
pub mod message;

/// Options applied to a subscription at registration.
pub mod options;

/// Listeners bound to a connection.
pub mod subscriber;

/// Handles to registered subscriptions.
pub mod subscription;

#[cfg(test)]
mod testing;

pub use connection::{Connection, ConnectionError, MessageHandler};
pub use error::Error;
pub use listener::Listener;
pub use listeners::Listeners;
pub use message::{AckError, Acker, AutoAcker, Message};
pub use options::{BROKER_DEFAULT_ACK_WAIT, DEFAULT_ACK_WAIT, SubscriptionOptions};
pub use subscriber::{Subscriber, parse_message};
pub use subscription::{Subscription, SubscriptionError, SubscriptionState};

pub use ticketing_events::{DecodeError, Event, Subject};
