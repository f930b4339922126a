//! In-memory implementation of the messaging crate.
//!
//! [`MemoryBroker`] simulates a durable streaming broker inside one process:
//! per-subject channels, queue groups, ack-wait redelivery and connection
//! loss. Each simulated service process gets its own [`MemoryConnection`].
//! Timers run on `tokio::time`, so tests can drive ack-wait expiry with a
//! paused clock.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod broker;
mod connection;
mod error;
mod subscription;

pub use broker::MemoryBroker;
pub use connection::MemoryConnection;
pub use error::Error;
pub use subscription::MemorySubscription;
