use std::error::Error;
use std::fmt::{self, Debug};

use async_trait::async_trait;
use ticketing_events::Subject;
use tokio::sync::watch;

/// Marker trait for subscription errors
pub trait SubscriptionError: Error + Send + Sync + 'static {}

/// Lifecycle of a subscription as seen by one listener instance.
///
/// Handles only ever report `Subscribing` onwards; `Unregistered` is the
/// state of a listener before [`Connection::subscribe`] has produced a
/// handle, and the default.
///
/// [`Connection::subscribe`]: crate::Connection::subscribe
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SubscriptionState {
    /// No handle exists yet.
    #[default]
    Unregistered,

    /// Registration is in flight.
    Subscribing,

    /// Messages are flowing.
    Active,

    /// The connection dropped; the broker keeps durable state until it
    /// returns.
    Suspended,

    /// Closed or unsubscribed. Terminal.
    Closed,
}

impl fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unregistered => "unregistered",
            Self::Subscribing => "subscribing",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Closed => "closed",
        };

        f.write_str(name)
    }
}

/// A registered subscription.
///
/// Dropping the handle stops delivery to this instance exactly like
/// [`close`](Self::close); durable broker-side state is kept.
#[async_trait]
pub trait Subscription
where
    Self: Debug + Send + Sync + 'static,
{
    /// The error type for the subscription.
    type Error: SubscriptionError;

    /// The subscribed subject.
    fn subject(&self) -> Subject;

    /// The queue group this instance joined.
    fn queue_group(&self) -> &str;

    /// Watches lifecycle transitions.
    fn state_changes(&self) -> watch::Receiver<SubscriptionState>;

    /// The current lifecycle state.
    fn state(&self) -> SubscriptionState {
        let changes = self.state_changes();
        let state = *changes.borrow();
        state
    }

    /// Stops delivery to this instance. Durable state survives, so messages
    /// published meanwhile are replayed to the next instance that attaches
    /// under the same durable name.
    async fn close(self) -> Result<(), Self::Error>;

    /// Stops delivery and removes the durable state.
    async fn unsubscribe(self) -> Result<(), Self::Error>;
}
