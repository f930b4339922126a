use crate::broker::{GroupKey, MemberId, MemoryBroker};
use crate::error::Error;

use std::sync::Arc;

use async_trait::async_trait;
use ticketing_events::Subject;
use ticketing_messaging::{Subscription, SubscriptionState};
use tokio::sync::watch;

/// A subscription attached to a [`MemoryBroker`] queue group.
///
/// Dropping it detaches the member and stops its task; durable group state
/// is kept.
#[derive(Debug)]
pub struct MemorySubscription {
    broker: MemoryBroker,
    key: GroupKey,
    member: MemberId,
    state: Arc<watch::Sender<SubscriptionState>>,
    _stop_sender: watch::Sender<()>,
}

impl MemorySubscription {
    pub(crate) const fn new(
        broker: MemoryBroker,
        key: GroupKey,
        member: MemberId,
        state: Arc<watch::Sender<SubscriptionState>>,
        stop_sender: watch::Sender<()>,
    ) -> Self {
        Self {
            broker,
            key,
            member,
            state,
            _stop_sender: stop_sender,
        }
    }

    /// The durable name, if the group is durable.
    #[must_use]
    pub fn durable_name(&self) -> Option<&str> {
        self.key.durable_name.as_deref()
    }
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        self.broker.detach(&self.key, self.member, false);
    }
}

#[async_trait]
impl Subscription for MemorySubscription {
    type Error = Error;

    fn subject(&self) -> Subject {
        self.key.subject
    }

    fn queue_group(&self) -> &str {
        &self.key.queue_group
    }

    fn state_changes(&self) -> watch::Receiver<SubscriptionState> {
        self.state.subscribe()
    }

    async fn close(self) -> Result<(), Self::Error> {
        drop(self);
        Ok(())
    }

    async fn unsubscribe(self) -> Result<(), Self::Error> {
        self.broker.detach(&self.key, self.member, true);
        Ok(())
    }
}
