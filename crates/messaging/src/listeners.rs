use crate::Error;
use crate::connection::Connection;
use crate::listener::Listener;
use crate::subscriber::Subscriber;

use std::collections::BTreeMap;
use std::fmt::{self, Debug};

use async_trait::async_trait;
use ticketing_events::Subject;
use tracing::info;

#[async_trait]
trait Registered<C>: Send + Sync
where
    C: Connection,
{
    fn queue_group_name(&self) -> &str;

    async fn listen(&self) -> Result<C::Subscription, Error<C::Error>>;
}

#[async_trait]
impl<L, C> Registered<C> for Subscriber<L, C>
where
    L: Listener,
    C: Connection,
{
    fn queue_group_name(&self) -> &str {
        Self::queue_group_name(self)
    }

    async fn listen(&self) -> Result<C::Subscription, Error<C::Error>> {
        Self::listen(self).await
    }
}

/// Every listener of a service, keyed by subject.
///
/// Services register their listeners once and call [`start`](Self::start)
/// during startup.
pub struct Listeners<C>
where
    C: Connection,
{
    connection: C,
    registered: BTreeMap<Subject, Vec<Box<dyn Registered<C>>>>,
}

impl<C> Debug for Listeners<C>
where
    C: Connection,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (subject, registered) in &self.registered {
            let groups: Vec<&str> = registered.iter().map(|r| r.queue_group_name()).collect();
            map.entry(subject, &groups);
        }
        map.finish()
    }
}

impl<C> Listeners<C>
where
    C: Connection,
{
    /// Creates an empty registry subscribing through `connection`.
    pub const fn new(connection: C) -> Self {
        Self {
            connection,
            registered: BTreeMap::new(),
        }
    }

    /// Registers a listener under its event's subject.
    pub fn register<L>(&mut self, listener: L) -> &mut Self
    where
        L: Listener,
    {
        let subscriber = Subscriber::new(self.connection.clone(), listener);

        self.registered
            .entry(subscriber.subject())
            .or_default()
            .push(Box::new(subscriber));

        self
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with<L>(mut self, listener: L) -> Self
    where
        L: Listener,
    {
        self.register(listener);
        self
    }

    /// Subjects with at least one registered listener.
    pub fn subjects(&self) -> impl Iterator<Item = Subject> + '_ {
        self.registered.keys().copied()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registered.values().map(Vec::len).sum()
    }

    /// Whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Subscribes every registered listener, in subject order.
    ///
    /// Stops at the first failure; subscriptions created before it are
    /// dropped, which closes them.
    ///
    /// # Errors
    ///
    /// Returns the first [`Error::Subscribe`] encountered.
    pub async fn start(&self) -> Result<Vec<C::Subscription>, Error<C::Error>> {
        let mut subscriptions = Vec::with_capacity(self.len());

        for registered in self.registered.values().flatten() {
            subscriptions.push(registered.listen().await?);
        }

        info!(count = subscriptions.len(), "Started listeners");

        Ok(subscriptions)
    }
}
