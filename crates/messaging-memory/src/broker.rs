use crate::MemoryConnection;
use crate::error::Error;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use ticketing_events::{Event, Subject};
use ticketing_messaging::{
    AckError, Acker, AutoAcker, Message, SubscriptionOptions, SubscriptionState,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};

pub type ConnectionId = u64;
pub type MemberId = u64;

/// Identifies the shared state of a queue group on one subject.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub subject: Subject,
    pub queue_group: String,
    pub durable_name: Option<String>,
}

#[derive(Debug)]
struct Stored {
    sequence: u64,
    payload: Bytes,
}

#[derive(Debug)]
struct Pending {
    attempt: u32,
    payload: Bytes,
}

#[derive(Debug)]
struct Member {
    id: MemberId,
    connection: ConnectionId,
    sender: mpsc::UnboundedSender<Message>,
    state: Arc<watch::Sender<SubscriptionState>>,
}

#[derive(Debug)]
struct Group {
    ack_wait: Duration,
    manual_ack: bool,
    durable: bool,
    /// Index of the next never-delivered entry in the channel log.
    cursor: usize,
    pending: BTreeMap<u64, Pending>,
    /// Pending sequences whose ack-wait ran out, awaiting redelivery.
    expired: BTreeSet<u64>,
    members: Vec<Member>,
    next_member: usize,
}

impl Group {
    fn new(options: &SubscriptionOptions, log_len: usize) -> Self {
        Self {
            ack_wait: options.ack_wait(),
            manual_ack: options.manual_ack_mode(),
            durable: options.durable_name().is_some(),
            cursor: if options.deliver_all_available() {
                0
            } else {
                log_len
            },
            pending: BTreeMap::new(),
            expired: BTreeSet::new(),
            members: Vec::new(),
            next_member: 0,
        }
    }

    /// Picks the next member with a live connection, round robin.
    fn next_available(&mut self, connections: &HashMap<ConnectionId, bool>) -> Option<usize> {
        let count = self.members.len();

        for offset in 0..count {
            let index = (self.next_member + offset) % count;
            let connection = self.members[index].connection;

            if connections.get(&connection).copied().unwrap_or(false) {
                self.next_member = (index + 1) % count;
                return Some(index);
            }
        }

        None
    }
}

#[derive(Debug, Default)]
struct State {
    channels: HashMap<Subject, Vec<Stored>>,
    connections: HashMap<ConnectionId, bool>,
    groups: HashMap<GroupKey, Group>,
    next_connection: ConnectionId,
    next_member: MemberId,
}

/// An in-process streaming broker.
///
/// Keeps every published payload per subject and tracks, per queue group,
/// what has been delivered and what is still awaiting acknowledgement.
/// Clones share the same broker.
#[derive(Clone, Debug, Default)]
pub struct MemoryBroker {
    state: Arc<Mutex<State>>,
}

impl MemoryBroker {
    /// Creates an empty broker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new connection, standing in for one service process.
    pub fn connect(&self, client_id: impl Into<String>) -> MemoryConnection {
        let id = {
            let mut state = self.lock();
            let id = state.next_connection;
            state.next_connection += 1;
            state.connections.insert(id, true);
            id
        };

        MemoryConnection::new(self.clone(), client_id.into(), id)
    }

    /// Appends a raw payload to the channel of `subject` and returns its
    /// sequence number. Sequences start at 1.
    pub fn publish(&self, subject: Subject, payload: impl Into<Bytes>) -> u64 {
        let mut guard = self.lock();
        let state = &mut *guard;

        let log = state.channels.entry(subject).or_default();
        let sequence = log.len() as u64 + 1;
        log.push(Stored {
            sequence,
            payload: payload.into(),
        });

        debug!(%subject, sequence, "Published");

        let keys: Vec<GroupKey> = state
            .groups
            .keys()
            .filter(|key| key.subject == subject)
            .cloned()
            .collect();

        for key in keys {
            self.pump(state, &key);
        }

        sequence
    }

    /// Serializes and publishes an event on its subject.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] if the event cannot be serialized.
    pub fn publish_event<E>(&self, event: &E) -> Result<u64, Error>
    where
        E: Event,
    {
        let payload = event.encode()?;

        Ok(self.publish(E::SUBJECT, payload))
    }

    /// Number of payloads ever published on `subject`.
    #[must_use]
    pub fn channel_len(&self, subject: Subject) -> usize {
        self.lock().channels.get(&subject).map_or(0, Vec::len)
    }

    /// Number of messages delivered to `queue_group` on `subject` and not yet
    /// acknowledged.
    #[must_use]
    pub fn pending(&self, subject: Subject, queue_group: &str) -> usize {
        self.lock()
            .groups
            .iter()
            .filter(|(key, _)| key.subject == subject && key.queue_group == queue_group)
            .map(|(_, group)| group.pending.len())
            .sum()
    }

    /// Number of subscriptions currently attached to `queue_group` on
    /// `subject`.
    #[must_use]
    pub fn members(&self, subject: Subject, queue_group: &str) -> usize {
        self.lock()
            .groups
            .iter()
            .filter(|(key, _)| key.subject == subject && key.queue_group == queue_group)
            .map(|(_, group)| group.members.len())
            .sum()
    }

    /// Whether any state, attached or not, is kept for `queue_group` on
    /// `subject`.
    #[must_use]
    pub fn has_group(&self, subject: Subject, queue_group: &str) -> bool {
        self.lock()
            .groups
            .keys()
            .any(|key| key.subject == subject && key.queue_group == queue_group)
    }

    pub(crate) fn is_connected(&self, connection: ConnectionId) -> bool {
        self.lock()
            .connections
            .get(&connection)
            .copied()
            .unwrap_or(false)
    }

    /// Attaches a member to its group, creating the group on first use.
    /// Returns `None` when the connection is down.
    pub(crate) fn attach(
        &self,
        connection: ConnectionId,
        key: GroupKey,
        options: &SubscriptionOptions,
        sender: mpsc::UnboundedSender<Message>,
        state_sender: Arc<watch::Sender<SubscriptionState>>,
    ) -> Option<MemberId> {
        let mut guard = self.lock();
        let state = &mut *guard;

        if !state.connections.get(&connection).copied().unwrap_or(false) {
            return None;
        }

        let id = state.next_member;
        state.next_member += 1;

        let log_len = state.channels.get(&key.subject).map_or(0, Vec::len);
        let group = state
            .groups
            .entry(key.clone())
            .or_insert_with(|| Group::new(options, log_len));

        group.ack_wait = options.ack_wait();
        group.manual_ack = options.manual_ack_mode();
        group.members.push(Member {
            id,
            connection,
            sender,
            state: state_sender,
        });

        if let Some(member) = group.members.last() {
            member.state.send_replace(SubscriptionState::Active);
        }

        debug!(subject = %key.subject, queue_group = key.queue_group, member = id, "Member attached");

        self.pump(state, &key);

        Some(id)
    }

    /// Removes a member. The group's state goes with its last member unless
    /// the group is durable and `remove_durable` is false.
    pub(crate) fn detach(&self, key: &GroupKey, member: MemberId, remove_durable: bool) {
        let mut guard = self.lock();
        let state = &mut *guard;

        let Some(group) = state.groups.get_mut(key) else {
            return;
        };

        let Some(index) = group.members.iter().position(|m| m.id == member) else {
            return;
        };

        let removed = group.members.remove(index);
        removed.state.send_replace(SubscriptionState::Closed);

        debug!(subject = %key.subject, queue_group = key.queue_group, member, "Member detached");

        if group.members.is_empty() && (remove_durable || !group.durable) {
            state.groups.remove(key);
            debug!(subject = %key.subject, queue_group = key.queue_group, "Group removed");
        }
    }

    /// Marks a connection up or down and moves its members' states along.
    pub(crate) fn set_connected(&self, connection: ConnectionId, connected: bool) {
        let mut guard = self.lock();
        let state = &mut *guard;

        state.connections.insert(connection, connected);

        let member_state = if connected {
            SubscriptionState::Active
        } else {
            SubscriptionState::Suspended
        };

        let mut touched = Vec::new();
        for (key, group) in &state.groups {
            let mut any = false;
            for member in group.members.iter().filter(|m| m.connection == connection) {
                member.state.send_replace(member_state);
                any = true;
            }
            if any {
                touched.push(key.clone());
            }
        }

        if connected {
            for key in touched {
                self.pump(state, &key);
            }
        }
    }

    fn ack(&self, connection: ConnectionId, key: &GroupKey, sequence: u64) -> Result<(), AckError> {
        let mut state = self.lock();

        if !state.connections.get(&connection).copied().unwrap_or(false) {
            return Err(AckError::Disconnected);
        }

        if let Some(group) = state.groups.get_mut(key) {
            group.pending.remove(&sequence);
            group.expired.remove(&sequence);
        }

        trace!(subject = %key.subject, queue_group = key.queue_group, sequence, "Acknowledged");

        Ok(())
    }

    fn expire(&self, key: &GroupKey, sequence: u64, attempt: u32) {
        let mut guard = self.lock();
        let state = &mut *guard;

        let Some(group) = state.groups.get_mut(key) else {
            return;
        };

        match group.pending.get(&sequence) {
            Some(pending) if pending.attempt == attempt => {
                group.expired.insert(sequence);
            }
            _ => return,
        }

        debug!(subject = %key.subject, queue_group = key.queue_group, sequence, attempt, "Ack-wait expired");

        self.pump(state, key);
    }

    fn schedule_expiry(&self, key: GroupKey, sequence: u64, attempt: u32, ack_wait: Duration) {
        let broker = self.clone();

        tokio::spawn(async move {
            tokio::time::sleep(ack_wait).await;
            broker.expire(&key, sequence, attempt);
        });
    }

    /// Hands out expired and never-delivered messages to connected members
    /// until either runs out.
    fn pump(&self, state: &mut State, key: &GroupKey) {
        let State {
            channels,
            connections,
            groups,
            ..
        } = state;

        let Some(group) = groups.get_mut(key) else {
            return;
        };
        let log = channels.get(&key.subject).map_or(&[][..], Vec::as_slice);

        loop {
            if group.expired.is_empty() && group.cursor >= log.len() {
                break;
            }

            let Some(index) = group.next_available(connections) else {
                break;
            };

            let (sequence, payload, redelivered, attempt) =
                if let Some(sequence) = group.expired.pop_first() {
                    let Some(pending) = group.pending.get_mut(&sequence) else {
                        continue;
                    };
                    pending.attempt += 1;
                    (sequence, pending.payload.clone(), true, pending.attempt)
                } else {
                    let stored = &log[group.cursor];
                    group.cursor += 1;
                    if group.manual_ack {
                        group.pending.insert(
                            stored.sequence,
                            Pending {
                                attempt: 1,
                                payload: stored.payload.clone(),
                            },
                        );
                    }
                    (stored.sequence, stored.payload.clone(), false, 1)
                };

            let member = &group.members[index];
            let acker: Arc<dyn Acker> = if group.manual_ack {
                Arc::new(MemoryAcker {
                    broker: self.clone(),
                    connection: member.connection,
                    key: key.clone(),
                    sequence,
                })
            } else {
                Arc::new(AutoAcker)
            };

            let message = Message::new(key.subject, payload, sequence, redelivered, acker);

            if member.sender.send(message).is_err() {
                // Receiving task is gone; undo this attempt and forget the member.
                let removed = group.members.remove(index);
                removed.state.send_replace(SubscriptionState::Closed);
                if redelivered {
                    if let Some(pending) = group.pending.get_mut(&sequence) {
                        pending.attempt -= 1;
                    }
                    group.expired.insert(sequence);
                } else {
                    group.pending.remove(&sequence);
                    group.cursor -= 1;
                }
                continue;
            }

            trace!(subject = %key.subject, queue_group = key.queue_group, sequence, redelivered, "Delivered");

            if group.manual_ack {
                self.schedule_expiry(key.clone(), sequence, attempt, group.ack_wait);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Acknowledges one delivery back to the broker, through the connection it
/// was delivered on.
#[derive(Debug)]
struct MemoryAcker {
    broker: MemoryBroker,
    connection: ConnectionId,
    key: GroupKey,
    sequence: u64,
}

#[async_trait]
impl Acker for MemoryAcker {
    async fn ack(&self) -> Result<(), AckError> {
        self.broker.ack(self.connection, &self.key, self.sequence)
    }
}
