use crate::UnknownSubject;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of channels events are published on.
///
/// Adding an event type means adding a variant here together with its payload
/// type and an [`AnyEvent`](crate::AnyEvent) arm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
    /// `ticket:created`
    #[serde(rename = "ticket:created")]
    TicketCreated,

    /// `ticket:updated`
    #[serde(rename = "ticket:updated")]
    TicketUpdated,

    /// `order:created`
    #[serde(rename = "order:created")]
    OrderCreated,

    /// `order:cancelled`
    #[serde(rename = "order:cancelled")]
    OrderCancelled,

    /// `expiration:complete`
    #[serde(rename = "expiration:complete")]
    ExpirationComplete,

    /// `payment:created`
    #[serde(rename = "payment:created")]
    PaymentCreated,
}

impl Subject {
    /// Every subject, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::TicketCreated,
        Self::TicketUpdated,
        Self::OrderCreated,
        Self::OrderCancelled,
        Self::ExpirationComplete,
        Self::PaymentCreated,
    ];

    /// The channel name on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TicketCreated => "ticket:created",
            Self::TicketUpdated => "ticket:updated",
            Self::OrderCreated => "order:created",
            Self::OrderCancelled => "order:cancelled",
            Self::ExpirationComplete => "expiration:complete",
            Self::PaymentCreated => "payment:created",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subject {
    type Err = UnknownSubject;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|subject| subject.as_str() == s)
            .ok_or_else(|| UnknownSubject(s.to_string()))
    }
}

impl From<Subject> for String {
    fn from(subject: Subject) -> Self {
        subject.as_str().to_string()
    }
}
