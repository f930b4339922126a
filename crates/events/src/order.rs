use crate::{Event, Subject};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an order is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Created, ticket not yet reserved.
    #[serde(rename = "created")]
    Created,

    /// Cancelled by the user, by expiry, or because the ticket was taken.
    #[serde(rename = "cancelled")]
    Cancelled,

    /// Ticket reserved, waiting for payment.
    #[serde(rename = "awaiting:payment")]
    AwaitingPayment,

    /// Paid.
    #[serde(rename = "complete")]
    Complete,
}

/// The ticket fields an order snapshot carries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderedTicket {
    /// Ticket id.
    pub id: String,

    /// Price at the time of ordering.
    pub price: f64,
}

/// An order reserved a ticket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedEvent {
    /// Order id.
    pub id: String,

    /// Order version.
    pub version: u64,

    /// Order status.
    pub status: OrderStatus,

    /// The buyer.
    pub user_id: String,

    /// When the reservation lapses.
    pub expires_at: DateTime<Utc>,

    /// The reserved ticket.
    pub ticket: OrderedTicket,
}

impl Event for OrderCreatedEvent {
    const SUBJECT: Subject = Subject::OrderCreated;
}

/// The ticket reference a cancellation carries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelledTicket {
    /// Ticket id.
    pub id: String,
}

/// An order released its ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    /// Order id.
    pub id: String,

    /// Order version.
    pub version: u64,

    /// The released ticket.
    pub ticket: CancelledTicket,
}

impl Event for OrderCancelledEvent {
    const SUBJECT: Subject = Subject::OrderCancelled;
}
