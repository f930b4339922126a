use crate::{Event, Subject};

use serde::{Deserialize, Serialize};

/// A ticket was listed for sale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketCreatedEvent {
    /// Ticket id.
    pub id: String,

    /// Optimistic concurrency version, starting at 0.
    pub version: u64,

    /// Ticket title.
    pub title: String,

    /// Asking price.
    pub price: f64,

    /// The seller.
    pub user_id: String,
}

impl Event for TicketCreatedEvent {
    const SUBJECT: Subject = Subject::TicketCreated;
}

/// A ticket changed, either by its owner or because an order reserved it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketUpdatedEvent {
    /// Ticket id.
    pub id: String,

    /// Version after the update.
    pub version: u64,

    /// Ticket title.
    pub title: String,

    /// Asking price.
    pub price: f64,

    /// The order currently reserving the ticket, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
}

impl Event for TicketUpdatedEvent {
    const SUBJECT: Subject = Subject::TicketUpdated;
}
