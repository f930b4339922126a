use crate::{Event, Subject};

use serde::{Deserialize, Serialize};

/// A charge succeeded for an order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreatedEvent {
    /// Payment id.
    pub id: String,

    /// The paid order.
    pub order_id: String,

    /// Charge id at the payment provider.
    pub stripe_id: String,
}

impl Event for PaymentCreatedEvent {
    const SUBJECT: Subject = Subject::PaymentCreated;
}
