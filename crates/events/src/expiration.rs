use crate::{Event, Subject};

use serde::{Deserialize, Serialize};

/// The reservation window of an order has passed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirationCompleteEvent {
    /// The expired order.
    pub order_id: String,
}

impl Event for ExpirationCompleteEvent {
    const SUBJECT: Subject = Subject::ExpirationComplete;
}
