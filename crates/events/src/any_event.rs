use crate::expiration::ExpirationCompleteEvent;
use crate::order::{OrderCancelledEvent, OrderCreatedEvent};
use crate::payment::PaymentCreatedEvent;
use crate::ticket::{TicketCreatedEvent, TicketUpdatedEvent};
use crate::{DecodeError, Event, Subject};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

macro_rules! define_any_event {
    ($($variant:ident($event:ty) => $wire:literal),+ $(,)?) => {
        /// Any event, tagged by its subject.
        ///
        /// Serializes as `{"subject": ..., "data": ...}`.
        #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "subject", content = "data")]
        pub enum AnyEvent {
            $(
                #[doc = concat!("`", $wire, "`")]
                #[serde(rename = $wire)]
                $variant($event),
            )+
        }

        impl AnyEvent {
            /// The subject selecting this arm.
            #[must_use]
            pub const fn subject(&self) -> Subject {
                match self {
                    $(Self::$variant(_) => Subject::$variant,)+
                }
            }

            /// Decodes a payload received on the channel named `subject`.
            ///
            /// The arm is chosen by the channel name; the payload must match that
            /// arm's schema.
            ///
            /// # Errors
            ///
            /// Returns [`DecodeError::UnknownSubject`] for an unknown channel, or
            /// the payload's own decode error.
            pub fn decode(subject: &str, payload: &[u8]) -> Result<Self, DecodeError> {
                match subject.parse::<Subject>()? {
                    $(Subject::$variant => Ok(Self::$variant(<$event>::decode(payload)?)),)+
                }
            }

            /// Encodes only the payload; the subject travels as the channel name.
            ///
            /// # Errors
            ///
            /// Returns an error if serialization fails.
            pub fn encode_data(&self) -> Result<Bytes, serde_json::Error> {
                match self {
                    $(Self::$variant(event) => event.encode(),)+
                }
            }
        }

        $(
            impl From<$event> for AnyEvent {
                fn from(event: $event) -> Self {
                    Self::$variant(event)
                }
            }
        )+
    };
}

define_any_event!(
    TicketCreated(TicketCreatedEvent) => "ticket:created",
    TicketUpdated(TicketUpdatedEvent) => "ticket:updated",
    OrderCreated(OrderCreatedEvent) => "order:created",
    OrderCancelled(OrderCancelledEvent) => "order:cancelled",
    ExpirationComplete(ExpirationCompleteEvent) => "expiration:complete",
    PaymentCreated(PaymentCreatedEvent) => "payment:created",
);
