//! Subjects and typed payloads for the domain events exchanged between services.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod any_event;
mod error;
mod event;
mod subject;

/// Events published when an order expires.
pub mod expiration;

/// Events describing the order lifecycle.
pub mod order;

/// Events published once a payment has been charged.
pub mod payment;

/// Events describing ticket changes.
pub mod ticket;

pub use any_event::AnyEvent;
pub use error::{DecodeError, UnknownSubject};
pub use event::Event;
pub use subject::Subject;

pub use expiration::ExpirationCompleteEvent;
pub use order::{OrderCancelledEvent, OrderCreatedEvent, OrderStatus};
pub use payment::PaymentCreatedEvent;
pub use ticket::{TicketCreatedEvent, TicketUpdatedEvent};
