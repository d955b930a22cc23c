//! Core types and trait seams for the Avisa notification system.
//!
//! This crate defines the shared vocabulary of the delivery subsystem:
//!
//! - [`NotificationRecord`] / [`NotificationCategory`] / [`NotificationStatus`] -
//!   the unit of work in the delivery queue and its state machine
//! - [`Subscriber`] - a billing subscriber as read from the subscriber store
//! - [`DeliveryEvent`] - audit events emitted on delivery transitions
//! - [`MessageTransport`] / [`SubscriberStore`] / [`AuditSink`] - the seams
//!   between the delivery core and its external collaborators
//!
//! Concrete implementations live in sibling crates (`database`,
//! `whatsapp-gateway`); the delivery core in `notifier` only depends on the
//! traits defined here.

mod event;
mod record;
mod subscriber;
mod traits;

pub use event::DeliveryEvent;
pub use record::{NotificationCategory, NotificationRecord, NotificationStatus, DEFAULT_MAX_ATTEMPTS};
pub use subscriber::Subscriber;
pub use traits::{AuditSink, MessageTransport, SubscriberStore, TransportError};

// Re-export async_trait for implementors.
pub use async_trait::async_trait;
