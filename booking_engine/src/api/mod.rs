//! The public API of the booking engine.
//!
//! Each API wraps a [`crate::traits::BookingDatabase`] backend, adds validation and logging, and publishes lifecycle
//! events to the subscribers registered in [`crate::events::EventProducers`].
pub mod availability_api;
pub mod expiry_api;
mod notifications;
pub mod order_flow_api;
pub mod order_objects;
pub mod refund_api;
