//! #  Database management and control.
//!
//! This module provides the interfaces that define the contracts of the booking engine database *backends*, as well
//! as the boundary to the payment gateway's reversal API.
//!
//! ## Traits
//! * [`BookingDatabase`] defines the highest level of behaviour for backends. Every order state transition (checkout,
//!   settlement, expiry, delivery and refunds) is a single atomic call on this trait.
//! * [`OrderManagement`] provides read-only queries for orders, their items, bookings, transactions and refund
//!   requests.
//! * [`AvailabilityManagement`] manages the per-resource, per-day availability ledger.
//! * [`RefundGateway`] reverses a settled payment at the payment gateway.
mod availability_management;
mod booking_database;
mod data_objects;
mod order_management;
mod refund_gateway;

pub use availability_management::AvailabilityManagement;
pub use booking_database::{BookingDatabase, BookingError};
pub use data_objects::{AnnulledOrder, InsertTransactionResult, SettlementEvent, SettlementOutcome};
pub use order_management::OrderManagement;
pub use refund_gateway::{GatewayReversalError, RefundGateway, ReversalReceipt, ReversalRequest};
