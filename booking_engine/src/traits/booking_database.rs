use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{Booking, NewOrder, NewRefundRequest, Order, OrderNumber, RefundRequest},
    traits::{
        data_objects::{AnnulledOrder, SettlementEvent, SettlementOutcome},
        AvailabilityManagement,
        GatewayReversalError,
        OrderManagement,
        ReversalReceipt,
    },
};

/// This trait defines the highest level of behaviour for backends supporting the booking engine.
///
/// Every method that changes an order's status runs in a single database transaction, which starts by taking the
/// write lock on the order row. Status preconditions are re-checked inside that transaction, so of two competing
/// transitions (e.g. a settlement and an expiry sweep) exactly one wins and the other becomes a no-op.
#[allow(async_fn_in_trait)]
pub trait BookingDatabase: Clone + OrderManagement + AvailabilityManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order produced by checkout, together with its items and booking. For bookables that keep a
    /// day calendar, the booked days are reserved for the order in the same transaction.
    ///
    /// ## Failure modes:
    /// - `OrderAlreadyExists` if the order number is taken.
    /// - `Conflict` if any of the requested days is not available.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, Booking), BookingError>;

    /// Applies one gateway event to its order, atomically.
    ///
    /// The (order, transaction code, status) triple is the idempotency key. A replayed event returns
    /// [`SettlementOutcome::Replayed`] and writes nothing.
    async fn process_settlement_event(&self, event: &SettlementEvent) -> Result<SettlementOutcome, BookingError>;

    /// Orders still awaiting payment whose payment deadline is at or before `now`.
    async fn fetch_expirable_orders(&self, now: DateTime<Utc>) -> Result<Vec<Order>, BookingError>;

    /// Expires the order, cancels its booking and releases any held availability.
    ///
    /// Returns `None` if the order is no longer awaiting payment, or its deadline has moved past `now`.
    async fn expire_order(&self, order_id: i64, now: DateTime<Utc>) -> Result<Option<AnnulledOrder>, BookingError>;

    /// Moves a paid order to `delivered`.
    async fn mark_order_delivered(&self, order_number: &OrderNumber) -> Result<Order, BookingError>;

    /// Creates a pending refund request. The caller is responsible for checking eligibility, but the backend
    /// guarantees that an order has at most one pending or approved request.
    async fn insert_refund_request(&self, request: NewRefundRequest) -> Result<RefundRequest, BookingError>;

    /// Rejects a pending refund request. Returns `AlreadyDecided` if the request is no longer pending.
    async fn reject_refund_request(&self, id: i64, now: DateTime<Utc>) -> Result<RefundRequest, BookingError>;

    /// Approves a pending refund request after the gateway has reversed the payment. In one transaction:
    /// - the request moves to `approved`,
    /// - the order moves to `refunded`,
    /// - the booking is cancelled and availability released,
    /// - a `refund` transaction record is stored.
    async fn approve_refund_request(
        &self,
        id: i64,
        receipt: &ReversalReceipt,
        now: DateTime<Utc>,
    ) -> Result<(RefundRequest, AnnulledOrder), BookingError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), BookingError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum BookingError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("The requested order (internal id {0}) does not exist")]
    OrderIdNotFound(i64),
    #[error("Refund request #{0} does not exist")]
    RefundRequestNotFound(i64),
    #[error("Cannot insert order, since it already exists: {0}")]
    OrderAlreadyExists(OrderNumber),
    #[error("Availability conflict. {0}")]
    Conflict(String),
    #[error("The transaction status '{0}' is not recognised")]
    UnknownTransactionStatus(String),
    #[error("The requested change is not allowed. {0}")]
    InvalidState(String),
    #[error("Refund request #{0} has already been decided")]
    AlreadyDecided(i64),
    #[error("{0}")]
    GatewayReversal(#[from] GatewayReversalError),
    #[error("Invalid amount. {0}")]
    InvalidAmount(String),
    #[error("Invalid booking details. {0}")]
    InvalidBookingDetails(String),
}

impl From<sqlx::Error> for BookingError {
    fn from(e: sqlx::Error) -> Self {
        BookingError::DatabaseError(e.to_string())
    }
}

impl BookingError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::OrderNotFound(_) | Self::OrderIdNotFound(_) | Self::RefundRequestNotFound(_))
    }
}
