use crate::{
    db_types::{Booking, Order, OrderItem, OrderNumber, PaymentTransaction, RefundRequest},
    traits::BookingError,
};

/// Read-only queries over orders and the records that hang off them.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, BookingError>;

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, BookingError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, BookingError>;

    async fn fetch_booking_for_order(&self, order_id: i64) -> Result<Option<Booking>, BookingError>;

    /// All transaction records for the order, oldest first.
    async fn fetch_transactions_for_order(&self, order_id: i64) -> Result<Vec<PaymentTransaction>, BookingError>;

    /// The most recent success-class transaction for the order. This is the authoritative payment record.
    async fn fetch_settled_transaction(&self, order_id: i64) -> Result<Option<PaymentTransaction>, BookingError>;

    async fn fetch_refund_request(&self, id: i64) -> Result<Option<RefundRequest>, BookingError>;

    async fn fetch_refund_requests_for_order(&self, order_id: i64) -> Result<Vec<RefundRequest>, BookingError>;
}
