//! Booking Engine
//!
//! The booking engine runs the order lifecycle of the trip booking service: orders move from `pending` through
//! (partial) payment to fulfilment, or end up expired, cancelled or refunded. Each transition keeps the order's
//! booking and the availability calendar of rented resources consistent with the order.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@traits`] and [`mod@sqlite`]). SQLite is the supported backend. You
//!    should never need to access the database directly. Instead, use the public API provided by the engine. The
//!    exception is the data types used in the database. These are defined in the `db_types` module and are public.
//! 2. The public API ([`mod@api`]). [`OrderFlowApi`] handles checkout, payment gateway notifications and fulfilment,
//!    [`ExpiryApi`] expires unpaid orders, [`RefundApi`] runs the refund workflow and [`AvailabilityApi`] manages
//!    resource calendars.
//!
//! The engine also emits events when payments are received and when orders are paid or annulled. A simple pub-sub
//! framework in [`mod@events`] lets you hook into these events, e.g. to send emails.
pub mod api;
pub mod db_types;
pub mod events;
pub mod helpers;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{
    availability_api::AvailabilityApi,
    expiry_api::ExpiryApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    refund_api::RefundApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    AvailabilityManagement,
    BookingDatabase,
    BookingError,
    GatewayReversalError,
    OrderManagement,
    RefundGateway,
    ReversalReceipt,
    ReversalRequest,
};
