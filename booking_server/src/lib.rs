//! # Booking server
//! This crate hosts the server code for the trip booking engine. It is responsible for:
//! * Listening for settlement callbacks from the payment gateway, and passing them on to the engine.
//! * Running the expiry worker, which expires orders that are past their payment deadline.
//! * Handling refund requests from customers, and refund decisions from administrators. Approved refunds are reversed
//!   at the payment gateway.
//! * Delivering order notifications to the email service.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/gateway/notification`: The payment gateway settlement callback.
//! * `/orders/{order_number}/refunds`: Customer refund requests.
//! * `/admin/...`: Order, refund and availability administration. Requires the `X-Admin-Key` header.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod gateway;
pub mod middleware;
pub mod notifications;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
