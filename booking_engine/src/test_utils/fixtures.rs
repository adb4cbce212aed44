//! Builders for the orders and gateway notifications used throughout the test suites.
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;

use crate::{
    db_types::{Bookable, BookableType, BookingDetails, NewBooking, NewOrder, NewOrderItem, PaxCount, Rupiah},
    order_objects::GatewayEvent,
};

/// Parses a `YYYY-MM-DD` date. Panics on bad input.
pub fn date(s: &str) -> NaiveDate {
    s.parse().expect("Invalid date in test fixture")
}

/// Parses an RFC 3339 timestamp. Panics on bad input.
pub fn timestamp(s: &str) -> DateTime<Utc> {
    s.parse().expect("Invalid timestamp in test fixture")
}

/// A single-item holiday package order for two adults, totalling `total`.
pub fn holiday_order(order_number: &str, user_id: i64, total: i64, deadline: DateTime<Utc>) -> NewOrder {
    let bookable = Bookable::new(BookableType::HolidayPackage, 1);
    let details = BookingDetails::HolidayPackage { pax: PaxCount::new(2, 0), addons: vec![], special_requests: None };
    let booking = NewBooking::new(bookable, date("2024-07-01"), date("2024-07-04"), details);
    NewOrder::new(order_number.into(), user_id, booking, deadline).with_item(NewOrderItem::new(
        bookable,
        "Bali 4D3N holiday package",
        1,
        Rupiah::from(total),
    ))
}

/// A car rental of `car_id` from `start` to `end` (inclusive), totalling `total`.
pub fn car_rental_order(
    order_number: &str,
    user_id: i64,
    car_id: i64,
    start: &str,
    end: &str,
    total: i64,
    deadline: DateTime<Utc>,
) -> NewOrder {
    let bookable = Bookable::new(BookableType::CarRental, car_id);
    let details = BookingDetails::CarRental {
        pickup_location: "Ngurah Rai Airport".into(),
        dropoff_location: None,
        with_driver: true,
        addons: vec![],
    };
    let booking = NewBooking::new(bookable, date(start), date(end), details);
    NewOrder::new(order_number.into(), user_id, booking, deadline).with_item(NewOrderItem::new(
        bookable,
        "Toyota Avanza with driver",
        1,
        Rupiah::from(total),
    ))
}

/// A gateway notification as the gateway would send it.
pub fn gateway_event(order_number: &str, status: &str, amount: i64, transaction_code: &str) -> GatewayEvent {
    GatewayEvent {
        order_number: order_number.into(),
        transaction_status: status.into(),
        gross_amount: Rupiah::from(amount),
        payment_type: "bank_transfer".into(),
        transaction_code: transaction_code.into(),
        raw_payload: json!({
            "order_id": order_number,
            "transaction_status": status,
            "gross_amount": format!("{amount}.00"),
            "payment_type": "bank_transfer",
            "transaction_id": transaction_code,
        }),
    }
}
