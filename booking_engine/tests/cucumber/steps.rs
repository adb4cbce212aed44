use booking_engine::{
    db_types::{AvailabilityStatus, OrderNumber, OrderStatusType, PaymentStatus, Rupiah},
    test_utils::fixtures::{car_rental_order, date, gateway_event, holiday_order, timestamp},
    BookingError,
    OrderManagement,
};
use chrono::Duration;
use cucumber::{given, then, when};

use crate::cucumber::{world::BookingSystem, BookingWorld};

const CHECKOUT_TIME: &str = "2024-06-01T08:00:00Z";

#[given("a fresh install")]
async fn fresh_database(world: &mut BookingWorld) {
    world.system = Some(BookingSystem::new().await);
}

#[given(expr = "car {int} has a calendar of {int} days from {word}")]
async fn car_calendar(world: &mut BookingWorld, car_id: i64, days: u32, from: String) {
    world.system().availability.initialize(car_id, date(&from), Some(days)).await.expect("Error creating calendar");
}

#[when(expr = "user {int} places order {word} for a holiday package costing {int} IDR")]
async fn place_holiday_order(world: &mut BookingWorld, user_id: i64, order_number: String, total: i64) {
    let deadline = timestamp(CHECKOUT_TIME) + Duration::hours(24);
    let order = holiday_order(&order_number, user_id, total, deadline);
    world.system().flow.create_order(order).await.expect("Error creating order");
}

#[when(expr = "user {int} rents car {int} from {word} to {word} in order {word} for {int} IDR")]
async fn rent_car(
    world: &mut BookingWorld,
    user_id: i64,
    car_id: i64,
    start: String,
    end: String,
    order_number: String,
    total: i64,
) {
    let deadline = timestamp(CHECKOUT_TIME) + Duration::hours(24);
    let order = car_rental_order(&order_number, user_id, car_id, &start, &end, total, deadline);
    world.last_error = world.system().flow.create_order(order).await.err();
}

#[when(expr = "the gateway reports {word} [{word}] of {int} IDR for order {word}")]
async fn gateway_reports(world: &mut BookingWorld, status: String, code: String, amount: i64, order_number: String) {
    let ev = gateway_event(&order_number, &status, amount, &code);
    world.last_error = world.system().flow.process_gateway_event(ev, timestamp(CHECKOUT_TIME)).await.err();
}

#[when(expr = "the expiry sweep runs at {word}")]
async fn sweep(world: &mut BookingWorld, at: String) {
    world.system().expiry.sweep(timestamp(&at)).await.expect("Error running the expiry sweep");
}

#[then("the last request failed with a conflict")]
async fn last_request_conflicted(world: &mut BookingWorld) {
    let err = world.last_error.take().expect("The last request succeeded");
    assert!(matches!(err, BookingError::Conflict(_)), "Unexpected error: {err}");
}

#[then("the last request succeeded")]
async fn last_request_succeeded(world: &mut BookingWorld) {
    if let Some(err) = world.last_error.take() {
        panic!("The last request failed: {err}");
    }
}

async fn fetch_order(world: &BookingWorld, order_number: &str) -> booking_engine::db_types::Order {
    let order_number = OrderNumber::from(order_number);
    world
        .system()
        .db
        .fetch_order_by_number(&order_number)
        .await
        .expect("Error fetching order")
        .unwrap_or_else(|| panic!("Order {order_number} does not exist"))
}

#[then(expr = "order {word} has status {string}")]
async fn order_status(world: &mut BookingWorld, order_number: String, status: String) {
    let order = fetch_order(world, &order_number).await;
    let expected = status.parse::<OrderStatusType>().expect("Unknown order status");
    assert_eq!(order.status, expected, "Status is incorrect");
}

#[then(expr = "order {word} has {int} IDR outstanding")]
async fn order_outstanding(world: &mut BookingWorld, order_number: String, amount: i64) {
    let order = fetch_order(world, &order_number).await;
    assert_eq!(order.outstanding(), Rupiah::from(amount), "Outstanding amount is incorrect");
}

#[then(expr = "order {word} has {int} IDR paid")]
async fn order_paid(world: &mut BookingWorld, order_number: String, amount: i64) {
    let order = fetch_order(world, &order_number).await;
    assert_eq!(order.paid_amount, Rupiah::from(amount), "Paid amount is incorrect");
}

#[then(expr = "the booking for order {word} has payment status {string}")]
async fn booking_payment_status(world: &mut BookingWorld, order_number: String, status: String) {
    let order = fetch_order(world, &order_number).await;
    let booking = world
        .system()
        .db
        .fetch_booking_for_order(order.id)
        .await
        .expect("Error fetching booking")
        .expect("Order has no booking");
    let expected = status.parse::<PaymentStatus>().expect("Unknown payment status");
    assert_eq!(booking.payment_status, expected, "Payment status is incorrect");
}

async fn check_car_days(world: &BookingWorld, car_id: i64, start: &str, end: &str, expected: AvailabilityStatus) {
    let days =
        world.system().availability.fetch(car_id, date(start), date(end)).await.expect("Error fetching availability");
    assert!(!days.is_empty(), "Car {car_id} has no calendar for these days");
    for day in days {
        assert_eq!(day.status, expected, "Car {car_id} is {} on {}", day.status, day.date);
    }
}

#[then(expr = "car {int} is booked from {word} to {word}")]
async fn car_booked(world: &mut BookingWorld, car_id: i64, start: String, end: String) {
    check_car_days(world, car_id, &start, &end, AvailabilityStatus::Booked).await;
}

#[then(expr = "car {int} is available from {word} to {word}")]
async fn car_available(world: &mut BookingWorld, car_id: i64, start: String, end: String) {
    check_car_days(world, car_id, &start, &end, AvailabilityStatus::Available).await;
}
