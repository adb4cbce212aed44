use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db_types::{Bookable, Booking, Order, OrderItem, OrderNumber, OrderStatusType, Rupiah};

/// One line of an order, as it appears on a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationLine {
    pub description: String,
    pub quantity: i64,
    pub unit_price: Rupiah,
    pub line_total: Rupiah,
}

impl From<&OrderItem> for NotificationLine {
    fn from(item: &OrderItem) -> Self {
        Self {
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            line_total: item.line_total(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSchedule {
    pub bookable: Bookable,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub location: Option<String>,
}

impl From<&Booking> for BookingSchedule {
    fn from(booking: &Booking) -> Self {
        Self {
            bookable: booking.bookable,
            start_date: booking.start_date,
            end_date: booking.end_date,
            location: booking.details.location().map(String::from),
        }
    }
}

/// Everything the email service needs to render a message about an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNotification {
    pub order_number: OrderNumber,
    pub user_id: i64,
    pub status: OrderStatusType,
    pub total_amount: Rupiah,
    pub paid_amount: Rupiah,
    pub outstanding: Rupiah,
    pub lines: Vec<NotificationLine>,
    pub schedule: Option<BookingSchedule>,
}

impl OrderNotification {
    pub fn new(order: &Order, items: &[OrderItem], booking: Option<&Booking>) -> Self {
        Self {
            order_number: order.order_number.clone(),
            user_id: order.user_id,
            status: order.status,
            total_amount: order.total_amount,
            paid_amount: order.paid_amount,
            outstanding: order.outstanding(),
            lines: items.iter().map(NotificationLine::from).collect(),
            schedule: booking.map(BookingSchedule::from),
        }
    }
}

/// Sent to the order's owner whenever funds are credited to the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceivedEvent {
    pub notification: OrderNotification,
    pub amount: Rupiah,
    pub transaction_code: String,
    pub payment_type: String,
}

/// Sent to the administrators when an order has been paid in full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub notification: OrderNotification,
}

impl OrderPaidEvent {
    pub fn new(notification: OrderNotification) -> Self {
        Self { notification }
    }
}

/// Sent when an order is expired, cancelled or refunded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub notification: OrderNotification,
    pub status: OrderStatusType,
}

impl OrderAnnulledEvent {
    pub fn new(notification: OrderNotification) -> Self {
        let status = notification.status;
        Self { notification, status }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventType {
    PaymentReceived(PaymentReceivedEvent),
    OrderPaid(OrderPaidEvent),
    OrderAnnulled(OrderAnnulledEvent),
}

impl EventType {
    pub fn order_number(&self) -> &OrderNumber {
        match self {
            Self::PaymentReceived(ev) => &ev.notification.order_number,
            Self::OrderPaid(ev) => &ev.notification.order_number,
            Self::OrderAnnulled(ev) => &ev.notification.order_number,
        }
    }
}
