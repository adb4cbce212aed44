use std::{fmt::Display, str::FromStr};

pub use booking_common::Rupiah;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

use crate::helpers::days_inclusive;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

/// Implements `Display` and `FromStr` for a snake_case, text-backed enum.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    s => Err(ConversionError(format!("'{s}' is not a valid {}", stringify!($name)))),
                }
            }
        }
    };
}

//--------------------------------------      OrderNumber      ---------------------------------------------------------
/// The human-readable, unique order reference shared with customers and the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------    OrderStatusType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// Created at checkout. No word from the payment gateway yet.
    Pending,
    /// The gateway has acknowledged a payment attempt that has not settled yet.
    Processing,
    /// A down payment has settled, but the order is not paid in full.
    PartiallyPaid,
    /// The order has been paid in full.
    Paid,
    /// The trip has been fulfilled.
    Delivered,
    /// The payment deadline passed without settlement.
    Expired,
    /// The gateway reported a failed or voided payment.
    Cancelled,
    /// The settled payment was reversed.
    Refunded,
}

text_enum!(OrderStatusType {
    Pending => "pending",
    Processing => "processing",
    PartiallyPaid => "partially_paid",
    Paid => "paid",
    Delivered => "delivered",
    Expired => "expired",
    Cancelled => "cancelled",
    Refunded => "refunded",
});

impl OrderStatusType {
    /// Statuses from which an order can still settle, or expire.
    pub const AWAITING_PAYMENT: [OrderStatusType; 2] = [OrderStatusType::Pending, OrderStatusType::Processing];
    /// Statuses that hold settled funds which may be reversed.
    pub const REFUNDABLE: [OrderStatusType; 2] = [OrderStatusType::Paid, OrderStatusType::PartiallyPaid];

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Expired | Self::Cancelled | Self::Refunded | Self::Delivered)
    }

    pub fn is_awaiting_payment(&self) -> bool {
        Self::AWAITING_PAYMENT.contains(self)
    }

    pub fn is_refundable(&self) -> bool {
        Self::REFUNDABLE.contains(self)
    }

    /// True if a success-class gateway event may still move the order forward.
    pub fn accepts_payment(&self) -> bool {
        self.is_awaiting_payment() || *self == Self::PartiallyPaid
    }
}

/// Classifies an order that has received `paid` out of `total`.
///
/// Returns `None` if nothing has been paid.
pub fn classify_settlement(total: Rupiah, paid: Rupiah) -> Option<OrderStatusType> {
    if !paid.is_positive() {
        None
    } else if paid >= total {
        Some(OrderStatusType::Paid)
    } else {
        Some(OrderStatusType::PartiallyPaid)
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub user_id: i64,
    pub subtotal: Rupiah,
    pub discount_amount: Rupiah,
    pub total_amount: Rupiah,
    pub paid_amount: Rupiah,
    pub status: OrderStatusType,
    pub payment_deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn outstanding(&self) -> Rupiah {
        self.total_amount - self.paid_amount
    }

    pub fn is_past_deadline(&self, now: DateTime<Utc>) -> bool {
        self.payment_deadline <= now
    }

    /// Checks that `status` and `paid_amount` agree with each other.
    pub fn is_consistent(&self) -> bool {
        if self.paid_amount > self.total_amount || self.paid_amount.value() < 0 {
            return false;
        }
        match self.status {
            OrderStatusType::Paid => self.paid_amount == self.total_amount,
            OrderStatusType::PartiallyPaid => self.paid_amount.is_positive() && self.paid_amount < self.total_amount,
            OrderStatusType::Pending | OrderStatusType::Processing => !self.paid_amount.is_positive(),
            _ => true,
        }
    }
}

//--------------------------------------       Bookable        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookableType {
    HolidayPackage,
    CarRental,
    Activity,
    OpenTrip,
    TripPlanner,
    Addon,
}

text_enum!(BookableType {
    HolidayPackage => "holiday_package",
    CarRental => "car_rental",
    Activity => "activity",
    OpenTrip => "open_trip",
    TripPlanner => "trip_planner",
    Addon => "addon",
});

impl BookableType {
    /// Only rentable resources keep a per-day availability calendar.
    pub fn supports_day_availability(&self) -> bool {
        matches!(self, Self::CarRental)
    }

    /// Add-ons can be ordered, but never carry a booking of their own.
    pub fn is_bookable(&self) -> bool {
        !matches!(self, Self::Addon)
    }
}

/// A reference to one purchasable catalog entity: a type tag plus the entity's id in its own catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRow, Serialize, Deserialize)]
pub struct Bookable {
    #[sqlx(rename = "bookable_type")]
    pub kind: BookableType,
    #[sqlx(rename = "bookable_id")]
    pub id: i64,
}

impl Bookable {
    pub fn new(kind: BookableType, id: i64) -> Self {
        Self { kind, id }
    }
}

impl Display for Bookable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

//--------------------------------------       OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    #[sqlx(flatten)]
    pub item: Bookable,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Rupiah,
}

impl OrderItem {
    pub fn line_total(&self) -> Rupiah {
        self.unit_price.saturating_mul(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub item: Bookable,
    pub description: String,
    pub quantity: i64,
    pub unit_price: Rupiah,
}

impl NewOrderItem {
    pub fn new<S: Into<String>>(item: Bookable, description: S, quantity: i64, unit_price: Rupiah) -> Self {
        Self { item, description: description.into(), quantity, unit_price }
    }

    pub fn checked_line_total(&self) -> Option<Rupiah> {
        self.unit_price.checked_mul(self.quantity)
    }

    pub fn line_total(&self) -> Rupiah {
        self.unit_price.saturating_mul(self.quantity)
    }
}

//--------------------------------------    BookingDetails     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaxCount {
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
}

impl PaxCount {
    pub fn new(adults: u32, children: u32) -> Self {
        Self { adults, children }
    }

    pub fn total(&self) -> u32 {
        self.adults + self.children
    }
}

/// The booking-time selections for each kind of bookable service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingDetails {
    HolidayPackage {
        pax: PaxCount,
        #[serde(default)]
        addons: Vec<String>,
        #[serde(default)]
        special_requests: Option<String>,
    },
    CarRental {
        pickup_location: String,
        #[serde(default)]
        dropoff_location: Option<String>,
        #[serde(default)]
        with_driver: bool,
        #[serde(default)]
        addons: Vec<String>,
    },
    Activity {
        pax: PaxCount,
        #[serde(default)]
        session: Option<String>,
    },
    OpenTrip {
        pax: PaxCount,
        #[serde(default)]
        meeting_point: Option<String>,
    },
    TripPlanner {
        pax: PaxCount,
        destinations: Vec<String>,
        #[serde(default)]
        notes: Option<String>,
    },
}

impl BookingDetails {
    pub fn kind(&self) -> BookableType {
        match self {
            Self::HolidayPackage { .. } => BookableType::HolidayPackage,
            Self::CarRental { .. } => BookableType::CarRental,
            Self::Activity { .. } => BookableType::Activity,
            Self::OpenTrip { .. } => BookableType::OpenTrip,
            Self::TripPlanner { .. } => BookableType::TripPlanner,
        }
    }

    /// Where the customer needs to be, if the service has a fixed location.
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::CarRental { pickup_location, .. } => Some(pickup_location.as_str()),
            Self::OpenTrip { meeting_point, .. } => meeting_point.as_deref(),
            _ => None,
        }
    }

    pub fn pax(&self) -> Option<PaxCount> {
        match self {
            Self::HolidayPackage { pax, .. } |
            Self::Activity { pax, .. } |
            Self::OpenTrip { pax, .. } |
            Self::TripPlanner { pax, .. } => Some(*pax),
            Self::CarRental { .. } => None,
        }
    }

    /// Checks that the details describe a booking of the given kind, and that the required selections were made.
    pub fn validate(&self, kind: BookableType) -> Result<(), String> {
        if self.kind() != kind {
            return Err(format!("{} details were supplied for a {kind} booking", self.kind()));
        }
        if let Some(pax) = self.pax() {
            if pax.adults == 0 {
                return Err("at least one adult is required".to_string());
            }
        }
        match self {
            Self::CarRental { pickup_location, .. } if pickup_location.trim().is_empty() => {
                Err("a pickup location is required".to_string())
            },
            Self::TripPlanner { destinations, .. } if destinations.is_empty() => {
                Err("at least one destination is required".to_string())
            },
            _ => Ok(()),
        }
    }
}

//--------------------------------------        Booking        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

text_enum!(BookingStatus {
    Confirmed => "confirmed",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

text_enum!(PaymentStatus {
    Unpaid => "unpaid",
    Partial => "partial",
    Paid => "paid",
});

impl PaymentStatus {
    pub fn for_amounts(amount_paid: Rupiah, total: Rupiah) -> Self {
        if amount_paid >= total {
            Self::Paid
        } else {
            Self::Partial
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub order_id: i64,
    #[sqlx(flatten)]
    pub bookable: Bookable,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub details: Json<BookingDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn cancel(&mut self) {
        self.status = BookingStatus::Cancelled;
        self.payment_status = PaymentStatus::Unpaid;
    }

    pub fn mark_paid(&mut self, amount_paid: Rupiah, total: Rupiah) {
        self.payment_status = PaymentStatus::for_amounts(amount_paid, total);
    }

    pub fn days(&self) -> i64 {
        days_inclusive(self.start_date, self.end_date)
    }

    /// The day range this booking holds on the availability ledger, if its bookable keeps one.
    pub fn availability_hold(&self) -> Option<AvailabilityHold> {
        self.bookable.kind.supports_day_availability().then_some(AvailabilityHold {
            resource_id: self.bookable.id,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityHold {
    pub resource_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub bookable: Bookable,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub details: BookingDetails,
}

impl NewBooking {
    pub fn new(bookable: Bookable, start_date: NaiveDate, end_date: NaiveDate, details: BookingDetails) -> Self {
        Self { bookable, start_date, end_date, details }
    }

    pub fn single_day(bookable: Bookable, date: NaiveDate, details: BookingDetails) -> Self {
        Self::new(bookable, date, date, details)
    }

    pub fn availability_hold(&self) -> Option<AvailabilityHold> {
        self.bookable.kind.supports_day_availability().then_some(AvailabilityHold {
            resource_id: self.bookable.id,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

//--------------------------------------       NewOrder        ---------------------------------------------------------
/// An order as produced by checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub user_id: i64,
    pub items: Vec<NewOrderItem>,
    pub discount_amount: Rupiah,
    pub payment_deadline: DateTime<Utc>,
    pub booking: NewBooking,
}

impl NewOrder {
    pub fn new(
        order_number: OrderNumber,
        user_id: i64,
        booking: NewBooking,
        payment_deadline: DateTime<Utc>,
    ) -> Self {
        Self { order_number, user_id, items: vec![], discount_amount: Rupiah::default(), payment_deadline, booking }
    }

    pub fn with_item(mut self, item: NewOrderItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_discount(mut self, discount: Rupiah) -> Self {
        self.discount_amount = discount;
        self
    }

    pub fn subtotal(&self) -> Rupiah {
        self.items.iter().map(NewOrderItem::line_total).fold(Rupiah::default(), Rupiah::saturating_add)
    }

    /// The subtotal, or `None` if it does not fit in an `i64`.
    pub fn checked_subtotal(&self) -> Option<Rupiah> {
        self.items.iter().try_fold(Rupiah::default(), |acc, item| acc.checked_add(item.checked_line_total()?))
    }

    pub fn total(&self) -> Rupiah {
        let total = self.subtotal() - self.discount_amount;
        total.max(Rupiah::default())
    }
}

//--------------------------------------   TransactionStatus   ---------------------------------------------------------
/// The gateway's vocabulary for the state of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Settlement,
    Capture,
    Deny,
    Cancel,
    Expire,
    Refund,
}

text_enum!(TransactionStatus {
    Pending => "pending",
    Settlement => "settlement",
    Capture => "capture",
    Deny => "deny",
    Cancel => "cancel",
    Expire => "expire",
    Refund => "refund",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionClass {
    /// Payment initiated, not settled.
    Pending,
    /// Funds captured.
    Success,
    /// Payment denied, cancelled or expired at the gateway.
    Failure,
    /// Funds returned to the customer.
    Refund,
}

impl TransactionStatus {
    pub const SETTLED: [TransactionStatus; 2] = [TransactionStatus::Settlement, TransactionStatus::Capture];

    pub fn class(&self) -> TransactionClass {
        match self {
            Self::Pending => TransactionClass::Pending,
            Self::Settlement | Self::Capture => TransactionClass::Success,
            Self::Deny | Self::Cancel | Self::Expire => TransactionClass::Failure,
            Self::Refund => TransactionClass::Refund,
        }
    }
}

//--------------------------------------  PaymentTransaction   ---------------------------------------------------------
/// One status report from the gateway about one payment attempt.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: i64,
    pub order_id: i64,
    pub transaction_code: String,
    pub status: TransactionStatus,
    pub gross_amount: Rupiah,
    pub payment_type: String,
    pub raw_payload: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl PaymentTransaction {
    pub fn is_settled(&self) -> bool {
        TransactionStatus::SETTLED.contains(&self.status)
    }
}

//--------------------------------------  AvailabilityRecord   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    Booked,
    Maintenance,
}

text_enum!(AvailabilityStatus {
    Available => "available",
    Booked => "booked",
    Maintenance => "maintenance",
});

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub id: i64,
    pub resource_id: i64,
    pub date: NaiveDate,
    pub status: AvailabilityStatus,
    /// The order holding this day, when `status` is `Booked`.
    pub order_id: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     RefundRequest     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Approved,
    Rejected,
}

text_enum!(RefundStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundDecision {
    Approved,
    Rejected,
}

text_enum!(RefundDecision {
    Approved => "approved",
    Rejected => "rejected",
});

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct RefundRequest {
    pub id: i64,
    pub order_id: i64,
    pub user_id: i64,
    pub reason: String,
    pub status: RefundStatus,
    /// The gateway's reference for the reversal, once approved.
    pub reversal_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRefundRequest {
    pub order_number: OrderNumber,
    pub user_id: i64,
    pub reason: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn down_payment_classification() {
        let total = Rupiah::from(1_000_000);
        assert_eq!(classify_settlement(total, Rupiah::from(400_000)), Some(OrderStatusType::PartiallyPaid));
        assert_eq!(classify_settlement(total, Rupiah::from(1_000_000)), Some(OrderStatusType::Paid));
        assert_eq!(classify_settlement(total, Rupiah::from(1_200_000)), Some(OrderStatusType::Paid));
        assert_eq!(classify_settlement(total, Rupiah::from(0)), None);
    }

    #[test]
    fn status_round_trip() {
        for status in [
            OrderStatusType::Pending,
            OrderStatusType::Processing,
            OrderStatusType::PartiallyPaid,
            OrderStatusType::Paid,
            OrderStatusType::Delivered,
            OrderStatusType::Expired,
            OrderStatusType::Cancelled,
            OrderStatusType::Refunded,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatusType>().unwrap(), status);
        }
        assert!("settled".parse::<TransactionStatus>().is_err());
        assert_eq!("capture".parse::<TransactionStatus>().unwrap().class(), TransactionClass::Success);
        assert_eq!("expire".parse::<TransactionStatus>().unwrap().class(), TransactionClass::Failure);
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatusType::Delivered.is_terminal());
        assert!(!OrderStatusType::Paid.is_terminal());
        assert!(OrderStatusType::PartiallyPaid.accepts_payment());
        assert!(!OrderStatusType::Expired.accepts_payment());
    }

    fn sample_booking() -> Booking {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        Booking {
            id: 1,
            order_id: 1,
            bookable: Bookable::new(BookableType::CarRental, 7),
            start_date: day,
            end_date: day + chrono::Days::new(2),
            status: BookingStatus::Confirmed,
            payment_status: PaymentStatus::Unpaid,
            details: Json(BookingDetails::CarRental {
                pickup_location: "Ngurah Rai Airport".into(),
                dropoff_location: None,
                with_driver: false,
                addons: vec![],
            }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn booking_payment_and_cancellation() {
        let mut booking = sample_booking();
        booking.mark_paid(Rupiah::from(400_000), Rupiah::from(1_000_000));
        assert_eq!(booking.payment_status, PaymentStatus::Partial);
        booking.mark_paid(Rupiah::from(1_000_000), Rupiah::from(1_000_000));
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
        booking.cancel();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert_eq!(booking.payment_status, PaymentStatus::Unpaid);
        assert_eq!(booking.days(), 3);
        let hold = booking.availability_hold().unwrap();
        assert_eq!(hold.resource_id, 7);
    }

    #[test]
    fn details_validation() {
        let details = BookingDetails::OpenTrip { pax: PaxCount::new(2, 1), meeting_point: Some("Labuan Bajo".into()) };
        assert!(details.validate(BookableType::OpenTrip).is_ok());
        assert!(details.validate(BookableType::Activity).is_err());
        assert_eq!(details.location(), Some("Labuan Bajo"));
        let no_adults = BookingDetails::Activity { pax: PaxCount::new(0, 2), session: None };
        assert!(no_adults.validate(BookableType::Activity).is_err());
        let json = r#"{"type":"car_rental","pickup_location":"Kuta"}"#;
        let parsed: BookingDetails = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.kind(), BookableType::CarRental);
        assert!(parsed.validate(BookableType::CarRental).is_ok());
    }

    #[test]
    fn order_totals() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let booking = NewBooking::single_day(
            Bookable::new(BookableType::Activity, 3),
            day,
            BookingDetails::Activity { pax: PaxCount::new(2, 0), session: None },
        );
        let order = NewOrder::new("ORD-1".into(), 9, booking, Utc::now())
            .with_item(NewOrderItem::new(Bookable::new(BookableType::Activity, 3), "Snorkelling", 2, 300_000.into()))
            .with_item(NewOrderItem::new(Bookable::new(BookableType::Addon, 11), "GoPro rental", 1, 50_000.into()))
            .with_discount(Rupiah::from(100_000));
        assert_eq!(order.subtotal(), Rupiah::from(650_000));
        assert_eq!(order.total(), Rupiah::from(550_000));
        let order = order.with_discount(Rupiah::from(1_000_000));
        assert_eq!(order.total(), Rupiah::from(0));
    }
}
