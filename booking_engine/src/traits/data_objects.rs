use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db_types::{Booking, Order, OrderNumber, PaymentTransaction, Rupiah, TransactionStatus};

/// A gateway status report that has been parsed into the engine's vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementEvent {
    pub order_number: OrderNumber,
    pub status: TransactionStatus,
    pub gross_amount: Rupiah,
    pub payment_type: String,
    pub transaction_code: String,
    /// The notification exactly as the gateway sent it.
    pub raw_payload: Value,
    pub received_at: DateTime<Utc>,
}

/// An order that moved to `expired`, `cancelled` or `refunded`, along with the cancelled booking.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnulledOrder {
    pub order: Order,
    pub booking: Option<Booking>,
    /// The number of availability days that were released.
    pub released_days: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettlementOutcome {
    /// The event had already been processed. Nothing was written.
    Replayed,
    /// The gateway acknowledged a payment attempt.
    Processing(Order),
    /// Funds were credited to the order.
    Settled { order: Order, booking: Option<Booking>, amount: Rupiah, fully_paid: bool },
    /// The order was cancelled or refunded.
    Annulled(AnnulledOrder),
    /// The event was stored for audit purposes, but did not change the order.
    Recorded(Order),
}

impl SettlementOutcome {
    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::Replayed => None,
            Self::Processing(order) | Self::Recorded(order) => Some(order),
            Self::Settled { order, .. } => Some(order),
            Self::Annulled(annulled) => Some(&annulled.order),
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, Self::Replayed)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InsertTransactionResult {
    Inserted(PaymentTransaction),
    AlreadyExists,
}
