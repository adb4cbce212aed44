use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    db_types::{
        Booking,
        Order,
        OrderItem,
        OrderNumber,
        PaymentTransaction,
        RefundRequest,
        Rupiah,
        TransactionClass,
        TransactionStatus,
    },
    traits::{BookingError, SettlementEvent},
};

/// A payment gateway notification, before its status has been checked against the known vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayEvent {
    pub order_number: OrderNumber,
    pub transaction_status: String,
    pub gross_amount: Rupiah,
    pub payment_type: String,
    pub transaction_code: String,
    pub raw_payload: Value,
}

impl GatewayEvent {
    /// Parses the event into the engine's vocabulary.
    ///
    /// ## Failure modes:
    /// - `UnknownTransactionStatus` for a status outside the gateway's documented set.
    /// - `InvalidAmount` for a success-class event that does not carry a positive amount.
    pub fn into_settlement_event(self, received_at: DateTime<Utc>) -> Result<SettlementEvent, BookingError> {
        let status = self.transaction_status.parse::<TransactionStatus>().map_err(|_| {
            error!(
                "🔄️ Notification for order {} carries the unknown status '{}'. It has been dropped and needs manual \
                 review. Payload: {}",
                self.order_number, self.transaction_status, self.raw_payload
            );
            BookingError::UnknownTransactionStatus(self.transaction_status.clone())
        })?;
        if status.class() == TransactionClass::Success && !self.gross_amount.is_positive() {
            return Err(BookingError::InvalidAmount(format!(
                "{} for order {} settled a non-positive amount ({})",
                self.transaction_code, self.order_number, self.gross_amount
            )));
        }
        Ok(SettlementEvent {
            order_number: self.order_number,
            status,
            gross_amount: self.gross_amount,
            payment_type: self.payment_type,
            transaction_code: self.transaction_code,
            raw_payload: self.raw_payload,
            received_at,
        })
    }
}

/// The result of one expiry sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepResult {
    /// Orders that were expired by this sweep.
    pub expired: Vec<OrderNumber>,
    /// Orders that settled (or were otherwise resolved) between selection and expiry.
    pub skipped: Vec<OrderNumber>,
    /// Orders that could not be expired, and the reason. They will be retried on the next sweep.
    pub failed: Vec<(OrderNumber, String)>,
}

impl SweepResult {
    pub fn expired_count(&self) -> usize {
        self.expired.len()
    }

    pub fn total_count(&self) -> usize {
        self.expired.len() + self.skipped.len() + self.failed.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// An order together with everything that hangs off it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub booking: Option<Booking>,
    pub transactions: Vec<PaymentTransaction>,
    pub refund_requests: Vec<RefundRequest>,
}
