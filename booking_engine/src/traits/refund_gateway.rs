use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{OrderNumber, Rupiah};

/// A request to return settled funds to the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalRequest {
    pub order_number: OrderNumber,
    /// The gateway's code for the settled transaction being reversed.
    pub transaction_code: String,
    /// Unique per refund request, so that the gateway can deduplicate retries.
    pub refund_key: String,
    pub amount: Rupiah,
    pub reason: String,
}

/// The gateway's acknowledgement of a successful reversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalReceipt {
    pub transaction_code: String,
    pub reference: String,
    pub amount: Rupiah,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayReversalError {
    #[error("The payment gateway did not respond in time")]
    Timeout,
    #[error("The payment gateway rejected the reversal. {0}")]
    Rejected(String),
    #[error("Could not reach the payment gateway. {0}")]
    Transport(String),
}

/// The boundary to the payment gateway's refund API.
#[allow(async_fn_in_trait)]
pub trait RefundGateway {
    async fn reverse(&self, request: &ReversalRequest) -> Result<ReversalReceipt, GatewayReversalError>;
}
