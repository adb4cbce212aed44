use std::fmt::Display;

use booking_engine::{
    db_types::{RefundDecision, Rupiah},
    order_objects::GatewayEvent,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The gateway sends amounts as decimal strings ("400000.00"), but a bare number is accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GatewayAmount {
    Text(String),
    Number(Number),
}

impl TryFrom<&GatewayAmount> for Rupiah {
    type Error = ServerError;

    fn try_from(value: &GatewayAmount) -> Result<Self, Self::Error> {
        match value {
            GatewayAmount::Text(s) => {
                s.parse::<Rupiah>().map_err(|e| ServerError::CouldNotDeserializePayload(format!("gross_amount: {e}")))
            },
            GatewayAmount::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(v), _) => Ok(Rupiah::from(v)),
                (None, Some(v)) => v.to_string().parse::<Rupiah>().map_err(|e| {
                    ServerError::CouldNotDeserializePayload(format!("gross_amount: {e}"))
                }),
                (None, None) => {
                    Err(ServerError::CouldNotDeserializePayload(format!("gross_amount: {n} is out of range")))
                },
            },
        }
    }
}

/// The fields of a gateway settlement callback that the engine needs. The callback carries many more, and the whole
/// body is kept as the transaction's raw payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayNotification {
    pub order_id: String,
    pub transaction_status: String,
    pub gross_amount: GatewayAmount,
    #[serde(default)]
    pub payment_type: String,
    pub transaction_id: String,
}

impl GatewayNotification {
    pub fn into_gateway_event(self, raw_payload: Value) -> Result<GatewayEvent, ServerError> {
        let gross_amount = Rupiah::try_from(&self.gross_amount)?;
        Ok(GatewayEvent {
            order_number: self.order_id.into(),
            transaction_status: self.transaction_status.trim().to_ascii_lowercase(),
            gross_amount,
            payment_type: self.payment_type,
            transaction_code: self.transaction_id,
            raw_payload,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundSubmission {
    pub user_id: i64,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RefundDecisionParams {
    pub decision: RefundDecision,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InitializeAvailabilityParams {
    pub from: NaiveDate,
    #[serde(default)]
    pub horizon_days: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}
