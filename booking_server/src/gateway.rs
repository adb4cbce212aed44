//! Client for the payment gateway's refund API.
//!
//! Reversals are posted to `{base_url}/v2/{transaction_code}/refund`, authenticated with the server key as the
//! basic-auth user. The gateway reports some failures with a 200 response and an error `status_code` in the body, so
//! the body is always checked.
use std::sync::Arc;

use booking_engine::{
    db_types::Rupiah,
    GatewayReversalError,
    RefundGateway,
    ReversalReceipt,
    ReversalRequest,
};
use booking_common::Secret;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::GatewayConfig;

#[derive(Debug, Error)]
pub enum GatewayClientError {
    #[error("Could not initialize the gateway client: {0}")]
    Initialization(String),
    #[error("The gateway request timed out")]
    Timeout,
    #[error("Could not reach the gateway: {0}")]
    Transport(String),
    #[error("The gateway refused the request. Error {status}. {message}")]
    Rejected { status: String, message: String },
    #[error("Could not read the gateway response: {0}")]
    InvalidResponse(String),
}

impl From<GatewayClientError> for GatewayReversalError {
    fn from(e: GatewayClientError) -> Self {
        match e {
            GatewayClientError::Timeout => Self::Timeout,
            GatewayClientError::Rejected { .. } => Self::Rejected(e.to_string()),
            e => Self::Transport(e.to_string()),
        }
    }
}

impl From<reqwest::Error> for GatewayClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct RefundBody<'a> {
    refund_key: &'a str,
    amount: i64,
    reason: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
struct RefundResponse {
    status_code: String,
    #[serde(default)]
    status_message: String,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    refund_chargeback_id: Option<Value>,
    #[serde(default)]
    refund_amount: Option<String>,
    #[serde(default)]
    refund_key: Option<String>,
}

impl RefundResponse {
    fn is_success(&self) -> bool {
        self.status_code == "200"
    }

    fn into_receipt(self, request: &ReversalRequest) -> ReversalReceipt {
        let reference = match self.refund_chargeback_id {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => self.refund_key.unwrap_or_else(|| request.refund_key.clone()),
        };
        let amount = self
            .refund_amount
            .and_then(|s| {
                s.parse::<Rupiah>()
                    .map_err(|e| warn!("💸️ The gateway returned an unreadable refund amount ({s}). {e}"))
                    .ok()
            })
            .unwrap_or(request.amount);
        ReversalReceipt {
            transaction_code: self.transaction_id.unwrap_or_else(|| request.transaction_code.clone()),
            reference,
            amount,
        }
    }
}

#[derive(Clone)]
pub struct HttpRefundGateway {
    base_url: String,
    server_key: Secret<String>,
    client: Arc<Client>,
}

impl HttpRefundGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayClientError> {
        let mut headers = HeaderMap::with_capacity(2);
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayClientError::Initialization(e.to_string()))?;
        Ok(Self { base_url: config.base_url.clone(), server_key: config.server_key.clone(), client: Arc::new(client) })
    }

    fn url(&self, transaction_code: &str) -> String {
        format!("{}/v2/{transaction_code}/refund", self.base_url)
    }

    pub async fn request_reversal(&self, request: &ReversalRequest) -> Result<ReversalReceipt, GatewayClientError> {
        let url = self.url(&request.transaction_code);
        let body =
            RefundBody { refund_key: &request.refund_key, amount: request.amount.value(), reason: &request.reason };
        trace!("💸️ Sending reversal request to {url}");
        let response = self
            .client
            .post(url)
            .basic_auth(self.server_key.reveal(), None::<&str>)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await?;
            return Err(GatewayClientError::Rejected { status: status.as_u16().to_string(), message });
        }
        let result = response.json::<RefundResponse>().await?;
        if !result.is_success() {
            return Err(GatewayClientError::Rejected { status: result.status_code, message: result.status_message });
        }
        debug!("💸️ Reversal for {} accepted by the gateway. {}", request.order_number, result.status_message);
        Ok(result.into_receipt(request))
    }
}

impl RefundGateway for HttpRefundGateway {
    async fn reverse(&self, request: &ReversalRequest) -> Result<ReversalReceipt, GatewayReversalError> {
        self.request_reversal(request).await.map_err(GatewayReversalError::from)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn request() -> ReversalRequest {
        ReversalRequest {
            order_number: "ORD-1".into(),
            transaction_code: "tx-1".into(),
            refund_key: "refund-3".into(),
            amount: Rupiah::from(1_000_000),
            reason: "Flight cancelled".into(),
        }
    }

    #[test]
    fn gateway_errors_in_a_200_body() {
        let body = json!({
            "status_code": "412",
            "status_message": "Merchant cannot modify the status of the transaction"
        });
        let response: RefundResponse = serde_json::from_value(body).unwrap();
        assert!(!response.is_success());
    }

    #[test]
    fn receipt_from_response() {
        let body = json!({
            "status_code": "200",
            "status_message": "Success, refund request is approved",
            "transaction_id": "tx-1",
            "refund_chargeback_id": 1203,
            "refund_amount": "1000000.00",
            "refund_key": "refund-3"
        });
        let response: RefundResponse = serde_json::from_value(body).unwrap();
        assert!(response.is_success());
        let receipt = response.into_receipt(&request());
        assert_eq!(receipt.reference, "1203");
        assert_eq!(receipt.amount, Rupiah::from(1_000_000));
        assert_eq!(receipt.transaction_code, "tx-1");
    }

    #[test]
    fn receipt_falls_back_to_the_request() {
        let response: RefundResponse = serde_json::from_value(json!({"status_code": "200"})).unwrap();
        let receipt = response.into_receipt(&request());
        assert_eq!(receipt.reference, "refund-3");
        assert_eq!(receipt.amount, Rupiah::from(1_000_000));
    }

    #[test]
    fn client_errors_become_reversal_errors() {
        let rejected = GatewayClientError::Rejected { status: "412".into(), message: "nope".into() };
        assert!(matches!(GatewayReversalError::from(rejected), GatewayReversalError::Rejected(_)));
        assert_eq!(GatewayReversalError::from(GatewayClientError::Timeout), GatewayReversalError::Timeout);
        let url = HttpRefundGateway::new(&GatewayConfig::default()).unwrap().url("tx-9");
        assert_eq!(url, "https://api.sandbox.midtrans.com/v2/tx-9/refund");
    }
}
