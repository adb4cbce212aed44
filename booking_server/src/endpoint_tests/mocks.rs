use booking_engine::{GatewayReversalError, RefundGateway, ReversalReceipt, ReversalRequest};
use mockall::mock;

mock! {
    pub Gateway {}
    impl RefundGateway for Gateway {
        async fn reverse(&self, request: &ReversalRequest) -> Result<ReversalReceipt, GatewayReversalError>;
    }
}

pub fn receipt_for(request: &ReversalRequest) -> ReversalReceipt {
    ReversalReceipt {
        transaction_code: request.transaction_code.clone(),
        reference: format!("chargeback-{}", request.refund_key),
        amount: request.amount,
    }
}
