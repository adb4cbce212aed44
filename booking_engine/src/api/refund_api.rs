use std::{
    collections::HashSet,
    fmt::Debug,
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    api::notifications::publish_annulled,
    db_types::{NewRefundRequest, OrderNumber, RefundDecision, RefundRequest, RefundStatus},
    events::EventProducers,
    traits::{BookingDatabase, BookingError, GatewayReversalError, RefundGateway, ReversalRequest},
};

pub const DEFAULT_REVERSAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Customer refund requests, and their review by an administrator.
///
/// Approving a request reverses the payment at the gateway before anything is written locally. If the reversal fails
/// or times out, the request stays pending and can be decided again.
pub struct RefundApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    reversal_timeout: Duration,
    in_flight: Arc<Mutex<HashSet<i64>>>,
}

impl<B: Clone, G: Clone> Clone for RefundApi<B, G> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            gateway: self.gateway.clone(),
            producers: self.producers.clone(),
            reversal_timeout: self.reversal_timeout,
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<B, G> Debug for RefundApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RefundApi")
    }
}

impl<B, G> RefundApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self {
            db,
            gateway,
            producers,
            reversal_timeout: DEFAULT_REVERSAL_TIMEOUT,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn with_reversal_timeout(mut self, timeout: Duration) -> Self {
        self.reversal_timeout = timeout;
        self
    }
}

impl<B, G> RefundApi<B, G>
where
    B: BookingDatabase,
    G: RefundGateway,
{
    /// Files a refund request on behalf of the order's owner.
    ///
    /// ## Failure modes:
    /// - `OrderNotFound` if the order does not exist.
    /// - `InvalidState` if the order belongs to someone else, has not been paid, or already has a pending or approved
    ///   refund request.
    pub async fn submit(
        &self,
        order_number: &OrderNumber,
        user_id: i64,
        reason: &str,
    ) -> Result<RefundRequest, BookingError> {
        let order = self
            .db
            .fetch_order_by_number(order_number)
            .await?
            .ok_or_else(|| BookingError::OrderNotFound(order_number.clone()))?;
        if order.user_id != user_id {
            warn!("💸️ User #{user_id} asked for a refund on order {order_number}, which belongs to someone else");
            return Err(BookingError::InvalidState(format!("Order {order_number} does not belong to user #{user_id}")));
        }
        if !order.status.is_refundable() {
            return Err(BookingError::InvalidState(format!(
                "Order {order_number} is {}. Only paid orders can be refunded",
                order.status
            )));
        }
        if self.db.fetch_settled_transaction(order.id).await?.is_none() {
            return Err(BookingError::InvalidState(format!("Order {order_number} has no settled payment to refund")));
        }
        let existing = self.db.fetch_refund_requests_for_order(order.id).await?;
        if let Some(open) = existing.iter().find(|r| r.status != RefundStatus::Rejected) {
            return Err(BookingError::InvalidState(format!(
                "Order {order_number} already has a refund request (#{}, {})",
                open.id, open.status
            )));
        }
        let request =
            NewRefundRequest { order_number: order_number.clone(), user_id, reason: reason.trim().to_string() };
        let request = self.db.insert_refund_request(request).await?;
        info!("💸️ Refund request #{} filed for order {order_number}", request.id);
        Ok(request)
    }

    /// Applies an administrator's decision to a pending refund request.
    ///
    /// ## Failure modes:
    /// - `RefundRequestNotFound` if the request does not exist.
    /// - `AlreadyDecided` if the request is no longer pending.
    /// - `InvalidState` if another decision on the same request is in progress.
    /// - `GatewayReversal` if the gateway could not reverse the payment. Nothing is changed locally.
    pub async fn decide(
        &self,
        request_id: i64,
        decision: RefundDecision,
        now: DateTime<Utc>,
    ) -> Result<RefundRequest, BookingError> {
        let _guard = InFlightGuard::acquire(&self.in_flight, request_id)?;
        let request =
            self.db.fetch_refund_request(request_id).await?.ok_or(BookingError::RefundRequestNotFound(request_id))?;
        if request.status != RefundStatus::Pending {
            return Err(BookingError::AlreadyDecided(request_id));
        }
        match decision {
            RefundDecision::Rejected => {
                let request = self.db.reject_refund_request(request_id, now).await?;
                info!("💸️ Refund request #{request_id} rejected");
                Ok(request)
            },
            RefundDecision::Approved => self.approve(request, now).await,
        }
    }

    async fn approve(&self, request: RefundRequest, now: DateTime<Utc>) -> Result<RefundRequest, BookingError> {
        let order =
            self.db.fetch_order_by_id(request.order_id).await?.ok_or(BookingError::OrderIdNotFound(request.order_id))?;
        if !order.status.is_refundable() {
            return Err(BookingError::InvalidState(format!(
                "Order {} is {} and cannot be refunded",
                order.order_number, order.status
            )));
        }
        let settled = self.db.fetch_settled_transaction(order.id).await?.ok_or_else(|| {
            BookingError::InvalidState(format!("Order {} has no settled payment to refund", order.order_number))
        })?;
        let reversal = ReversalRequest {
            order_number: order.order_number.clone(),
            transaction_code: settled.transaction_code,
            refund_key: format!("refund-{}", request.id),
            amount: order.paid_amount,
            reason: request.reason.clone(),
        };
        debug!("💸️ Asking the gateway to reverse {} for order {}", reversal.amount, order.order_number);
        let receipt = match tokio::time::timeout(self.reversal_timeout, self.gateway.reverse(&reversal)).await {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(e)) => {
                error!("💸️ The gateway refused to reverse the payment for order {}. {e}", order.order_number);
                return Err(e.into());
            },
            Err(_) => {
                error!(
                    "💸️ The gateway did not answer the reversal for order {} within {:?}. The refund request stays \
                     pending.",
                    order.order_number, self.reversal_timeout
                );
                return Err(GatewayReversalError::Timeout.into());
            },
        };
        let (approved, annulled) = self.db.approve_refund_request(request.id, &receipt, now).await.map_err(|e| {
            error!(
                "💸️ The gateway reversed {} for order {} (reference {}), but the approval could not be saved. Manual \
                 review is needed. {e}",
                receipt.amount, order.order_number, receipt.reference
            );
            e
        })?;
        info!(
            "💸️ Refund request #{} approved. {} returned for order {}",
            approved.id, receipt.amount, order.order_number
        );
        publish_annulled(&self.db, &self.producers, &annulled).await;
        Ok(approved)
    }
}

/// Marks a refund request as having a decision in progress, for as long as the guard lives.
struct InFlightGuard {
    set: Arc<Mutex<HashSet<i64>>>,
    id: i64,
}

impl InFlightGuard {
    fn acquire(set: &Arc<Mutex<HashSet<i64>>>, id: i64) -> Result<Self, BookingError> {
        let mut ids = set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !ids.insert(id) {
            let msg = format!("A decision on refund request #{id} is already in progress");
            return Err(BookingError::InvalidState(msg));
        }
        Ok(Self { set: Arc::clone(set), id })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut ids = self.set.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        ids.remove(&self.id);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn in_flight_guard_blocks_until_dropped() {
        let set = Arc::new(Mutex::new(HashSet::new()));
        let guard = InFlightGuard::acquire(&set, 1).unwrap();
        assert!(matches!(InFlightGuard::acquire(&set, 1), Err(BookingError::InvalidState(_))));
        assert!(InFlightGuard::acquire(&set, 2).is_ok());
        drop(guard);
        assert!(InFlightGuard::acquire(&set, 1).is_ok());
    }
}
