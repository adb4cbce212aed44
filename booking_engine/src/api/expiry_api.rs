use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    api::{notifications::publish_annulled, order_objects::SweepResult},
    events::EventProducers,
    traits::{BookingDatabase, BookingError},
};

/// Expires orders that have not been paid by their payment deadline.
pub struct ExpiryApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ExpiryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExpiryApi")
    }
}

impl<B> ExpiryApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ExpiryApi<B>
where B: BookingDatabase
{
    /// Expires every pending or processing order whose payment deadline is at or before `now`.
    ///
    /// Each order is expired in its own transaction. If one fails, the error is logged and recorded in the result,
    /// and the sweep carries on with the rest of the batch. An order that settled after it was selected is skipped:
    /// settlement always wins over expiry.
    ///
    /// An error is only returned if the batch could not be selected at all.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepResult, BookingError> {
        let candidates = self.db.fetch_expirable_orders(now).await?;
        trace!("🕰️ {} orders are past their payment deadline", candidates.len());
        let mut result = SweepResult::default();
        for order in candidates {
            match self.db.expire_order(order.id, now).await {
                Ok(Some(annulled)) => {
                    info!(
                        "🕰️ Order {} expired. Its payment deadline was {}",
                        order.order_number, order.payment_deadline
                    );
                    publish_annulled(&self.db, &self.producers, &annulled).await;
                    result.expired.push(order.order_number);
                },
                Ok(None) => {
                    debug!("🕰️ Order {} was resolved before it could be expired", order.order_number);
                    result.skipped.push(order.order_number);
                },
                Err(e) => {
                    let order_number = &order.order_number;
                    error!("🕰️ Could not expire order {order_number}. It will be retried on the next sweep. {e}");
                    result.failed.push((order.order_number, e.to_string()));
                },
            }
        }
        Ok(result)
    }
}
