use std::time::Duration;

use booking_engine::{db_types::OrderNumber, events::EventProducers, ExpiryApi, SqliteDatabase};
use chrono::Utc;
use log::*;
use tokio::task::JoinHandle;

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_expiry_worker(db: SqliteDatabase, producers: EventProducers, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = ExpiryApi::new(db, producers);
        info!("🕰️ Unpaid order expiry worker started. Sweeping every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            debug!("🕰️ Running unpaid order expiry job");
            match api.sweep(Utc::now()).await {
                Ok(result) => {
                    if result.total_count() > 0 {
                        info!(
                            "🕰️ {} orders expired, {} skipped, {} failed",
                            result.expired_count(),
                            result.skipped.len(),
                            result.failed.len()
                        );
                    }
                    debug!("🕰️ Expired orders: {}", order_list(&result.expired));
                    for (order_number, reason) in &result.failed {
                        warn!("🕰️ Order {order_number} could not be expired and will be retried. {reason}");
                    }
                },
                Err(e) => {
                    error!("🕰️ Error running unpaid order expiry job: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[OrderNumber]) -> String {
    orders.iter().map(|o| o.to_string()).collect::<Vec<String>>().join(", ")
}
