//! Order state transitions that span several tables.
//!
//! Every function here expects to run inside a transaction that has already locked the order row (see
//! [`super::orders::lock_order_by_number`]), and receives the order as it was read under that lock.
use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqliteConnection;

use super::{availability, bookings, orders, transactions};
use crate::{
    db_types::{classify_settlement, Booking, Order, OrderStatusType, PaymentStatus, PaymentTransaction},
    traits::{AnnulledOrder, BookingError, SettlementOutcome},
};

/// Cancels the booking of an order that has just moved to a terminal status, and frees any days it held.
pub async fn annul_order(
    order: Order,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<AnnulledOrder, BookingError> {
    let booking = bookings::cancel_booking(order.id, now, conn).await?;
    let released_days = match booking.as_ref().and_then(Booking::availability_hold) {
        Some(hold) => {
            availability::release_for_order(hold.resource_id, hold.start_date, hold.end_date, order.id, conn).await?
        },
        None => 0,
    };
    debug!("🗃️ Order {} is {}. Booking cancelled, {released_days} days released", order.order_number, order.status);
    Ok(AnnulledOrder { order, booking, released_days })
}

/// The gateway has acknowledged a payment attempt.
pub async fn apply_pending(
    order: Order,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<SettlementOutcome, BookingError> {
    if order.status != OrderStatusType::Pending {
        trace!("🗃️ Pending notification for {} recorded. Order is already {}", order.order_number, order.status);
        return Ok(SettlementOutcome::Recorded(order));
    }
    let from = [OrderStatusType::Pending];
    let outcome = match orders::update_status_if(order.id, OrderStatusType::Processing, &from, now, conn).await? {
        Some(updated) => SettlementOutcome::Processing(updated),
        None => SettlementOutcome::Recorded(order),
    };
    Ok(outcome)
}

/// Funds have been captured for the order.
pub async fn apply_success(
    order: Order,
    txn: &PaymentTransaction,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<SettlementOutcome, BookingError> {
    if !order.status.accepts_payment() {
        if order.status.is_terminal() {
            error!(
                "🗃️ {} of {} was settled for order {}, but the order is already {}. The payment has been recorded, \
                 but needs manual review.",
                txn.transaction_code, txn.gross_amount, order.order_number, order.status
            );
        } else {
            warn!(
                "🗃️ {} of {} was settled for order {}, which is already {}. The payment has been recorded as an \
                 overpayment.",
                txn.transaction_code, txn.gross_amount, order.order_number, order.status
            );
        }
        return Ok(SettlementOutcome::Recorded(order));
    }
    if transactions::is_already_credited(order.id, &txn.transaction_code, txn.id, conn).await? {
        debug!(
            "🗃️ {} [{}] for order {} has already been credited. Recorded only.",
            txn.transaction_code, txn.status, order.order_number
        );
        return Ok(SettlementOutcome::Recorded(order));
    }
    let total = order.total_amount;
    let mut paid = order.paid_amount.saturating_add(txn.gross_amount);
    if paid > total {
        warn!(
            "🗃️ Order {} has been overpaid. {paid} was received against a total of {total}. The paid amount is capped \
             at the order total.",
            order.order_number
        );
        paid = total;
    }
    // Nothing paid after a positive settlement means a zero-value order, which is paid in full.
    let status = classify_settlement(total, paid).unwrap_or(OrderStatusType::Paid);
    let Some(updated) = orders::apply_payment(order.id, paid, status, now, conn).await? else {
        return Ok(SettlementOutcome::Recorded(order));
    };
    let booking =
        bookings::update_payment_status(order.id, PaymentStatus::for_amounts(paid, total), now, conn).await?;
    if let Some(hold) = booking.as_ref().and_then(Booking::availability_hold) {
        match availability::reserve(hold.resource_id, hold.start_date, hold.end_date, order.id, conn).await {
            Ok(_) => {},
            Err(BookingError::Conflict(msg)) => {
                error!(
                    "🗃️ Order {} has been paid, but its availability hold could not be confirmed and needs manual \
                     review. {msg}",
                    order.order_number
                );
            },
            Err(e) => return Err(e),
        }
    }
    let amount = paid - order.paid_amount;
    let fully_paid = status == OrderStatusType::Paid;
    info!("🗃️ Order {} credited with {amount}. It is now {status} ({paid} of {total})", order.order_number);
    Ok(SettlementOutcome::Settled { order: updated, booking, amount, fully_paid })
}

/// The gateway reported a denied, cancelled or expired payment.
pub async fn apply_failure(
    order: Order,
    txn: &PaymentTransaction,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<SettlementOutcome, BookingError> {
    if order.status.is_terminal() {
        debug!("🗃️ {} for order {} recorded. Order is already {}", txn.status, order.order_number, order.status);
        return Ok(SettlementOutcome::Recorded(order));
    }
    if order.status.is_refundable() {
        // Only a void of the payment that is holding the funds cancels a paid order.
        let settled = transactions::fetch_settled_transaction(order.id, conn).await?;
        if settled.as_ref().map(|s| s.transaction_code.as_str()) != Some(txn.transaction_code.as_str()) {
            info!(
                "🗃️ {} of stale payment attempt {} for order {} recorded. The order remains {}",
                txn.status, txn.transaction_code, order.order_number, order.status
            );
            return Ok(SettlementOutcome::Recorded(order));
        }
    }
    let from = [
        OrderStatusType::Pending,
        OrderStatusType::Processing,
        OrderStatusType::PartiallyPaid,
        OrderStatusType::Paid,
    ];
    match orders::update_status_if(order.id, OrderStatusType::Cancelled, &from, now, conn).await? {
        Some(updated) => {
            info!("🗃️ Order {} cancelled after the gateway reported '{}'", updated.order_number, txn.status);
            Ok(SettlementOutcome::Annulled(annul_order(updated, now, conn).await?))
        },
        None => Ok(SettlementOutcome::Recorded(order)),
    }
}

/// The gateway reported that the payment was returned to the customer.
pub async fn apply_refund(
    order: Order,
    txn: &PaymentTransaction,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<SettlementOutcome, BookingError> {
    if !order.status.is_refundable() {
        info!(
            "🗃️ Refund {} for order {} recorded. The order is {} and is left as is",
            txn.transaction_code, order.order_number, order.status
        );
        return Ok(SettlementOutcome::Recorded(order));
    }
    let from = OrderStatusType::REFUNDABLE;
    match orders::update_status_if(order.id, OrderStatusType::Refunded, &from, now, conn).await? {
        Some(updated) => {
            info!("🗃️ Order {} refunded by the payment gateway", updated.order_number);
            Ok(SettlementOutcome::Annulled(annul_order(updated, now, conn).await?))
        },
        None => Ok(SettlementOutcome::Recorded(order)),
    }
}
