use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    api::{
        notifications::{publish_annulled, publish_payment_received, PaymentReceived},
        order_objects::{GatewayEvent, OrderSummary},
    },
    db_types::{Booking, NewOrder, Order, OrderNumber, Rupiah},
    events::EventProducers,
    traits::{BookingDatabase, BookingError, SettlementOutcome},
};

/// `OrderFlowApi` is the primary API for moving orders through their lifecycle: checkout, payment settlement in
/// response to payment gateway notifications, and fulfilment.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: BookingDatabase
{
    /// Stores a new order coming out of checkout.
    ///
    /// The booking details are checked against the bookable's type, and the order totals are calculated from the
    /// items. For car rentals, the booked days are held for the order straight away, so two customers can never pay
    /// for the same car on the same day.
    pub async fn create_order(&self, order: NewOrder) -> Result<(Order, Booking), BookingError> {
        validate_new_order(&order)?;
        let (order, booking) = self.db.insert_order(order).await?;
        info!(
            "🔄️📦️ Order {} created for user #{}. Total {} due by {}",
            order.order_number, order.user_id, order.total_amount, order.payment_deadline
        );
        Ok((order, booking))
    }

    /// Reconciles a payment gateway notification against its order.
    ///
    /// Every write for the event happens in one database transaction. Replays of an event that has already been
    /// processed are silently ignored.
    pub async fn process_gateway_event(
        &self,
        event: GatewayEvent,
        received_at: DateTime<Utc>,
    ) -> Result<SettlementOutcome, BookingError> {
        let event = event.into_settlement_event(received_at)?;
        trace!(
            "🔄️💰️ Processing '{}' for order {} ({}, {})",
            event.status,
            event.order_number,
            event.transaction_code,
            event.gross_amount
        );
        let outcome = match self.db.process_settlement_event(&event).await {
            Ok(outcome) => outcome,
            Err(e @ BookingError::OrderNotFound(_)) => {
                let code = &event.transaction_code;
                warn!("🔄️💰️ Notification {code} refers to an unknown order. It has been dropped. {e}");
                return Err(e);
            },
            Err(e) => {
                let (code, order_number) = (&event.transaction_code, &event.order_number);
                error!("🔄️💰️ Could not process notification {code} for {order_number}. {e}");
                return Err(e);
            },
        };
        match &outcome {
            SettlementOutcome::Replayed => {
                debug!("🔄️💰️ Notification {} [{}] is a replay", event.transaction_code, event.status);
            },
            SettlementOutcome::Processing(order) => {
                info!("🔄️💰️ Payment for order {} is being processed by the gateway", order.order_number);
            },
            SettlementOutcome::Settled { order, booking, amount, fully_paid } => {
                info!(
                    "🔄️💰️ Order {} received {amount}. It is now {} with {} outstanding",
                    order.order_number,
                    order.status,
                    order.outstanding()
                );
                let payment = PaymentReceived {
                    amount: *amount,
                    fully_paid: *fully_paid,
                    transaction_code: &event.transaction_code,
                    payment_type: &event.payment_type,
                };
                publish_payment_received(&self.db, &self.producers, order, booking.as_ref(), payment).await;
            },
            SettlementOutcome::Annulled(annulled) => {
                info!("🔄️❌️ Order {} is now {}", annulled.order.order_number, annulled.order.status);
                publish_annulled(&self.db, &self.producers, annulled).await;
            },
            SettlementOutcome::Recorded(order) => {
                debug!(
                    "🔄️💰️ Notification {} [{}] recorded against order {} ({})",
                    event.transaction_code, event.status, order.order_number, order.status
                );
            },
        }
        Ok(outcome)
    }

    /// Marks a paid order as fulfilled.
    pub async fn mark_delivered(&self, order_number: &OrderNumber) -> Result<Order, BookingError> {
        let order = self.db.mark_order_delivered(order_number).await?;
        info!("🔄️✅️ Order {} has been delivered", order.order_number);
        Ok(order)
    }

    /// Fetches the order along with its items, booking, transaction history and refund requests.
    pub async fn order_summary(&self, order_number: &OrderNumber) -> Result<OrderSummary, BookingError> {
        let order = self
            .db
            .fetch_order_by_number(order_number)
            .await?
            .ok_or_else(|| BookingError::OrderNotFound(order_number.clone()))?;
        let items = self.db.fetch_order_items(order.id).await?;
        let booking = self.db.fetch_booking_for_order(order.id).await?;
        let transactions = self.db.fetch_transactions_for_order(order.id).await?;
        let refund_requests = self.db.fetch_refund_requests_for_order(order.id).await?;
        Ok(OrderSummary { order, items, booking, transactions, refund_requests })
    }
}

fn validate_new_order(order: &NewOrder) -> Result<(), BookingError> {
    if order.order_number.as_str().trim().is_empty() {
        return Err(BookingError::InvalidBookingDetails("An order number is required".into()));
    }
    if order.items.is_empty() {
        return Err(BookingError::InvalidBookingDetails(format!("Order {} has no items", order.order_number)));
    }
    if let Some(item) = order.items.iter().find(|i| i.quantity <= 0 || i.unit_price < Rupiah::from(0)) {
        return Err(BookingError::InvalidAmount(format!(
            "'{}' has quantity {} at {} each",
            item.description, item.quantity, item.unit_price
        )));
    }
    if order.checked_subtotal().is_none() {
        return Err(BookingError::InvalidAmount(format!("The total of order {} is too large", order.order_number)));
    }
    if order.discount_amount < Rupiah::from(0) {
        return Err(BookingError::InvalidAmount(format!("The discount {} is negative", order.discount_amount)));
    }
    let booking = &order.booking;
    if !booking.bookable.kind.is_bookable() {
        return Err(BookingError::InvalidBookingDetails(format!("{} cannot be booked on its own", booking.bookable)));
    }
    if booking.end_date < booking.start_date {
        return Err(BookingError::InvalidBookingDetails(format!(
            "The booking ends ({}) before it starts ({})",
            booking.end_date, booking.start_date
        )));
    }
    booking.details.validate(booking.bookable.kind).map_err(BookingError::InvalidBookingDetails)
}
