use log::*;

use crate::{
    db_types::{Booking, Order, Rupiah},
    events::{
        publish_to_all,
        EventProducers,
        OrderAnnulledEvent,
        OrderNotification,
        OrderPaidEvent,
        PaymentReceivedEvent,
    },
    traits::{AnnulledOrder, OrderManagement},
};

pub(crate) struct PaymentReceived<'a> {
    pub amount: Rupiah,
    pub fully_paid: bool,
    pub transaction_code: &'a str,
    pub payment_type: &'a str,
}

/// Builds the notification snapshot for an order. A failure to load the order lines is logged, and the notification
/// goes out without them: the state change has already been committed.
async fn notification_for<B: OrderManagement>(db: &B, order: &Order, booking: Option<&Booking>) -> OrderNotification {
    let items = match db.fetch_order_items(order.id).await {
        Ok(items) => items,
        Err(e) => {
            warn!("📬️ Could not load the items for order {}. The notification will omit them. {e}", order.order_number);
            vec![]
        },
    };
    OrderNotification::new(order, &items, booking)
}

pub(crate) async fn publish_payment_received<B: OrderManagement>(
    db: &B,
    producers: &EventProducers,
    order: &Order,
    booking: Option<&Booking>,
    event: PaymentReceived<'_>,
) {
    let wants_receipt = !producers.payment_received_producer.is_empty();
    let wants_alert = event.fully_paid && !producers.order_paid_producer.is_empty();
    if !wants_receipt && !wants_alert {
        return;
    }
    let notification = notification_for(db, order, booking).await;
    if wants_alert {
        debug!("📬️ Notifying order paid hook subscribers about {}", order.order_number);
        publish_to_all(&producers.order_paid_producer, OrderPaidEvent::new(notification.clone())).await;
    }
    if wants_receipt {
        debug!("📬️ Notifying payment received hook subscribers about {}", order.order_number);
        let ev = PaymentReceivedEvent {
            notification,
            amount: event.amount,
            transaction_code: event.transaction_code.to_string(),
            payment_type: event.payment_type.to_string(),
        };
        publish_to_all(&producers.payment_received_producer, ev).await;
    }
}

pub(crate) async fn publish_annulled<B: OrderManagement>(db: &B, producers: &EventProducers, annulled: &AnnulledOrder) {
    if producers.order_annulled_producer.is_empty() {
        return;
    }
    debug!("📬️ Notifying order annulled hook subscribers about {}", annulled.order.order_number);
    let notification = notification_for(db, &annulled.order, annulled.booking.as_ref()).await;
    publish_to_all(&producers.order_annulled_producer, OrderAnnulledEvent::new(notification)).await;
}
