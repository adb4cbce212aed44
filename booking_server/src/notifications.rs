//! Delivery of order notifications to the email service.
//!
//! Every engine event is wrapped in an [`EventType`] and POSTed as JSON to the configured notification URL. Without a
//! URL, the notification is written to the log instead, which is handy in development.
use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use booking_engine::events::{EventHooks, EventType};
use log::*;
use reqwest::Client;

use crate::errors::ServerError;

const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(15);

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Clone)]
pub struct NotificationClient {
    url: Option<String>,
    client: Arc<Client>,
}

impl NotificationClient {
    pub fn new(url: Option<String>) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(NOTIFICATION_TIMEOUT)
            .build()
            .map_err(|e| ServerError::InitializeError(format!("Could not create the notification client. {e}")))?;
        Ok(Self { url, client: Arc::new(client) })
    }

    /// Sends the notification. Failures are logged, never returned: by the time a notification goes out, the change
    /// it describes has been committed.
    pub async fn deliver(&self, event: EventType) {
        let order_number = event.order_number().clone();
        let Some(url) = &self.url else {
            let body = serde_json::to_string(&event).unwrap_or_else(|e| format!("{e}"));
            info!("📬️ Notification for order {order_number}: {body}");
            return;
        };
        match self.client.post(url).json(&event).send().await {
            Ok(res) if res.status().is_success() => {
                debug!("📬️ Notification for order {order_number} delivered");
            },
            Ok(res) => {
                let status = res.status();
                warn!("📬️ The notification service refused the notification for order {order_number}. {status}");
            },
            Err(e) => {
                warn!("📬️ Could not deliver the notification for order {order_number}. {e}");
            },
        }
    }
}

/// Hooks every engine event up to `client`.
pub fn notification_hooks(client: NotificationClient) -> EventHooks {
    let mut hooks = EventHooks::default();
    let c = client.clone();
    hooks.on_payment_received(move |ev| {
        let c = c.clone();
        Box::pin(async move { c.deliver(EventType::PaymentReceived(ev)).await }) as HookFuture
    });
    let c = client.clone();
    hooks.on_order_paid(move |ev| {
        let c = c.clone();
        Box::pin(async move { c.deliver(EventType::OrderPaid(ev)).await }) as HookFuture
    });
    hooks.on_order_annulled(move |ev| {
        let c = client.clone();
        Box::pin(async move { c.deliver(EventType::OrderAnnulled(ev)).await }) as HookFuture
    });
    hooks
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn all_events_are_hooked() {
        let client = NotificationClient::new(None).unwrap();
        let hooks = notification_hooks(client);
        assert!(hooks.on_payment_received.is_some());
        assert!(hooks.on_order_paid.is_some());
        assert!(hooks.on_order_annulled.is_some());
    }
}
