//! Simple stateless pub-sub event handler
//!
//! This module provides a simple hook system that allows components of the system to subscribe to order lifecycle
//! events (payments received, orders paid, orders annulled) and react to them. The event handler is stateless, i.e.
//! the handlers have no access to the internal state of the system. All that is received is the event itself.
//!
//! However, the handlers can be async. Each event is handled on its own task, so a slow notification endpoint does
//! not hold up the order flow that published the event.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    listener: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        Self { listener: receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    /// Runs until every producer has been dropped, and all in-flight events have been handled.
    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // Only producers keep the channel open, so that dropping the last one shuts the handler down.
        drop(self.sender);
        let mut jobs = JoinSet::new();
        while let Some(ev) = self.listener.recv().await {
            trace!("📬️ Handling event");
            let handler = Arc::clone(&self.handler);
            jobs.spawn(async move {
                (handler)(ev).await;
            });
            // Reap finished jobs so the set does not grow without bound on a long-running server
            while let Some(done) = jobs.try_join_next() {
                if let Err(e) = done {
                    warn!("📬️ Event handler task failed: {e}");
                }
            }
        }
        if !jobs.is_empty() {
            debug!("📬️ Waiting for {} jobs to complete", jobs.len());
        }
        while let Some(done) = jobs.join_next().await {
            if let Err(e) = done {
                warn!("📬️ Event handler task failed: {e}. Some notifications may not have been sent.");
            }
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to send event: {e}");
        }
    }
}

/// Sends a copy of `event` to every producer in the list.
pub async fn publish_to_all<E: Clone + Send + Sync>(producers: &[EventProducer<E>], event: E) {
    for producer in producers {
        producer.publish_event(event.clone()).await;
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicI64, Ordering};

    use super::*;

    #[derive(Clone, Debug)]
    struct Credited {
        amount: i64,
    }

    #[tokio::test]
    async fn every_event_is_handled_before_shutdown() {
        let _ = env_logger::try_init();
        let total = Arc::new(AtomicI64::new(0));
        let t2 = total.clone();
        let handler = Arc::new(move |ev: Credited| {
            let total = total.clone();
            Box::pin(async move {
                tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
                let _ = total.fetch_add(ev.amount, Ordering::SeqCst);
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let event_handler = EventHandler::new(1, handler);
        let settlements = event_handler.subscribe();
        let refunds = event_handler.subscribe();
        tokio::spawn(async move {
            for amount in [400_000, 600_000] {
                settlements.publish_event(Credited { amount }).await;
            }
        });
        tokio::spawn(async move {
            publish_to_all(&[refunds], Credited { amount: -1_000_000 }).await;
        });

        event_handler.start_handler().await;
        assert_eq!(t2.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn publish_to_all_fans_out() {
        let count = Arc::new(AtomicI64::new(0));
        let make_handler = |count: Arc<AtomicI64>| {
            Arc::new(move |_: Credited| {
                let count = count.clone();
                Box::pin(async move {
                    count.fetch_add(1, Ordering::SeqCst);
                }) as Pin<Box<dyn Future<Output = ()> + Send>>
            })
        };
        let a = EventHandler::new(4, make_handler(count.clone()));
        let b = EventHandler::new(4, make_handler(count.clone()));
        let producers = vec![a.subscribe(), b.subscribe()];
        publish_to_all(&producers, Credited { amount: 1 }).await;
        drop(producers);
        a.start_handler().await;
        b.start_handler().await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
