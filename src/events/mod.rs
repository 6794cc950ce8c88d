//! Domain events.
//!
//! Commands publish through an [`EventSender`]; [`process_events`] logs each
//! event, raises low-stock warnings and rebroadcasts it on the [`ChangeFeed`]
//! that live subscriptions read from.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::StockStatus;

pub mod feed;

pub use feed::{ChangeFeed, Subscription, SubscriptionFilter};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sender paired with a fresh receiver, for wiring the processor.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    pub async fn send(&self, event: Event) -> Result<(), ServiceError> {
        self.sender
            .send(event)
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))
    }

    /// Publishes after a committed write. The write already succeeded, so a
    /// closed channel is logged rather than reported to the caller.
    pub async fn publish(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            warn!(event = name, error = %e, "event dropped");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    MedicineCreated {
        user_id: String,
        medicine_id: Uuid,
        aisle_id: Uuid,
        name: String,
    },
    MedicineUpdated {
        user_id: String,
        medicine_id: Uuid,
        aisle_id: Uuid,
    },
    MedicineDeleted {
        user_id: String,
        medicine_id: Uuid,
        aisle_id: Uuid,
    },
    StockAdjusted {
        user_id: String,
        medicine_id: Uuid,
        aisle_id: Uuid,
        old_quantity: i32,
        new_quantity: i32,
        status: StockStatus,
    },
    AisleCreated {
        user_id: String,
        aisle_id: Uuid,
        name: String,
    },
    AisleUpdated {
        user_id: String,
        aisle_id: Uuid,
    },
    AisleDeleted {
        user_id: String,
        aisle_id: Uuid,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::MedicineCreated { .. } => "medicine_created",
            Event::MedicineUpdated { .. } => "medicine_updated",
            Event::MedicineDeleted { .. } => "medicine_deleted",
            Event::StockAdjusted { .. } => "stock_adjusted",
            Event::AisleCreated { .. } => "aisle_created",
            Event::AisleUpdated { .. } => "aisle_updated",
            Event::AisleDeleted { .. } => "aisle_deleted",
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Event::MedicineCreated { user_id, .. }
            | Event::MedicineUpdated { user_id, .. }
            | Event::MedicineDeleted { user_id, .. }
            | Event::StockAdjusted { user_id, .. }
            | Event::AisleCreated { user_id, .. }
            | Event::AisleUpdated { user_id, .. }
            | Event::AisleDeleted { user_id, .. } => user_id,
        }
    }

    pub fn medicine_id(&self) -> Option<Uuid> {
        match self {
            Event::MedicineCreated { medicine_id, .. }
            | Event::MedicineUpdated { medicine_id, .. }
            | Event::MedicineDeleted { medicine_id, .. }
            | Event::StockAdjusted { medicine_id, .. } => Some(*medicine_id),
            _ => None,
        }
    }

    pub fn aisle_id(&self) -> Uuid {
        match self {
            Event::MedicineCreated { aisle_id, .. }
            | Event::MedicineUpdated { aisle_id, .. }
            | Event::MedicineDeleted { aisle_id, .. }
            | Event::StockAdjusted { aisle_id, .. }
            | Event::AisleCreated { aisle_id, .. }
            | Event::AisleUpdated { aisle_id, .. }
            | Event::AisleDeleted { aisle_id, .. } => *aisle_id,
        }
    }
}

/// Consumes events until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, feed: ChangeFeed) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        info!(event = event.name(), user_id = event.user_id(), "Received event");
        crate::metrics::EVENTS_PROCESSED
            .with_label_values(&[event.name()])
            .inc();

        handle_event(&event);

        let delivered = feed.publish(event);
        debug!(subscribers = delivered, "Event rebroadcast");
    }

    info!("Event channel closed; event processing stopped");
}

fn handle_event(event: &Event) {
    match event {
        Event::StockAdjusted {
            medicine_id,
            old_quantity,
            new_quantity,
            status,
            ..
        } => {
            info!(
                "Stock adjusted: medicine={}, old_quantity={}, new_quantity={}",
                medicine_id, old_quantity, new_quantity
            );
            match status {
                StockStatus::Critical => warn!(
                    "Critical stock level for medicine {}: {} remaining",
                    medicine_id, new_quantity
                ),
                StockStatus::Warning => warn!(
                    "Low stock for medicine {}: {} remaining",
                    medicine_id, new_quantity
                ),
                StockStatus::Normal => {}
            }
        }
        Event::MedicineDeleted { medicine_id, .. } => {
            info!("Medicine {} deleted; history retained", medicine_id);
        }
        Event::AisleDeleted { aisle_id, .. } => {
            info!("Aisle {} deleted", aisle_id);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock_event(user: &str) -> Event {
        Event::StockAdjusted {
            user_id: user.into(),
            medicine_id: Uuid::new_v4(),
            aisle_id: Uuid::new_v4(),
            old_quantity: 20,
            new_quantity: 15,
            status: StockStatus::Warning,
        }
    }

    #[tokio::test]
    async fn processor_rebroadcasts_to_subscribers() {
        let feed = ChangeFeed::new(16);
        let mut subscription = feed.subscribe(SubscriptionFilter::for_user("user-1"));
        let (sender, rx) = EventSender::channel(8);
        let processor = tokio::spawn(process_events(rx, feed.clone()));

        let event = stock_event("user-1");
        sender.send(event.clone()).await.unwrap();
        assert_eq!(subscription.next().await, Some(event));

        drop(sender);
        processor.await.unwrap();
    }

    #[tokio::test]
    async fn publish_on_closed_channel_does_not_panic() {
        let (sender, rx) = EventSender::channel(1);
        drop(rx);
        assert!(sender.send(stock_event("u")).await.is_err());
        sender.publish(stock_event("u")).await;
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(stock_event("user-1")).unwrap();
        assert_eq!(json["type"], "stock_adjusted");
        assert_eq!(json["status"], "warning");
        assert_eq!(json["new_quantity"], 15);
    }
}
