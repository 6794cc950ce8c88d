use futures::stream::{self, Stream};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;
use uuid::Uuid;

use super::Event;

/// Fan-out of committed changes to live subscribers.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<Event>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns how many subscribers received the event.
    pub fn publish(&self, event: Event) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self, filter: SubscriptionFilter) -> Subscription {
        Subscription {
            receiver: Some(self.sender.subscribe()),
            filter,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Which events a subscription receives. Always scoped to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub user_id: String,
    pub medicine_id: Option<Uuid>,
    pub aisle_id: Option<Uuid>,
}

impl SubscriptionFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            medicine_id: None,
            aisle_id: None,
        }
    }

    pub fn medicine(mut self, medicine_id: Uuid) -> Self {
        self.medicine_id = Some(medicine_id);
        self
    }

    pub fn aisle(mut self, aisle_id: Uuid) -> Self {
        self.aisle_id = Some(aisle_id);
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        event.user_id() == self.user_id
            && self
                .medicine_id
                .map_or(true, |id| event.medicine_id() == Some(id))
            && self.aisle_id.map_or(true, |id| event.aisle_id() == id)
    }
}

/// A live subscription. Dropping it, or calling [`Subscription::cancel`], stops delivery.
#[derive(Debug)]
pub struct Subscription {
    receiver: Option<broadcast::Receiver<Event>>,
    filter: SubscriptionFilter,
}

impl Subscription {
    /// Next matching event; `None` once cancelled or the feed is gone.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        user_id = %self.filter.user_id,
                        skipped,
                        "change subscription lagged; events were skipped"
                    );
                }
                Err(RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    pub fn cancel(&mut self) {
        self.receiver = None;
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }

    pub fn filter(&self) -> &SubscriptionFilter {
        &self.filter
    }

    pub fn into_stream(self) -> impl Stream<Item = Event> + Send {
        stream::unfold(self, |mut subscription| async move {
            subscription
                .next()
                .await
                .map(|event| (event, subscription))
        })
    }
}
