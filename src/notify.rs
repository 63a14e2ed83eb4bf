//! Out-of-stock event publishing.

use tokio::sync::broadcast;
use tracing::debug;

/// Events published by the vending machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The stock level just transitioned from one to zero.
    OutOfStock,
}

/// Fire-and-forget publish channel for machine events.
///
/// Publishing is best-effort: a publish with no subscribers (or a lagged
/// subscriber) is logged and dropped, and never fails the order that
/// triggered it.
#[derive(Clone)]
pub struct Notifications {
    sender: broadcast::Sender<Notification>,
}

impl Notifications {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn publish(&self, notification: Notification) {
        if self.sender.send(notification.clone()).is_err() {
            debug!(?notification, "no subscribers for notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_is_harmless() {
        let notifications = Notifications::new(4);
        notifications.publish(Notification::OutOfStock);
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let notifications = Notifications::new(4);
        let mut events = notifications.subscribe();
        notifications.publish(Notification::OutOfStock);
        assert_eq!(events.recv().await.unwrap(), Notification::OutOfStock);
    }
}
