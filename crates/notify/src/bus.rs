//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the live change feed of the service: notification
//! inserts and sound-setting updates are published here and fanned out
//! to every active session's [`LiveFeed`](crate::feed::LiveFeed). It is
//! designed to be shared via `Arc<EventBus>` across the application.

use tdy_core::sound::SoundSetting;
use tdy_db::models::notification::Notification;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// FeedEvent
// ---------------------------------------------------------------------------

/// A change-feed event.
///
/// Events are delivered in publish order per subscriber; the bus does
/// not deduplicate, so a redelivered event shows up twice downstream.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// A notification row was inserted.
    NotificationInserted(Notification),
    /// The admin sound setting changed.
    SoundSettingUpdated(SoundSetting),
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`FeedEvent`].
pub struct EventBus {
    sender: broadcast::Sender<FeedEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are
    /// dropped and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// the notification row itself is already persisted.
    pub fn publish(&self, event: FeedEvent) {
        // Ignore the SendError -- it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sample_notification(user_id: i64) -> Notification {
        Notification {
            id: 1,
            user_id,
            title: "New order".to_string(),
            message: String::new(),
            kind: "order".to_string(),
            is_read: false,
            metadata: serde_json::json!({}),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(FeedEvent::NotificationInserted(sample_notification(7)));

        let received = rx.recv().await.expect("should receive the event");
        assert_matches!(
            received,
            FeedEvent::NotificationInserted(n) if n.user_id == 7
        );
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(FeedEvent::SoundSettingUpdated(SoundSetting::Preset {
            name: "chime".to_string(),
        }));

        assert_matches!(
            rx1.recv().await.expect("subscriber 1 should receive"),
            FeedEvent::SoundSettingUpdated(_)
        );
        assert_matches!(
            rx2.recv().await.expect("subscriber 2 should receive"),
            FeedEvent::SoundSettingUpdated(_)
        );
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        // No subscribers -- this must not panic.
        bus.publish(FeedEvent::NotificationInserted(sample_notification(1)));
    }
}
