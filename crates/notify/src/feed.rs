//! Per-session live feed: bridges the event bus into store mutations,
//! toasts, and sounds.
//!
//! One [`LiveFeed`] task runs per authenticated session. It subscribes
//! to the [`EventBus`](crate::bus::EventBus), forwards this user's
//! notification inserts to their [`NotificationStore`], plays the
//! configured sound for order notifications, and renders toasts. Admin
//! sessions additionally track sound-setting updates in shared state so
//! the next order event uses the new sound. The loop exits when the bus
//! sender is dropped or the session's receiver is torn down.

use std::sync::Arc;

use tdy_core::notification::{self, NotificationKind};
use tdy_core::sound::{self, SoundSetting};
use tdy_core::types::DbId;
use tokio::sync::{broadcast, RwLock};

use crate::bus::FeedEvent;
use crate::player::Player;
use crate::store::{NotificationSource, NotificationStore};

/// Sink for user-visible toast messages. Fire-and-forget; no result is
/// consumed by the feed.
pub trait ToastSink: Send + Sync {
    fn show(&self, toast: notification::Toast);
}

/// Identity of the session a feed serves.
#[derive(Debug, Clone, Copy)]
pub struct FeedSession {
    pub user_id: DbId,
    pub is_admin: bool,
}

/// Per-session subscription loop.
pub struct LiveFeed;

impl LiveFeed {
    /// Run the feed loop for one session.
    ///
    /// Events arrive in bus order; the feed neither reorders nor
    /// deduplicates. A lagged receiver logs and continues, a closed bus
    /// ends the loop.
    pub async fn run<S: NotificationSource>(
        mut receiver: broadcast::Receiver<FeedEvent>,
        session: FeedSession,
        store: Arc<NotificationStore<S>>,
        player: Arc<Player>,
        toasts: Arc<dyn ToastSink>,
        sound_setting: Arc<RwLock<Option<SoundSetting>>>,
    ) {
        loop {
            match receiver.recv().await {
                Ok(FeedEvent::NotificationInserted(n)) => {
                    if n.user_id != session.user_id {
                        continue;
                    }

                    let kind =
                        NotificationKind::parse(&n.kind).unwrap_or(NotificationKind::Info);
                    let toast = notification::toast_for(kind, &n.title, &n.message, &n.metadata);

                    store.on_insert(n).await;

                    if kind == NotificationKind::Order {
                        let setting = sound_setting.read().await.clone();
                        let cue = sound::resolve_cue(setting.as_ref());
                        player.play(&cue);
                    }

                    toasts.show(toast);
                }
                Ok(FeedEvent::SoundSettingUpdated(setting)) => {
                    if session.is_admin {
                        tracing::debug!(
                            user_id = session.user_id,
                            "Sound setting updated for session"
                        );
                        *sound_setting.write().await = Some(setting);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        user_id = session.user_id,
                        skipped = n,
                        "Live feed lagged, some events were not delivered"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!(user_id = session.user_id, "Event bus closed, feed shutting down");
                    break;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tdy_core::notification::Toast;
    use tdy_db::models::notification::Notification;

    use crate::bus::EventBus;
    use crate::player::AudioSink;
    use crate::store::{RetryPolicy, StoreError};

    /// Source that never fails and starts empty; the feed only appends.
    struct EmptySource;

    #[async_trait]
    impl NotificationSource for EmptySource {
        async fn fetch_recent(&self, _: DbId, _: i64) -> Result<Vec<Notification>, StoreError> {
            Ok(Vec::new())
        }
        async fn mark_read(&self, _: DbId, _: DbId) -> Result<bool, StoreError> {
            Ok(true)
        }
        async fn mark_all_read(&self, _: DbId) -> Result<u64, StoreError> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct RecordingToasts {
        shown: Mutex<Vec<Toast>>,
    }

    impl ToastSink for RecordingToasts {
        fn show(&self, toast: Toast) {
            self.shown.lock().unwrap().push(toast);
        }
    }

    #[derive(Default)]
    struct CountingSink {
        pattern_calls: Mutex<usize>,
    }

    impl AudioSink for CountingSink {
        fn play_pattern(&self, _: &[tdy_core::sound::Tone]) -> anyhow::Result<()> {
            *self.pattern_calls.lock().unwrap() += 1;
            Ok(())
        }
        fn play_file(&self, _: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn order_notification(id: DbId, user_id: DbId) -> Notification {
        Notification {
            id,
            user_id,
            title: "New order".to_string(),
            message: String::new(),
            kind: "order".to_string(),
            is_read: false,
            metadata: serde_json::json!({
                "order_id": "deadbeef1234",
                "order_type": "food",
                "item_count": 1,
                "total_amount": 12.0,
                "items": [{"product_name": "Khachapuri", "quantity": 1, "price": 12.0}],
            }),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn info_notification(id: DbId, user_id: DbId) -> Notification {
        Notification {
            id,
            user_id,
            title: "Welcome".to_string(),
            message: "Thanks for signing up".to_string(),
            kind: "info".to_string(),
            is_read: false,
            metadata: serde_json::json!({}),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    struct Harness {
        bus: EventBus,
        store: Arc<NotificationStore<EmptySource>>,
        sink: Arc<CountingSink>,
        toasts: Arc<RecordingToasts>,
        setting: Arc<RwLock<Option<SoundSetting>>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Harness {
        /// Close the bus and wait for the feed loop to drain and exit.
        async fn finish(&mut self) {
            // Replacing the bus drops the original sender, which closes
            // the channel after all published events are consumed.
            self.bus = EventBus::default();
            (&mut self.handle).await.expect("feed task should exit cleanly");
        }
    }

    fn spawn_feed(session: FeedSession) -> Harness {
        let bus = EventBus::default();
        let store = Arc::new(NotificationStore::new(
            EmptySource,
            session.user_id,
            RetryPolicy::new(1, std::time::Duration::from_millis(0)),
        ));
        let sink = Arc::new(CountingSink::default());
        let toasts = Arc::new(RecordingToasts::default());
        let setting = Arc::new(RwLock::new(None));

        let handle = tokio::spawn(LiveFeed::run(
            bus.subscribe(),
            session,
            store.clone(),
            Arc::new(Player::new(sink.clone())),
            toasts.clone(),
            setting.clone(),
        ));

        Harness {
            bus,
            store,
            sink,
            toasts,
            setting,
            handle,
        }
    }

    #[tokio::test]
    async fn order_insert_updates_store_plays_sound_and_toasts() {
        let mut fixture = spawn_feed(FeedSession {
            user_id: 7,
            is_admin: true,
        });

        fixture
            .bus
            .publish(FeedEvent::NotificationInserted(order_notification(1, 7)));

        fixture.finish().await;

        assert_eq!(fixture.store.unread().await, 1);
        assert_eq!(*fixture.sink.pattern_calls.lock().unwrap(), 1);

        let toasts = fixture.toasts.shown.lock().unwrap();
        assert_eq!(toasts.len(), 1);
        assert!(toasts[0].body.contains("Order #deadbeef"));
        assert!(toasts[0].body.contains("1x Khachapuri"));
    }

    #[tokio::test]
    async fn other_users_events_are_ignored() {
        let mut fixture = spawn_feed(FeedSession {
            user_id: 7,
            is_admin: false,
        });

        fixture
            .bus
            .publish(FeedEvent::NotificationInserted(order_notification(1, 99)));

        fixture.finish().await;

        assert_eq!(fixture.store.unread().await, 0);
        assert!(fixture.toasts.shown.lock().unwrap().is_empty());
        assert_eq!(*fixture.sink.pattern_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn non_order_kinds_toast_without_sound() {
        let mut fixture = spawn_feed(FeedSession {
            user_id: 7,
            is_admin: false,
        });

        fixture
            .bus
            .publish(FeedEvent::NotificationInserted(info_notification(1, 7)));

        fixture.finish().await;

        assert_eq!(*fixture.sink.pattern_calls.lock().unwrap(), 0);
        let toasts = fixture.toasts.shown.lock().unwrap();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].title, "Welcome");
        assert_eq!(toasts[0].body, "Thanks for signing up");
    }

    #[tokio::test]
    async fn admin_sessions_track_sound_setting_updates() {
        let mut fixture = spawn_feed(FeedSession {
            user_id: 1,
            is_admin: true,
        });

        fixture
            .bus
            .publish(FeedEvent::SoundSettingUpdated(SoundSetting::Preset {
                name: "ding".to_string(),
            }));

        fixture.finish().await;

        assert_eq!(
            *fixture.setting.read().await,
            Some(SoundSetting::Preset {
                name: "ding".to_string()
            })
        );
    }

    #[tokio::test]
    async fn non_admin_sessions_ignore_sound_setting_updates() {
        let mut fixture = spawn_feed(FeedSession {
            user_id: 7,
            is_admin: false,
        });

        fixture
            .bus
            .publish(FeedEvent::SoundSettingUpdated(SoundSetting::Preset {
                name: "ding".to_string(),
            }));

        fixture.finish().await;

        assert_eq!(*fixture.setting.read().await, None);
    }
}
