//! Per-session notification store with bounded-retry loading.
//!
//! [`NotificationStore`] is the authoritative in-memory view of one
//! user's notifications: an ordered newest-first list plus an unread
//! counter. It loads through the [`NotificationSource`] seam so the
//! retry and degradation behavior can be exercised without a database.

use std::time::Duration;

use async_trait::async_trait;
use tdy_core::types::DbId;
use tdy_db::models::notification::Notification;
use tdy_db::repositories::NotificationRepo;
use tdy_db::DbPool;
use tokio::sync::RwLock;

/// Maximum number of notifications loaded per user.
pub const MAX_LOADED: i64 = 50;

// ---------------------------------------------------------------------------
// Errors and seams
// ---------------------------------------------------------------------------

/// Error surfaced by a remote store seam.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Remote source of notification rows.
#[async_trait]
pub trait NotificationSource: Send + Sync {
    /// Fetch up to `limit` most-recent notifications, newest first.
    async fn fetch_recent(
        &self,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<Notification>, StoreError>;

    /// Mark one notification read, scoped to the user. Returns `true`
    /// if an unread row was updated.
    async fn mark_read(&self, notification_id: DbId, user_id: DbId) -> Result<bool, StoreError>;

    /// Mark all of the user's notifications read. Returns the number of
    /// rows updated.
    async fn mark_all_read(&self, user_id: DbId) -> Result<u64, StoreError>;
}

/// [`NotificationSource`] backed by Postgres via [`NotificationRepo`].
pub struct SqlNotificationSource {
    pool: DbPool,
}

impl SqlNotificationSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationSource for SqlNotificationSource {
    async fn fetch_recent(
        &self,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<Notification>, StoreError> {
        Ok(NotificationRepo::list_for_user(&self.pool, user_id, false, limit).await?)
    }

    async fn mark_read(&self, notification_id: DbId, user_id: DbId) -> Result<bool, StoreError> {
        Ok(NotificationRepo::mark_read(&self.pool, notification_id, user_id).await?)
    }

    async fn mark_all_read(&self, user_id: DbId) -> Result<u64, StoreError> {
        Ok(NotificationRepo::mark_all_read(&self.pool, user_id).await?)
    }
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

/// Bounded retry with a fixed (non-exponential) delay, applied to the
/// initial load only. Explicitly configurable rather than hard-coded.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Result of a [`NotificationStore::load`].
///
/// Distinguishes "empty because there is no data" from "empty because
/// all retries were exhausted".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The source answered; the store holds `count` notifications.
    Loaded { count: usize },
    /// Every attempt failed; the store settled into an empty list.
    Degraded,
}

#[derive(Default)]
struct Inner {
    items: Vec<Notification>,
    unread: u64,
}

/// The in-memory notification view for one user session.
///
/// Mutations await the remote write before touching local state, so a
/// failed write never causes optimistic-update drift.
pub struct NotificationStore<S: NotificationSource> {
    source: S,
    user_id: DbId,
    retry: RetryPolicy,
    inner: RwLock<Inner>,
}

impl<S: NotificationSource> NotificationStore<S> {
    pub fn new(source: S, user_id: DbId, retry: RetryPolicy) -> Self {
        Self {
            source,
            user_id,
            retry,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Load the user's most recent notifications, retrying per the
    /// configured policy. After exhausting retries the store settles
    /// into an empty list: the UI shell stays available even when the
    /// badge count is wrong.
    pub async fn load(&self) -> LoadOutcome {
        for attempt in 1..=self.retry.attempts {
            match self.source.fetch_recent(self.user_id, MAX_LOADED).await {
                Ok(items) => {
                    let unread = items.iter().filter(|n| !n.is_read).count() as u64;
                    let count = items.len();
                    let mut inner = self.inner.write().await;
                    inner.items = items;
                    inner.unread = unread;
                    return LoadOutcome::Loaded { count };
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = self.user_id,
                        attempt,
                        max_attempts = self.retry.attempts,
                        error = %e,
                        "Failed to load notifications"
                    );
                    if attempt < self.retry.attempts {
                        tokio::time::sleep(self.retry.delay).await;
                    }
                }
            }
        }

        tracing::error!(
            user_id = self.user_id,
            "Notification load retries exhausted, degrading to empty view"
        );
        let mut inner = self.inner.write().await;
        inner.items.clear();
        inner.unread = 0;
        LoadOutcome::Degraded
    }

    /// Mark one notification read.
    ///
    /// Fire-and-forget from the caller's perspective: remote failures
    /// are logged and local state is left untouched. The unread counter
    /// drops by at most 1 and floors at 0.
    pub async fn mark_read(&self, notification_id: DbId) {
        match self.source.mark_read(notification_id, self.user_id).await {
            Ok(true) => {
                let mut inner = self.inner.write().await;
                if let Some(item) = inner.items.iter_mut().find(|n| n.id == notification_id) {
                    item.is_read = true;
                }
                inner.unread = inner.unread.saturating_sub(1);
            }
            Ok(false) => {
                // Already read or not ours; nothing to update locally.
            }
            Err(e) => {
                tracing::warn!(
                    user_id = self.user_id,
                    notification_id,
                    error = %e,
                    "Failed to mark notification read"
                );
            }
        }
    }

    /// Mark every unread notification read in one remote operation and
    /// reset the unread counter.
    pub async fn mark_all_read(&self) {
        match self.source.mark_all_read(self.user_id).await {
            Ok(marked) => {
                let mut inner = self.inner.write().await;
                for item in &mut inner.items {
                    item.is_read = true;
                }
                inner.unread = 0;
                tracing::debug!(user_id = self.user_id, marked, "Marked all notifications read");
            }
            Err(e) => {
                tracing::warn!(
                    user_id = self.user_id,
                    error = %e,
                    "Failed to mark all notifications read"
                );
            }
        }
    }

    /// Append a newly-arrived notification at the front.
    ///
    /// Driven exclusively by the live feed; no deduplication is
    /// attempted, so a redelivered event shows up twice until the next
    /// full [`load`](Self::load).
    pub async fn on_insert(&self, notification: Notification) {
        let mut inner = self.inner.write().await;
        if !notification.is_read {
            inner.unread += 1;
        }
        inner.items.insert(0, notification);
    }

    /// Snapshot of the current list, newest first.
    pub async fn snapshot(&self) -> Vec<Notification> {
        self.inner.read().await.items.clone()
    }

    /// Current unread count.
    pub async fn unread(&self) -> u64 {
        self.inner.read().await.unread
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
