//! Today Delivery notification and reward-redemption runtime.
//!
//! This crate wires the pure domain logic in `tdy-core` to the stores in
//! `tdy-db` and to live delivery:
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`; the service's live change feed.
//! - [`NotificationStore`] -- per-session view of a user's notifications
//!   with bounded-retry loading.
//! - [`LiveFeed`] -- per-session subscription that turns feed events into
//!   store mutations, toasts, and sounds.
//! - [`Player`] -- best-effort sound playback over an [`AudioSink`].
//! - [`RedemptionFlow`] -- the cashback-code redemption state machine.

pub mod bus;
pub mod feed;
pub mod player;
pub mod redeem;
pub mod store;

pub use bus::{EventBus, FeedEvent};
pub use feed::{FeedSession, LiveFeed, ToastSink};
pub use player::{AudioSink, NullSink, Player};
pub use redeem::{RedeemError, Redeemed, RedemptionFlow, SqlCodeStore, SqlLedgerStore};
pub use store::{LoadOutcome, NotificationStore, RetryPolicy, SqlNotificationSource};
