//! Domain types and pure logic for the Today Delivery notification and
//! reward service.
//!
//! Everything in this crate is I/O-free: notification kinds and toast
//! rendering, reward-code normalization and ledger transition rules,
//! sound presets and PCM synthesis, and the shared error type. Remote
//! stores and delivery channels live in `tdy-db` and `tdy-notify`.

pub mod error;
pub mod notification;
pub mod rewards;
pub mod sound;
pub mod types;
