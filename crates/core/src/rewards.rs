//! Reward-code normalization, ledger transition rules, and the
//! redemption rate limit.
//!
//! The ledger state machine per (user, reward type) is:
//! no entry → active (collected < required) → redeemed (terminal).
//! A redeemed entry is never reopened; the next code of that type starts
//! a fresh entry. [`apply_code`] encodes these transitions as a pure
//! function so the storage layer and the in-memory tests share one rule.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::CoreError;
use crate::types::DbId;

/// Codes a user must collect before an entry is redeemed, for entries
/// created by the redemption flow.
pub const DEFAULT_CODES_REQUIRED: i32 = 5;

/// Minimum accepted code length after normalization.
pub const MIN_CODE_LEN: usize = 3;

/// Maximum accepted code length after normalization.
pub const MAX_CODE_LEN: usize = 50;

/// Minimum interval between redemption attempts by one user.
pub const REDEEM_MIN_INTERVAL: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// Code normalization
// ---------------------------------------------------------------------------

/// Normalize a user-submitted code: trim surrounding whitespace and
/// uppercase. Codes are stored uppercase, so `"  abc123  "` and
/// `"ABC123"` resolve to the same record.
///
/// Rejects empty input and lengths outside
/// [`MIN_CODE_LEN`]..=[`MAX_CODE_LEN`] before any remote call is made.
pub fn normalize_code(raw: &str) -> Result<String, CoreError> {
    let code = raw.trim().to_uppercase();
    if code.is_empty() {
        return Err(CoreError::Validation("Code must not be empty".to_string()));
    }
    if code.len() < MIN_CODE_LEN || code.len() > MAX_CODE_LEN {
        return Err(CoreError::Validation(format!(
            "Code length must be between {MIN_CODE_LEN} and {MAX_CODE_LEN} characters"
        )));
    }
    Ok(code)
}

// ---------------------------------------------------------------------------
// Ledger transitions
// ---------------------------------------------------------------------------

/// The ledger mutation a valid code produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerStep {
    /// No active entry exists: open a new one with `collected = 1`.
    Open { required: i32 },
    /// An active entry exists: increment it, redeeming when the
    /// increment reaches the threshold.
    Advance { collected: i32, redeemed: bool },
}

/// Compute the transition for one valid code given the current active
/// entry, if any, as `(collected, required)`.
pub fn apply_code(active: Option<(i32, i32)>) -> LedgerStep {
    match active {
        None => LedgerStep::Open {
            required: DEFAULT_CODES_REQUIRED,
        },
        Some((collected, required)) => {
            let next = collected + 1;
            LedgerStep::Advance {
                collected: next,
                redeemed: next >= required,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

/// Per-user rate limit for redemption attempts.
///
/// The attempt timestamp is recorded when the check passes, before the
/// code lookup runs, so failed lookups count against the limit too. The
/// limiter is in-process only; it deters abuse and is not a correctness
/// guarantee.
pub struct RateLimiter {
    min_interval: Duration,
    last_attempt: Mutex<HashMap<DbId, Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_attempt: Mutex::new(HashMap::new()),
        }
    }

    /// Check the limit for `user_id` and record this attempt.
    ///
    /// Returns `Err(CoreError::RateLimited)` when the previous attempt
    /// was less than the configured interval ago; the previous timestamp
    /// is kept in that case.
    pub fn check_and_record(&self, user_id: DbId) -> Result<(), CoreError> {
        let now = Instant::now();
        let mut map = self.last_attempt.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(last) = map.get(&user_id) {
            let elapsed = now.duration_since(*last);
            if elapsed < self.min_interval {
                let remaining = self.min_interval - elapsed;
                return Err(CoreError::RateLimited {
                    retry_after_ms: remaining.as_millis() as u64,
                });
            }
        }
        map.insert(user_id, now);
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(REDEEM_MIN_INTERVAL)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
