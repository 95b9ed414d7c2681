//! Cashback-code redemption flow.
//!
//! The flow validates and normalizes the submitted code, applies the
//! per-user rate limit, atomically claims the code, then advances the
//! reward ledger per the transition rules in
//! [`tdy_core::rewards::apply_code`]. The claim is a single conditional
//! update: zero rows affected means "invalid or already used", so two
//! concurrent attempts on one code can never both succeed.
//!
//! A failure after the claim leaves the code consumed with no ledger
//! credit. The flow does not roll back; it logs the inconsistency and
//! surfaces a generic failure.

use std::sync::Arc;

use async_trait::async_trait;
use tdy_core::error::CoreError;
use tdy_core::rewards::{self, LedgerStep, RateLimiter};
use tdy_core::types::{DbId, Timestamp};
use tdy_db::repositories::{CashbackCodeRepo, RewardRepo};
use tdy_db::DbPool;

use crate::store::StoreError;

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// A successfully claimed code.
#[derive(Debug, Clone)]
pub struct ClaimedCode {
    pub code: String,
    pub code_type: String,
}

/// Progress of one ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardProgress {
    pub entry_id: DbId,
    pub reward_type: String,
    pub collected: i32,
    pub required: i32,
    pub redeemed: bool,
    /// Set when the entry reaches its threshold, in the same update
    /// that flips `redeemed`.
    pub redeemed_at: Option<Timestamp>,
}

/// Store of cashback codes.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Atomically claim an unused code for a user. Returns `None` when
    /// the code is unknown or already used.
    async fn claim(&self, code: &str, user_id: DbId) -> Result<Option<ClaimedCode>, StoreError>;
}

/// Store of reward ledger entries.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Newest non-redeemed entry for (user, reward type), if any.
    async fn find_active(
        &self,
        user_id: DbId,
        reward_type: &str,
    ) -> Result<Option<RewardProgress>, StoreError>;

    /// Open a fresh entry with `collected = 1`.
    async fn open(
        &self,
        user_id: DbId,
        reward_type: &str,
        required: i32,
    ) -> Result<RewardProgress, StoreError>;

    /// Increment an entry by one code, redeeming it when the increment
    /// reaches the threshold.
    async fn advance(&self, entry_id: DbId) -> Result<RewardProgress, StoreError>;
}

// ---------------------------------------------------------------------------
// Errors and results
// ---------------------------------------------------------------------------

/// User-facing redemption outcome errors.
#[derive(Debug, thiserror::Error)]
pub enum RedeemError {
    /// Input rejected before any remote call.
    #[error("{0}")]
    Invalid(String),

    /// A previous attempt by this user was too recent.
    #[error("Please wait a moment before trying another code")]
    RateLimited { retry_after_ms: u64 },

    /// The code does not exist or was already consumed.
    #[error("Invalid or already used code")]
    UnknownCode,

    /// A remote call failed; deliberately generic toward the user.
    #[error("Redemption failed, please try again")]
    Failed,
}

/// A successful redemption: the code's type and the resulting ledger
/// state.
#[derive(Debug, Clone)]
pub struct Redeemed {
    pub code_type: String,
    pub progress: RewardProgress,
}

// ---------------------------------------------------------------------------
// Flow
// ---------------------------------------------------------------------------

/// The redemption flow over its store seams.
pub struct RedemptionFlow {
    codes: Arc<dyn CodeStore>,
    ledger: Arc<dyn LedgerStore>,
    limiter: RateLimiter,
}

impl RedemptionFlow {
    pub fn new(codes: Arc<dyn CodeStore>, ledger: Arc<dyn LedgerStore>) -> Self {
        Self::with_limiter(codes, ledger, RateLimiter::default())
    }

    pub fn with_limiter(
        codes: Arc<dyn CodeStore>,
        ledger: Arc<dyn LedgerStore>,
        limiter: RateLimiter,
    ) -> Self {
        Self {
            codes,
            ledger,
            limiter,
        }
    }

    /// Redeem a raw user-submitted code for `user_id`.
    ///
    /// Validation and the rate limit run before any remote call; the
    /// attempt timestamp is recorded regardless of the lookup outcome.
    pub async fn redeem(&self, raw: &str, user_id: DbId) -> Result<Redeemed, RedeemError> {
        let code = rewards::normalize_code(raw).map_err(|e| RedeemError::Invalid(e.to_string()))?;

        if let Err(CoreError::RateLimited { retry_after_ms }) =
            self.limiter.check_and_record(user_id)
        {
            return Err(RedeemError::RateLimited { retry_after_ms });
        }

        let claimed = self
            .codes
            .claim(&code, user_id)
            .await
            .map_err(|e| {
                tracing::error!(user_id, error = %e, "Code claim failed");
                RedeemError::Failed
            })?
            .ok_or(RedeemError::UnknownCode)?;

        let progress = self
            .credit_ledger(user_id, &claimed.code_type)
            .await
            .map_err(|e| {
                // The code is already consumed at this point; there is no
                // rollback. Log loudly so the inconsistency is visible.
                tracing::error!(
                    user_id,
                    code = %claimed.code,
                    code_type = %claimed.code_type,
                    error = %e,
                    "Ledger update failed after code was claimed; code consumed without credit"
                );
                RedeemError::Failed
            })?;

        tracing::info!(
            user_id,
            code_type = %claimed.code_type,
            collected = progress.collected,
            required = progress.required,
            redeemed = progress.redeemed,
            "Code redeemed"
        );

        Ok(Redeemed {
            code_type: claimed.code_type,
            progress,
        })
    }

    /// Apply one valid code to the user's ledger for `reward_type`.
    async fn credit_ledger(
        &self,
        user_id: DbId,
        reward_type: &str,
    ) -> Result<RewardProgress, StoreError> {
        let active = self.ledger.find_active(user_id, reward_type).await?;
        let step = rewards::apply_code(active.as_ref().map(|e| (e.collected, e.required)));

        // The stores compute the increment themselves so the write is a
        // single statement; `apply_code` decides which branch runs.
        match (step, active) {
            (LedgerStep::Advance { .. }, Some(entry)) => {
                self.ledger.advance(entry.entry_id).await
            }
            (LedgerStep::Open { required }, _) => {
                self.ledger.open(user_id, reward_type, required).await
            }
            // Advance without an entry cannot arise from `apply_code`;
            // opening a fresh entry is the safe interpretation.
            (LedgerStep::Advance { .. }, None) => {
                self.ledger
                    .open(user_id, reward_type, rewards::DEFAULT_CODES_REQUIRED)
                    .await
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SQL-backed stores
// ---------------------------------------------------------------------------

/// [`CodeStore`] backed by Postgres via [`CashbackCodeRepo`].
pub struct SqlCodeStore {
    pool: DbPool,
}

impl SqlCodeStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CodeStore for SqlCodeStore {
    async fn claim(&self, code: &str, user_id: DbId) -> Result<Option<ClaimedCode>, StoreError> {
        let row = CashbackCodeRepo::claim(&self.pool, code, user_id).await?;
        Ok(row.map(|c| ClaimedCode {
            code: c.code,
            code_type: c.code_type,
        }))
    }
}

/// [`LedgerStore`] backed by Postgres via [`RewardRepo`].
pub struct SqlLedgerStore {
    pool: DbPool,
}

impl SqlLedgerStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn progress_from_row(row: tdy_db::models::reward::UserReward) -> RewardProgress {
    RewardProgress {
        entry_id: row.id,
        reward_type: row.reward_type,
        collected: row.codes_collected,
        required: row.codes_required,
        redeemed: row.is_redeemed,
        redeemed_at: row.redeemed_at,
    }
}

#[async_trait]
impl LedgerStore for SqlLedgerStore {
    async fn find_active(
        &self,
        user_id: DbId,
        reward_type: &str,
    ) -> Result<Option<RewardProgress>, StoreError> {
        let row = RewardRepo::find_active(&self.pool, user_id, reward_type).await?;
        Ok(row.map(progress_from_row))
    }

    async fn open(
        &self,
        user_id: DbId,
        reward_type: &str,
        required: i32,
    ) -> Result<RewardProgress, StoreError> {
        let row = RewardRepo::open(&self.pool, user_id, reward_type, required).await?;
        Ok(progress_from_row(row))
    }

    async fn advance(&self, entry_id: DbId) -> Result<RewardProgress, StoreError> {
        let row = RewardRepo::advance(&self.pool, entry_id).await?;
        Ok(progress_from_row(row))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use assert_matches::assert_matches;

    struct CodeRow {
        code_type: String,
        used_by: Option<DbId>,
    }

    /// In-memory code store; claims are atomic under the lock.
    #[derive(Default)]
    struct MemCodes {
        rows: Mutex<HashMap<String, CodeRow>>,
        lookups: AtomicUsize,
    }

    impl MemCodes {
        fn with_code(code: &str, code_type: &str) -> Arc<Self> {
            let store = Self::default();
            store.rows.lock().unwrap().insert(
                code.to_string(),
                CodeRow {
                    code_type: code_type.to_string(),
                    used_by: None,
                },
            );
            Arc::new(store)
        }

        fn add(&self, code: &str, code_type: &str) {
            self.rows.lock().unwrap().insert(
                code.to_string(),
                CodeRow {
                    code_type: code_type.to_string(),
                    used_by: None,
                },
            );
        }

        fn used_by(&self, code: &str) -> Option<DbId> {
            self.rows.lock().unwrap().get(code).and_then(|r| r.used_by)
        }
    }

    #[async_trait]
    impl CodeStore for MemCodes {
        async fn claim(&self, code: &str, user_id: DbId) -> Result<Option<ClaimedCode>, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(code) {
                Some(row) if row.used_by.is_none() => {
                    row.used_by = Some(user_id);
                    Ok(Some(ClaimedCode {
                        code: code.to_string(),
                        code_type: row.code_type.clone(),
                    }))
                }
                _ => Ok(None),
            }
        }
    }

    /// In-memory ledger applying [`rewards::apply_code`].
    #[derive(Default)]
    struct MemLedger {
        rows: Mutex<Vec<(DbId, RewardProgress)>>,
        next_id: AtomicUsize,
    }

    #[async_trait]
    impl LedgerStore for MemLedger {
        async fn find_active(
            &self,
            user_id: DbId,
            reward_type: &str,
        ) -> Result<Option<RewardProgress>, StoreError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .rev()
                .find(|(owner, p)| {
                    *owner == user_id && p.reward_type == reward_type && !p.redeemed
                })
                .map(|(_, p)| p.clone()))
        }

        async fn open(
            &self,
            user_id: DbId,
            reward_type: &str,
            required: i32,
        ) -> Result<RewardProgress, StoreError> {
            let entry = RewardProgress {
                entry_id: self.next_id.fetch_add(1, Ordering::SeqCst) as DbId + 1,
                reward_type: reward_type.to_string(),
                collected: 1,
                required,
                redeemed: false,
                redeemed_at: None,
            };
            self.rows.lock().unwrap().push((user_id, entry.clone()));
            Ok(entry)
        }

        async fn advance(&self, entry_id: DbId) -> Result<RewardProgress, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            let (_, entry) = rows
                .iter_mut()
                .find(|(_, p)| p.entry_id == entry_id)
                .ok_or_else(|| StoreError::Unavailable("no such entry".to_string()))?;
            match rewards::apply_code(Some((entry.collected, entry.required))) {
                LedgerStep::Advance { collected, redeemed } => {
                    entry.collected = collected;
                    entry.redeemed = redeemed;
                    if redeemed {
                        entry.redeemed_at = Some(chrono::Utc::now());
                    }
                    Ok(entry.clone())
                }
                LedgerStep::Open { .. } => unreachable!("advance always has an entry"),
            }
        }
    }

    fn flow(codes: Arc<MemCodes>, ledger: Arc<MemLedger>) -> RedemptionFlow {
        // Zero interval so sequential test calls are not throttled.
        RedemptionFlow::with_limiter(codes, ledger, RateLimiter::new(Duration::from_millis(0)))
    }

    const USER: DbId = 42;

    #[tokio::test]
    async fn first_redemption_opens_a_ledger_entry() {
        let codes = MemCodes::with_code("CASHBACK-AB12CD", "cashback");
        let ledger = Arc::new(MemLedger::default());
        let flow = flow(codes.clone(), ledger);

        let result = flow
            .redeem("CASHBACK-AB12CD", USER)
            .await
            .expect("redemption should succeed");

        assert_eq!(result.code_type, "cashback");
        assert_eq!(result.progress.collected, 1);
        assert_eq!(result.progress.required, 5);
        assert!(!result.progress.redeemed);
        assert_eq!(codes.used_by("CASHBACK-AB12CD"), Some(USER));
    }

    #[tokio::test]
    async fn input_is_normalized_before_lookup() {
        let codes = MemCodes::with_code("ABC123", "cashback");
        let ledger = Arc::new(MemLedger::default());
        let flow = flow(codes.clone(), ledger);

        flow.redeem("  abc123  ", USER)
            .await
            .expect("normalized code should match");
        assert_eq!(codes.used_by("ABC123"), Some(USER));
    }

    #[tokio::test]
    async fn invalid_input_makes_no_remote_call() {
        let codes = Arc::new(MemCodes::default());
        let ledger = Arc::new(MemLedger::default());
        let flow = flow(codes.clone(), ledger);

        assert_matches!(flow.redeem("", USER).await, Err(RedeemError::Invalid(_)));
        assert_matches!(flow.redeem("ab", USER).await, Err(RedeemError::Invalid(_)));
        assert_matches!(
            flow.redeem(&"x".repeat(51), USER).await,
            Err(RedeemError::Invalid(_))
        );
        assert_eq!(codes.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn same_code_never_succeeds_twice() {
        let codes = MemCodes::with_code("ONCE-ONLY", "cashback");
        let ledger = Arc::new(MemLedger::default());
        let flow = flow(codes.clone(), ledger);

        flow.redeem("ONCE-ONLY", USER).await.expect("first use succeeds");
        assert_matches!(
            flow.redeem("ONCE-ONLY", USER).await,
            Err(RedeemError::UnknownCode)
        );
        // A different user cannot reuse it either.
        assert_matches!(
            flow.redeem("ONCE-ONLY", 99).await,
            Err(RedeemError::UnknownCode)
        );
    }

    #[tokio::test]
    async fn unknown_code_is_rejected_without_mutation() {
        let codes = Arc::new(MemCodes::default());
        let ledger = Arc::new(MemLedger::default());
        let flow = flow(codes, ledger.clone());

        assert_matches!(
            flow.redeem("NO-SUCH-CODE", USER).await,
            Err(RedeemError::UnknownCode)
        );
        assert!(ledger.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fifth_code_redeems_the_entry() {
        let codes = Arc::new(MemCodes::default());
        let ledger = Arc::new(MemLedger::default());
        let flow = flow(codes.clone(), ledger);

        for i in 1..=5 {
            codes.add(&format!("CODE-{i}"), "cashback");
            let result = flow
                .redeem(&format!("CODE-{i}"), USER)
                .await
                .expect("valid code should redeem");
            assert_eq!(result.progress.collected, i);
            assert_eq!(result.progress.redeemed, i == 5);
            // The redemption timestamp lands in the same update that
            // flips the flag.
            assert_eq!(result.progress.redeemed_at.is_some(), i == 5);
        }
    }

    #[tokio::test]
    async fn code_after_redemption_opens_a_new_generation() {
        let codes = Arc::new(MemCodes::default());
        let ledger = Arc::new(MemLedger::default());
        let flow = flow(codes.clone(), ledger.clone());

        for i in 1..=6 {
            codes.add(&format!("CODE-{i}"), "cashback");
            flow.redeem(&format!("CODE-{i}"), USER)
                .await
                .expect("valid code should redeem");
        }

        // The 6th code started a fresh entry rather than touching the
        // redeemed one.
        let rows = ledger.rows.lock().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].1.redeemed);
        assert_eq!(rows[0].1.collected, 5);
        assert!(!rows[1].1.redeemed);
        assert_eq!(rows[1].1.collected, 1);
    }

    #[tokio::test]
    async fn reward_types_accumulate_independently() {
        let codes = Arc::new(MemCodes::default());
        let ledger = Arc::new(MemLedger::default());
        let flow = flow(codes.clone(), ledger);

        codes.add("CASH-1", "cashback");
        codes.add("RIDE-1", "free_ride");

        let cash = flow.redeem("CASH-1", USER).await.unwrap();
        let ride = flow.redeem("RIDE-1", USER).await.unwrap();

        assert_eq!(cash.progress.collected, 1);
        assert_eq!(ride.progress.collected, 1);
        assert_ne!(cash.progress.entry_id, ride.progress.entry_id);
    }

    #[tokio::test]
    async fn second_attempt_within_window_skips_the_lookup() {
        let codes = MemCodes::with_code("ABC123", "cashback");
        let ledger = Arc::new(MemLedger::default());
        let flow = RedemptionFlow::with_limiter(
            codes.clone(),
            ledger,
            RateLimiter::new(Duration::from_secs(3)),
        );

        flow.redeem("ABC123", USER).await.expect("first attempt passes");
        assert_eq!(codes.lookups.load(Ordering::SeqCst), 1);

        assert_matches!(
            flow.redeem("DEF456", USER).await,
            Err(RedeemError::RateLimited { .. })
        );
        // No second remote lookup happened.
        assert_eq!(codes.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_attempts_count_against_the_rate_limit() {
        let codes = Arc::new(MemCodes::default());
        let ledger = Arc::new(MemLedger::default());
        let flow = RedemptionFlow::with_limiter(
            codes,
            ledger,
            RateLimiter::new(Duration::from_secs(3)),
        );

        // The attempt is recorded before the lookup, so a miss still
        // starts the window.
        assert_matches!(
            flow.redeem("NO-SUCH", USER).await,
            Err(RedeemError::UnknownCode)
        );
        assert_matches!(
            flow.redeem("NO-SUCH", USER).await,
            Err(RedeemError::RateLimited { .. })
        );
    }

    #[tokio::test]
    async fn ledger_failure_after_claim_reports_generic_failure() {
        struct BrokenLedger;

        #[async_trait]
        impl LedgerStore for BrokenLedger {
            async fn find_active(
                &self,
                _: DbId,
                _: &str,
            ) -> Result<Option<RewardProgress>, StoreError> {
                Err(StoreError::Unavailable("ledger down".to_string()))
            }
            async fn open(&self, _: DbId, _: &str, _: i32) -> Result<RewardProgress, StoreError> {
                Err(StoreError::Unavailable("ledger down".to_string()))
            }
            async fn advance(&self, _: DbId) -> Result<RewardProgress, StoreError> {
                Err(StoreError::Unavailable("ledger down".to_string()))
            }
        }

        let codes = MemCodes::with_code("ABC123", "cashback");
        let flow = RedemptionFlow::with_limiter(
            codes.clone(),
            Arc::new(BrokenLedger),
            RateLimiter::new(Duration::from_millis(0)),
        );

        assert_matches!(flow.redeem("ABC123", USER).await, Err(RedeemError::Failed));
        // Known integrity gap: the code stays consumed.
        assert_eq!(codes.used_by("ABC123"), Some(USER));
    }
}
