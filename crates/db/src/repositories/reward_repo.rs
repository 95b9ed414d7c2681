//! Repository for the `user_rewards` ledger table.

use sqlx::PgPool;
use tdy_core::types::DbId;

use crate::models::reward::UserReward;

/// Column list for `user_rewards` queries.
const COLUMNS: &str = "id, user_id, reward_type, codes_collected, codes_required, \
                       is_redeemed, redeemed_at, created_at";

/// Provides operations for the reward ledger.
pub struct RewardRepo;

impl RewardRepo {
    /// Find the newest non-redeemed entry for (user, reward type).
    ///
    /// The redemption flow only ever operates on this entry; redeemed
    /// entries are terminal.
    pub async fn find_active(
        pool: &PgPool,
        user_id: DbId,
        reward_type: &str,
    ) -> Result<Option<UserReward>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_rewards \
             WHERE user_id = $1 AND reward_type = $2 AND is_redeemed = false \
             ORDER BY created_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, UserReward>(&query)
            .bind(user_id)
            .bind(reward_type)
            .fetch_optional(pool)
            .await
    }

    /// Open a fresh ledger entry with `codes_collected = 1`.
    pub async fn open(
        pool: &PgPool,
        user_id: DbId,
        reward_type: &str,
        codes_required: i32,
    ) -> Result<UserReward, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_rewards (user_id, reward_type, codes_collected, codes_required) \
             VALUES ($1, $2, 1, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserReward>(&query)
            .bind(user_id)
            .bind(reward_type)
            .bind(codes_required)
            .fetch_one(pool)
            .await
    }

    /// Increment an entry by one code, redeeming it in the same
    /// statement when the increment reaches the threshold.
    pub async fn advance(pool: &PgPool, entry_id: DbId) -> Result<UserReward, sqlx::Error> {
        let query = format!(
            "UPDATE user_rewards \
             SET codes_collected = codes_collected + 1, \
                 is_redeemed = (codes_collected + 1 >= codes_required), \
                 redeemed_at = CASE \
                     WHEN codes_collected + 1 >= codes_required THEN NOW() \
                     ELSE redeemed_at \
                 END \
             WHERE id = $1 AND is_redeemed = false \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserReward>(&query)
            .bind(entry_id)
            .fetch_one(pool)
            .await
    }

    /// List all ledger entries for a user, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<UserReward>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_rewards \
             WHERE user_id = $1 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, UserReward>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
