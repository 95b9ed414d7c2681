//! Repository for the `cashback_codes` table.

use sqlx::PgPool;
use tdy_core::types::DbId;

use crate::models::reward::CashbackCode;

/// Column list for `cashback_codes` queries.
const COLUMNS: &str = "id, code, code_type, is_used, used_by, used_at, created_at";

/// Provides operations for cashback codes.
pub struct CashbackCodeRepo;

impl CashbackCodeRepo {
    /// Atomically claim an unused code for a user.
    ///
    /// A single conditional UPDATE sets `is_used`, `used_by`, and
    /// `used_at` together; two concurrent attempts on the same code can
    /// never both succeed. Returns the claimed row, or `None` when the
    /// code does not exist or was already used. Expects `code` to be
    /// normalized (uppercase) by the caller.
    pub async fn claim(
        pool: &PgPool,
        code: &str,
        user_id: DbId,
    ) -> Result<Option<CashbackCode>, sqlx::Error> {
        let query = format!(
            "UPDATE cashback_codes \
             SET is_used = true, used_by = $2, used_at = NOW() \
             WHERE code = $1 AND is_used = false \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CashbackCode>(&query)
            .bind(code)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Bulk-insert freshly generated codes of one type.
    ///
    /// Returns the number of codes inserted. Duplicate codes violate
    /// `uq_cashback_codes_code` and fail the whole batch.
    pub async fn create_batch(
        pool: &PgPool,
        codes: &[String],
        code_type: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO cashback_codes (code, code_type) \
             SELECT UPPER(c), $2 FROM UNNEST($1::text[]) AS c",
        )
        .bind(codes)
        .bind(code_type)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// List the codes a user has consumed, newest first.
    pub async fn list_used_by(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<CashbackCode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cashback_codes \
             WHERE used_by = $1 \
             ORDER BY used_at DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, CashbackCode>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
