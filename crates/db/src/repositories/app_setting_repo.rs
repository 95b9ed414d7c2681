//! Repository for the `app_settings` key/value table.

use sqlx::PgPool;

use crate::models::setting::AppSetting;

/// Column list for `app_settings` queries.
const COLUMNS: &str = "key, value, updated_at";

/// Provides operations for process-wide configuration records.
pub struct AppSettingRepo;

impl AppSettingRepo {
    /// Fetch a setting by key. Absence is a valid state (callers fall
    /// back to their defaults).
    pub async fn get(pool: &PgPool, key: &str) -> Result<Option<AppSetting>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM app_settings WHERE key = $1");
        sqlx::query_as::<_, AppSetting>(&query)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// Create or replace a setting, returning the stored row.
    pub async fn upsert(
        pool: &PgPool,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<AppSetting, sqlx::Error> {
        let query = format!(
            "INSERT INTO app_settings (key, value) \
             VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE \
             SET value = EXCLUDED.value, updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AppSetting>(&query)
            .bind(key)
            .bind(value)
            .fetch_one(pool)
            .await
    }
}
