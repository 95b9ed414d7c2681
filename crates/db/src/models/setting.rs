//! App setting entity model.

use serde::Serialize;
use sqlx::FromRow;
use tdy_core::types::Timestamp;

/// A row from the `app_settings` key/value table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AppSetting {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: Timestamp,
}
