//! Notification entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tdy_core::types::{DbId, Timestamp};

/// A row from the `notifications` table.
///
/// `kind` is stored as text; [`tdy_core::notification::NotificationKind`]
/// parses it at the point of use so an unexpected value degrades to a
/// generic toast instead of failing the row decode.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub is_read: bool,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a notification.
#[derive(Debug, Deserialize)]
pub struct NewNotification {
    pub user_id: DbId,
    pub title: String,
    #[serde(default)]
    pub message: String,
    pub kind: String,
    #[serde(default = "default_metadata")]
    pub metadata: serde_json::Value,
}

fn default_metadata() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}
