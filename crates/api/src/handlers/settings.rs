//! Handlers for the notification sound setting.
//!
//! The setting is stored as JSON in `app_settings`; writes are admin-only
//! and broadcast on the event bus so live admin sessions pick up the new
//! sound without reconnecting.

use axum::extract::State;
use axum::Json;
use tdy_core::sound::{SoundSetting, SOUND_SETTING_KEY};
use tdy_db::repositories::AppSettingRepo;
use tdy_notify::FeedEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AdminUser, AuthUser};
use crate::state::AppState;

/// GET /api/v1/settings/notification-sound
///
/// Return the configured notification sound, or `null` when unset (the
/// client then uses the default beep). A malformed stored value is
/// reported as unset rather than an error.
pub async fn get_notification_sound(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let setting = AppSettingRepo::get(&state.pool, SOUND_SETTING_KEY).await?;

    let value = setting
        .and_then(|row| match serde_json::from_value::<SoundSetting>(row.value) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!(error = %e, "Stored sound setting is malformed");
                None
            }
        })
        .map(|s| serde_json::to_value(s))
        .transpose()
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(Json(serde_json::json!({
        "data": value.unwrap_or(serde_json::Value::Null)
    })))
}

/// PUT /api/v1/settings/notification-sound
///
/// Replace the notification sound setting (admin only). The body must
/// deserialize to a valid [`SoundSetting`]; unknown preset names are
/// rejected here rather than silently falling back at play time.
pub async fn update_notification_sound(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(setting): Json<SoundSetting>,
) -> AppResult<Json<serde_json::Value>> {
    if let SoundSetting::Preset { name } = &setting {
        if tdy_core::sound::preset_pattern(name).is_none() {
            return Err(AppError::BadRequest(format!("unknown sound preset: {name}")));
        }
    }
    if let SoundSetting::File { path } = &setting {
        if path.trim().is_empty() {
            return Err(AppError::BadRequest("sound file path must not be empty".into()));
        }
    }

    let value =
        serde_json::to_value(&setting).map_err(|e| AppError::InternalError(e.to_string()))?;
    let stored = AppSettingRepo::upsert(&state.pool, SOUND_SETTING_KEY, &value).await?;

    tracing::info!(admin_id = admin.user_id, "Notification sound updated");
    state
        .event_bus
        .publish(FeedEvent::SoundSettingUpdated(setting));

    Ok(Json(serde_json::json!({ "data": stored.value })))
}
