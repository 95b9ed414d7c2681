//! Handlers for the `/notifications` resource.
//!
//! All endpoints require authentication via [`AuthUser`]; creation is
//! admin-only and fans the new row out over the event bus.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tdy_core::error::CoreError;
use tdy_core::notification::NotificationKind;
use tdy_core::types::DbId;
use tdy_db::models::notification::NewNotification;
use tdy_db::repositories::NotificationRepo;
use tdy_notify::FeedEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AdminUser, AuthUser};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// If `true`, return only unread notifications. Defaults to `false`.
    pub unread_only: Option<bool>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
}

/// Maximum page size for notification listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for notification listing.
const DEFAULT_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications
///
/// List the authenticated user's notifications, newest first, with
/// optional unread filtering.
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let unread_only = params.unread_only.unwrap_or(false);

    let notifications =
        NotificationRepo::list_for_user(&state.pool, auth.user_id, unread_only, limit).await?;

    Ok(Json(serde_json::json!({ "data": notifications })))
}

/// Validate a notification creation payload: non-blank title and a
/// recognized kind string.
fn validate_new_notification(input: &NewNotification) -> Result<(), AppError> {
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".into()));
    }
    NotificationKind::parse(&input.kind)?;
    Ok(())
}

/// POST /api/v1/notifications
///
/// Create a notification for a user (admin only). The stored row is
/// published on the event bus so live sessions receive it immediately.
pub async fn create_notification(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(input): Json<NewNotification>,
) -> AppResult<impl IntoResponse> {
    validate_new_notification(&input)?;

    let notification = NotificationRepo::create(
        &state.pool,
        input.user_id,
        &input.title,
        &input.message,
        &input.kind,
        &input.metadata,
    )
    .await?;

    tracing::info!(
        admin_id = admin.user_id,
        user_id = notification.user_id,
        notification_id = notification.id,
        kind = %notification.kind,
        "Notification created"
    );
    state
        .event_bus
        .publish(FeedEvent::NotificationInserted(notification.clone()));

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": notification })),
    ))
}

/// POST /api/v1/notifications/{id}/read
///
/// Mark a single notification as read. Returns 204 No Content on success,
/// or 404 if the notification does not belong to the authenticated user.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let found = NotificationRepo::mark_read(&state.pool, notification_id, auth.user_id).await?;

    if !found {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id: notification_id,
        }));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/read-all
///
/// Mark all of the authenticated user's notifications as read.
/// Returns the number of notifications that were marked.
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;

    Ok(Json(serde_json::json!({
        "data": { "marked_read": count }
    })))
}

/// GET /api/v1/notifications/unread-count
///
/// Return the number of unread notifications for the authenticated user.
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;

    Ok(Json(serde_json::json!({
        "data": { "count": count }
    })))
}
