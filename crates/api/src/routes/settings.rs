//! Route definitions for the `/settings` resource.
//!
//! Reads require authentication; writes are admin-only.

use axum::routing::get;
use axum::Router;

use crate::handlers::settings;
use crate::state::AppState;

/// Routes mounted at `/settings`.
///
/// ```text
/// GET    /notification-sound   -> get_notification_sound
/// PUT    /notification-sound   -> update_notification_sound (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/notification-sound",
        get(settings::get_notification_sound).put(settings::update_notification_sound),
    )
}
