pub mod health;
pub mod notification;
pub mod rewards;
pub mod settings;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                  live feed WebSocket (?token=...)
///
/// /notifications                       list (?unread_only, limit), create (admin)
/// /notifications/read-all              mark all read (POST)
/// /notifications/unread-count          unread count (GET)
/// /notifications/{id}/read             mark read (POST)
///
/// /rewards                             list reward ledger (GET)
/// /rewards/redeem                      redeem a code (POST)
/// /rewards/codes                       list own used codes (GET), create batch (POST, admin)
///
/// /settings/notification-sound         get (GET), update (PUT, admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Live feed WebSocket.
        .route("/ws", get(ws::ws_handler))
        // Notifications.
        .nest("/notifications", notification::router())
        // Reward ledger and code redemption.
        .nest("/rewards", rewards::router())
        // Process-wide settings.
        .nest("/settings", settings::router())
}
