//! Route definitions for the `/rewards` resource.
//!
//! All endpoints require authentication; code batch creation is
//! admin-only.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::rewards;
use crate::state::AppState;

/// Routes mounted at `/rewards`.
///
/// ```text
/// GET    /           -> list_rewards
/// POST   /redeem     -> redeem
/// GET    /codes      -> list_used_codes
/// POST   /codes      -> create_codes (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(rewards::list_rewards))
        .route("/redeem", post(rewards::redeem))
        .route(
            "/codes",
            get(rewards::list_used_codes).post(rewards::create_codes),
        )
}
