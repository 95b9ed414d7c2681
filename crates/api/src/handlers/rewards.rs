//! Handlers for the `/rewards` resource: code redemption, the reward
//! ledger, and admin code-batch creation.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tdy_core::rewards;
use tdy_db::repositories::{CashbackCodeRepo, RewardRepo};
use tdy_notify::Redeemed;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AdminUser, AuthUser};
use crate::state::AppState;

/// Maximum page size for used-code listing.
const MAX_CODES_LIMIT: i64 = 100;

/// Default page size for used-code listing.
const DEFAULT_CODES_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body for `POST /rewards/redeem`.
#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub code: String,
}

/// Query parameters for `GET /rewards/codes`.
#[derive(Debug, Deserialize)]
pub struct CodesQuery {
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
}

/// Body for `POST /rewards/codes` (admin batch creation).
#[derive(Debug, Deserialize)]
pub struct CreateCodesRequest {
    pub codes: Vec<String>,
    pub code_type: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/rewards/redeem
///
/// Redeem a cashback code for the authenticated user. The flow claims
/// the code atomically and credits the user's reward ledger; failures
/// map to 400 (bad or unknown code), 429 (too many attempts), or 500.
pub async fn redeem(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<RedeemRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let Redeemed {
        code_type,
        progress,
    } = state.redemption.redeem(&input.code, auth.user_id).await?;

    Ok(Json(serde_json::json!({
        "data": {
            "code_type": code_type,
            "reward": {
                "entry_id": progress.entry_id,
                "reward_type": progress.reward_type,
                "codes_collected": progress.collected,
                "codes_required": progress.required,
                "is_redeemed": progress.redeemed,
                "redeemed_at": progress.redeemed_at,
            }
        }
    })))
}

/// GET /api/v1/rewards
///
/// List the authenticated user's reward ledger entries, newest first.
/// Includes both in-progress and redeemed entries.
pub async fn list_rewards(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let entries = RewardRepo::list_for_user(&state.pool, auth.user_id).await?;

    Ok(Json(serde_json::json!({ "data": entries })))
}

/// GET /api/v1/rewards/codes
///
/// List the codes the authenticated user has redeemed, newest first.
pub async fn list_used_codes(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<CodesQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_CODES_LIMIT)
        .clamp(1, MAX_CODES_LIMIT);
    let codes = CashbackCodeRepo::list_used_by(&state.pool, auth.user_id, limit).await?;

    Ok(Json(serde_json::json!({ "data": codes })))
}

/// POST /api/v1/rewards/codes
///
/// Create a batch of cashback codes (admin only). Codes are normalized
/// to uppercase on insert; a duplicate within the batch or against
/// existing codes maps to 409 via the unique constraint.
pub async fn create_codes(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCodesRequest>,
) -> AppResult<impl IntoResponse> {
    if input.codes.is_empty() {
        return Err(AppError::BadRequest("codes must not be empty".into()));
    }
    if input.code_type.trim().is_empty() {
        return Err(AppError::BadRequest("code_type must not be empty".into()));
    }

    let mut normalized = Vec::with_capacity(input.codes.len());
    for raw in &input.codes {
        let code = rewards::normalize_code(raw).map_err(|e| AppError::BadRequest(e.to_string()))?;
        normalized.push(code);
    }

    let created = CashbackCodeRepo::create_batch(&state.pool, &normalized, &input.code_type).await?;

    tracing::info!(
        admin_id = admin.user_id,
        code_type = %input.code_type,
        created,
        "Cashback code batch created"
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": { "created": created } })),
    ))
}
