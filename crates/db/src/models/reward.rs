//! Reward ledger and cashback code entity models.

use serde::Serialize;
use sqlx::FromRow;
use tdy_core::types::{DbId, Timestamp};

/// A row from the `user_rewards` table: one generation of progress
/// toward a reward of a given type.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserReward {
    pub id: DbId,
    pub user_id: DbId,
    pub reward_type: String,
    pub codes_collected: i32,
    pub codes_required: i32,
    pub is_redeemed: bool,
    pub redeemed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// A row from the `cashback_codes` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CashbackCode {
    pub id: DbId,
    pub code: String,
    pub code_type: String,
    pub is_used: bool,
    pub used_by: Option<DbId>,
    pub used_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
