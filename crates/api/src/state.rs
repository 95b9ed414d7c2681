use std::sync::Arc;

use tdy_notify::{EventBus, RedemptionFlow};

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: tdy_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager.
    pub ws_manager: Arc<WsManager>,
    /// Centralized event bus for feed events.
    pub event_bus: Arc<EventBus>,
    /// Cashback code redemption flow (claim + ledger credit).
    pub redemption: Arc<RedemptionFlow>,
}
