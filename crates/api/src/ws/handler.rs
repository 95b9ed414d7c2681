use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tdy_core::error::CoreError;
use tdy_core::sound::{SoundSetting, SOUND_SETTING_KEY};
use tdy_db::repositories::AppSettingRepo;
use tdy_notify::{
    FeedSession, LiveFeed, LoadOutcome, NotificationStore, Player, SqlNotificationSource,
};
use tokio::sync::RwLock;

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::ws::frames::{Frame, WsFrameSink, WsToastSink};

/// Query parameters for the WebSocket upgrade request.
///
/// Browsers cannot set headers on WebSocket handshakes, so the access
/// token travels as a query parameter instead of `Authorization`.
#[derive(Debug, Deserialize)]
pub struct WsUpgradeQuery {
    token: String,
}

/// HTTP handler that authenticates and upgrades the connection to WebSocket.
///
/// The token is validated before the upgrade; an invalid token rejects the
/// handshake with 401 instead of opening and immediately closing a socket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsUpgradeQuery>,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let claims = validate_token(&query.token, &state.config.jwt).map_err(|_| {
        AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
    })?;

    let session = FeedSession {
        user_id: claims.sub,
        is_admin: claims.is_admin(),
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, session)))
}

/// Manage a single authenticated WebSocket connection after upgrade.
///
/// 1. Registers the connection with `WsManager`.
/// 2. Loads the user's recent notifications and sends a snapshot frame.
/// 3. Spawns a live feed task bridging bus events into sound/toast frames.
/// 4. Spawns a sender task forwarding channel messages to the socket sink.
/// 5. Processes inbound messages on the current task and cleans up on
///    disconnect.
async fn handle_socket(socket: WebSocket, state: AppState, session: FeedSession) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id = session.user_id, "WebSocket connected");

    let (tx, mut rx) = state
        .ws_manager
        .add(conn_id.clone(), session.user_id)
        .await;

    // Session-local view of the sound setting. Admin feeds keep it fresh
    // from bus events; it starts from whatever is persisted.
    let sound_setting = Arc::new(RwLock::new(load_sound_setting(&state).await));

    let store = Arc::new(NotificationStore::new(
        SqlNotificationSource::new(state.pool.clone()),
        session.user_id,
        state.config.retry_policy(),
    ));
    let outcome = store.load().await;
    let degraded = matches!(outcome, LoadOutcome::Degraded);
    if degraded {
        tracing::warn!(
            conn_id = %conn_id,
            user_id = session.user_id,
            "Notification load degraded, sending empty snapshot"
        );
    }

    let snapshot = Frame::Snapshot {
        degraded,
        unread: store.unread().await,
        notifications: store.snapshot().await,
    };
    match snapshot.into_message() {
        Ok(message) => {
            let _ = tx.send(message);
        }
        Err(e) => tracing::error!(conn_id = %conn_id, error = %e, "Failed to encode snapshot"),
    }

    // Live feed task: bus events -> store updates + sound/toast frames.
    let feed_task = tokio::spawn(LiveFeed::run(
        state.event_bus.subscribe(),
        session,
        store,
        Arc::new(Player::new(Arc::new(WsFrameSink::new(tx.clone())))),
        Arc::new(WsToastSink::new(tx.clone())),
        sound_setting,
    ));

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Receiver loop: process inbound messages.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_msg) => {
                // Reads and redemptions go through the REST surface.
            }
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: remove connection and abort the helper tasks.
    state.ws_manager.remove(&conn_id).await;
    feed_task.abort();
    send_task.abort();
    tracing::info!(conn_id = %conn_id, user_id = session.user_id, "WebSocket disconnected");
}

/// Load the persisted notification sound setting, if any.
///
/// Absent or malformed settings resolve to `None`, which downstream
/// falls back to the default beep.
async fn load_sound_setting(state: &AppState) -> Option<SoundSetting> {
    match AppSettingRepo::get(&state.pool, SOUND_SETTING_KEY).await {
        Ok(Some(row)) => match serde_json::from_value::<SoundSetting>(row.value) {
            Ok(setting) => Some(setting),
            Err(e) => {
                tracing::warn!(error = %e, "Stored sound setting is malformed, using default");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load sound setting, using default");
            None
        }
    }
}
