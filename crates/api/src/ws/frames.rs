//! Outbound WebSocket frames and the sinks that emit them.
//!
//! Sounds and toasts are pushed to the client as JSON text frames; the
//! client renders the toast and synthesizes or fetches the audio. Both
//! sinks write straight into the connection's unbounded channel, so they
//! stay synchronous and cheap to call from the feed task.

use anyhow::Context;
use axum::extract::ws::Message;
use serde::Serialize;
use tdy_core::notification::Toast;
use tdy_core::sound::Tone;
use tdy_db::models::notification::Notification;
use tdy_notify::{AudioSink, ToastSink};

use crate::ws::manager::WsSender;

/// JSON frame pushed to a WebSocket client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frame {
    /// Initial state after connect: recent notifications plus unread count.
    /// `degraded` is set when the backing load failed and the list is empty.
    Snapshot {
        degraded: bool,
        unread: u64,
        notifications: Vec<Notification>,
    },
    /// A toast the client should render.
    Toast { toast: Toast },
    /// A tone pattern the client should synthesize and play.
    SoundPattern { tones: Vec<Tone> },
    /// A static audio asset the client should fetch and play.
    SoundFile { path: String },
}

impl Frame {
    /// Encode as a WebSocket text message.
    pub fn into_message(self) -> Result<Message, serde_json::Error> {
        Ok(Message::Text(serde_json::to_string(&self)?.into()))
    }
}

/// [`AudioSink`] that forwards sound frames to one connection.
pub struct WsFrameSink {
    tx: WsSender,
}

impl WsFrameSink {
    pub fn new(tx: WsSender) -> Self {
        Self { tx }
    }

    fn push(&self, frame: Frame) -> anyhow::Result<()> {
        let message = frame.into_message().context("encoding sound frame")?;
        self.tx
            .send(message)
            .context("connection channel closed")?;
        Ok(())
    }
}

impl AudioSink for WsFrameSink {
    fn play_pattern(&self, tones: &[Tone]) -> anyhow::Result<()> {
        self.push(Frame::SoundPattern {
            tones: tones.to_vec(),
        })
    }

    fn play_file(&self, path: &str) -> anyhow::Result<()> {
        self.push(Frame::SoundFile {
            path: path.to_string(),
        })
    }
}

/// [`ToastSink`] that forwards toast frames to one connection.
pub struct WsToastSink {
    tx: WsSender,
}

impl WsToastSink {
    pub fn new(tx: WsSender) -> Self {
        Self { tx }
    }
}

impl ToastSink for WsToastSink {
    fn show(&self, toast: Toast) {
        match (Frame::Toast { toast }).into_message() {
            Ok(message) => {
                let _ = self.tx.send(message);
            }
            Err(e) => tracing::warn!(error = %e, "Failed to encode toast frame"),
        }
    }
}
