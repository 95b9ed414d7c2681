//! Best-effort sound playback.
//!
//! [`Player`] resolves what to play; the [`AudioSink`] seam does the
//! actual output (a WebSocket push frame in production, a recording
//! double in tests; a local sink would render the pattern to PCM via
//! [`tdy_core::sound::render`]). Playback is a UI affordance, not
//! correctness: every failure is logged and swallowed, and file
//! failures fall back to the default synthesized beep.

use std::sync::Arc;

use tdy_core::sound::{self, SoundCue, Tone};

/// Output seam for notification sounds.
///
/// Implementations must tolerate being called from any task. Errors are
/// observed by the [`Player`] for logging and fallback only; they never
/// propagate further.
pub trait AudioSink: Send + Sync {
    /// Play a synthesized tone pattern.
    fn play_pattern(&self, tones: &[Tone]) -> anyhow::Result<()>;

    /// Play a static audio asset by path.
    fn play_file(&self, path: &str) -> anyhow::Result<()>;
}

/// Sink that discards all audio. Useful for headless sessions and tests.
pub struct NullSink;

impl AudioSink for NullSink {
    fn play_pattern(&self, _tones: &[Tone]) -> anyhow::Result<()> {
        Ok(())
    }

    fn play_file(&self, _path: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Best-effort sound player over an [`AudioSink`].
pub struct Player {
    sink: Arc<dyn AudioSink>,
}

impl Player {
    pub fn new(sink: Arc<dyn AudioSink>) -> Self {
        Self { sink }
    }

    /// Play the default synthetic beep. Never surfaces an error.
    pub fn play_default_beep(&self) {
        if let Err(e) = self.sink.play_pattern(&sound::default_beep()) {
            tracing::warn!(error = %e, "Failed to play default beep");
        }
    }

    /// Play a static audio asset, falling back to the default beep when
    /// the sink rejects it (missing file, unsupported format, blocked
    /// output).
    pub fn play_from_file(&self, path: &str) {
        if let Err(e) = self.sink.play_file(path) {
            tracing::warn!(path, error = %e, "File playback failed, falling back to beep");
            self.play_default_beep();
        }
    }

    /// Play a named preset. Unknown names fall back to the default beep.
    pub fn play_preset(&self, name: &str) {
        match sound::preset_pattern(name) {
            Some(tones) => {
                if let Err(e) = self.sink.play_pattern(&tones) {
                    tracing::warn!(preset = name, error = %e, "Failed to play preset");
                }
            }
            None => {
                tracing::debug!(preset = name, "Unknown sound preset, using default beep");
                self.play_default_beep();
            }
        }
    }

    /// Play a resolved cue.
    pub fn play(&self, cue: &SoundCue) {
        match cue {
            SoundCue::File { path } => self.play_from_file(path),
            SoundCue::Pattern { tones } => {
                if let Err(e) = self.sink.play_pattern(tones) {
                    tracing::warn!(error = %e, "Failed to play sound pattern");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
