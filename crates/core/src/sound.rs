//! Notification sound presets and PCM synthesis.
//!
//! The admin-configured sound setting selects either a static audio file
//! or one of five named synthesized presets. Every fallback path lands
//! on the default beep: a missing setting, an unknown preset name, and
//! (at playback time) a file that cannot be played.
//!
//! Synthesis is pure: [`render`] turns a tone pattern into an f32 PCM
//! buffer; actual output goes through the `AudioSink` seam in
//! `tdy-notify`.

use serde::{Deserialize, Serialize};

/// `app_settings` key under which the active sound setting is stored.
pub const SOUND_SETTING_KEY: &str = "notification_sound";

/// Sample rate used when rendering tone patterns.
pub const SAMPLE_RATE: u32 = 44_100;

/// Linear attack length applied to every tone.
const ATTACK_MS: u32 = 10;

// ---------------------------------------------------------------------------
// Setting
// ---------------------------------------------------------------------------

/// The admin-scoped sound setting, stored as JSON in `app_settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SoundSetting {
    /// Play a static audio asset.
    File { path: String },
    /// Play a named synthesized preset.
    Preset { name: String },
}

// ---------------------------------------------------------------------------
// Tones and patterns
// ---------------------------------------------------------------------------

/// Oscillator shape for a synthesized tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    Sawtooth,
}

/// One synthesized tone within a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tone {
    pub frequency_hz: f32,
    pub start_ms: u32,
    pub duration_ms: u32,
    pub waveform: Waveform,
    pub peak_gain: f32,
}

impl Tone {
    const fn new(
        frequency_hz: f32,
        start_ms: u32,
        duration_ms: u32,
        waveform: Waveform,
        peak_gain: f32,
    ) -> Self {
        Self {
            frequency_hz,
            start_ms,
            duration_ms,
            waveform,
            peak_gain,
        }
    }
}

/// The default synthetic beep: a two-step 800 Hz → 600 Hz sweep over
/// roughly half a second. Used whenever no sound is configured or a
/// configured sound cannot be resolved or played.
pub fn default_beep() -> Vec<Tone> {
    vec![
        Tone::new(800.0, 0, 250, Waveform::Sine, 0.35),
        Tone::new(600.0, 250, 250, Waveform::Sine, 0.30),
    ]
}

/// All valid preset names.
pub const PRESET_NAMES: &[&str] = &["bell", "chime", "pop", "ding", "digital"];

/// Look up the tone pattern for a named preset.
///
/// Returns `None` for unknown names; callers fall back to
/// [`default_beep`].
pub fn preset_pattern(name: &str) -> Option<Vec<Tone>> {
    match name {
        // Two descending triangle tones.
        "bell" => Some(vec![
            Tone::new(880.0, 0, 300, Waveform::Triangle, 0.40),
            Tone::new(660.0, 150, 350, Waveform::Triangle, 0.30),
        ]),
        // Three-note ascending sine arpeggio (C5, E5, G5).
        "chime" => Some(vec![
            Tone::new(523.25, 0, 200, Waveform::Sine, 0.35),
            Tone::new(659.25, 180, 200, Waveform::Sine, 0.35),
            Tone::new(783.99, 360, 260, Waveform::Sine, 0.35),
        ]),
        // Two-tone square blip.
        "pop" => Some(vec![
            Tone::new(400.0, 0, 80, Waveform::Square, 0.25),
            Tone::new(300.0, 80, 80, Waveform::Square, 0.20),
        ]),
        // Single sustained sine tone.
        "ding" => Some(vec![Tone::new(987.77, 0, 600, Waveform::Sine, 0.35)]),
        // Three-tone sawtooth arpeggio.
        "digital" => Some(vec![
            Tone::new(440.0, 0, 120, Waveform::Sawtooth, 0.30),
            Tone::new(554.37, 120, 120, Waveform::Sawtooth, 0.30),
            Tone::new(659.25, 240, 160, Waveform::Sawtooth, 0.30),
        ]),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Cue resolution
// ---------------------------------------------------------------------------

/// A resolved, ready-to-play sound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SoundCue {
    File { path: String },
    Pattern { tones: Vec<Tone> },
}

/// Resolve the active setting to a concrete cue.
///
/// The setting is passed in explicitly (resolved once per event by the
/// live feed) rather than read from shared state, keeping this pure.
/// `None` and unknown preset names resolve to the default beep.
pub fn resolve_cue(setting: Option<&SoundSetting>) -> SoundCue {
    match setting {
        Some(SoundSetting::File { path }) => SoundCue::File { path: path.clone() },
        Some(SoundSetting::Preset { name }) => match preset_pattern(name) {
            Some(tones) => SoundCue::Pattern { tones },
            None => SoundCue::Pattern {
                tones: default_beep(),
            },
        },
        None => SoundCue::Pattern {
            tones: default_beep(),
        },
    }
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

/// Render a tone pattern to mono f32 PCM at the given sample rate.
///
/// Each tone gets a linear attack over the first [`ATTACK_MS`] and an
/// exponential decay over the remainder. Overlapping tones are summed
/// and the result is clamped to [-1, 1].
pub fn render(tones: &[Tone], sample_rate: u32) -> Vec<f32> {
    let total_ms = tones
        .iter()
        .map(|t| t.start_ms + t.duration_ms)
        .max()
        .unwrap_or(0);
    let total_samples = (total_ms as u64 * sample_rate as u64 / 1000) as usize;
    let mut buffer = vec![0.0f32; total_samples];

    for tone in tones {
        let start = (tone.start_ms as u64 * sample_rate as u64 / 1000) as usize;
        let len = (tone.duration_ms as u64 * sample_rate as u64 / 1000) as usize;
        let attack = ((ATTACK_MS.min(tone.duration_ms)) as u64 * sample_rate as u64 / 1000) as usize;

        for i in 0..len {
            let t = i as f32 / sample_rate as f32;
            let phase = (t * tone.frequency_hz).fract();
            let raw = match tone.waveform {
                Waveform::Sine => (2.0 * std::f32::consts::PI * phase).sin(),
                Waveform::Triangle => 4.0 * (phase - 0.5).abs() - 1.0,
                Waveform::Square => {
                    if phase < 0.5 {
                        1.0
                    } else {
                        -1.0
                    }
                }
                Waveform::Sawtooth => 2.0 * phase - 1.0,
            };

            let envelope = if i < attack {
                i as f32 / attack.max(1) as f32
            } else {
                let progress = (i - attack) as f32 / (len - attack).max(1) as f32;
                (-5.0 * progress).exp()
            };

            if let Some(sample) = buffer.get_mut(start + i) {
                *sample = (*sample + raw * envelope * tone.peak_gain).clamp(-1.0, 1.0);
            }
        }
    }

    buffer
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
