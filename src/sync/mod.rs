pub mod beat_detector;
pub mod engine;
pub mod mood;
pub mod segment_index;
pub mod spectrum;
pub mod tempo;

pub use beat_detector::{BeatDetector, BeatState};
pub use engine::{spawn_engine, EngineHandle, SyncEngine, SyncFrameHandle};
pub use mood::{Mood, MoodClassifier, MoodState};
pub use segment_index::find_active;
pub use spectrum::SpectrumAnalyzer;
pub use tempo::TempoSync;

use serde::Deserialize;

/// Length of a segment's pitch and timbre vectors (one value per pitch class).
pub const CHROMA_BINS: usize = 12;

/// Tempo substituted when the analysis supplies no usable BPM.
pub const DEFAULT_BPM: f32 = 120.0;

/// One time-sliced unit of precomputed track analysis, covering
/// `[start, start + duration)` seconds of playback.
///
/// Segments are immutable once fetched and are expected to be ordered by
/// `start` and non-overlapping; [`provider`](crate::provider) enforces the
/// ordering when it ingests a wire payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub start: f32,
    pub duration: f32,
    /// Reliability of this segment's measurements (0.0-1.0).
    #[serde(default)]
    pub confidence: f32,
    /// Peak loudness in dB, typically negative; magnitude is an energy proxy.
    #[serde(default)]
    pub loudness_max: f32,
    /// Chroma energy per pitch class (0.0-1.0 each).
    #[serde(default)]
    pub pitches: Vec<f32>,
    /// Spectral-shape descriptor, unbounded real values.
    #[serde(default)]
    pub timbre: Vec<f32>,
}

impl Segment {
    pub fn end(&self) -> f32 {
        self.start + self.duration
    }

    /// Half-open containment test: `start <= position < start + duration`.
    pub fn contains(&self, position_seconds: f32) -> bool {
        position_seconds >= self.start && position_seconds < self.end()
    }
}

/// Full analysis for one track. Replaced atomically when the current track
/// changes; consumers never see a partially-updated instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackAnalysis {
    #[serde(default = "default_bpm")]
    pub bpm: f32,
    #[serde(default = "default_half")]
    pub energy: f32,
    #[serde(default = "default_half")]
    pub valence: f32,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

fn default_bpm() -> f32 {
    DEFAULT_BPM
}

fn default_half() -> f32 {
    0.5
}

/// Bass/mid/treble display levels, each normalized to 0.0-1.0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrequencySpectrum {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
}

/// The complete signal snapshot published once per animation frame.
///
/// The engine writes a whole `SyncFrame` in one assignment, so a reader
/// always sees beat, spectrum, mood and tempo from the same frame.
#[derive(Debug, Clone)]
pub struct SyncFrame {
    pub frame_index: u64,
    /// Synthesized beat strength with percussive decay (0.0-1.0).
    pub beat_intensity: f32,
    /// `None` while idle or paused, or when no segment covers the position.
    pub spectrum: Option<FrequencySpectrum>,
    /// `None` until a track analysis is loaded.
    pub mood: Option<MoodState>,
    /// Animation-speed scalar; 1.0 means the 120 BPM reference tempo.
    pub tempo_multiplier: f32,
}

impl Default for SyncFrame {
    fn default() -> Self {
        Self {
            frame_index: 0,
            beat_intensity: 0.0,
            spectrum: None,
            mood: None,
            tempo_multiplier: 1.0,
        }
    }
}

pub(crate) fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// BPM guard shared by the beat detector and tempo sync: zero, negative and
/// non-finite values would poison every downstream division, so they are
/// replaced with the reference tempo.
pub(crate) fn sanitize_bpm(bpm: f32) -> f32 {
    if bpm.is_finite() && bpm > 0.0 {
        bpm
    } else {
        DEFAULT_BPM
    }
}
