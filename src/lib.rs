//! # Syncwave
//!
//! An audio-feature synchronization engine for music visualizers. Converts
//! coarse, pre-computed track analysis (time-stamped segments with loudness,
//! timbre and pitch vectors, plus aggregate tempo/energy/valence) into
//! smooth, frame-rate-independent signals that renderers sample every frame:
//!
//! - **Beat intensity**: a 0-1 pulse with percussive decay between onsets
//! - **Frequency spectrum**: bass/mid/treble levels derived from timbre
//! - **Mood**: a coarse energy/valence classification with confidence
//! - **Tempo multiplier**: track BPM normalized against a 120 BPM reference
//!
//! The engine does no raw-audio DSP; it only reinterprets analysis data an
//! external service already computed. Playback position, pause state and
//! track changes come from a host player through the narrow contracts in
//! [`player`]; analysis payloads arrive through [`provider`].
//!
//! All four signals are recomputed once per animation frame by
//! [`sync::SyncEngine`] and published together as a single complete
//! [`sync::SyncFrame`], so readers never observe a torn update.

pub mod clock;
pub mod player;
pub mod provider;
pub mod sync;

pub use clock::{wall_clock_ms, CancelHandle, FrameScheduler};
pub use player::{PlaybackSnapshot, PlayerClock, PlayerEvent, SharedPlayer};
pub use provider::{AnalysisProvider, StaticProvider};
pub use sync::{
    spawn_engine, EngineHandle, FrequencySpectrum, Mood, MoodState, Segment, SyncEngine,
    SyncFrame, SyncFrameHandle, TrackAnalysis,
};
