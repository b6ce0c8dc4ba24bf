use std::sync::{Arc, Mutex};

/// One poll of the host player's transport, taken once per animation frame.
///
/// The position may jump discontinuously (seek) or stop advancing (pause);
/// the engine never assumes monotonic continuity.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackSnapshot {
    pub position_seconds: f32,
    pub duration_seconds: f32,
    pub is_paused: bool,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            position_seconds: 0.0,
            duration_seconds: 0.0,
            is_paused: true,
        }
    }
}

/// The only contract the engine needs from a host player: a transport
/// snapshot on demand. Track changes arrive separately as [`PlayerEvent`]s.
pub trait PlayerClock: Send {
    fn snapshot(&self) -> PlaybackSnapshot;
}

/// Track lifecycle notifications from the player integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// A different track is now current; carries the new track id.
    TrackChanged(String),
    /// The playback session ended; the engine drops back to idle signals.
    SessionEnded,
}

/// Shared transport state: the player integration writes it, the engine
/// polls it once per frame through [`PlayerClock`].
#[derive(Clone, Default)]
pub struct SharedPlayer {
    inner: Arc<Mutex<PlaybackSnapshot>>,
}

impl SharedPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole snapshot in one assignment so the engine never
    /// reads a half-updated transport.
    pub fn set(&self, snapshot: PlaybackSnapshot) {
        *self.inner.lock().unwrap() = snapshot;
    }

    pub fn seek(&self, position_seconds: f32) {
        let mut inner = self.inner.lock().unwrap();
        inner.position_seconds = position_seconds.max(0.0);
    }

    pub fn set_paused(&self, paused: bool) {
        self.inner.lock().unwrap().is_paused = paused;
    }

    /// Advance the position by a frame delta, saturating at the track end.
    pub fn advance(&self, delta_seconds: f32) {
        let mut inner = self.inner.lock().unwrap();
        if !inner.is_paused {
            inner.position_seconds =
                (inner.position_seconds + delta_seconds).min(inner.duration_seconds);
        }
    }
}

impl PlayerClock for SharedPlayer {
    fn snapshot(&self) -> PlaybackSnapshot {
        *self.inner.lock().unwrap()
    }
}
