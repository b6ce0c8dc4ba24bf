use std::sync::{Arc, Mutex};

use crossbeam_channel::Receiver;
use log::{debug, info, warn};
use tokio::task::JoinHandle;

use super::beat_detector::BeatDetector;
use super::mood::{MoodClassifier, MoodState};
use super::segment_index::find_active;
use super::spectrum::SpectrumAnalyzer;
use super::tempo::TempoSync;
use super::{SyncFrame, TrackAnalysis};
use crate::clock::{CancelHandle, FrameScheduler};
use crate::player::{PlaybackSnapshot, PlayerClock, PlayerEvent};
use crate::provider::{resolve_fetch, AnalysisProvider};

/// Read side of the published per-frame signals.
///
/// Cloning the handle is cheap; `read` returns the complete frame the
/// orchestrator last wrote, never a partially-updated one.
#[derive(Clone)]
pub struct SyncFrameHandle {
    inner: Arc<Mutex<SyncFrame>>,
}

impl SyncFrameHandle {
    pub fn read(&self) -> SyncFrame {
        self.inner.lock().unwrap().clone()
    }
}

/// Per-frame orchestrator over the track lifecycle: idle until an analysis
/// is loaded, then deriving all four signals once per animation frame.
///
/// Signals are computed in a fixed order within a frame (segment lookup,
/// spectrum, beat) and published as one [`SyncFrame`], so readers always
/// see a mutually consistent snapshot.
pub struct SyncEngine {
    analysis: Option<TrackAnalysis>,
    beat: BeatDetector,
    mood: Option<MoodState>,
    tempo_multiplier: f32,
    frame_index: u64,
    published: Arc<Mutex<SyncFrame>>,
}

impl Default for SyncEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncEngine {
    pub fn new() -> Self {
        Self {
            analysis: None,
            beat: BeatDetector::new(),
            mood: None,
            tempo_multiplier: 1.0,
            frame_index: 0,
            published: Arc::new(Mutex::new(SyncFrame::default())),
        }
    }

    pub fn frame_handle(&self) -> SyncFrameHandle {
        SyncFrameHandle {
            inner: Arc::clone(&self.published),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.analysis.is_some()
    }

    /// Install the analysis for a newly-current track, or `None` when the
    /// service had nothing for it.
    ///
    /// Mood and tempo depend only on aggregate features, so they are
    /// recomputed here, once per track, not per frame. The beat envelope
    /// restarts from silence so the new track never inherits the previous
    /// track's pulse or refractory window.
    pub fn load_track(&mut self, analysis: Option<TrackAnalysis>) {
        match &analysis {
            Some(a) => {
                let mood = MoodClassifier::classify(a.energy, a.valence);
                info!(
                    "Track loaded: {} segments, {:.1} bpm, mood {} ({:.2})",
                    a.segments.len(),
                    a.bpm,
                    mood.mood,
                    mood.confidence
                );
                self.mood = Some(mood);
                self.tempo_multiplier = TempoSync::multiplier(a.bpm);
            }
            None => {
                info!("No analysis available; signals idle");
                self.mood = None;
                self.tempo_multiplier = 1.0;
            }
        }
        self.beat.reset();
        self.analysis = analysis;
        self.publish(0.0, None);
    }

    /// Drop back to idle (session ended or the host navigated away).
    pub fn clear_track(&mut self) {
        if self.analysis.is_some() {
            self.load_track(None);
        }
    }

    /// Run one animation frame against the given transport snapshot and
    /// wall clock, returning the frame that was published.
    ///
    /// While loaded and playing: segment lookup, then spectrum, then beat.
    /// While paused or idle: the spectrum drops out immediately and the
    /// beat envelope fades instead of snapping to zero, so visuals settle
    /// without popping.
    pub fn advance(&mut self, playback: PlaybackSnapshot, now_ms: f64) -> SyncFrame {
        let (intensity, spectrum) = match &self.analysis {
            Some(analysis) if !playback.is_paused => {
                let segment = find_active(&analysis.segments, playback.position_seconds);
                let spectrum = segment.map(SpectrumAnalyzer::analyze);
                let intensity = self.beat.update(
                    segment,
                    playback.position_seconds,
                    analysis.bpm,
                    false,
                    now_ms,
                );
                (intensity, spectrum)
            }
            _ => {
                let intensity =
                    self.beat
                        .update(None, playback.position_seconds, 0.0, true, now_ms);
                (intensity, None)
            }
        };

        self.publish(intensity, spectrum)
    }

    fn publish(
        &mut self,
        beat_intensity: f32,
        spectrum: Option<super::FrequencySpectrum>,
    ) -> SyncFrame {
        // Every published frame gets its own index, including the
        // out-of-band frame written on track load.
        self.frame_index += 1;
        let frame = SyncFrame {
            frame_index: self.frame_index,
            beat_intensity,
            spectrum,
            mood: self.mood,
            tempo_multiplier: self.tempo_multiplier,
        };
        *self.published.lock().unwrap() = frame.clone();
        frame
    }
}

/// A running engine loop. Dropping the handle cancels the loop, so the
/// pending tick can never outlive its owner; `shutdown` is idempotent.
pub struct EngineHandle {
    frames: SyncFrameHandle,
    cancel: CancelHandle,
    task: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub fn frames(&self) -> SyncFrameHandle {
        self.frames.clone()
    }

    /// Stop the frame loop before its next tick. Safe to call repeatedly.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Shut down and wait for the loop task to finish.
    pub async fn stopped(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Engine loop task failed: {}", e);
            }
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn the per-frame loop: applies pending player events, polls the
/// player clock and advances the engine once per tick.
///
/// Analysis fetches triggered by track changes run on their own task and
/// land on an internal channel, so the frame callback never blocks on the
/// network; the engine consumes the result on a later tick, staying idle
/// (or on the previous track) until then.
///
/// Every track change bumps a generation counter and fetch results carry
/// the generation they were requested under. A fetch that completes after
/// its track was superseded (or after the session ended) is discarded, so
/// a slow analysis service can never install a stale track's signals.
pub fn spawn_engine<P>(
    mut engine: SyncEngine,
    player: P,
    events: Receiver<PlayerEvent>,
    provider: Arc<dyn AnalysisProvider>,
    fps: u32,
) -> EngineHandle
where
    P: PlayerClock + 'static,
{
    let frames = engine.frame_handle();
    let (loaded_tx, loaded_rx) = crossbeam_channel::unbounded::<(u64, Option<TrackAnalysis>)>();
    let mut current_generation: u64 = 0;

    let (cancel, task) = FrameScheduler::new(fps).spawn(move |now_ms| {
        while let Ok(event) = events.try_recv() {
            match event {
                PlayerEvent::TrackChanged(track_id) => {
                    current_generation += 1;
                    let generation = current_generation;
                    let provider = Arc::clone(&provider);
                    let loaded_tx = loaded_tx.clone();
                    tokio::spawn(async move {
                        let analysis = resolve_fetch(provider.fetch(&track_id).await, &track_id);
                        let _ = loaded_tx.send((generation, analysis));
                    });
                }
                PlayerEvent::SessionEnded => {
                    current_generation += 1;
                    engine.clear_track();
                }
            }
        }

        while let Ok((generation, analysis)) = loaded_rx.try_recv() {
            if generation == current_generation {
                engine.load_track(analysis);
            } else {
                debug!(
                    "Discarding stale analysis fetch (generation {}, current {})",
                    generation, current_generation
                );
            }
        }

        engine.advance(player.snapshot(), now_ms);
    });

    EngineHandle {
        frames,
        cancel,
        task: Some(task),
    }
}
