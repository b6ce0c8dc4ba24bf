use super::{clamp01, sanitize_bpm, Segment, CHROMA_BINS};

// Empirically tuned constants, kept exactly for behavioral parity with the
// visuals they were tuned against.
const LOUDNESS_CEILING_DB: f32 = 60.0;
const TIMBRE_ENERGY_NORM: f32 = 10.0;
const TIMBRE_CUE_WEIGHT: f32 = 0.3;
const PHASE_WINDOW: f32 = 0.15;
const PHASE_BOOST_GAIN: f32 = 0.2;
const RAW_INTENSITY_GAIN: f32 = 1.5;
const ONSET_THRESHOLD: f32 = 0.3;
const REFRACTORY_FRACTION: f32 = 0.7;
const IDLE_DECAY: f32 = 0.95;
const FAST_DECAY: f32 = 0.88;
const SLOW_DECAY: f32 = 0.92;

/// Beat envelope state. Mutated only by [`BeatDetector`].
#[derive(Debug, Clone, Copy)]
pub struct BeatState {
    /// Current beat strength, always within 0.0-1.0.
    pub intensity: f32,
    /// Wall-clock time of the last registered onset, in milliseconds.
    pub last_beat_wall_ms: f64,
}

impl Default for BeatState {
    fn default() -> Self {
        Self {
            intensity: 0.0,
            // Far enough in the past that the first onset is never blocked
            // by the refractory window.
            last_beat_wall_ms: f64::NEG_INFINITY,
        }
    }
}

/// Converts noisy per-segment loudness/timbre measurements into discrete,
/// debounced beat pulses with a musically plausible decay envelope.
///
/// Raw per-frame loudness is far too noisy to drive visuals directly (it
/// pulses every frame, not every beat). Each frame the detector either
/// registers an onset or decays the current intensity. An onset requires
/// the playback position to be near a beat boundary, the combined cue
/// strength to clear the threshold, and at least 70% of one beat interval
/// to have passed since the previous onset. Strong pulses decay faster
/// than weak ones so loud beats feel percussive rather than sustained.
#[derive(Debug, Default)]
pub struct BeatDetector {
    state: BeatState,
}

impl BeatDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop back to silence. Called on track changes so a new track never
    /// inherits the previous track's envelope or refractory window.
    pub fn reset(&mut self) {
        self.state = BeatState::default();
    }

    pub fn intensity(&self) -> f32 {
        self.state.intensity
    }

    pub fn state(&self) -> BeatState {
        self.state
    }

    /// Advance the envelope by one animation frame and return the new
    /// intensity.
    ///
    /// With no active segment or while paused the envelope only fades
    /// (gentle 0.95 per frame) so visuals settle instead of popping.
    /// Malformed segment data takes the same fade path rather than
    /// propagating NaN into shared state.
    pub fn update(
        &mut self,
        segment: Option<&Segment>,
        position_seconds: f32,
        bpm: f32,
        paused: bool,
        now_ms: f64,
    ) -> f32 {
        let segment = match segment {
            Some(s) if !paused => s,
            _ => return self.decay(IDLE_DECAY),
        };

        let beat_interval = 60.0 / sanitize_bpm(bpm);
        let segment_elapsed = position_seconds - segment.start;
        let beat_phase = segment_elapsed.rem_euclid(beat_interval) / beat_interval;

        let raw = match Self::raw_intensity(segment, beat_phase) {
            Some(raw) => raw,
            None => return self.decay(IDLE_DECAY),
        };

        let refractory_ms = f64::from(beat_interval) * 1000.0 * f64::from(REFRACTORY_FRACTION);
        let onset = beat_phase < PHASE_WINDOW
            && now_ms - self.state.last_beat_wall_ms > refractory_ms
            && raw > ONSET_THRESHOLD;

        if onset {
            self.state.intensity = raw;
            self.state.last_beat_wall_ms = now_ms;
        } else {
            let factor = if self.state.intensity > 0.5 {
                FAST_DECAY
            } else {
                SLOW_DECAY
            };
            self.decay(factor);
        }

        self.state.intensity
    }

    /// Instantaneous strength from three independent cues: loudness scaled
    /// by segment confidence, mean absolute timbre energy, and a boost for
    /// proximity to the beat boundary.
    fn raw_intensity(segment: &Segment, beat_phase: f32) -> Option<f32> {
        if segment.timbre.len() != CHROMA_BINS {
            return None;
        }

        let loudness = segment.loudness_max.abs() / LOUDNESS_CEILING_DB;
        let timbre_mean =
            segment.timbre.iter().map(|t| t.abs()).sum::<f32>() / CHROMA_BINS as f32;
        let timbre_energy = clamp01(timbre_mean / TIMBRE_ENERGY_NORM);
        let phase_boost = if beat_phase < PHASE_WINDOW {
            PHASE_BOOST_GAIN * (1.0 - beat_phase / PHASE_WINDOW)
        } else {
            0.0
        };

        let raw = clamp01(
            (loudness * segment.confidence + timbre_energy * TIMBRE_CUE_WEIGHT + phase_boost)
                * RAW_INTENSITY_GAIN,
        );
        raw.is_finite().then_some(raw)
    }

    fn decay(&mut self, factor: f32) -> f32 {
        self.state.intensity = clamp01(self.state.intensity * factor);
        self.state.intensity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loud_segment(start: f32) -> Segment {
        Segment {
            start,
            duration: 0.5,
            confidence: 0.9,
            loudness_max: -10.0,
            pitches: vec![0.0; CHROMA_BINS],
            timbre: vec![
                5.0, 5.0, 5.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
            ],
        }
    }

    #[test]
    fn onset_fires_on_the_beat() {
        let mut detector = BeatDetector::new();
        let segment = loud_segment(0.0);

        let intensity = detector.update(Some(&segment), 0.0, 120.0, false, 1_000.0);

        // loudness 10/60 * 0.9 + timbre (20/12)/10 * 0.3 + phase boost 0.2,
        // all times the 1.5 gain.
        let expected = ((10.0 / 60.0) * 0.9 + (20.0 / 12.0) / 10.0 * 0.3 + 0.2) * 1.5;
        assert!((intensity - expected).abs() < 1e-5, "got {}", intensity);
        assert_eq!(detector.state().last_beat_wall_ms, 1_000.0);
    }

    #[test]
    fn refractory_blocks_back_to_back_onsets() {
        let mut detector = BeatDetector::new();
        let segment = loud_segment(0.0);

        let first = detector.update(Some(&segment), 0.0, 120.0, false, 0.0);
        assert!(first > 0.3);

        // 100ms later we are still inside the 350ms refractory window
        // (0.7 * 500ms at 120 BPM), so even an on-beat position only decays.
        let second = detector.update(Some(&segment), 0.01, 120.0, false, 100.0);
        assert!(second < first);
        assert_eq!(detector.state().last_beat_wall_ms, 0.0);

        // Past the refractory window the next on-beat frame fires again.
        let third = detector.update(Some(&segment), 0.01, 120.0, false, 400.0);
        assert!(third > second);
        assert_eq!(detector.state().last_beat_wall_ms, 400.0);
    }

    #[test]
    fn intensity_decays_monotonically_without_onsets() {
        let mut detector = BeatDetector::new();
        let segment = loud_segment(0.0);
        detector.update(Some(&segment), 0.0, 120.0, false, 0.0);

        // Off-beat positions (phase well past the 0.15 window) never onset.
        let mut previous = detector.intensity();
        for frame in 1..200 {
            let position = 0.2 + (frame as f32) * 0.0001;
            let intensity = detector.update(Some(&segment), position, 120.0, false, frame as f64 * 16.0);
            assert!(intensity <= previous);
            previous = intensity;
        }
        assert!(previous < 0.01, "envelope should converge toward zero");
    }

    #[test]
    fn high_intensity_decays_faster() {
        let mut high = BeatDetector::new();
        high.state.intensity = 0.8;
        let mut low = BeatDetector::new();
        low.state.intensity = 0.4;

        let segment = loud_segment(0.0);
        // Off-beat, weak position: decay path in both cases.
        high.update(Some(&segment), 0.2, 120.0, false, 0.0);
        low.update(Some(&segment), 0.2, 120.0, false, 0.0);

        assert!((high.intensity() - 0.8 * 0.88).abs() < 1e-6);
        assert!((low.intensity() - 0.4 * 0.92).abs() < 1e-6);
    }

    #[test]
    fn paused_playback_decays_gently() {
        let mut detector = BeatDetector::new();
        detector.state.intensity = 0.8;

        let segment = loud_segment(0.0);
        let intensity = detector.update(Some(&segment), 0.0, 120.0, true, 0.0);
        assert!((intensity - 0.76).abs() < 1e-6);
    }

    #[test]
    fn missing_segment_decays_gently() {
        let mut detector = BeatDetector::new();
        detector.state.intensity = 0.5;

        let intensity = detector.update(None, 3.0, 120.0, false, 0.0);
        assert!((intensity - 0.475).abs() < 1e-6);
    }

    #[test]
    fn invalid_bpm_falls_back_to_default() {
        for bad_bpm in [0.0, -1.0, f32::NAN] {
            let mut detector = BeatDetector::new();
            let segment = loud_segment(0.0);
            let intensity = detector.update(Some(&segment), 0.0, bad_bpm, false, 0.0);
            // Must behave exactly as the 120 BPM path: onset on the beat.
            assert!(intensity > 0.3, "bpm {} should not break onset", bad_bpm);
        }
    }

    #[test]
    fn malformed_timbre_skips_beat_computation() {
        let mut detector = BeatDetector::new();
        detector.state.intensity = 0.6;

        let mut segment = loud_segment(0.0);
        segment.timbre = vec![5.0; 7];
        let intensity = detector.update(Some(&segment), 0.0, 120.0, false, 0.0);

        assert!((intensity - 0.6 * 0.95).abs() < 1e-6);
        assert_eq!(detector.state().last_beat_wall_ms, f64::NEG_INFINITY);
    }

    #[test]
    fn non_finite_loudness_never_reaches_shared_state() {
        let mut detector = BeatDetector::new();
        let mut segment = loud_segment(0.0);
        segment.loudness_max = f32::NAN;

        let intensity = detector.update(Some(&segment), 0.0, 120.0, false, 0.0);
        assert!(intensity.is_finite());
    }

    #[test]
    fn reset_restarts_envelope_and_refractory() {
        let mut detector = BeatDetector::new();
        let segment = loud_segment(0.0);
        detector.update(Some(&segment), 0.0, 120.0, false, 1_000.0);
        assert!(detector.intensity() > 0.0);

        detector.reset();
        assert_eq!(detector.intensity(), 0.0);

        // A fresh onset can fire immediately even though wall-clock barely moved.
        let intensity = detector.update(Some(&segment), 0.0, 120.0, false, 1_016.0);
        assert!(intensity > 0.3);
    }
}
