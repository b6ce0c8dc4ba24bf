use super::{sanitize_bpm, DEFAULT_BPM};

/// Normalizes a track's BPM into an animation-speed multiplier.
///
/// A value of 1.0 means "animate at the reference tempo"; consumers scale
/// their own per-frame deltas by it. The engine only publishes the scalar,
/// it never drives animation itself.
pub struct TempoSync;

impl TempoSync {
    pub fn multiplier(bpm: f32) -> f32 {
        sanitize_bpm(bpm) / DEFAULT_BPM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_tempo_maps_to_unity() {
        assert_eq!(TempoSync::multiplier(120.0), 1.0);
        assert_eq!(TempoSync::multiplier(240.0), 2.0);
        assert_eq!(TempoSync::multiplier(60.0), 0.5);
    }

    #[test]
    fn invalid_bpm_maps_to_unity() {
        assert_eq!(TempoSync::multiplier(0.0), 1.0);
        assert_eq!(TempoSync::multiplier(-30.0), 1.0);
        assert_eq!(TempoSync::multiplier(f32::NAN), 1.0);
    }
}
