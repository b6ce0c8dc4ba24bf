use super::{clamp01, FrequencySpectrum, Segment, CHROMA_BINS};

/// Maps a segment's 12-dimensional timbre vector onto three display bands.
///
/// Timbre coefficients are unbounded and typically signed; each band takes
/// the mean of its four coefficients, recenters it with +0.5 into a usable
/// display range and saturates to 0.0-1.0. Indices 0-3 feed bass, 4-7 mid,
/// 8-11 treble. Stateless and deterministic.
pub struct SpectrumAnalyzer;

impl SpectrumAnalyzer {
    pub fn analyze(segment: &Segment) -> FrequencySpectrum {
        if segment.timbre.len() != CHROMA_BINS {
            // Malformed vector from upstream; zero rather than index out of range.
            return FrequencySpectrum::default();
        }

        FrequencySpectrum {
            bass: Self::band_level(&segment.timbre[0..4]),
            mid: Self::band_level(&segment.timbre[4..8]),
            treble: Self::band_level(&segment.timbre[8..12]),
        }
    }

    fn band_level(coefficients: &[f32]) -> f32 {
        let mean = coefficients.iter().sum::<f32>() / coefficients.len() as f32;
        if !mean.is_finite() {
            return 0.0;
        }
        clamp01(mean + 0.5)
    }
}
