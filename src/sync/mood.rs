use std::fmt;

use super::clamp01;

/// Coarse track mood derived from aggregate energy and valence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Happy,
    Sad,
    Energetic,
    Calm,
    Neutral,
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Energetic => "energetic",
            Mood::Calm => "calm",
            Mood::Neutral => "neutral",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoodState {
    pub mood: Mood,
    /// Classification confidence, clamped to 0.0-1.0.
    pub confidence: f32,
}

/// Deterministic energy/valence decision table, evaluated in order with the
/// first match winning.
///
/// The thresholds intentionally leave gaps (e.g. valence between 0.4 and 0.5
/// with mid energy) that fall through to neutral. That is the tuned,
/// observed behavior and is preserved as-is.
pub struct MoodClassifier;

impl MoodClassifier {
    pub fn classify(energy: f32, valence: f32) -> MoodState {
        if !energy.is_finite() || !valence.is_finite() {
            return MoodState {
                mood: Mood::Neutral,
                confidence: 0.5,
            };
        }

        let (mood, confidence) = if valence > 0.6 && energy > 0.6 {
            (Mood::Happy, (valence + energy) / 2.0)
        } else if valence < 0.4 && energy > 0.6 {
            (Mood::Energetic, energy)
        } else if valence < 0.4 && energy < 0.4 {
            (Mood::Sad, 1.0 - (valence + energy) / 2.0)
        } else if valence > 0.5 && energy < 0.4 {
            (Mood::Calm, (valence + (1.0 - energy)) / 2.0)
        } else {
            (Mood::Neutral, 0.5)
        };

        MoodState {
            mood,
            confidence: clamp01(confidence),
        }
    }
}
