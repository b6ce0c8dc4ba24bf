use std::cmp::Ordering;

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};

use crate::sync::TrackAnalysis;

/// Sanitize a freshly deserialized analysis into one the engine can trust:
/// segments with non-finite or negative timing are dropped, the rest are
/// sorted by start so segment lookup can binary-search, and confidence is
/// clamped into range.
pub fn sanitize_analysis(mut analysis: TrackAnalysis) -> TrackAnalysis {
    let total = analysis.segments.len();
    analysis.segments.retain(|s| {
        s.start.is_finite() && s.duration.is_finite() && s.start >= 0.0 && s.duration >= 0.0
    });
    for segment in &mut analysis.segments {
        segment.confidence = segment.confidence.clamp(0.0, 1.0);
    }
    analysis
        .segments
        .sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(Ordering::Equal));

    let dropped = total - analysis.segments.len();
    if dropped > 0 {
        warn!(
            "Dropped {} malformed analysis segments ({} kept)",
            dropped,
            analysis.segments.len()
        );
    }
    debug!(
        "Ingested analysis: {} segments, {:.1} bpm, energy {:.2}, valence {:.2}",
        analysis.segments.len(),
        analysis.bpm,
        analysis.energy,
        analysis.valence
    );

    analysis
}

/// Parse and sanitize the external analysis service's JSON payload.
///
/// The service is an external collaborator; this is the only place its
/// wire format is interpreted. Fields the service omits get engine
/// defaults (120 BPM, 0.5 energy/valence) so a sparse payload still
/// produces usable signals.
pub fn parse_analysis(json: &str) -> Result<TrackAnalysis> {
    let analysis: TrackAnalysis = serde_json::from_str(json)?;
    Ok(sanitize_analysis(analysis))
}

/// Source of track analyses. The real implementation wraps the streaming
/// service's HTTP client; the engine only cares about the result.
///
/// `Ok(None)` means the service has no analysis for this track, which is a
/// normal state: the engine degrades to idle signals rather than erroring.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn fetch(&self, track_id: &str) -> Result<Option<TrackAnalysis>>;
}

/// Canned provider for tests and the demo binary.
pub struct StaticProvider {
    analysis: TrackAnalysis,
}

impl StaticProvider {
    pub fn new(analysis: TrackAnalysis) -> Self {
        Self { analysis }
    }
}

#[async_trait]
impl AnalysisProvider for StaticProvider {
    async fn fetch(&self, _track_id: &str) -> Result<Option<TrackAnalysis>> {
        Ok(Some(self.analysis.clone()))
    }
}

/// Collapse a fetch result the way the run loop does: failures are logged
/// for diagnostics and treated as "no analysis available".
pub fn resolve_fetch(result: Result<Option<TrackAnalysis>>, track_id: &str) -> Option<TrackAnalysis> {
    match result {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!("Analysis fetch failed for track {}: {}", track_id, e);
            None
        }
    }
}
