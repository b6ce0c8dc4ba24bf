use super::Segment;

/// Locate the segment active at `position_seconds`, or `None` when the
/// position falls before the first segment, after the last, or inside a gap.
///
/// Segments are ordered by `start` and non-overlapping, so a binary search
/// for the last segment starting at or before the position is sufficient.
/// The function never extrapolates beyond segment coverage.
pub fn find_active(segments: &[Segment], position_seconds: f32) -> Option<&Segment> {
    if segments.is_empty() || !position_seconds.is_finite() {
        return None;
    }

    let idx = segments.partition_point(|s| s.start <= position_seconds);
    if idx == 0 {
        return None;
    }

    let candidate = &segments[idx - 1];
    candidate.contains(position_seconds).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::CHROMA_BINS;

    fn segment(start: f32, duration: f32) -> Segment {
        Segment {
            start,
            duration,
            confidence: 1.0,
            loudness_max: -10.0,
            pitches: vec![0.0; CHROMA_BINS],
            timbre: vec![0.0; CHROMA_BINS],
        }
    }

    fn contiguous(count: usize, duration: f32) -> Vec<Segment> {
        (0..count)
            .map(|i| segment(i as f32 * duration, duration))
            .collect()
    }

    #[test]
    fn finds_containing_segment() {
        let segments = contiguous(10, 0.5);

        for (i, s) in segments.iter().enumerate() {
            // Sample the start, the middle and just shy of the end.
            for t in [s.start, s.start + 0.25, s.start + 0.499] {
                let found = find_active(&segments, t).expect("segment should be active");
                assert_eq!(found.start, segments[i].start, "position {}", t);
            }
        }
    }

    #[test]
    fn boundary_belongs_to_next_segment() {
        let segments = contiguous(3, 0.5);
        let found = find_active(&segments, 0.5).unwrap();
        assert_eq!(found.start, 0.5);
    }

    #[test]
    fn empty_list_returns_none() {
        assert!(find_active(&[], 0.0).is_none());
        assert!(find_active(&[], 123.4).is_none());
    }

    #[test]
    fn out_of_range_returns_none() {
        let segments = vec![segment(1.0, 0.5), segment(1.5, 0.5)];

        assert!(find_active(&segments, 0.5).is_none());
        assert!(find_active(&segments, 2.0).is_none());
        assert!(find_active(&segments, 100.0).is_none());
    }

    #[test]
    fn gap_between_segments_returns_none() {
        let segments = vec![segment(0.0, 0.5), segment(1.0, 0.5)];
        assert!(find_active(&segments, 0.75).is_none());
    }

    #[test]
    fn zero_duration_segment_never_matches() {
        let segments = vec![segment(1.0, 0.0)];
        assert!(find_active(&segments, 1.0).is_none());
    }

    #[test]
    fn non_finite_position_returns_none() {
        let segments = contiguous(3, 0.5);
        assert!(find_active(&segments, f32::NAN).is_none());
        assert!(find_active(&segments, f32::INFINITY).is_none());
    }
}
