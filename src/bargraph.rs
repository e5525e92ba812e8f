//! The 8 segment LED bar graph.
use crate::config::SEGMENTS;

/// Number of lit segments for an object at `distance_cm`.
///
/// Objects at 1cm or closer light no segment, objects at
/// `near_threshold_cm - 1` or beyond light all of them. In between, every
/// centimeter beyond the first lights one more segment.
pub fn segments_lit(distance_cm: u32, near_threshold_cm: u32) -> u8 {
    let full = near_threshold_cm.saturating_sub(1);
    if distance_cm <= 1 {
        0
    } else if distance_cm >= full {
        SEGMENTS
    } else {
        (distance_cm - 1).min(u32::from(SEGMENTS)) as u8
    }
}

/// The output mask lighting the first `segments` segments, one bit per
/// segment starting at bit 0.
pub const fn mask(segments: u8) -> u8 {
    if segments >= SEGMENTS {
        u8::MAX
    } else {
        (1 << segments) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_per_distance() {
        assert_eq!(segments_lit(0, 10), 0);
        assert_eq!(segments_lit(1, 10), 0);
        assert_eq!(segments_lit(2, 10), 1);
        assert_eq!(segments_lit(3, 10), 2);
        assert_eq!(segments_lit(8, 10), 7);
        assert_eq!(segments_lit(9, 10), 8);
        assert_eq!(segments_lit(10, 10), 8);
        assert_eq!(segments_lit(u32::MAX, 10), 8);
    }

    #[test]
    fn segments_are_bounded_and_monotonic() {
        for threshold in [2, 10, 12, 30] {
            let mut previous = 0;
            for distance in 1..threshold {
                let lit = segments_lit(distance, threshold);
                assert!(lit <= SEGMENTS);
                assert!(lit >= previous, "{distance}cm of {threshold}cm");
                previous = lit;
            }
        }
    }

    #[test]
    fn masks_are_contiguous() {
        assert_eq!(mask(0), 0b0000_0000);
        assert_eq!(mask(1), 0b0000_0001);
        assert_eq!(mask(3), 0b0000_0111);
        assert_eq!(mask(7), 0b0111_1111);
        assert_eq!(mask(8), 0b1111_1111);
        assert_eq!(mask(200), 0b1111_1111);
        for segments in 0..=SEGMENTS {
            assert_eq!(mask(segments).count_ones(), u32::from(segments));
            assert_eq!(mask(segments).trailing_ones(), u32::from(segments));
        }
    }
}
