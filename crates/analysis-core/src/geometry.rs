//! Planar geometry on pixel-space points.
//!
//! Degenerate inputs (zero-length segments) produce `0.0` rather than an
//! error; callers treat that as a neutral reading.

/// A point in pixel space, `y` growing downward.
pub type Point = (f64, f64);

/// Angle ABC in degrees, with `b` as the vertex. Range `[0, 180]`.
pub fn angle_at_vertex(a: Point, b: Point, c: Point) -> f64 {
    let ba = (a.0 - b.0, a.1 - b.1);
    let bc = (c.0 - b.0, c.1 - b.1);

    let mag_ba = (ba.0 * ba.0 + ba.1 * ba.1).sqrt();
    let mag_bc = (bc.0 * bc.0 + bc.1 * bc.1).sqrt();
    if mag_ba == 0.0 || mag_bc == 0.0 {
        return 0.0;
    }

    let dot = ba.0 * bc.0 + ba.1 * bc.1;
    let cos_angle = (dot / (mag_ba * mag_bc)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

/// Inclination of segment `p1 -> p2` against the upward image vertical.
///
/// 0° means `p2` is straight above `p1`; larger values are more horizontal,
/// 180° is straight below. Range `[0, 180]`.
pub fn angle_from_vertical(p1: Point, p2: Point) -> f64 {
    let vx = p2.0 - p1.0;
    let vy = p2.1 - p1.1;
    let mag = (vx * vx + vy * vy).sqrt();
    if mag == 0.0 {
        return 0.0;
    }
    // Reference direction is (0, -1); the dot product reduces to -vy.
    let cos_angle = (-vy / mag).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

pub fn euclidean_distance(p1: Point, p2: Point) -> f64 {
    let dx = p1.0 - p2.0;
    let dy = p1.1 - p2.1;
    (dx * dx + dy * dy).sqrt()
}

/// Index of the largest value, first occurrence on ties. 0 for an empty signal.
pub fn argmax(signal: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in signal.iter().enumerate().skip(1) {
        if v > signal[best] {
            best = i;
        }
    }
    best
}

/// Y of the line through `p1` and `p2` at horizontal position `x`.
///
/// A (near-)vertical line yields `p1.y`.
pub fn line_y_at_x(p1: Point, p2: Point, x: f64) -> f64 {
    if (p2.0 - p1.0).abs() < 1e-6 {
        return p1.1;
    }
    let t = (x - p1.0) / (p2.0 - p1.0);
    p1.1 + t * (p2.1 - p1.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_right_angle() {
        let angle = angle_at_vertex((0.0, 0.0), (1.0, 0.0), (1.0, 1.0));
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_straight_line_is_180() {
        let angle = angle_at_vertex((0.0, 0.0), (1.0, 0.0), (2.0, 0.0));
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_vertex_is_zero() {
        assert_eq!(angle_at_vertex((1.0, 1.0), (1.0, 1.0), (3.0, 4.0)), 0.0);
        assert_eq!(angle_from_vertical((2.0, 2.0), (2.0, 2.0)), 0.0);
    }

    #[test]
    fn test_vertical_reference() {
        // p2 directly above p1 (smaller y).
        assert!(angle_from_vertical((0.0, 10.0), (0.0, 0.0)).abs() < 1e-9);
        // Horizontal.
        assert!((angle_from_vertical((0.0, 0.0), (5.0, 0.0)) - 90.0).abs() < 1e-9);
        // Straight down.
        assert!((angle_from_vertical((0.0, 0.0), (0.0, 5.0)) - 180.0).abs() < 1e-9);
        // 45 degrees forward and up.
        assert!((angle_from_vertical((0.0, 10.0), (10.0, 0.0)) - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance() {
        assert!((euclidean_distance((0.0, 0.0), (3.0, 4.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_argmax_ties_and_empty() {
        assert_eq!(argmax(&[]), 0);
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), 1);
        assert_eq!(argmax(&[-5.0]), 0);
    }

    #[test]
    fn test_line_y_at_x() {
        assert!((line_y_at_x((0.0, 0.0), (10.0, 10.0), 5.0) - 5.0).abs() < 1e-12);
        assert_eq!(line_y_at_x((3.0, 7.0), (3.0, 20.0), 100.0), 7.0);
    }

    fn coord() -> impl Strategy<Value = f64> {
        -2000.0f64..2000.0
    }

    proptest! {
        #[test]
        fn prop_vertex_angle_in_range(ax in coord(), ay in coord(), bx in coord(), by in coord(), cx in coord(), cy in coord()) {
            let angle = angle_at_vertex((ax, ay), (bx, by), (cx, cy));
            prop_assert!((0.0..=180.0).contains(&angle));
        }

        #[test]
        fn prop_vertical_angle_in_range(ax in coord(), ay in coord(), bx in coord(), by in coord()) {
            let angle = angle_from_vertical((ax, ay), (bx, by));
            prop_assert!((0.0..=180.0).contains(&angle));
        }

        #[test]
        fn prop_coincident_points_are_zero(x in coord(), y in coord(), cx in coord(), cy in coord()) {
            prop_assert_eq!(angle_at_vertex((x, y), (x, y), (cx, cy)), 0.0);
            prop_assert_eq!(angle_from_vertical((x, y), (x, y)), 0.0);
        }

        #[test]
        fn prop_argmax_is_a_maximum(signal in proptest::collection::vec(-100.0f64..100.0, 1..50)) {
            let idx = argmax(&signal);
            prop_assert!(signal.iter().all(|&v| v <= signal[idx]));
            prop_assert!(signal[..idx].iter().all(|&v| v < signal[idx]));
        }
    }
}
