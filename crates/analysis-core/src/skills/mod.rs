//! Exercise analyzers.
//!
//! All four follow the same outline: pick the better-tracked body side,
//! find the extreme frame(s) of a skill-specific signal, measure the
//! remaining metrics at those frames, then compare against a constant
//! threshold table. Metrics that only make sense from one camera view carry
//! a reliability flag that gates the matching issue.

mod deadlift;
mod pulling;
mod push_up;
mod squat;

pub use deadlift::{Deadlift, DeadliftThresholds};
pub use pulling::{PullVariant, Pulling, PullingThresholds};
pub use push_up::{PushUp, PushUpThresholds};
pub use squat::{Squat, SquatThresholds};

use formcheck_pose_model::{Joint, Keypoint, Landmark, PoseSequence, Side};

use crate::geometry::{angle_at_vertex, argmax};

/// Sentinel that keeps frames without the signal out of extremum search.
const MISSING_SIGNAL: f64 = -1e9;

/// Mean confidence of `joints` on `side` over every frame they appear in.
pub(crate) fn average_confidence(sequence: &PoseSequence, side: Side, joints: &[Joint]) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for frame in sequence {
        for &joint in joints {
            if let Some(kp) = frame.get(Landmark::of(side, joint)) {
                total += kp.confidence;
                count += 1;
            }
        }
    }
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// The side whose `joints` were tracked with higher mean confidence.
/// Ties go to the left side.
pub(crate) fn choose_side(sequence: &PoseSequence, joints: &[Joint]) -> Side {
    let left = average_confidence(sequence, Side::Left, joints);
    let right = average_confidence(sequence, Side::Right, joints);
    let side = if left >= right { Side::Left } else { Side::Right };
    tracing::debug!(left, right, %side, "Selected body side");
    side
}

/// Elbow angle per frame on `side`, skipping frames where any of shoulder,
/// elbow or wrist is missing or below `min_confidence`.
pub(crate) fn gated_elbow_angles(
    sequence: &PoseSequence,
    side: Side,
    min_confidence: f64,
) -> Vec<(usize, f64)> {
    let shoulder = Landmark::of(side, Joint::Shoulder);
    let elbow = Landmark::of(side, Joint::Elbow);
    let wrist = Landmark::of(side, Joint::Wrist);

    sequence
        .iter()
        .enumerate()
        .filter_map(|(i, frame)| {
            let (s, e, w) = (frame.get(shoulder)?, frame.get(elbow)?, frame.get(wrist)?);
            if !all_confident(&[s, e, w], min_confidence) {
                return None;
            }
            Some((i, angle_at_vertex(s.point(), e.point(), w.point())))
        })
        .collect()
}

/// Lowest and highest entries of `(frame, value)` pairs, first occurrence
/// on ties. `None` for an empty slice.
pub(crate) fn min_max_by_value(values: &[(usize, f64)]) -> Option<((usize, f64), (usize, f64))> {
    let first = *values.first()?;
    let mut lo = first;
    let mut hi = first;
    for &(i, v) in &values[1..] {
        if v < lo.1 {
            lo = (i, v);
        }
        if v > hi.1 {
            hi = (i, v);
        }
    }
    Some((lo, hi))
}

/// Frame with the largest signal value; frames with `None` never win
/// unless every frame is `None`.
pub(crate) fn frame_of_max(signal: &[Option<f64>]) -> usize {
    let values: Vec<f64> = signal.iter().map(|v| v.unwrap_or(MISSING_SIGNAL)).collect();
    argmax(&values)
}

/// Frame with the smallest signal value, same missing-frame rule.
pub(crate) fn frame_of_min(signal: &[Option<f64>]) -> usize {
    let values: Vec<f64> = signal
        .iter()
        .map(|v| v.map(|y| -y).unwrap_or(MISSING_SIGNAL))
        .collect();
    argmax(&values)
}

/// Whether every point reaches `threshold` confidence.
pub(crate) fn all_confident(points: &[Keypoint], threshold: f64) -> bool {
    points.iter().all(|kp| kp.is_confident(threshold))
}

pub(crate) fn flag(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::sequence;
    use super::*;
    use formcheck_pose_model::Landmark::*;

    #[test]
    fn test_side_tie_prefers_left() {
        let seq = sequence(vec![vec![
            (LeftHip, 0.0, 0.0, 0.7),
            (RightHip, 0.0, 0.0, 0.7),
        ]]);
        assert_eq!(choose_side(&seq, &[Joint::Hip]), Side::Left);
        assert_eq!(choose_side(&PoseSequence::default(), &[Joint::Hip]), Side::Left);
    }

    #[test]
    fn test_side_follows_confidence() {
        let seq = sequence(vec![
            vec![(LeftHip, 0.0, 0.0, 0.3), (RightHip, 0.0, 0.0, 0.9)],
            vec![(LeftHip, 0.0, 0.0, 0.4)],
        ]);
        assert_eq!(choose_side(&seq, &[Joint::Hip]), Side::Right);
    }

    #[test]
    fn test_gated_elbow_angles_drop_low_confidence() {
        let seq = sequence(vec![
            vec![
                (LeftShoulder, 0.0, 0.0, 0.9),
                (LeftElbow, 0.0, 10.0, 0.9),
                (LeftWrist, 10.0, 10.0, 0.9),
            ],
            vec![
                (LeftShoulder, 0.0, 0.0, 0.9),
                (LeftElbow, 0.0, 10.0, 0.2),
                (LeftWrist, 0.0, 20.0, 0.9),
            ],
            vec![(LeftShoulder, 0.0, 0.0, 0.9)],
        ]);
        let angles = gated_elbow_angles(&seq, Side::Left, 0.35);
        assert_eq!(angles.len(), 1);
        assert_eq!(angles[0].0, 0);
        assert!((angles[0].1 - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_extremum_frames_skip_missing() {
        let signal = [None, Some(5.0), Some(9.0), None, Some(9.0), Some(1.0)];
        assert_eq!(frame_of_max(&signal), 2);
        assert_eq!(frame_of_min(&signal), 5);
        assert_eq!(frame_of_max(&[None, None]), 0);
    }

    #[test]
    fn test_min_max_first_occurrence() {
        let values = [(3, 120.0), (4, 90.0), (5, 90.0), (6, 170.0), (7, 170.0)];
        let ((lo_i, lo), (hi_i, hi)) = min_max_by_value(&values).unwrap();
        assert_eq!((lo_i, lo), (4, 90.0));
        assert_eq!((hi_i, hi), (6, 170.0));
        assert!(min_max_by_value(&[]).is_none());
    }
}
