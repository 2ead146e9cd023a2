use formcheck_analysis_core::{
    get_skill, AnalysisOptions, AttemptAux, AttemptInput, Session, SkillKind,
};
use formcheck_common::FormcheckError;
use formcheck_pose_model::{
    FeatureSet, ImageSize, Issue, Keypoint, KnowledgeBase, Landmark, PoseFrame, PoseSequence,
};
use proptest::prelude::*;

fn still_clip(frames: usize, points: &[(Landmark, f64, f64, f64)]) -> PoseSequence {
    PoseSequence::new(
        (0..frames)
            .map(|i| {
                points
                    .iter()
                    .fold(PoseFrame::new(i, ImageSize::new(1280, 720)), |f, &(lm, x, y, c)| {
                        f.with(lm, Keypoint::new(x, y, c))
                    })
            })
            .collect(),
    )
}

/// Point `len` pixels from `origin`, inclined `deg` forward (+x) from straight up.
fn lean_from(origin: (f64, f64), deg: f64, len: f64) -> (f64, f64) {
    let r = deg.to_radians();
    (origin.0 + len * r.sin(), origin.1 - len * r.cos())
}

#[test]
fn squat_side_view_example() {
    let hip = (300.0, 440.0);
    let shoulder = lean_from(hip, 50.0, 250.0);
    let clip = still_clip(
        6,
        &[
            (Landmark::LeftShoulder, shoulder.0, shoulder.1, 0.9),
            (Landmark::LeftHip, hip.0, hip.1, 0.9),
            (Landmark::LeftKnee, 380.0, 400.0, 0.9),
            (Landmark::LeftAnkle, 330.0, 560.0, 0.9),
        ],
    );

    let session = Session::run(
        "squat",
        vec![AttemptInput::new("Side clip", "side", clip)],
        &KnowledgeBase::new(),
        &AnalysisOptions::default(),
    )
    .unwrap();
    let attempt = &session.attempts()[0];

    assert!((attempt.features.get_or("depth_px", 0.0) - 40.0).abs() < 1e-6);
    assert!((attempt.features.get_or("torso_forward_deg", 0.0) - 50.0).abs() < 1e-6);
    assert!(attempt.features.flag("sagittal_reliable"));
    assert!(!attempt.features.flag("valgus_reliable"));
    assert_eq!(attempt.evaluation.issues, vec![Issue::ExcessiveForwardLean]);
    assert!((attempt.evaluation.score - 0.8).abs() < 1e-12);
}

#[test]
fn push_up_example() {
    let features = FeatureSet::new()
        .with("elbow_min_deg", 100.0)
        .with("elbow_max_deg", 170.0)
        .with("hip_offset_norm", 0.10);
    let result = SkillKind::PushUp.skill().evaluate(&features);
    assert_eq!(result.issues, vec![Issue::ShallowDepth, Issue::HipSag]);
    assert!((result.score - 0.6).abs() < 1e-12);
}

#[test]
fn deadlift_example() {
    let features = FeatureSet::new()
        .with("torso_forward_deg", 75.0)
        .with("shin_angle_deg", 10.0)
        .with("hip_hinge_deg", 150.0)
        .with("hip_vs_knee_norm", 0.0)
        .with("shoulder_over_ankle_norm", 0.0);
    let result = SkillKind::Deadlift.skill().evaluate(&features);
    assert_eq!(result.issues, vec![Issue::ExcessiveForwardLean]);
    assert!((result.score - 0.85).abs() < 1e-12);
}

#[test]
fn unknown_exercise_is_rejected() {
    assert!(matches!(
        get_skill("bench_press"),
        Err(FormcheckError::UnknownSkill { .. })
    ));

    let clip = still_clip(2, &[(Landmark::LeftHip, 0.0, 0.0, 0.9)]);
    let result = Session::run(
        "bench_press",
        vec![AttemptInput::new("Side clip", "side", clip)],
        &KnowledgeBase::new(),
        &AnalysisOptions::default(),
    );
    assert!(matches!(result, Err(FormcheckError::UnknownSkill { ref name }) if name == "bench_press"));
}

#[test]
fn equal_confidence_measures_left_side() {
    // Left side leans 45 degrees, right side is upright.
    let l_sh = lean_from((300.0, 400.0), 45.0, 200.0);
    let clip = still_clip(
        3,
        &[
            (Landmark::LeftShoulder, l_sh.0, l_sh.1, 0.8),
            (Landmark::LeftHip, 300.0, 400.0, 0.8),
            (Landmark::LeftKnee, 330.0, 450.0, 0.8),
            (Landmark::LeftAnkle, 330.0, 550.0, 0.8),
            (Landmark::RightShoulder, 500.0, 200.0, 0.8),
            (Landmark::RightHip, 500.0, 400.0, 0.8),
            (Landmark::RightKnee, 530.0, 450.0, 0.8),
            (Landmark::RightAnkle, 530.0, 550.0, 0.8),
        ],
    );
    let features = SkillKind::Deadlift
        .skill()
        .extract_features(&clip, &AttemptAux::new("side"));
    assert!((features.get_or("torso_forward_deg", 0.0) - 45.0).abs() < 1e-6);
}

#[test]
fn registry_lists_five_exercises() {
    let names: Vec<&str> = SkillKind::ALL.iter().map(|k| k.name()).collect();
    assert_eq!(names, ["squat", "push_up", "pull_up", "chin_up", "deadlift"]);
    for kind in SkillKind::ALL {
        let skill = kind.skill();
        assert!(!skill.upload_spec().is_empty());
        assert!(!skill.issue_vocabulary().is_empty());
    }
}

#[test]
fn squat_view_gating() {
    let squat = SkillKind::Squat.skill();
    let all = FeatureSet::new()
        .with("depth_px", -20.0)
        .with("torso_forward_deg", 60.0)
        .with("valgus_ratio", 0.5)
        .with("valgus_reliable", 1.0)
        .with("sagittal_reliable", 1.0);
    assert_eq!(
        squat.evaluate(&all).issues,
        vec![Issue::ShallowSquat, Issue::ExcessiveForwardLean, Issue::KneeValgus]
    );

    let no_sagittal = all.clone().with("sagittal_reliable", 0.0);
    assert_eq!(squat.evaluate(&no_sagittal).issues, vec![Issue::KneeValgus]);

    let no_valgus = all.with("valgus_reliable", 0.0);
    assert_eq!(
        squat.evaluate(&no_valgus).issues,
        vec![Issue::ShallowSquat, Issue::ExcessiveForwardLean]
    );
}

#[test]
fn pulling_view_gating() {
    for kind in [SkillKind::PullUp, SkillKind::ChinUp] {
        let skill = kind.skill();
        let all = FeatureSet::new()
            .with("elbow_min_deg", 100.0)
            .with("elbow_max_deg", 150.0)
            .with("torso_forward_deg", 50.0)
            .with("elbow_sym_norm", 0.3)
            .with("symmetry_reliable", 1.0)
            .with("swing_reliable", 1.0);
        assert_eq!(
            skill.evaluate(&all).issues,
            vec![
                Issue::LimitedTopRange,
                Issue::NoDeadHang,
                Issue::Swinging,
                Issue::Asymmetry
            ]
        );

        let no_swing = all.clone().with("swing_reliable", 0.0);
        assert_eq!(
            skill.evaluate(&no_swing).issues,
            vec![Issue::LimitedTopRange, Issue::NoDeadHang, Issue::Asymmetry]
        );

        let no_symmetry = all.with("symmetry_reliable", 0.0);
        assert_eq!(
            skill.evaluate(&no_symmetry).issues,
            vec![Issue::LimitedTopRange, Issue::NoDeadHang, Issue::Swinging]
        );
    }
}

fn features_for(kind: SkillKind) -> impl Strategy<Value = FeatureSet> {
    let names: &'static [&'static str] = match kind {
        SkillKind::Squat => &["depth_px", "torso_forward_deg", "valgus_ratio"],
        SkillKind::PushUp => &["elbow_min_deg", "elbow_max_deg", "hip_offset_norm"],
        SkillKind::PullUp | SkillKind::ChinUp => &[
            "elbow_min_deg",
            "elbow_max_deg",
            "torso_forward_deg",
            "pulling_angle_deg",
            "elbow_sym_norm",
            "wrist_sym_norm",
        ],
        SkillKind::Deadlift => &[
            "torso_forward_deg",
            "shin_angle_deg",
            "hip_hinge_deg",
            "hip_vs_knee_norm",
            "shoulder_over_ankle_norm",
        ],
    };
    (
        prop::collection::vec(-1.0f64..1.0, names.len()),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(move |(unit, flag_a, flag_b)| {
            let mut set: FeatureSet = names
                .iter()
                .zip(unit)
                .map(|(&name, u)| {
                    let value = if name.ends_with("_deg") { u.abs() * 180.0 } else { u };
                    (name, value)
                })
                .collect();
            let flags: &[&str] = match kind {
                SkillKind::Squat => &["sagittal_reliable", "valgus_reliable"],
                SkillKind::PullUp | SkillKind::ChinUp => &["swing_reliable", "symmetry_reliable"],
                _ => &[],
            };
            for (name, on) in flags.iter().zip([flag_a, flag_b]) {
                set.insert(*name, if on { 1.0 } else { 0.0 });
            }
            set
        })
}

/// Push one metric past its limit without touching the others.
fn worsen(kind: SkillKind, features: &FeatureSet) -> FeatureSet {
    let f = features.clone();
    match kind {
        SkillKind::Squat => f.with("depth_px", -10.0),
        SkillKind::PushUp => f.with("elbow_min_deg", 130.0),
        SkillKind::PullUp | SkillKind::ChinUp => f.with("elbow_max_deg", 100.0),
        SkillKind::Deadlift => f.with("shin_angle_deg", 45.0),
    }
}

fn kind() -> impl Strategy<Value = SkillKind> {
    prop::sample::select(SkillKind::ALL.to_vec())
}

proptest! {
    #[test]
    fn prop_more_issues_never_score_higher(
        (kind, features) in kind().prop_flat_map(|k| (Just(k), features_for(k)))
    ) {
        let skill = kind.skill();
        let base = skill.evaluate(&features);
        let worse = skill.evaluate(&worsen(kind, &features));

        prop_assert!(base.issues.iter().all(|i| worse.issues.contains(i)));
        prop_assert!(worse.score <= base.score);
        prop_assert!((0.0..=1.0).contains(&worse.score));
    }

    #[test]
    fn prop_clearing_a_flag_removes_only_its_issues(
        (kind, flag, features) in gated_flag().prop_flat_map(|(k, f)| (Just(k), Just(f), features_for(k)))
    ) {
        let skill = kind.skill();
        let on = skill.evaluate(&features.clone().with(flag, 1.0));
        let off = skill.evaluate(&features.clone().with(flag, 0.0));

        let gated = issues_gated_by(flag);
        let expected: Vec<Issue> = on.issues.iter().copied().filter(|i| !gated.contains(i)).collect();
        prop_assert_eq!(off.issues, expected);
    }
}

/// Every reliability flag with the skills that honour it.
fn gated_flag() -> impl Strategy<Value = (SkillKind, &'static str)> {
    prop::sample::select(vec![
        (SkillKind::Squat, "valgus_reliable"),
        (SkillKind::Squat, "sagittal_reliable"),
        (SkillKind::PullUp, "swing_reliable"),
        (SkillKind::PullUp, "symmetry_reliable"),
        (SkillKind::ChinUp, "swing_reliable"),
        (SkillKind::ChinUp, "symmetry_reliable"),
    ])
}

fn issues_gated_by(flag: &str) -> &'static [Issue] {
    match flag {
        "valgus_reliable" => &[Issue::KneeValgus],
        "sagittal_reliable" => &[Issue::ShallowSquat, Issue::ExcessiveForwardLean],
        "swing_reliable" => &[Issue::Swinging],
        "symmetry_reliable" => &[Issue::Asymmetry],
        _ => &[],
    }
}

#[test]
fn swinging_on_side_view() {
    let features = FeatureSet::new()
        .with("elbow_min_deg", 60.0)
        .with("elbow_max_deg", 170.0)
        .with("torso_forward_deg", 45.0)
        .with("swing_reliable", 1.0)
        .with("symmetry_reliable", 0.0);
    let result = SkillKind::PullUp.skill().evaluate(&features);
    assert_eq!(result.issues, vec![Issue::Swinging]);
    assert!((result.score - 0.8).abs() < 1e-12);
}
