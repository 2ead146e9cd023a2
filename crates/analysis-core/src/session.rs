//! One analysis request: a skill plus the clips uploaded for it.
//!
//! Each clip is smoothed, measured, evaluated and matched against the
//! knowledge base independently of the others. Clips without usable
//! landmarks are dropped with a warning; the session only fails when none
//! are left.

use formcheck_common::{AnalysisDefaults, FormcheckError, FormcheckResult};
use formcheck_pose_model::{
    DrillRecommendation, EvaluationResult, FeatureSet, KnowledgeBase, PoseSequence,
};
use serde::Serialize;

use crate::aggregate::Aggregator;
use crate::skill::{validate_uploads, AttemptAux, Skill, SkillKind};
use crate::smooth::{PoseSmoother, DEFAULT_ALPHA};

/// Per-run analysis parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    pub smoothing_alpha: f64,
    pub min_confidence: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            smoothing_alpha: DEFAULT_ALPHA,
            min_confidence: crate::skill::MIN_CONFIDENCE,
        }
    }
}

impl From<&AnalysisDefaults> for AnalysisOptions {
    fn from(defaults: &AnalysisDefaults) -> Self {
        Self {
            smoothing_alpha: defaults.smoothing_alpha,
            min_confidence: defaults.min_confidence,
        }
    }
}

/// A raw clip bound to the upload slot it was submitted under.
#[derive(Debug, Clone)]
pub struct AttemptInput {
    /// Display label, usually the slot label.
    pub label: String,
    /// Upload slot key, e.g. `"side"`.
    pub view: String,
    pub sequence: PoseSequence,
}

impl AttemptInput {
    pub fn new(label: impl Into<String>, view: impl Into<String>, sequence: PoseSequence) -> Self {
        Self {
            label: label.into(),
            view: view.into(),
            sequence,
        }
    }
}

/// One analyzed clip.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub label: String,
    pub view: String,
    /// Smoothed sequence the metrics were measured on.
    #[serde(skip)]
    pub sequence: PoseSequence,
    pub features: FeatureSet,
    pub evaluation: EvaluationResult,
    pub recommendations: Vec<DrillRecommendation>,
    /// Display frames, already clamped to the sequence.
    pub key_frames: Vec<usize>,
    pub key_frame: usize,
    pub overlay_labels: Vec<String>,
    pub summary: String,
}

/// Analyze a single clip.
///
/// Returns `None` when no frame carries the landmarks the skill needs.
pub fn analyze_attempt(
    skill: &dyn Skill,
    input: AttemptInput,
    kb: &KnowledgeBase,
    options: &AnalysisOptions,
) -> Option<Attempt> {
    let AttemptInput {
        label,
        view,
        sequence,
    } = input;

    let smoothed = PoseSmoother::new(options.smoothing_alpha).smooth(&sequence);
    let aux = AttemptAux::new(view.clone()).with_min_confidence(options.min_confidence);
    let features = skill.extract_features(&smoothed, &aux);
    if features.is_empty() {
        tracing::warn!(
            skill = skill.name(),
            label = %label,
            frames = smoothed.len(),
            "No usable landmarks in clip, excluding attempt"
        );
        return None;
    }

    let evaluation = skill.evaluate(&features);
    let recommendations = skill.recommend_drills(&evaluation.issues, kb);

    let key_frames: Vec<usize> = skill
        .select_key_frames(&features)
        .into_iter()
        .map(|i| smoothed.clamp_index(i as i64))
        .collect();
    let key_frame = smoothed.clamp_index(skill.select_key_frame(&features) as i64);

    let summary = match skill.summarize_for_prompt(&features) {
        s if s.trim().is_empty() => generic_summary(&features),
        s => s,
    };

    tracing::info!(
        skill = skill.name(),
        label = %label,
        view = %view,
        score = evaluation.score,
        issues = evaluation.issues.len(),
        "Attempt analyzed"
    );

    Some(Attempt {
        label,
        view,
        overlay_labels: skill.overlay_labels(&features),
        sequence: smoothed,
        features,
        evaluation,
        recommendations,
        key_frames,
        key_frame,
        summary,
    })
}

/// First three metrics as `name=value`, or `"n/a"`.
pub(crate) fn generic_summary(features: &FeatureSet) -> String {
    let pairs: Vec<String> = features
        .iter()
        .take(3)
        .map(|(k, v)| format!("{k}={v:.2}"))
        .collect();
    if pairs.is_empty() {
        "n/a".to_string()
    } else {
        pairs.join(", ")
    }
}

/// The attempts of one analysis request.
#[derive(Debug, Clone)]
pub struct Session {
    kind: SkillKind,
    attempts: Vec<Attempt>,
    excluded: Vec<String>,
}

impl Session {
    /// Resolve the exercise, check the uploads and analyze every clip in order.
    pub fn run(
        exercise: &str,
        inputs: Vec<AttemptInput>,
        kb: &KnowledgeBase,
        options: &AnalysisOptions,
    ) -> FormcheckResult<Self> {
        let kind: SkillKind = exercise.parse()?;
        Self::check_uploads(kind, &inputs)?;

        let skill = kind.skill();
        let mut attempts = Vec::with_capacity(inputs.len());
        let mut excluded = Vec::new();
        for input in inputs {
            let label = input.label.clone();
            match analyze_attempt(skill, input, kb, options) {
                Some(attempt) => attempts.push(attempt),
                None => excluded.push(label),
            }
        }

        Self::from_parts(kind, attempts, excluded)
    }

    /// Enforce the upload precondition for `kind` on the given clips.
    pub fn check_uploads(kind: SkillKind, inputs: &[AttemptInput]) -> FormcheckResult<()> {
        let views: Vec<&str> = inputs.iter().map(|i| i.view.as_str()).collect();
        validate_uploads(&kind.skill().upload_spec(), &views)
    }

    /// Assemble a session from attempts analyzed elsewhere, e.g. in parallel.
    ///
    /// Fails with `NoValidFrames` when every clip was excluded.
    pub fn from_parts(
        kind: SkillKind,
        attempts: Vec<Attempt>,
        excluded: Vec<String>,
    ) -> FormcheckResult<Self> {
        if attempts.is_empty() {
            let label = if excluded.is_empty() {
                "no clips".to_string()
            } else {
                excluded.join(", ")
            };
            return Err(FormcheckError::no_valid_frames(label));
        }
        Ok(Self {
            kind,
            attempts,
            excluded,
        })
    }

    pub fn kind(&self) -> SkillKind {
        self.kind
    }

    pub fn skill(&self) -> &'static dyn Skill {
        self.kind.skill()
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    /// Labels of clips dropped for lack of usable landmarks.
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    pub fn aggregate(&self) -> Aggregator<'_> {
        Aggregator::new(&self.attempts)
    }
}
