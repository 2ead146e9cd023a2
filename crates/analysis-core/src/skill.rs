//! The per-exercise skill contract and the exercise registry.
//!
//! Every exercise implements [`Skill`]. Only [`Skill::name`] is mandatory;
//! each other capability has a documented generic fallback so that all
//! skills are total over the same contract.

use std::fmt;
use std::str::FromStr;

use formcheck_common::{FormcheckError, FormcheckResult};
use formcheck_pose_model::{
    uploads_satisfied, DrillRecommendation, EvaluationResult, FeatureSet, Issue, KnowledgeBase,
    PoseSequence, UploadSlot,
};

use crate::skills::{Deadlift, PullVariant, Pulling, PushUp, Squat};

/// Default confidence floor for landmarks feeding an angle.
pub const MIN_CONFIDENCE: f64 = 0.35;

/// Score penalty per issue unless a skill says otherwise.
pub const DEFAULT_ISSUE_WEIGHT: f64 = 0.2;

/// Per-attempt context handed to feature extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptAux {
    /// Declared camera view (upload slot key), e.g. `"front"` or `"side"`.
    pub view: String,

    /// Landmarks below this confidence do not feed angle extremum search.
    pub min_confidence: f64,
}

impl AttemptAux {
    pub fn new(view: impl Into<String>) -> Self {
        Self {
            view: view.into(),
            min_confidence: MIN_CONFIDENCE,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn is_front(&self) -> bool {
        self.view == "front"
    }

    pub fn is_side(&self) -> bool {
        self.view == "side"
    }
}

impl Default for AttemptAux {
    fn default() -> Self {
        Self::new("unknown")
    }
}

/// Capability set of one exercise analyzer.
pub trait Skill: Send + Sync {
    /// Registry key, e.g. `"push_up"`.
    fn name(&self) -> &'static str;

    /// Human-readable exercise name.
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Issue tags this skill can emit.
    ///
    /// Fallback: none.
    fn issue_vocabulary(&self) -> &'static [Issue] {
        &[]
    }

    /// Score penalty per detected issue.
    fn issue_weight(&self) -> f64 {
        DEFAULT_ISSUE_WEIGHT
    }

    /// Camera-view slots this skill wants.
    ///
    /// Fallback: a single required `"primary"` slot.
    fn upload_spec(&self) -> Vec<UploadSlot> {
        vec![UploadSlot::primary()]
    }

    /// Derive metrics from a (smoothed) pose sequence.
    ///
    /// Returns an empty set when no frame has the landmarks the skill needs.
    /// Fallback: always empty.
    fn extract_features(&self, _sequence: &PoseSequence, _aux: &AttemptAux) -> FeatureSet {
        FeatureSet::new()
    }

    /// Apply the skill's thresholds.
    ///
    /// Fallback: no issues, full score.
    fn evaluate(&self, _features: &FeatureSet) -> EvaluationResult {
        EvaluationResult::from_issues(Vec::new(), self.issue_weight())
    }

    /// Look issues up in the knowledge base, in issue order.
    ///
    /// Issues without an entry are skipped.
    fn recommend_drills(&self, issues: &[Issue], kb: &KnowledgeBase) -> Vec<DrillRecommendation> {
        issues
            .iter()
            .filter_map(|&issue| match kb.lookup(issue) {
                Some(entry) => Some(DrillRecommendation {
                    issue,
                    explain: entry.explain.clone(),
                    drills: entry.drills.clone(),
                }),
                None => {
                    tracing::debug!(skill = self.name(), %issue, "No knowledge-base entry");
                    None
                }
            })
            .collect()
    }

    /// Frames worth displaying, most representative first.
    ///
    /// Fallback: `key_frame_idx` if present, else frame 0.
    fn select_key_frames(&self, features: &FeatureSet) -> Vec<usize> {
        vec![features.frame_index("key_frame_idx") as usize]
    }

    /// The single most representative frame.
    ///
    /// Fallback: the first of [`Skill::select_key_frames`].
    fn select_key_frame(&self, features: &FeatureSet) -> usize {
        self.select_key_frames(features)
            .first()
            .copied()
            .unwrap_or(0)
    }

    /// Short labels to draw on a key frame.
    ///
    /// Fallback: the first two metrics as `name=value`.
    fn overlay_labels(&self, features: &FeatureSet) -> Vec<String> {
        features
            .iter()
            .take(2)
            .map(|(k, v)| format!("{k}={v:.2}"))
            .collect()
    }

    /// Qualitative summary for the feedback generator.
    ///
    /// Fallback: the first three metrics as `name=value`, or `"n/a"`.
    fn summarize_for_prompt(&self, features: &FeatureSet) -> String {
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
}

static SQUAT: Squat = Squat;
static PUSH_UP: PushUp = PushUp;
static PULL_UP: Pulling = Pulling::new(PullVariant::PullUp);
static CHIN_UP: Pulling = Pulling::new(PullVariant::ChinUp);
static DEADLIFT: Deadlift = Deadlift;

/// Registered exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkillKind {
    Squat,
    PushUp,
    PullUp,
    ChinUp,
    Deadlift,
}

impl SkillKind {
    pub const ALL: [SkillKind; 5] = [
        SkillKind::Squat,
        SkillKind::PushUp,
        SkillKind::PullUp,
        SkillKind::ChinUp,
        SkillKind::Deadlift,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SkillKind::Squat => "squat",
            SkillKind::PushUp => "push_up",
            SkillKind::PullUp => "pull_up",
            SkillKind::ChinUp => "chin_up",
            SkillKind::Deadlift => "deadlift",
        }
    }

    /// The analyzer implementing this exercise.
    pub fn skill(&self) -> &'static dyn Skill {
        match self {
            SkillKind::Squat => &SQUAT,
            SkillKind::PushUp => &PUSH_UP,
            SkillKind::PullUp => &PULL_UP,
            SkillKind::ChinUp => &CHIN_UP,
            SkillKind::Deadlift => &DEADLIFT,
        }
    }
}

impl fmt::Display for SkillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SkillKind {
    type Err = FormcheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkillKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| FormcheckError::unknown_skill(s))
    }
}

/// Look up a registered exercise by name.
pub fn get_skill(name: &str) -> FormcheckResult<&'static dyn Skill> {
    name.parse::<SkillKind>().map(|kind| kind.skill())
}

/// Enforce the upload precondition for a session.
///
/// An empty slot list is replaced by the generic primary slot.
pub fn validate_uploads<S: AsRef<str>>(slots: &[UploadSlot], filled: &[S]) -> FormcheckResult<()> {
    let fallback;
    let slots = if slots.is_empty() {
        fallback = vec![UploadSlot::primary()];
        &fallback[..]
    } else {
        slots
    };

    if uploads_satisfied(slots, filled) {
        return Ok(());
    }

    let required: Vec<&str> = slots
        .iter()
        .filter(|s| s.required)
        .map(|s| s.key.as_str())
        .collect();
    let message = if required.is_empty() {
        let keys: Vec<&str> = slots.iter().map(|s| s.key.as_str()).collect();
        format!("upload at least one of: {}", keys.join(", "))
    } else {
        format!("upload at least one required clip: {}", required.join(", "))
    };
    Err(FormcheckError::missing_upload(message))
}
