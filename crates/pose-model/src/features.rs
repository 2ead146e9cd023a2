//! Feature sets, the issue vocabulary, and evaluation results.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Named scalar metrics for one attempt, in insertion order.
///
/// Values are degrees, pixel distances, normalized ratios, frame indices,
/// or reliability flags (`0.0` / `1.0`). An empty set means no usable
/// frames were found in the clip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    entries: Vec<(String, f64)>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a metric, keeping its first insertion position.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| *v)
    }

    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    /// Reliability flag lookup; absent or zero means unreliable.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| v != 0.0)
    }

    /// Frame index stored as a metric; absent or negative reads as 0.
    pub fn frame_index(&self, name: &str) -> i64 {
        self.get(name).map(|v| v as i64).unwrap_or(0).max(0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Serialize for FeatureSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'a> FromIterator<(&'a str, f64)> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        let mut set = FeatureSet::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

/// Form-flaw tags produced by rule evaluation.
///
/// Each exercise draws from its own subset; the tags double as
/// knowledge-base keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Issue {
    // squat
    ShallowSquat,
    ExcessiveForwardLean,
    KneeValgus,
    // push-up
    ShallowDepth,
    NoLockout,
    HipSag,
    HipsPiking,
    // pull-up / chin-up
    LimitedTopRange,
    NoDeadHang,
    Swinging,
    Asymmetry,
    // deadlift
    TooUpright,
    KneesForward,
    HipsTooLow,
    HipsTooHigh,
    ShouldersForward,
    RoundedBackRisk,
}

impl Issue {
    pub fn as_str(&self) -> &'static str {
        match self {
            Issue::ShallowSquat => "shallow_squat",
            Issue::ExcessiveForwardLean => "excessive_forward_lean",
            Issue::KneeValgus => "knee_valgus",
            Issue::ShallowDepth => "shallow_depth",
            Issue::NoLockout => "no_lockout",
            Issue::HipSag => "hip_sag",
            Issue::HipsPiking => "hips_piking",
            Issue::LimitedTopRange => "limited_top_range",
            Issue::NoDeadHang => "no_dead_hang",
            Issue::Swinging => "swinging",
            Issue::Asymmetry => "asymmetry",
            Issue::TooUpright => "too_upright",
            Issue::KneesForward => "knees_forward",
            Issue::HipsTooLow => "hips_too_low",
            Issue::HipsTooHigh => "hips_too_high",
            Issue::ShouldersForward => "shoulders_forward",
            Issue::RoundedBackRisk => "rounded_back_risk",
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one attempt's features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    /// Form score in `[0.0, 1.0]`; non-increasing in issue count.
    pub score: f64,
    /// Issues in detection order.
    pub issues: Vec<Issue>,
}

impl EvaluationResult {
    /// Score `max(0, 1 - weight * issue_count)`.
    pub fn from_issues(issues: Vec<Issue>, weight_per_issue: f64) -> Self {
        let score = (1.0 - weight_per_issue * issues.len() as f64).max(0.0);
        Self { score, issues }
    }

    pub fn has_issue(&self, issue: Issue) -> bool {
        self.issues.contains(&issue)
    }
}

/// Explanation and drills for one detected issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrillRecommendation {
    pub issue: Issue,
    pub explain: String,
    pub drills: Vec<String>,
}
