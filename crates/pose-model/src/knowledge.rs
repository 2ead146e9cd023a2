//! Per-exercise knowledge base of issue explanations and drills.
//!
//! Stored as `<dir>/<exercise>.json`:
//!
//! ```json
//! { "shallow_squat": { "explain": "...", "drills": ["Box squat", "..."] } }
//! ```
//!
//! A missing file or missing key is not an error: the knowledge base may
//! legitimately not cover every issue.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::features::Issue;
use crate::sequence::PoseError;

/// Knowledge-base entry for one issue tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KbEntry {
    #[serde(default)]
    pub explain: String,
    #[serde(default)]
    pub drills: Vec<String>,
}

/// Issue tag to explanation and drills, for one exercise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgeBase {
    entries: HashMap<String, KbEntry>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, issue: impl Into<String>, entry: KbEntry) {
        self.entries.insert(issue.into(), entry);
    }

    pub fn lookup(&self, issue: Issue) -> Option<&KbEntry> {
        self.entries.get(issue.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tags present in the file that no analyzer can emit.
    pub fn unknown_tags(&self, known: &[Issue]) -> Vec<String> {
        let mut unknown: Vec<String> = self
            .entries
            .keys()
            .filter(|k| !known.iter().any(|i| i.as_str() == k.as_str()))
            .cloned()
            .collect();
        unknown.sort();
        unknown
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Load `<dir>/<exercise>.json`, or an empty base when the file is absent.
    pub fn load(dir: impl AsRef<Path>, exercise: &str) -> Result<Self, PoseError> {
        let path = dir.as_ref().join(format!("{exercise}.json"));
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No knowledge base file, using empty mapping");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| PoseError::IoError {
            path: path.clone(),
            source: e,
        })?;
        Self::from_json(&content).map_err(|e| PoseError::ParseError { path, source: e })
    }
}
