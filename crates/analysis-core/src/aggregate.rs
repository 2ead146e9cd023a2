//! Cross-attempt aggregation.
//!
//! Only the issue and drill vocabularies are combined. Feature values stay
//! attached to the attempt they were measured on.

use formcheck_pose_model::Issue;
use serde::Serialize;

use crate::session::Attempt;

/// Append `item` unless an equal element is already present.
fn push_unique<T: PartialEq>(set: &mut Vec<T>, item: T) {
    if !set.contains(&item) {
        set.push(item);
    }
}

/// Combined view over the issues and drills of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overall {
    pub issues: Vec<Issue>,
    pub drills: Vec<String>,
}

/// Read-only aggregation over a slice of attempts.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'a> {
    attempts: &'a [Attempt],
}

impl<'a> Aggregator<'a> {
    pub fn new(attempts: &'a [Attempt]) -> Self {
        Self { attempts }
    }

    /// Every issue seen, in first-seen order.
    pub fn issues(&self) -> Vec<Issue> {
        let mut out = Vec::new();
        for attempt in self.attempts {
            for &issue in &attempt.evaluation.issues {
                push_unique(&mut out, issue);
            }
        }
        out
    }

    /// Every recommended drill, in first-seen order.
    pub fn drills(&self) -> Vec<String> {
        let mut out = Vec::new();
        for drill in self
            .attempts
            .iter()
            .flat_map(|a| &a.recommendations)
            .flat_map(|r| &r.drills)
        {
            push_unique(&mut out, drill.clone());
        }
        out
    }

    /// The leading drill of each recommendation, deduplicated.
    pub fn first_drills(&self) -> Vec<String> {
        let mut out = Vec::new();
        for drill in self
            .attempts
            .iter()
            .flat_map(|a| &a.recommendations)
            .filter_map(|r| r.drills.first())
        {
            push_unique(&mut out, drill.clone());
        }
        out
    }

    pub fn overall(&self) -> Overall {
        Overall {
            issues: self.issues(),
            drills: self.drills(),
        }
    }
}
