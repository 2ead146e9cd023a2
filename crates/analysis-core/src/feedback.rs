//! Coaching-feedback text for a session.
//!
//! [`build_prompt`] produces the instruction text handed to an external
//! text generator. [`template_feedback`] is the deterministic fallback used
//! when no generator is available. Neither performs any I/O.

use std::fmt;
use std::str::FromStr;

use formcheck_common::FormcheckError;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregator;
use crate::session::Attempt;

/// Drills listed in a knowledge-base prompt.
const PROMPT_DRILL_LIMIT: usize = 6;

/// Drills listed in the template fallback.
const TEMPLATE_DRILL_LIMIT: usize = 3;

const STYLE_RULES: &str = "Do not label the form as simply good or bad. Describe positives, \
shared tendencies, and how posture/form could improve. Use simple language. Do not mention \
angles, ratios, or any numbers.";

/// What the feedback may draw on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackMode {
    /// Metrics, detected issues and knowledge-base drills.
    #[default]
    Kb,
    /// Qualitative metric summaries only; the generator picks the issues.
    AnglesOnly,
}

impl FeedbackMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackMode::Kb => "kb",
            FeedbackMode::AnglesOnly => "angles_only",
        }
    }
}

impl fmt::Display for FeedbackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackMode {
    type Err = FormcheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kb" => Ok(FeedbackMode::Kb),
            "angles_only" | "angles-only" => Ok(FeedbackMode::AnglesOnly),
            other => Err(FormcheckError::config(format!(
                "unknown feedback mode '{other}' (expected kb or angles_only)"
            ))),
        }
    }
}

fn clip_label(attempt: &Attempt, position: usize) -> String {
    if attempt.label.is_empty() {
        format!("clip_{position}")
    } else {
        attempt.label.clone()
    }
}

fn join_or(items: &[String], sep: &str, empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(sep)
    }
}

/// Multi-clip prompt for an external feedback generator.
pub fn build_prompt(exercise: &str, attempts: &[Attempt], mode: FeedbackMode) -> String {
    let mut lines = match mode {
        FeedbackMode::AnglesOnly => vec![
            format!(
                "Act as an expert strength and conditioning coach. Analyze this {exercise} session \
                 across multiple clips using only angle summaries from multiple keyframes."
            ),
            "For each clip you get angle summaries only; do not use predefined issue labels or drills."
                .to_string(),
        ],
        FeedbackMode::Kb => vec![
            format!(
                "Act as an expert strength and conditioning coach. Analyze this {exercise} session \
                 across multiple clips."
            ),
            "For each clip you get metrics and detected issues.".to_string(),
        ],
    };

    for (i, attempt) in attempts.iter().enumerate() {
        let label = clip_label(attempt, i + 1);
        let view = &attempt.view;
        let metrics = &attempt.summary;
        lines.push(match mode {
            FeedbackMode::AnglesOnly => format!("- {label} (view={view}): angles={metrics}."),
            FeedbackMode::Kb => {
                let issues: Vec<String> = attempt
                    .evaluation
                    .issues
                    .iter()
                    .map(|i| i.to_string())
                    .collect();
                format!(
                    "- {label} (view={view}): metrics={metrics}; issues={}.",
                    join_or(&issues, ", ", "none")
                )
            }
        });
    }

    let agg = Aggregator::new(attempts);
    if mode == FeedbackMode::Kb {
        let issues: Vec<String> = agg.issues().iter().map(|i| i.to_string()).collect();
        let drills: Vec<String> = agg.drills().into_iter().take(PROMPT_DRILL_LIMIT).collect();
        lines.push(format!("Overall issues: {}.", join_or(&issues, ", ", "none")));
        lines.push(format!("Candidate drills: {}.", join_or(&drills, "; ", "none")));
    }

    lines.push(STYLE_RULES.to_string());
    let closing = match mode {
        FeedbackMode::AnglesOnly => "1-2 drills or cues to prioritize",
        FeedbackMode::Kb => "1-2 drills to prioritize",
    };
    lines.push(format!(
        "Write 3 concise sentences total: 1) overall snapshot with at least one positive, \
         2) main shared tendency to improve, 3) {closing}. Keep it under 90 words."
    ));

    lines.join("\n")
}

/// Deterministic feedback text used when no generator answers.
pub fn template_feedback(exercise: &str, attempts: &[Attempt], mode: FeedbackMode) -> String {
    let blocks: Vec<String> = attempts
        .iter()
        .enumerate()
        .map(|(i, attempt)| {
            let pairs: Vec<String> = attempt
                .features
                .iter()
                .take(2)
                .map(|(k, v)| format!("{k}={v:.1}"))
                .collect();
            format!(
                "{}: {}",
                clip_label(attempt, i + 1),
                join_or(&pairs, ", ", "n/a")
            )
        })
        .collect();

    let header = format!("{exercise} session across {} clip(s):", attempts.len());
    let body = format!("{}.", blocks.join(" | "));

    match mode {
        FeedbackMode::AnglesOnly => [
            header,
            body,
            "Focus on consistent positions and smooth control.".to_string(),
            "Prioritize one drill or cue that improves control and range.".to_string(),
        ]
        .join(" "),
        FeedbackMode::Kb => {
            let agg = Aggregator::new(attempts);
            let issues: Vec<String> = agg.issues().iter().map(|i| i.to_string()).collect();
            let drills: Vec<String> = agg
                .first_drills()
                .into_iter()
                .take(TEMPLATE_DRILL_LIMIT)
                .collect();
            [
                header,
                body,
                format!("Key improvements: {}.", join_or(&issues, ", ", "none")),
                format!("Try: {}.", join_or(&drills, "; ", "practice fundamentals")),
            ]
            .join(" ")
        }
    }
}
