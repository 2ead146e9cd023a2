//! Analyze one exercise session from per-view pose files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use formcheck_analysis_core::{
    analyze_attempt, build_prompt, template_feedback, AnalysisOptions, Attempt, AttemptInput,
    FeedbackMode, Overall, Session, SkillKind,
};
use formcheck_common::{AppConfig, FormcheckError};
use formcheck_pose_model::{KnowledgeBase, PoseSequence, UploadSlot};
use serde::Serialize;

#[derive(Serialize)]
struct Report<'a> {
    generated_at: DateTime<Utc>,
    exercise: &'static str,
    mode: FeedbackMode,
    attempts: &'a [Attempt],
    excluded: &'a [String],
    overall: Overall,
    prompt: String,
    template: String,
}

/// Split a `VIEW=PATH` argument.
fn parse_clip_arg(arg: &str) -> anyhow::Result<(String, PathBuf)> {
    match arg.split_once('=') {
        Some((view, path)) if !view.trim().is_empty() && !path.trim().is_empty() => {
            Ok((view.trim().to_string(), PathBuf::from(path.trim())))
        }
        _ => anyhow::bail!("Invalid --clip '{arg}', expected VIEW=PATH"),
    }
}

fn load_clip(view: &str, path: &Path) -> anyhow::Result<PoseSequence> {
    if !path.is_file() {
        return Err(FormcheckError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }
    let sequence =
        PoseSequence::load(path).map_err(|e| anyhow::anyhow!("Failed to load {view} clip: {e}"))?;
    for problem in sequence.validate() {
        tracing::warn!(view, path = %path.display(), "{problem}");
    }
    Ok(sequence)
}

/// Bind clips to the skill's slots: slot label for display, slot order for sequencing.
fn bind_to_slots(slots: &[UploadSlot], clips: Vec<(String, PoseSequence)>) -> Vec<AttemptInput> {
    let position = |view: &str| {
        slots
            .iter()
            .position(|s| s.key == view)
            .unwrap_or(slots.len())
    };
    let mut inputs: Vec<AttemptInput> = clips
        .into_iter()
        .map(|(view, sequence)| {
            let label = slots
                .iter()
                .find(|s| s.key == view)
                .map(|s| s.label.clone())
                .unwrap_or_else(|| view.clone());
            AttemptInput::new(label, view, sequence)
        })
        .collect();
    inputs.sort_by_key(|input| position(&input.view));
    inputs
}

pub async fn run(
    mut config: AppConfig,
    exercise: String,
    clips: Vec<String>,
    kb_dir: Option<PathBuf>,
    alpha: Option<f64>,
    mode: String,
    json: bool,
) -> anyhow::Result<()> {
    let kind: SkillKind = exercise.parse()?;
    let mode: FeedbackMode = mode.parse()?;
    if let Some(alpha) = alpha {
        config.analysis.smoothing_alpha = alpha;
    }
    if let Some(dir) = kb_dir {
        config.knowledge_base_dir = dir;
    }
    config.validate()?;

    let kb = KnowledgeBase::load(&config.knowledge_base_dir, kind.name())
        .map_err(|e| anyhow::anyhow!("Failed to load knowledge base: {e}"))?;
    if kb.is_empty() {
        tracing::warn!(
            exercise = kind.name(),
            dir = %config.knowledge_base_dir.display(),
            "No knowledge base found, drills will be empty"
        );
    }

    let mut loaded = Vec::with_capacity(clips.len());
    for arg in &clips {
        let (view, path) = parse_clip_arg(arg)?;
        let sequence = load_clip(&view, &path)?;
        loaded.push((view, sequence));
    }
    let inputs = bind_to_slots(&kind.skill().upload_spec(), loaded);
    Session::check_uploads(kind, &inputs)?;

    let options = AnalysisOptions::from(&config.analysis);
    let kb = Arc::new(kb);
    let handles: Vec<_> = inputs
        .into_iter()
        .map(|input| {
            let kb = Arc::clone(&kb);
            let label = input.label.clone();
            let handle = tokio::task::spawn_blocking(move || {
                analyze_attempt(kind.skill(), input, &kb, &options)
            });
            (label, handle)
        })
        .collect();

    let mut attempts = Vec::new();
    let mut excluded = Vec::new();
    for (label, handle) in handles {
        match handle
            .await
            .with_context(|| format!("Analysis task for '{label}' failed"))?
        {
            Some(attempt) => attempts.push(attempt),
            None => excluded.push(label),
        }
    }
    let session = Session::from_parts(kind, attempts, excluded)?;

    let prompt = build_prompt(kind.name(), session.attempts(), mode);
    let template = template_feedback(kind.name(), session.attempts(), mode);

    if json {
        let report = Report {
            generated_at: Utc::now(),
            exercise: kind.name(),
            mode,
            attempts: session.attempts(),
            excluded: session.excluded(),
            overall: session.aggregate().overall(),
            prompt,
            template,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{} session", session.skill().display_name());
    println!("{}", "=".repeat(50));
    for attempt in session.attempts() {
        println!();
        println!("{} (view={})", attempt.label, attempt.view);
        println!("  Score: {:.2}", attempt.evaluation.score);
        for (name, value) in attempt.features.iter() {
            println!("  {name:<26} {value:.2}");
        }
        println!("  Key frames: {:?} (primary {})", attempt.key_frames, attempt.key_frame);
        if !attempt.overlay_labels.is_empty() {
            println!("  Overlay: {}", attempt.overlay_labels.join(" | "));
        }
        if attempt.evaluation.issues.is_empty() {
            println!("  Issues: none");
        }
        for issue in &attempt.evaluation.issues {
            println!("  [ISSUE] {issue}");
        }
        for rec in &attempt.recommendations {
            println!("    {}: {}", rec.issue, rec.explain);
            for drill in &rec.drills {
                println!("      - {drill}");
            }
        }
    }

    for label in session.excluded() {
        println!();
        println!("[WARN] {label}: no usable landmarks, clip excluded");
    }

    let overall = session.aggregate().overall();
    println!();
    println!("Overall");
    println!("{}", "-".repeat(50));
    let issues: Vec<String> = overall.issues.iter().map(|i| i.to_string()).collect();
    println!(
        "  Issues: {}",
        if issues.is_empty() {
            "none".to_string()
        } else {
            issues.join(", ")
        }
    );
    println!();
    println!("Feedback ({mode}):");
    println!("  {template}");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clip_arg() {
        let (view, path) = parse_clip_arg("side=clips/side.jsonl").unwrap();
        assert_eq!(view, "side");
        assert_eq!(path, PathBuf::from("clips/side.jsonl"));
        assert!(parse_clip_arg("side.jsonl").is_err());
        assert!(parse_clip_arg("=side.jsonl").is_err());
    }

    #[test]
    fn test_missing_clip_is_file_not_found() {
        let path = std::env::temp_dir().join("formcheck_no_such_clip.jsonl");
        let _ = std::fs::remove_file(&path);
        let err = load_clip("side", &path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FormcheckError>(),
            Some(FormcheckError::FileNotFound { path: p }) if *p == path
        ));
        assert!(err.to_string().contains("formcheck_no_such_clip.jsonl"));
    }

    #[test]
    fn test_bind_to_slots_uses_slot_order_and_labels() {
        let slots = SkillKind::Squat.skill().upload_spec();
        let clips = vec![
            ("back".to_string(), PoseSequence::default()),
            ("side".to_string(), PoseSequence::default()),
            ("front".to_string(), PoseSequence::default()),
        ];
        let inputs = bind_to_slots(&slots, clips);
        let views: Vec<&str> = inputs.iter().map(|i| i.view.as_str()).collect();
        assert_eq!(views, ["front", "side", "back"]);
        assert_eq!(inputs[2].label, "back");
        assert_eq!(inputs[0].label, slots[0].label);
    }
}
