//! Validate a pose file.

use std::path::PathBuf;

use formcheck_pose_model::{Landmark, PoseSequence};

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating pose file: {}", path.display());

    let sequence =
        PoseSequence::load(&path).map_err(|e| anyhow::anyhow!("Failed to load pose file: {e}"))?;

    println!("  Frames: {}", sequence.len());
    println!("  Frames with a detection: {}", sequence.detected_frames());
    if let Some(first) = sequence.get(0) {
        println!(
            "  Image size: {}x{}",
            first.image_size.width, first.image_size.height
        );
    }

    println!("  Landmark coverage:");
    for landmark in Landmark::ALL {
        let seen = sequence.coverage(landmark);
        if seen > 0 {
            println!("    {:<16} {}/{}", landmark.name(), seen, sequence.len());
        }
    }

    let problems = sequence.validate();
    if problems.is_empty() {
        println!("\nPose file is valid.");
    } else {
        println!("\nValidation issues:");
        for problem in &problems {
            println!("  - {problem}");
        }
        println!("\n{} issue(s) found.", problems.len());
    }

    sequence
        .ensure_valid()
        .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
    Ok(())
}
