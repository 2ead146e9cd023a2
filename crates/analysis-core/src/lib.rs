//! FormCheck Analysis Core
//!
//! Turns pose sequences into coaching output:
//! - **Geometry:** Joint angles and segment inclinations in pixel space
//! - **Smoothing:** Per-landmark exponential filter over keypoint streams
//! - **Skills:** One analyzer per exercise behind a common [`Skill`] contract
//! - **Sessions:** Per-clip analysis, cross-clip aggregation, feedback text
//!
//! This crate is pure computation. Pose files and knowledge bases are
//! loaded by the caller.

pub mod aggregate;
pub mod feedback;
pub mod geometry;
pub mod session;
pub mod skill;
pub mod skills;
pub mod smooth;

pub use aggregate::{Aggregator, Overall};
pub use feedback::{build_prompt, template_feedback, FeedbackMode};
pub use session::{analyze_attempt, AnalysisOptions, Attempt, AttemptInput, Session};
pub use skill::{get_skill, validate_uploads, AttemptAux, Skill, SkillKind};
pub use smooth::PoseSmoother;
