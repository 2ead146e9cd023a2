//! FormCheck Pose Model
//!
//! Defines the core data contracts shared by the analysis engine and its callers:
//! - **Keypoints:** Named 2D landmarks with confidence, in pixel space
//! - **Sequences:** One pose frame per sampled video frame of a clip
//! - **Features:** Per-attempt metrics, issue vocabulary, and evaluation results
//! - **Knowledge base:** Issue-keyed explanations and drills per exercise
//!
//! Pixel coordinates follow image convention: `y` grows downward.

pub mod features;
pub mod keypoint;
pub mod knowledge;
pub mod sequence;
pub mod upload;

pub use features::*;
pub use keypoint::*;
pub use knowledge::*;
pub use sequence::*;
pub use upload::*;
