//! Camera-view upload slots an exercise asks for.

use serde::{Deserialize, Serialize};

/// One clip slot, keyed by the view it expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSlot {
    /// View key handed to feature extraction (`"front"`, `"side"`, ...).
    pub key: String,
    pub label: String,
    pub instruction: String,
    pub required: bool,
}

impl UploadSlot {
    pub fn new(key: &str, label: &str, instruction: &str, required: bool) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            instruction: instruction.to_string(),
            required,
        }
    }

    /// Generic slot used when an exercise declares none.
    pub fn primary() -> Self {
        Self::new(
            "primary",
            "Primary clip",
            "Best angle for this exercise.",
            true,
        )
    }
}

/// Whether the filled slot keys allow a session to run.
///
/// At least one required slot must be filled; when no slot is required,
/// any filled slot will do.
pub fn uploads_satisfied<S: AsRef<str>>(slots: &[UploadSlot], filled: &[S]) -> bool {
    let is_filled = |key: &str| filled.iter().any(|f| f.as_ref() == key);
    let mut required = slots.iter().filter(|s| s.required).peekable();
    if required.peek().is_some() {
        required.any(|s| is_filled(&s.key))
    } else {
        slots.iter().any(|s| is_filled(&s.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squat_like() -> Vec<UploadSlot> {
        vec![
            UploadSlot::new("front", "Front clip", "", false),
            UploadSlot::new("side", "Side clip", "", false),
        ]
    }

    #[test]
    fn test_optional_slots_need_any_one() {
        let slots = squat_like();
        assert!(uploads_satisfied(&slots, &["side"]));
        assert!(!uploads_satisfied::<&str>(&slots, &[]));
        assert!(!uploads_satisfied(&slots, &["back"]));
    }

    #[test]
    fn test_required_slot_must_be_filled() {
        let slots = vec![
            UploadSlot::new("side", "Side clip", "", true),
            UploadSlot::new("front", "Front clip", "", false),
        ];
        assert!(uploads_satisfied(&slots, &["side"]));
        assert!(!uploads_satisfied(&slots, &["front"]));
    }
}
