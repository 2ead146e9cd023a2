//! Error types shared across FormCheck crates.

use std::path::PathBuf;

/// Top-level error type for FormCheck operations.
#[derive(Debug, thiserror::Error)]
pub enum FormcheckError {
    #[error("Unknown skill: {name}")]
    UnknownSkill { name: String },

    #[error("Missing upload: {message}")]
    MissingUpload { message: String },

    #[error("No valid frames: {label}")]
    NoValidFrames { label: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using FormcheckError.
pub type FormcheckResult<T> = Result<T, FormcheckError>;

impl FormcheckError {
    pub fn unknown_skill(name: impl Into<String>) -> Self {
        Self::UnknownSkill { name: name.into() }
    }

    pub fn missing_upload(msg: impl Into<String>) -> Self {
        Self::MissingUpload {
            message: msg.into(),
        }
    }

    pub fn no_valid_frames(label: impl Into<String>) -> Self {
        Self::NoValidFrames {
            label: label.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
