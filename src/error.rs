//! Error taxonomy for level setup
//!
//! Only configuration problems are errors. Out-of-range indices and
//! missed shots are normal outcomes and never surface here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    /// Catmull-Rom baking needs at least four control points
    #[error("path needs at least 4 control points, found {found}")]
    TooFewControlPoints { found: usize },

    #[error("palette is empty")]
    EmptyPalette,

    #[error("ball spacing must be positive and finite, got {0}")]
    InvalidSpacing(f32),

    #[error("invalid setting `{field}`: {reason}")]
    InvalidSetting { field: &'static str, reason: String },

    #[error("failed to read level file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse level json: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChainError {
    pub(crate) fn setting(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            field,
            reason: reason.into(),
        }
    }
}
