//! Error types
//!
//! The simulation itself never fails once a world exists; only building a
//! world from bad constants does.

/// Configuration errors, raised when a world is constructed
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A constant is out of its valid range
    #[error("invalid tuning `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },

    /// Tuning JSON could not be parsed
    #[error("tuning parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
