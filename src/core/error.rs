use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProjectionError {
    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl ProjectionError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ProjectionError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub fn parameter(&self) -> &'static str {
        match self {
            ProjectionError::InvalidParameter { name, .. } => name,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            ProjectionError::InvalidParameter { reason, .. } => reason,
        }
    }
}
