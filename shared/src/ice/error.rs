use std::fmt;

use super::CaptureKind;

/// Errors raised while building or driving an ice surface.
///
/// Construction errors are returned to the caller. Per-frame errors are
/// collected in a [`FrameReport`](super::FrameReport) and logged, never
/// propagated across the frame boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum IceError {
    /// A required render-to-texture collaborator is not available.
    MissingDependency(&'static str),
    /// One capture pass failed this frame; its target keeps the previous content.
    RenderStepFailure { target: CaptureKind, reason: String },
    /// Options that cannot produce a usable surface.
    InvalidConfiguration(String),
}

impl IceError {
    pub fn render_step(target: CaptureKind, reason: impl Into<String>) -> Self {
        IceError::RenderStepFailure {
            target,
            reason: reason.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        IceError::InvalidConfiguration(reason.into())
    }

    /// Whether the error only degrades the current frame.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, IceError::RenderStepFailure { .. })
    }
}

impl fmt::Display for IceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IceError::MissingDependency(name) => {
                write!(f, "Required component {name} not found")
            }
            IceError::RenderStepFailure { target, reason } => {
                write!(f, "{target} capture failed: {reason}")
            }
            IceError::InvalidConfiguration(reason) => {
                write!(f, "Invalid ice configuration: {reason}")
            }
        }
    }
}

impl std::error::Error for IceError {}
