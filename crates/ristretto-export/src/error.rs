use thiserror::Error;

/// Per-task export failure. Every variant carries the input index of the
/// buffer it belongs to; one failed task never affects the others.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("encoding image {index} failed: {reason}")]
    EncodeFailed { index: usize, reason: String },

    #[error("encoding image {index} timed out after {after_ms} ms")]
    Timeout { index: usize, after_ms: u64 },

    #[error("worker for image {index} exited before replying")]
    WorkerLost { index: usize },
}

impl ExportError {
    pub fn index(&self) -> usize {
        match self {
            Self::EncodeFailed { index, .. }
            | Self::Timeout { index, .. }
            | Self::WorkerLost { index } => *index,
        }
    }
}
