use thiserror::Error;

/// Failure of a pipeline stage. Surfaces synchronously to the caller of
/// `EditGraph::resolve`; a failing node never degrades to a pass-through.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("invalid parameters for `{node}`: {reason}")]
    InvalidNodeParameters { node: String, reason: String },

    #[error("no handler registered for node `{0}`")]
    UnknownNode(String),

    #[error("invalid pixel buffer: {0}")]
    InvalidBuffer(String),
}

impl PipelineError {
    pub(crate) fn invalid(node: &str, reason: impl Into<String>) -> Self {
        Self::InvalidNodeParameters {
            node: node.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("decode failed for {key}: {reason}")]
    Failed { key: String, reason: String },

    #[error("no decode task queued for {0}")]
    NotQueued(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("history cursor {cursor} out of range for {len} entries")]
    CursorOutOfRange { cursor: usize, len: usize },
}
