use crate::shape::Shape;

/// All errors that can occur within continua.
///
/// Shape-family variants (`ShapeMismatch`, `UnsupportedChannels`,
/// `RankMismatch`, `ElementCountMismatch`) are raised before any pixel is
/// touched. Dataset and decode errors are propagated unchanged from the
/// collaborator that produced them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two shapes that must agree do not (e.g. foreground vs. `input_dim`).
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: Shape, got: Shape },

    /// Only 1- and 3-channel images can be composited.
    #[error("unsupported channel count: {channels} (expected 1 or 3)")]
    UnsupportedChannels { channels: usize },

    /// Image buffers must be rank 2 (H×W) or rank 3 (H×W×C / C×H×W).
    #[error("rank mismatch: expected rank {expected}, got {got}")]
    RankMismatch { expected: usize, got: usize },

    /// Element count mismatch when creating an image from a vec.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// A dataset was indexed past its end.
    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A dataset with no samples was used where at least one is required.
    #[error("dataset '{0}' is empty")]
    EmptyDataset(String),

    /// An image file could not be decoded.
    #[error("failed to decode {path}: {reason}")]
    ImageDecode { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }

    /// Whether this error describes a shape or channel problem with the input.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Error::ShapeMismatch { .. }
                | Error::UnsupportedChannels { .. }
                | Error::RankMismatch { .. }
                | Error::ElementCountMismatch { .. }
        )
    }
}

/// Convenience Result type used throughout continua.
pub type Result<T> = std::result::Result<T, Error>;
