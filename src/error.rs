use thiserror::Error;

/// Recoverable editing failures. None of these leave the layout in a
/// partially modified state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("nothing to undo")]
    EmptyHistory,
    #[error("nothing to redo")]
    EmptyFuture,
    /// The requested edit would not change any cell; do not submit a command.
    #[error("operation would not change the layout")]
    NoOp,
    #[error("region must be square ({width}x{height} given)")]
    InvalidRegion { width: u16, height: u16 },
    #[error("layout dimensions must be non-zero ({width}x{height} given)")]
    InvalidDimensions { width: u16, height: u16 },
    #[error("a drawing gesture is still in progress")]
    GestureInProgress,
}

/// Error type for .bss / .sls file operations
#[derive(Debug, Error)]
pub enum SessionFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("tile layer has {actual} entries, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Edit(#[from] EditError),
}

impl From<Box<bincode::ErrorKind>> for SessionFileError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SessionFileError::Serialize(e.to_string())
    }
}
