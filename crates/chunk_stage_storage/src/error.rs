use thiserror::Error;

pub type StageResult<T> = Result<T, StageError>;

/// Every failure a chunk stage can report.
#[derive(Debug, Error)]
pub enum StageError {
    /// A precondition on a public argument was violated.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("index {index:?} is out of bounds")]
    OutOfBounds { index: Vec<i32> },
    #[error("composite serializer fields disagree on endianness")]
    InconsistentEndianness,
    #[error("the store has been completed")]
    StoreClosed,
    #[error("operation cancelled")]
    Cancelled,
    #[error("truncated buffer: needed {needed} bytes but only {remaining} remain")]
    Truncated { needed: usize, remaining: usize },
    #[cfg(feature = "sled")]
    #[error("storage backend error: {0}")]
    Backend(#[from] sled::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StageError {
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    #[inline]
    pub fn out_of_bounds(index: &[i32]) -> Self {
        Self::OutOfBounds {
            index: index.to_vec(),
        }
    }

    /// True for failures that say nothing about the data, only about the caller giving up or the store going away.
    #[inline]
    pub fn is_interruption(&self) -> bool {
        matches!(self, Self::Cancelled | Self::StoreClosed)
    }
}
