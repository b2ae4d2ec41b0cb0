use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for SAUCE operations.
///
/// Structured variants carry enough context to build a useful diagnostic;
/// [`SauceError::kind`] collapses them into the small taxonomy callers are
/// expected to branch on.
#[derive(Error, Debug)]
pub enum SauceError {
    // === Structural errors ===
    /// The last 128 bytes of the source do not start with `SAUCE`.
    #[error("SAUCE record not found at the end of the source")]
    RecordNotFound,

    /// The record declares comment lines but no `COMNT` block sits where
    /// the declared count says it should.
    #[error("SAUCE comment block not found: record declares {lines} line(s)")]
    CommentNotFound { lines: u8 },

    /// The record declares more comment lines than the source can hold.
    #[error(
        "SAUCE comment block too short: {lines} line(s) need {required} bytes before the record, only {available} available"
    )]
    CommentTooShort {
        lines: u8,
        required: u64,
        available: u64,
    },

    /// A comment operation was requested on a record without comment lines.
    #[error("SAUCE record has no comment block")]
    NoComment,

    /// The source is non-empty but shorter than a record.
    #[error("source too short: {len} bytes, a SAUCE record needs {required}")]
    TooShort { len: u64, required: u64 },

    /// The source has zero length.
    #[error("source is empty")]
    Empty,

    // === Caller errors ===
    /// A required input was missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A fixed-capacity buffer cannot hold the result of the operation.
    #[error("buffer capacity exceeded: need {required} bytes, capacity is {capacity}")]
    CapacityExceeded { required: usize, capacity: usize },

    // === I/O errors ===
    /// The file could not be opened.
    #[error("cannot open '{path}': {source}")]
    CannotOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file operation failed after the file was opened.
    #[error("{op} failed on '{path}': {source}")]
    FileIo {
        path: PathBuf,
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Untargeted I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Internal ===
    /// Internal logic error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Error kinds callers branch on. The message text is supplementary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Record tag absent at the expected tail position.
    NotFound,
    /// Declared comment cannot be located, is too short, or does not exist.
    CommentNotFound,
    /// Source shorter than a record.
    TooShort,
    /// Zero-length source.
    Empty,
    /// Missing or malformed input, including insufficient buffer capacity.
    InvalidArgument,
    /// Underlying open/read/write/seek/truncate/rename failed.
    Io,
    /// Unexpected internal condition.
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "not found",
            Self::CommentNotFound => "comment not found",
            Self::TooShort => "too short",
            Self::Empty => "empty",
            Self::InvalidArgument => "invalid argument",
            Self::Io => "i/o failure",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

impl SauceError {
    /// Collapse this error into its [`ErrorKind`].
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RecordNotFound => ErrorKind::NotFound,
            Self::CommentNotFound { .. } | Self::CommentTooShort { .. } | Self::NoComment => {
                ErrorKind::CommentNotFound
            }
            Self::TooShort { .. } => ErrorKind::TooShort,
            Self::Empty => ErrorKind::Empty,
            Self::InvalidArgument(_) | Self::CapacityExceeded { .. } => ErrorKind::InvalidArgument,
            Self::CannotOpen { .. } | Self::FileIo { .. } | Self::Io(_) => ErrorKind::Io,
            Self::Internal(_) => ErrorKind::Other,
        }
    }

    /// Legacy integer code used by the C tooling.
    #[allow(clippy::match_same_arms)]
    pub const fn error_code(&self) -> i32 {
        match self {
            Self::CannotOpen { .. } => -1,
            Self::RecordNotFound => -2,
            Self::CommentNotFound { .. } | Self::CommentTooShort { .. } | Self::NoComment => -3,
            Self::TooShort { .. } => -4,
            Self::InvalidArgument(_) | Self::CapacityExceeded { .. } => -5,
            Self::FileIo { .. } | Self::Io(_) => -6,
            Self::Empty => -7,
            Self::Internal(_) => -8,
        }
    }

    /// Whether this error means "there is no SAUCE data here" rather than
    /// "there is SAUCE data but it is broken".
    pub const fn is_absent(&self) -> bool {
        matches!(
            self,
            Self::RecordNotFound | Self::TooShort { .. } | Self::Empty
        )
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Wrap an I/O error with the file and operation it came from.
    pub fn file_io(path: impl Into<PathBuf>, op: &'static str, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            op,
            source,
        }
    }
}

/// Result type alias using `SauceError`.
pub type Result<T> = std::result::Result<T, SauceError>;
