//! Read, write and remove SAUCE metadata at the tail of files and buffers.
//!
//! ```no_run
//! use sauce::{SauceRecord, SauceSession};
//!
//! let session = SauceSession::new();
//! let mut record = SauceRecord::default();
//! record.set_title("Logo");
//! record.set_author("someone");
//! if session.write_record("logo.ans", &record).is_err() {
//!     eprintln!("{}", session.last_error().unwrap_or_default());
//! }
//! ```
//!
//! Every operation returns a [`Result`]; branch on [`SauceError::kind`].
//! [`SauceSession`] additionally keeps the text of the most recent failure
//! for callers used to polling an error string.

pub mod session;

pub use sauce_error::{ErrorKind, Result, SauceError};
pub use sauce_tail::{
    CommentState, FileStore, FixedBuffer, Splice, TailLayout, TailSource, TailStore,
    WRITE_RECORD_GROWTH, buffer, engine, file, write_comment_growth,
};
pub use sauce_types::{
    COMMENT_ID, COMMENT_ID_SIZE, COMMENT_LINE_LENGTH, Comment, DataType, EOF_CHAR,
    MAX_COMMENT_LINES, RECORD_ID, RECORD_SIZE, RECORD_VERSION, SauceRecord, comment_block_size,
    comment_lines_for, comment_string_length, comments_equal, total_size,
};
pub use session::{SauceSession, clear_error, default_session, last_error};
