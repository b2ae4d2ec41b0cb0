//! Operation wrappers that remember the last failure.
//!
//! A [`SauceSession`] forwards to the [`file`](sauce_tail::file) and
//! [`buffer`](sauce_tail::buffer) surfaces unchanged. When an operation
//! fails, the session also stores a message naming the operation, the
//! target and the error. The message stays until it is overwritten by the
//! next failure or cleared with [`SauceSession::clear_error`]; successful
//! calls do not clear it.
//!
//! The process-wide [`default_session`] is shared by every thread, so its
//! last error may come from a concurrent call. Use a session per caller
//! when that matters.

use std::fmt;
use std::path::Path;

use parking_lot::Mutex;
use sauce_error::{Result, SauceError};
use sauce_tail::{TailLayout, buffer, file};
use sauce_types::{Comment, SauceRecord};
use tracing::debug;

static DEFAULT_SESSION: SauceSession = SauceSession::new();

/// The shared process-wide session.
pub fn default_session() -> &'static SauceSession {
    &DEFAULT_SESSION
}

/// Last error recorded by the [`default_session`].
pub fn last_error() -> Option<String> {
    DEFAULT_SESSION.last_error()
}

/// Clear the [`default_session`]'s last error.
pub fn clear_error() {
    DEFAULT_SESSION.clear_error();
}

/// What an operation ran against, for error messages.
enum Target<'a> {
    Path(&'a Path),
    Buffer { len: usize },
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "'{}'", path.display()),
            Self::Buffer { len } => write!(f, "buffer of {len} bytes"),
        }
    }
}

#[derive(Debug, Default)]
pub struct SauceSession {
    last_error: Mutex<Option<String>>,
}

impl SauceSession {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_error: parking_lot::const_mutex(None),
        }
    }

    /// Message of the most recent failure, if any.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    pub fn clear_error(&self) {
        *self.last_error.lock() = None;
    }

    fn set_error(&self, message: String) {
        debug!(error = %message, "sauce operation failed");
        *self.last_error.lock() = Some(message);
    }

    fn track<T>(&self, op: &str, target: &Target<'_>, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            self.set_error(format!("{op} on {target}: {err}"));
        }
        result
    }

    fn check_layout(&self, target: &Target<'_>, layout: Result<TailLayout>) -> bool {
        let outcome = layout.and_then(|layout| match layout.comment_error() {
            Some(err) => Err(err),
            None => Ok(()),
        });
        self.track("check", target, outcome).is_ok()
    }

    // === File surface ===

    pub fn locate(&self, path: impl AsRef<Path>) -> Result<TailLayout> {
        let path = path.as_ref();
        self.track("locate", &Target::Path(path), file::locate(path))
    }

    pub fn read_record(&self, path: impl AsRef<Path>) -> Result<SauceRecord> {
        let path = path.as_ref();
        self.track("read record", &Target::Path(path), file::read_record(path))
    }

    /// Read up to `lines` comment lines. A record without a comment yields
    /// an empty comment.
    pub fn read_comment(&self, path: impl AsRef<Path>, lines: u8) -> Result<Comment> {
        let path = path.as_ref();
        self.track(
            "read comment",
            &Target::Path(path),
            file::read_comment(path, lines),
        )
    }

    pub fn write_record(&self, path: impl AsRef<Path>, record: &SauceRecord) -> Result<u64> {
        let path = path.as_ref();
        self.track(
            "write record",
            &Target::Path(path),
            file::write_record(path, record),
        )
    }

    pub fn write_comment(&self, path: impl AsRef<Path>, text: impl AsRef<[u8]>) -> Result<u64> {
        let path = path.as_ref();
        self.track(
            "write comment",
            &Target::Path(path),
            file::write_comment(path, text.as_ref()),
        )
    }

    pub fn write_comment_lines(
        &self,
        path: impl AsRef<Path>,
        text: impl AsRef<[u8]>,
        lines: u8,
    ) -> Result<u64> {
        let path = path.as_ref();
        self.track(
            "write comment",
            &Target::Path(path),
            file::write_comment_lines(path, text.as_ref(), lines),
        )
    }

    pub fn remove_record(&self, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        self.track("remove record", &Target::Path(path), file::remove_record(path))
    }

    pub fn remove_comment(&self, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        self.track(
            "remove comment",
            &Target::Path(path),
            file::remove_comment(path),
        )
    }

    /// `true` when the file holds a record with a consistent comment.
    /// On `false` the reason is available from [`Self::last_error`].
    pub fn check(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.check_layout(&Target::Path(path), file::locate(path))
    }

    // === Buffer surface ===

    pub fn locate_buffer(&self, data: &[u8]) -> Result<TailLayout> {
        let target = Target::Buffer { len: data.len() };
        self.track("locate", &target, buffer::locate(data))
    }

    pub fn read_record_buffer(&self, data: &[u8]) -> Result<SauceRecord> {
        let target = Target::Buffer { len: data.len() };
        self.track("read record", &target, buffer::read_record(data))
    }

    pub fn read_comment_buffer(&self, data: &[u8], lines: u8) -> Result<Comment> {
        let target = Target::Buffer { len: data.len() };
        self.track("read comment", &target, buffer::read_comment(data, lines))
    }

    /// Needs up to [`WRITE_RECORD_GROWTH`](sauce_tail::WRITE_RECORD_GROWTH)
    /// spare bytes past `len`.
    pub fn write_record_buffer(
        &self,
        buf: &mut [u8],
        len: usize,
        record: &SauceRecord,
    ) -> Result<usize> {
        self.track(
            "write record",
            &Target::Buffer { len },
            buffer::write_record(buf, len, record),
        )
    }

    pub fn write_comment_buffer(
        &self,
        buf: &mut [u8],
        len: usize,
        text: impl AsRef<[u8]>,
    ) -> Result<usize> {
        self.track(
            "write comment",
            &Target::Buffer { len },
            buffer::write_comment(buf, len, text.as_ref()),
        )
    }

    pub fn write_comment_lines_buffer(
        &self,
        buf: &mut [u8],
        len: usize,
        text: impl AsRef<[u8]>,
        lines: u8,
    ) -> Result<usize> {
        self.track(
            "write comment",
            &Target::Buffer { len },
            buffer::write_comment_lines(buf, len, text.as_ref(), lines),
        )
    }

    pub fn remove_record_buffer(&self, buf: &mut [u8], len: usize) -> Result<usize> {
        self.track(
            "remove record",
            &Target::Buffer { len },
            buffer::remove_record(buf, len),
        )
    }

    pub fn remove_comment_buffer(&self, buf: &mut [u8], len: usize) -> Result<usize> {
        self.track(
            "remove comment",
            &Target::Buffer { len },
            buffer::remove_comment(buf, len),
        )
    }

    pub fn check_buffer(&self, data: &[u8]) -> bool {
        let target = Target::Buffer { len: data.len() };
        self.check_layout(&target, buffer::locate(data))
    }

    /// Record an error produced outside the session, e.g. by calling the
    /// [`engine`](sauce_tail::engine) directly on a custom store.
    pub fn record_error(&self, op: &str, err: &SauceError) {
        self.set_error(format!("{op}: {err}"));
    }
}
